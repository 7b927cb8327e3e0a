//! Client for a third-party text-completion API
//!
//! One POST per question, no caching, no retry. The bearer credential is
//! read from the environment variable named in the config; there is no
//! compiled-in default.

use crate::config::AiConfig;
use crate::error::{DeployError, DeployResult};

use serde::{Deserialize, Serialize};

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    text: String,
}

pub struct AiClient {
    http: reqwest::Client,
    config: AiConfig,
    api_key: String,
}

impl AiClient {
    /// Build a client, reading the credential from the configured
    /// environment variable.
    pub fn from_env(config: AiConfig) -> DeployResult<Self> {
        let api_key = std::env::var(&config.api_key_env).map_err(|_| {
            DeployError::Config(format!(
                "Environment variable {} is not set",
                config.api_key_env
            ))
        })?;

        Ok(Self {
            http: reqwest::Client::new(),
            config,
            api_key,
        })
    }

    /// Request a single completion for `prompt`.
    pub async fn complete(&self, prompt: &str) -> DeployResult<String> {
        let request = CompletionRequest {
            model: &self.config.model,
            prompt,
            max_tokens: self.config.max_tokens,
        };

        let response = self
            .http
            .post(&self.config.api_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| DeployError::AiRequest(e.to_string()))?;

        if !response.status().is_success() {
            return Err(DeployError::AiRequest(format!(
                "completion endpoint returned {}",
                response.status()
            )));
        }

        let body: CompletionResponse = response
            .json()
            .await
            .map_err(|e| DeployError::AiRequest(format!("invalid response body: {}", e)))?;

        body.choices
            .into_iter()
            .next()
            .map(|c| c.text.trim().to_string())
            .ok_or_else(|| DeployError::AiRequest("no choices in completion response".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_credential_is_a_config_error() {
        let config = AiConfig {
            api_key_env: "MULTIDEPLOY_TEST_UNSET_KEY".to_string(),
            ..AiConfig::default()
        };
        std::env::remove_var("MULTIDEPLOY_TEST_UNSET_KEY");
        assert!(matches!(
            AiClient::from_env(config),
            Err(DeployError::Config(_))
        ));
    }

    #[test]
    fn response_parsing_takes_first_choice() {
        let body = r#"{"choices":[{"text":"  use a low gas price  "},{"text":"other"}]}"#;
        let parsed: CompletionResponse = serde_json::from_str(body).unwrap();
        let text = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.text.trim().to_string())
            .unwrap();
        assert_eq!(text, "use a low gas price");
    }
}
