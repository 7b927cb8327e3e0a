//! Configuration management for multideploy
//!
//! Loads configuration from TOML files with environment variable substitution.
//! Every section has sensible defaults so the tool runs without a config file.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub submitter: SubmitterConfig,
    pub store: StoreConfig,
    pub ai: AiConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SubmitterConfig {
    /// Attempts per transaction before a transient error becomes terminal
    pub max_retries: u32,
    /// Base delay between retries; doubles per attempt
    pub retry_delay_ms: u64,
    /// Pause between consecutive submissions in a batch
    pub inter_tx_delay_ms: u64,
    pub receipt_poll_interval_ms: u64,
    pub receipt_timeout_secs: u64,
    pub gas_price_strategy: GasPriceStrategy,
    pub gas_price_buffer_percent: u64,
    pub max_gas_price_gwei: u64,
    /// Gas price multiplier (percent) when replacing a stuck transaction
    pub speed_up_percent: u64,
}

impl Default for SubmitterConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay_ms: 1_000,
            inter_tx_delay_ms: 500,
            receipt_poll_interval_ms: 500,
            receipt_timeout_secs: 120,
            gas_price_strategy: GasPriceStrategy::Legacy,
            gas_price_buffer_percent: 10,
            max_gas_price_gwei: 500,
            speed_up_percent: 125,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GasPriceStrategy {
    Legacy,
    Eip1559,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Path of the JSON endpoint catalog
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("blockchains.json"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    pub api_url: String,
    pub model: String,
    pub max_tokens: u32,
    /// Name of the environment variable holding the bearer credential.
    /// There is no default value for the credential itself.
    pub api_key_env: String,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.openai.com/v1/completions".to_string(),
            model: "gpt-3.5-turbo-instruct".to_string(),
            max_tokens: 150,
            api_key_env: "OPENAI_API_KEY".to_string(),
        }
    }
}

impl Settings {
    /// Load settings, preferring an explicit path, then MULTIDEPLOY_CONFIG,
    /// then config/default.toml. A missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => env::var("MULTIDEPLOY_CONFIG")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("config/default.toml")),
        };

        if !config_path.exists() {
            if path.is_some() {
                anyhow::bail!("Config file not found: {:?}", config_path);
            }
            return Ok(Settings::default());
        }

        let config_str = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        // Substitute environment variables
        let config_str = substitute_env_vars(&config_str);

        let settings: Settings =
            toml::from_str(&config_str).with_context(|| "Failed to parse configuration")?;

        settings.validate()?;

        Ok(settings)
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if self.submitter.max_retries == 0 {
            anyhow::bail!("submitter.max_retries must be at least 1");
        }
        if self.submitter.speed_up_percent <= 100 {
            anyhow::bail!("submitter.speed_up_percent must be greater than 100");
        }
        if self.submitter.max_gas_price_gwei == 0 {
            anyhow::bail!("submitter.max_gas_price_gwei must be nonzero");
        }
        Ok(())
    }
}

/// Substitute environment variables in the format ${VAR_NAME}
fn substitute_env_vars(input: &str) -> String {
    let mut result = input.to_string();
    let re = regex::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").unwrap();

    for cap in re.captures_iter(input) {
        let var_name = &cap[1];
        let var_value = env::var(var_name).unwrap_or_default();
        result = result.replace(&cap[0], &var_value);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_env_var_substitution() {
        env::set_var("TEST_VAR", "test_value");
        let input = "url = \"https://api.example.com/${TEST_VAR}/endpoint\"";
        let result = substitute_env_vars(input);
        assert_eq!(result, "url = \"https://api.example.com/test_value/endpoint\"");
    }

    #[test]
    fn missing_config_file_yields_defaults() {
        // Resolved through MULTIDEPLOY_CONFIG so the result never depends
        // on what the working directory contains; no other test reads or
        // writes this variable
        let dir = tempfile::tempdir().unwrap();
        env::set_var("MULTIDEPLOY_CONFIG", dir.path().join("absent.toml"));
        let settings = Settings::load(None);
        env::remove_var("MULTIDEPLOY_CONFIG");

        let settings = settings.unwrap();
        assert_eq!(settings.submitter.max_retries, 3);
        assert_eq!(settings.store.path, PathBuf::from("blockchains.json"));
    }

    #[test]
    fn explicit_missing_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Settings::load(Some(&dir.path().join("absent.toml"))).is_err());
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[submitter]\nmax_retries = 5\ngas_price_strategy = \"eip1559\"").unwrap();
        let settings = Settings::load(Some(file.path())).unwrap();
        assert_eq!(settings.submitter.max_retries, 5);
        assert_eq!(settings.submitter.gas_price_strategy, GasPriceStrategy::Eip1559);
        assert_eq!(settings.submitter.retry_delay_ms, 1_000);
        assert_eq!(settings.ai.max_tokens, 150);
    }

    #[test]
    fn zero_retries_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[submitter]\nmax_retries = 0").unwrap();
        assert!(Settings::load(Some(file.path())).is_err());
    }
}
