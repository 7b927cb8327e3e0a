//! Error types for multideploy

use thiserror::Error;

/// Main error type for batch submission and endpoint management
#[derive(Error, Debug)]
pub enum DeployError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Endpoint catalog error: {0}")]
    Store(String),

    #[error("Endpoint '{0}' not found in catalog")]
    EndpointNotFound(String),

    #[error("Endpoint '{0}' already exists in catalog")]
    DuplicateEndpoint(String),

    #[error("Connection error to {url}: {message}")]
    Connection { url: String, message: String },

    #[error("Wallet error: {0}")]
    Wallet(String),

    #[error("Nonce fetch error: {0}")]
    NonceFetch(String),

    #[error("Gas price error: {0}")]
    GasPrice(String),

    #[error("Signing error: {0}")]
    Signing(String),

    #[error("Send error: {0}")]
    Send(String),

    #[error("Receipt error: {0}")]
    Receipt(String),

    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),

    #[error("Invalid transaction template: {0}")]
    Template(String),

    #[error("Timeout waiting for {operation}")]
    Timeout { operation: String },

    #[error("Batch run cancelled")]
    Cancelled,

    #[error("AI request error: {0}")]
    AiRequest(String),
}

impl DeployError {
    /// Check if an error is transient and worth retrying with backoff.
    ///
    /// Permanent failures (bad key, signing, malformed template, reverted
    /// or rejected transactions) abort the batch immediately.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DeployError::Connection { .. }
                | DeployError::NonceFetch(_)
                | DeployError::GasPrice(_)
                | DeployError::Send(_)
                | DeployError::Timeout { .. }
        )
    }
}

/// Result type for multideploy operations
pub type DeployResult<T> = Result<T, DeployError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_errors_are_retryable() {
        assert!(DeployError::Connection {
            url: "http://localhost:8545".to_string(),
            message: "refused".to_string(),
        }
        .is_retryable());
        assert!(DeployError::Timeout {
            operation: "receipt".to_string()
        }
        .is_retryable());
        assert!(DeployError::Send("nonce too low".to_string()).is_retryable());
    }

    #[test]
    fn permanent_errors_are_not_retryable() {
        assert!(!DeployError::Wallet("bad key".to_string()).is_retryable());
        assert!(!DeployError::Signing("bad chain id".to_string()).is_retryable());
        assert!(!DeployError::InsufficientFunds("have 0".to_string()).is_retryable());
        assert!(!DeployError::Receipt("reverted".to_string()).is_retryable());
        assert!(!DeployError::Cancelled.is_retryable());
    }
}
