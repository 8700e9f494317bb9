//! Payment Error Types

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, PaymentError>;

/// Checkout and reconciliation errors
#[derive(Error, Debug)]
pub enum PaymentError {
    /// Required Square credentials are missing
    #[error("Configuration error: {0}")]
    Config(String),

    /// Caller supplied something we cannot act on (e.g. an unknown tier)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Square API call failed
    #[error("Square error: {0}")]
    Provider(String),

    /// Webhook signature verification failed
    #[error("{0}")]
    VerificationFailure(String),

    /// Verified webhook body could not be decoded
    #[error("Webhook parse error: {0}")]
    WebhookParse(String),

    /// Purchase storage error
    #[error("Storage error: {0}")]
    Storage(String),
}

impl PaymentError {
    /// Check if this error is retryable
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Provider(_) | Self::Storage(_))
    }

    /// Get user-friendly message
    pub const fn user_message(&self) -> &str {
        match self {
            Self::Config(_) => "Payments are not configured.",
            Self::InvalidArgument(_) => "Invalid tier selected.",
            Self::Provider(_) => "Payment processing failed. Please try again.",
            Self::VerificationFailure(_) => "Webhook signature verification failed",
            Self::WebhookParse(_) => "Webhook payload could not be read.",
            Self::Storage(_) => "An error occurred processing your request.",
        }
    }

    /// Stable machine-readable code for API responses
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => "PAYMENTS_DISABLED",
            Self::InvalidArgument(_) => "INVALID_ARGUMENT",
            Self::Provider(_) => "PROVIDER_ERROR",
            Self::VerificationFailure(_) => "INVALID_SIGNATURE",
            Self::WebhookParse(_) => "WEBHOOK_PARSE_ERROR",
            Self::Storage(_) => "STORAGE_ERROR",
        }
    }
}

impl From<reqwest::Error> for PaymentError {
    fn from(err: reqwest::Error) -> Self {
        Self::Provider(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(PaymentError::Provider("timeout".into()).is_retryable());
        assert!(PaymentError::Storage("locked".into()).is_retryable());
        assert!(!PaymentError::InvalidArgument("Gold".into()).is_retryable());
        assert!(!PaymentError::VerificationFailure("bad".into()).is_retryable());
    }

    #[test]
    fn test_verification_message() {
        let err = PaymentError::VerificationFailure("Webhook signature verification failed".into());
        assert_eq!(err.to_string(), "Webhook signature verification failed");
        assert_eq!(err.code(), "INVALID_SIGNATURE");
    }
}
