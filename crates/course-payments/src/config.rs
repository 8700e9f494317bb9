//! Square Configuration
//!
//! Loaded from environment variables. Missing values do not fail loading;
//! each operation checks for what it needs when it runs.

use std::time::Duration;

use crate::error::{PaymentError, Result};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Square API environment
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SquareEnvironment {
    #[default]
    Sandbox,
    Production,
}

impl SquareEnvironment {
    pub const fn base_url(self) -> &'static str {
        match self {
            Self::Sandbox => "https://connect.squareupsandbox.com",
            Self::Production => "https://connect.squareup.com",
        }
    }

    fn from_env_value(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "production" => Self::Production,
            "sandbox" => Self::Sandbox,
            other => {
                tracing::warn!(value = %other, "Unrecognised SQUARE_ENVIRONMENT, using sandbox");
                Self::Sandbox
            }
        }
    }
}

/// Square client configuration
#[derive(Clone, Debug)]
pub struct SquareConfig {
    pub access_token: Option<String>,
    pub location_id: Option<String>,
    pub webhook_signature_key: Option<String>,

    /// URL Square posts webhooks to; Square signs it together with the body
    pub webhook_notification_url: Option<String>,

    pub environment: SquareEnvironment,

    /// Overrides the environment's base URL (tests, proxies)
    pub base_url: Option<String>,

    pub timeout: Duration,
}

impl Default for SquareConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            location_id: None,
            webhook_signature_key: None,
            webhook_notification_url: None,
            environment: SquareEnvironment::default(),
            base_url: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl SquareConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        let timeout = non_empty_var("SQUARE_TIMEOUT_SECS")
            .map_or(DEFAULT_TIMEOUT, |v| parse_timeout(&v));

        Self {
            access_token: non_empty_var("SQUARE_ACCESS_TOKEN"),
            location_id: non_empty_var("SQUARE_LOCATION_ID"),
            webhook_signature_key: non_empty_var("SQUARE_WEBHOOK_SIGNATURE_KEY"),
            webhook_notification_url: non_empty_var("SQUARE_WEBHOOK_NOTIFICATION_URL"),
            environment: non_empty_var("SQUARE_ENVIRONMENT")
                .map(|v| SquareEnvironment::from_env_value(&v))
                .unwrap_or_default(),
            base_url: non_empty_var("SQUARE_API_BASE_URL"),
            timeout,
        }
    }

    /// Base URL for API calls
    pub fn api_base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.environment.base_url())
    }

    /// Names of the required variables that are not set
    pub fn missing_vars(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.access_token.is_none() {
            missing.push("SQUARE_ACCESS_TOKEN");
        }
        if self.location_id.is_none() {
            missing.push("SQUARE_LOCATION_ID");
        }
        if self.webhook_signature_key.is_none() {
            missing.push("SQUARE_WEBHOOK_SIGNATURE_KEY");
        }
        if self.webhook_notification_url.is_none() {
            missing.push("SQUARE_WEBHOOK_NOTIFICATION_URL");
        }
        missing
    }

    pub const fn checkout_configured(&self) -> bool {
        self.access_token.is_some() && self.location_id.is_some()
    }

    /// Square signs the notification URL with every delivery, so webhooks
    /// cannot verify without it
    pub const fn webhook_configured(&self) -> bool {
        self.access_token.is_some()
            && self.webhook_signature_key.is_some()
            && self.webhook_notification_url.is_some()
    }

    /// Location to sell from, or a configuration error
    pub fn require_location_id(&self) -> Result<&str> {
        if !self.checkout_configured() {
            return Err(PaymentError::Config(
                "Square environment variables not set.".into(),
            ));
        }
        self.location_id
            .as_deref()
            .ok_or_else(|| PaymentError::Config("Square environment variables not set.".into()))
    }

    /// Webhook signature key, or a configuration error
    pub fn require_signature_key(&self) -> Result<&str> {
        self.webhook_signature_key
            .as_deref()
            .ok_or_else(|| PaymentError::Config("Square webhook signature key not set.".into()))
    }
}

/// Positive whole seconds; anything else falls back to the default
fn parse_timeout(value: &str) -> Duration {
    match value.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Duration::from_secs(secs),
        _ => {
            tracing::warn!(value, "Invalid SQUARE_TIMEOUT_SECS, using {}s", DEFAULT_TIMEOUT.as_secs());
            DEFAULT_TIMEOUT
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
