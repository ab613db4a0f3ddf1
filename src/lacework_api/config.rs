use crate::lacework_api::client::{DEFAULT_REFRESH_MARGIN_SECONDS, DEFAULT_TOKEN_EXPIRY_SECONDS};
use crate::lacework_api::types::LaceworkError;

/// Lacework host, e.g. `acme.lacework.net`
pub const ENV_LACEWORK_URL: &str = "LACEWORK_URL";
/// Optional sub-account name
pub const ENV_LACEWORK_SUB_ACCOUNT: &str = "LACEWORK_SUB_ACCOUNT";
/// Secret identifier of the credential record
pub const ENV_LACEWORK_API_CREDENTIALS: &str = "LACEWORK_API_CREDENTIALS";
/// Optional token validity window override (seconds)
pub const ENV_LACEWORK_TOKEN_EXPIRY_SECONDS: &str = "LACEWORK_TOKEN_EXPIRY_SECONDS";

/// Settings for one onboarding target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaceworkConfig {
    pub host: String,
    pub sub_account: Option<String>,
    pub credentials_secret_id: String,
    pub token_expiry_seconds: u64,
    pub refresh_margin_seconds: i64,
}

impl LaceworkConfig {
    pub fn new(host: impl Into<String>, credentials_secret_id: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            sub_account: None,
            credentials_secret_id: credentials_secret_id.into(),
            token_expiry_seconds: DEFAULT_TOKEN_EXPIRY_SECONDS,
            refresh_margin_seconds: DEFAULT_REFRESH_MARGIN_SECONDS,
        }
    }

    /// Scope account operations to a sub-account; an empty name clears it
    pub fn with_sub_account(mut self, sub_account: impl Into<String>) -> Self {
        let sub_account = sub_account.into();
        self.sub_account = if sub_account.is_empty() {
            None
        } else {
            Some(sub_account)
        };
        self
    }

    pub fn with_token_expiry(mut self, seconds: u64) -> Self {
        self.token_expiry_seconds = seconds;
        self
    }

    pub fn with_refresh_margin(mut self, seconds: i64) -> Self {
        self.refresh_margin_seconds = seconds;
        self
    }

    /// Read configuration from `LACEWORK_*` environment variables
    pub fn from_env() -> Result<Self, LaceworkError> {
        let host = required_env(ENV_LACEWORK_URL)?;
        let credentials_secret_id = required_env(ENV_LACEWORK_API_CREDENTIALS)?;

        let mut config = Self::new(host, credentials_secret_id);

        if let Ok(sub_account) = std::env::var(ENV_LACEWORK_SUB_ACCOUNT) {
            config = config.with_sub_account(sub_account.trim());
        }

        if let Ok(raw) = std::env::var(ENV_LACEWORK_TOKEN_EXPIRY_SECONDS) {
            let seconds = raw.trim().parse::<u64>().map_err(|e| {
                LaceworkError::Config(format!(
                    "{} must be a number of seconds, got {:?}: {}",
                    ENV_LACEWORK_TOKEN_EXPIRY_SECONDS, raw, e
                ))
            })?;
            config = config.with_token_expiry(seconds);
        }

        tracing::debug!(
            "Loaded Lacework configuration: host={}, sub_account={:?}",
            config.host,
            config.sub_account
        );
        Ok(config)
    }

    /// Lacework account name, the first DNS label of the host
    ///
    /// `acme.lacework.net` and `https://acme.lacework.net` both give `acme`.
    pub fn account_name(&self) -> &str {
        let host = self
            .host
            .split_once("://")
            .map(|(_, rest)| rest)
            .unwrap_or(&self.host);
        host.split('.').next().unwrap_or(host)
    }
}

fn required_env(name: &str) -> Result<String, LaceworkError> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(LaceworkError::Config(format!(
            "{} environment variable is not set",
            name
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    fn clear_env() {
        for name in [
            ENV_LACEWORK_URL,
            ENV_LACEWORK_SUB_ACCOUNT,
            ENV_LACEWORK_API_CREDENTIALS,
            ENV_LACEWORK_TOKEN_EXPIRY_SECONDS,
        ] {
            env::remove_var(name);
        }
    }

    #[test]
    fn test_account_name_from_host() {
        assert_eq!(LaceworkConfig::new("acme.lacework.net", "s").account_name(), "acme");
        assert_eq!(
            LaceworkConfig::new("https://acme.fra.lacework.net", "s").account_name(),
            "acme"
        );
        assert_eq!(LaceworkConfig::new("localhost", "s").account_name(), "localhost");
    }

    #[test]
    fn test_empty_sub_account_is_none() {
        let config = LaceworkConfig::new("acme.lacework.net", "s").with_sub_account("");
        assert!(config.sub_account.is_none());
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        clear_env();
        env::set_var(ENV_LACEWORK_URL, "acme.lacework.net");
        env::set_var(ENV_LACEWORK_API_CREDENTIALS, "LaceworkApiCredentials");

        let config = LaceworkConfig::from_env().unwrap();
        assert_eq!(config.host, "acme.lacework.net");
        assert_eq!(config.credentials_secret_id, "LaceworkApiCredentials");
        assert_eq!(config.sub_account, None);
        assert_eq!(config.token_expiry_seconds, 86400);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        clear_env();
        env::set_var(ENV_LACEWORK_URL, "acme.lacework.net");
        env::set_var(ENV_LACEWORK_API_CREDENTIALS, "creds");
        env::set_var(ENV_LACEWORK_SUB_ACCOUNT, "ProdTenant");
        env::set_var(ENV_LACEWORK_TOKEN_EXPIRY_SECONDS, "3600");

        let config = LaceworkConfig::from_env().unwrap();
        assert_eq!(config.sub_account.as_deref(), Some("ProdTenant"));
        assert_eq!(config.token_expiry_seconds, 3600);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_missing_host() {
        clear_env();
        env::set_var(ENV_LACEWORK_API_CREDENTIALS, "creds");

        let err = LaceworkConfig::from_env().unwrap_err();
        assert!(matches!(err, LaceworkError::Config(msg) if msg.contains(ENV_LACEWORK_URL)));

        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_bad_expiry() {
        clear_env();
        env::set_var(ENV_LACEWORK_URL, "acme.lacework.net");
        env::set_var(ENV_LACEWORK_API_CREDENTIALS, "creds");
        env::set_var(ENV_LACEWORK_TOKEN_EXPIRY_SECONDS, "one day");

        assert!(matches!(
            LaceworkConfig::from_env(),
            Err(LaceworkError::Config(_))
        ));

        clear_env();
    }
}
