//! Configuration loader for megaeth-bot

use core_logic::{ConfigError, DelayRange, RetrySettings};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use url::Url;

pub const CAPMONSTER_KEY_ENV: &str = "CAPMONSTER_API_KEY";

/// Run-wide settings. Loaded once, then shared read-only by every worker.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Random pause before the first account is dispatched
    pub delay_before_start: DelayRange,
    /// Pause a worker keeps its slot for after finishing an account
    pub delay_between_accs: DelayRange,
    pub capmonster_api_key: String,
    pub shuffle_accs: bool,
    /// Worker count; the CLI flag or the prompt wins over this
    pub threads: Option<usize>,
    pub endpoints: Endpoints,
    pub retry: RetrySettings,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Endpoints {
    pub rpc_url: String,
    pub capmonster_url: String,
    pub faucet_url: String,
    pub verify_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            rpc_url: "https://carrot.megaeth.com/rpc".to_string(),
            capmonster_url: "https://api.capmonster.cloud".to_string(),
            faucet_url: "https://carrot.megaeth.com/claim".to_string(),
            verify_url: "https://c.thirdweb.com/event".to_string(),
        }
    }
}

impl Settings {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        if !path.exists() {
            return Err(ConfigError::FileNotFound { path: display });
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: display.clone(),
            msg: e.to_string(),
        })?;

        let mut settings = Self::from_toml_str(&content).map_err(|e| match e {
            ConfigError::ParseError { msg, .. } => ConfigError::ParseError { path: display, msg },
            other => other,
        })?;

        if let Ok(key) = std::env::var(CAPMONSTER_KEY_ENV) {
            if !key.trim().is_empty() {
                settings.capmonster_api_key = key;
            }
        }

        Ok(settings)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let settings: Settings = toml::from_str(content).map_err(|e| ConfigError::ParseError {
            path: "<inline>".to_string(),
            msg: e.to_string(),
        })?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.delay_before_start.validate("delay_before_start")?;
        self.delay_between_accs.validate("delay_between_accs")?;
        self.retry.validate()?;

        if self.threads == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "threads".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        if Url::parse(&self.endpoints.rpc_url).is_err() {
            return Err(ConfigError::InvalidRpcUrl {
                url: self.endpoints.rpc_url.clone(),
            });
        }

        for (field, value) in [
            ("endpoints.capmonster_url", &self.endpoints.capmonster_url),
            ("endpoints.faucet_url", &self.endpoints.faucet_url),
            ("endpoints.verify_url", &self.endpoints.verify_url),
        ] {
            if let Err(e) = Url::parse(value) {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    reason: e.to_string(),
                });
            }
        }

        Ok(())
    }

    pub fn has_captcha_key(&self) -> bool {
        !self.capmonster_api_key.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_file_uses_defaults() {
        let settings = Settings::from_toml_str("capmonster_api_key = \"abc\"").unwrap();
        assert_eq!(settings.endpoints, Endpoints::default());
        assert_eq!(settings.retry, RetrySettings::default());
        assert_eq!(settings.delay_between_accs, DelayRange::ZERO);
        assert!(!settings.shuffle_accs);
        assert!(settings.has_captcha_key());
    }

    #[test]
    fn test_full_file() {
        let settings = Settings::from_toml_str(
            r#"
            capmonster_api_key = ""
            shuffle_accs = true
            threads = 4
            delay_before_start = { min = 1, max = 5 }
            delay_between_accs = { min = 10, max = 20 }

            [endpoints]
            rpc_url = "http://127.0.0.1:8545"

            [retry]
            max_attempts = 3
            delay_secs = 1
            "#,
        )
        .unwrap();

        assert!(settings.shuffle_accs);
        assert_eq!(settings.threads, Some(4));
        assert_eq!(settings.delay_between_accs, DelayRange::new(10, 20));
        assert_eq!(settings.endpoints.rpc_url, "http://127.0.0.1:8545");
        assert_eq!(settings.endpoints.faucet_url, Endpoints::default().faucet_url);
        assert_eq!(settings.retry.max_attempts, 3);
        assert_eq!(settings.retry.deadline_secs, 30);
        assert!(!settings.has_captcha_key());
    }

    #[test]
    fn test_inverted_range_is_rejected() {
        let err = Settings::from_toml_str("delay_between_accs = { min = 9, max = 3 }").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "delay_between_accs"));
    }

    #[test]
    fn test_bad_rpc_url_is_rejected() {
        let err = Settings::from_toml_str("[endpoints]\nrpc_url = \"not a url\"").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRpcUrl { .. }));
    }

    #[test]
    fn test_missing_file() {
        let err = Settings::from_path("/nope/config.toml").unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }));
    }
}
