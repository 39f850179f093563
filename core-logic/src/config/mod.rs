use crate::error::ConfigError;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Inclusive range of whole seconds, e.g. `{ min = 5, max = 15 }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayRange {
    pub min: u64,
    pub max: u64,
}

impl DelayRange {
    pub const ZERO: DelayRange = DelayRange { min: 0, max: 0 };

    pub fn new(min: u64, max: u64) -> Self {
        Self { min, max }
    }

    pub fn validate(&self, field: &str) -> Result<(), ConfigError> {
        if self.min > self.max {
            return Err(ConfigError::InvalidValue {
                field: field.to_string(),
                reason: format!("min ({}) is greater than max ({})", self.min, self.max),
            });
        }
        Ok(())
    }

    /// Picks a delay uniformly from `[min, max]` seconds.
    pub fn sample(&self) -> Duration {
        if self.min >= self.max {
            return Duration::from_secs(self.min);
        }
        let secs = rand::thread_rng().gen_range(self.min..=self.max);
        Duration::from_secs(secs)
    }
}

impl Default for DelayRange {
    fn default() -> Self {
        Self::ZERO
    }
}

/// Upper bound for `retry.deadline_secs`: one hour.
pub const MAX_RETRY_DEADLINE_SECS: u64 = 3_600;

/// Retry policy as written in the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub delay_secs: u64,
    pub deadline_secs: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            delay_secs: 3,
            deadline_secs: 30,
        }
    }
}

impl RetrySettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "retry.max_attempts".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.deadline_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "retry.deadline_secs".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.deadline_secs > MAX_RETRY_DEADLINE_SECS {
            return Err(ConfigError::InvalidValue {
                field: "retry.deadline_secs".to_string(),
                reason: format!("must be at most {}", MAX_RETRY_DEADLINE_SECS),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyScheme {
    Http,
    Https,
    Socks4,
    Socks5,
}

impl FromStr for ProxyScheme {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "http" => Ok(ProxyScheme::Http),
            "https" => Ok(ProxyScheme::Https),
            "socks4" => Ok(ProxyScheme::Socks4),
            "socks5" => Ok(ProxyScheme::Socks5),
            other => Err(ConfigError::UnsupportedProxyScheme {
                scheme: other.to_string(),
                proxy: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for ProxyScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProxyScheme::Http => "http",
            ProxyScheme::Https => "https",
            ProxyScheme::Socks4 => "socks4",
            ProxyScheme::Socks5 => "socks5",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// `scheme://host:port`, credentials stripped
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl ProxyConfig {
    /// Validates the scheme against the supported set.
    pub fn scheme(&self) -> Result<ProxyScheme, ConfigError> {
        let scheme = self
            .url
            .split_once("://")
            .map(|(scheme, _)| scheme)
            .unwrap_or_default();

        scheme
            .parse::<ProxyScheme>()
            .map_err(|_| ConfigError::UnsupportedProxyScheme {
                scheme: scheme.to_string(),
                proxy: self.url.clone(),
            })
    }
}
