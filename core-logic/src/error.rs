//! # Core Error Types
//!
//! Centralized error definitions for the core-logic crate.
//! All errors implement `std::error::Error` and `std::fmt::Display`.

use thiserror::Error;

/// Unified error type for core-logic operations.
///
/// Wraps the specific error families so the binary can surface a single
/// type for anything that goes wrong before dispatch begins.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error(transparent)]
    Config(ConfigError),

    #[error(transparent)]
    Wallet(WalletError),

    #[error(transparent)]
    Network(NetworkError),

    #[error(transparent)]
    Pool(PoolError),
}

impl From<ConfigError> for CoreError {
    fn from(e: ConfigError) -> Self {
        CoreError::Config(e)
    }
}

impl From<WalletError> for CoreError {
    fn from(e: WalletError) -> Self {
        CoreError::Wallet(e)
    }
}

impl From<NetworkError> for CoreError {
    fn from(e: NetworkError) -> Self {
        CoreError::Network(e)
    }
}

impl From<PoolError> for CoreError {
    fn from(e: PoolError) -> Self {
        CoreError::Pool(e)
    }
}

/// Configuration-related errors. All of these abort the run before any
/// account is dispatched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid RPC URL format: '{url}'")]
    InvalidRpcUrl { url: String },

    #[error("Missing required configuration field: '{field}'")]
    MissingField { field: String },

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Unsupported proxy scheme '{scheme}' in '{proxy}' (expected http, https, socks4 or socks5)")]
    UnsupportedProxyScheme { scheme: String, proxy: String },

    #[error("Unknown workflow: '{name}'")]
    UnknownWorkflow { name: String },

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("I/O error reading {path}: {msg}")]
    IoError { path: String, msg: String },

    #[error("Failed to parse {path}: {msg}")]
    ParseError { path: String, msg: String },
}

/// Account key and address errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    #[error("Invalid private key format: expected hex string")]
    InvalidKeyFormat,

    #[error("Private key has wrong length: expected 64 hex chars, got {length}")]
    InvalidKeyLength { length: usize },

    #[error("Invalid address: {value}")]
    InvalidAddress { value: String },

    #[error("Account has no signing key")]
    MissingSigner,
}

/// HTTP and RPC transport errors
#[derive(Error, Debug, Clone)]
pub enum NetworkError {
    #[error("Request to {endpoint} timed out")]
    Timeout { endpoint: String },

    #[error("Connection failed to {endpoint}: {reason}")]
    ConnectionFailed { endpoint: String, reason: String },

    #[error("HTTP error {status_code} from {endpoint}")]
    HttpError { status_code: u16, endpoint: String },

    #[error("Invalid response from {endpoint}: {reason}")]
    InvalidResponse { endpoint: String, reason: String },

    #[error("Request to {endpoint} rejected: {reason}")]
    Rejected { endpoint: String, reason: String },
}

impl NetworkError {
    /// Classifies a reqwest failure against `endpoint`.
    pub fn from_reqwest(endpoint: &str, err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            NetworkError::Timeout {
                endpoint: endpoint.to_string(),
            }
        } else if let Some(status) = err.status() {
            NetworkError::HttpError {
                status_code: status.as_u16(),
                endpoint: endpoint.to_string(),
            }
        } else {
            NetworkError::ConnectionFailed {
                endpoint: endpoint.to_string(),
                reason: err.to_string(),
            }
        }
    }
}

/// Client pool errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error("No client available: the pool is empty")]
    Empty,

    #[error("Failed to build client for proxy {proxy}: {reason}")]
    Build { proxy: String, reason: String },
}
