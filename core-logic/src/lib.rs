//! # Core Logic - Shared Runtime for Account Bots
//!
//! This crate holds the chain-agnostic pieces every bot binary needs:
//! configuration primitives, typed errors, progress tracking, and the
//! runtime utilities that drive per-account work.
//!
//! ## Modules
//!
//! - [`config`] - Delay ranges, retry settings and proxy descriptions
//! - [`error`] - Typed error handling with thiserror
//! - [`metrics`] - Progress counter and run summary
//! - [`traits`] - The `Task` trait and task outcomes
//! - [`utils`] - Logger, proxy loading, client pool, retry executor, scheduler

pub mod config;
pub mod error;
pub mod metrics;
pub mod traits;
pub mod utils;

pub use config::{DelayRange, ProxyConfig, ProxyScheme, RetrySettings};
pub use error::{ConfigError, CoreError, NetworkError, PoolError, WalletError};
pub use metrics::{ProgressCounter, RunSummary};
pub use traits::{Task, TaskResult, TaskStatus};

pub use utils::{
    setup_logger, spawn_shutdown_listener, Attempt, ClientPool, ProxyManager, RetryError,
    RetryExecutor, RetryPolicy, Scheduler,
};
