//! # Utilities Module
//!
//! Runtime plumbing shared by every chain crate: logging, proxies, the
//! client pool, the retry executor and the account scheduler.

pub mod client_pool;
pub mod logger;
pub mod proxy_manager;
pub mod retry;
pub mod runner;

pub use client_pool::{build_client, ClientPool, DEFAULT_CLIENT_TIMEOUT};
pub use logger::setup_logger;
pub use proxy_manager::ProxyManager;
pub use retry::{Attempt, RetryError, RetryExecutor, RetryPolicy};
pub use runner::{spawn_shutdown_listener, Scheduler};
