//! MegaETH testnet bot.
//!
//! Runs one selected workflow (faucet claim or an NFT mint) for every
//! loaded account, with bounded concurrency, a rotating pool of proxied
//! HTTP clients and a uniform retry policy for every external call.

pub mod accounts;
pub mod captcha;
pub mod config;
pub mod context;
pub mod faucet;
pub mod gateway;
pub mod tasks;
pub mod tx_builder;
pub mod verify;
pub mod workflows;

mod http;

pub use accounts::{AccountData, load_accounts};
pub use config::Settings;
pub use context::RunContext;
pub use gateway::{ChainGateway, GatewayError, Receipt, RpcGateway};
pub use tx_builder::{BuildError, TransactionBuilder};
pub use workflows::{MintCall, MintDescriptor, MintVariant, Workflow, WorkflowKind, WorkflowTask};
