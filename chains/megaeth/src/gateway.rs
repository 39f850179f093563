//! Chain access for one account.
//!
//! [`ChainGateway`] is the narrow surface the transaction builder and the
//! mint workflow need. [`RpcGateway`] implements it over an alloy HTTP
//! provider whose transport comes from the shared client pool.

use alloy::eips::BlockNumberOrTag;
use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::client::ClientBuilder;
use alloy::rpc::types::TransactionRequest;
use alloy::transports::http::Http;
use alloy::transports::{RpcError, TransportError};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::{Instant, sleep, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::Url;

pub const CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(180);
pub const RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Debug, Error)]
pub enum GatewayError {
    /// Transport-level failure; usually transient.
    #[error("network error during {stage}: {reason}")]
    Network { stage: &'static str, reason: String },

    /// The simulated call would revert on-chain.
    #[error("gas estimation reverted: {0}")]
    EstimationReverted(String),

    /// The node refused the transaction (bad nonce, underpriced, ...).
    #[error("transaction rejected by node: {0}")]
    Rejected(String),

    #[error("latest block header carries no base fee")]
    MissingBaseFee,

    #[error("transaction {0} not mined within {1:?}")]
    ConfirmationTimeout(TxHash, Duration),

    #[error("cancelled")]
    Cancelled,
}

impl GatewayError {
    fn network(stage: &'static str, err: impl std::fmt::Display) -> Self {
        GatewayError::Network {
            stage,
            reason: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Receipt {
    pub tx_hash: TxHash,
    /// `false` when the transaction was mined but reverted
    pub success: bool,
    pub block_number: Option<u64>,
    pub gas_used: u64,
}

#[async_trait]
pub trait ChainGateway: Send + Sync {
    /// Address every read and estimate is made for
    fn address(&self) -> Address;

    async fn pending_nonce(&self) -> Result<u64, GatewayError>;

    async fn balance(&self) -> Result<U256, GatewayError>;

    async fn chain_id(&self) -> Result<u64, GatewayError>;

    async fn suggest_priority_fee(&self) -> Result<u128, GatewayError>;

    async fn latest_base_fee(&self) -> Result<u128, GatewayError>;

    async fn estimate_gas(&self, to: Address, value: U256, data: Bytes)
    -> Result<u64, GatewayError>;

    /// Broadcasts an EIP-2718 encoded signed transaction.
    async fn submit(&self, signed_tx: Bytes) -> Result<TxHash, GatewayError>;

    /// Blocks until `tx_hash` is mined, the run is cancelled, or the
    /// confirmation timeout passes.
    async fn wait_confirmed(&self, tx_hash: TxHash) -> Result<Receipt, GatewayError>;
}

/// Alloy-backed gateway, exclusively owned by one account's task.
pub struct RpcGateway {
    provider: Arc<dyn Provider + Send + Sync>,
    address: Address,
    cancel: CancellationToken,
    confirm_timeout: Duration,
    poll_interval: Duration,
}

impl RpcGateway {
    pub fn connect(
        rpc_url: &str,
        http: reqwest::Client,
        address: Address,
        cancel: CancellationToken,
    ) -> anyhow::Result<Self> {
        let url: Url = rpc_url
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid RPC URL {}: {}", rpc_url, e))?;

        let client = ClientBuilder::default()
            .layer(alloy::transports::layers::RetryBackoffLayer::new(
                5, 100, 2000,
            ))
            .transport(Http::with_client(http, url), false);

        let provider: Arc<dyn Provider + Send + Sync> =
            Arc::new(ProviderBuilder::new().connect_client(client));

        Ok(Self {
            provider,
            address,
            cancel,
            confirm_timeout: CONFIRMATION_TIMEOUT,
            poll_interval: RECEIPT_POLL_INTERVAL,
        })
    }

    /// Overrides how long [`ChainGateway::wait_confirmed`] waits and how
    /// often it polls.
    pub fn with_confirmation(mut self, timeout: Duration, poll_interval: Duration) -> Self {
        self.confirm_timeout = timeout;
        self.poll_interval = poll_interval;
        self
    }
}

/// JSON-RPC error responses are the node's verdict; anything else is transport.
fn classify(
    stage: &'static str,
    err: TransportError,
    on_response: fn(String) -> GatewayError,
) -> GatewayError {
    match err {
        RpcError::ErrorResp(payload) => on_response(payload.message.to_string()),
        other => GatewayError::network(stage, other),
    }
}

#[async_trait]
impl ChainGateway for RpcGateway {
    fn address(&self) -> Address {
        self.address
    }

    async fn pending_nonce(&self) -> Result<u64, GatewayError> {
        self.provider
            .get_transaction_count(self.address)
            .pending()
            .await
            .map_err(|e| GatewayError::network("nonce", e))
    }

    async fn balance(&self) -> Result<U256, GatewayError> {
        self.provider
            .get_balance(self.address)
            .await
            .map_err(|e| GatewayError::network("balance", e))
    }

    async fn chain_id(&self) -> Result<u64, GatewayError> {
        self.provider
            .get_chain_id()
            .await
            .map_err(|e| GatewayError::network("chain id", e))
    }

    async fn suggest_priority_fee(&self) -> Result<u128, GatewayError> {
        self.provider
            .get_max_priority_fee_per_gas()
            .await
            .map_err(|e| GatewayError::network("priority fee", e))
    }

    async fn latest_base_fee(&self) -> Result<u128, GatewayError> {
        let block = self
            .provider
            .get_block_by_number(BlockNumberOrTag::Latest)
            .await
            .map_err(|e| GatewayError::network("base fee", e))?
            .ok_or_else(|| GatewayError::network("base fee", "latest block not found"))?;

        block
            .header
            .base_fee_per_gas
            .map(u128::from)
            .ok_or(GatewayError::MissingBaseFee)
    }

    async fn estimate_gas(
        &self,
        to: Address,
        value: U256,
        data: Bytes,
    ) -> Result<u64, GatewayError> {
        let call = TransactionRequest::default()
            .from(self.address)
            .to(to)
            .value(value)
            .input(data.into());

        self.provider
            .estimate_gas(call)
            .await
            .map_err(|e| classify("gas estimate", e, GatewayError::EstimationReverted))
    }

    async fn submit(&self, signed_tx: Bytes) -> Result<TxHash, GatewayError> {
        let pending = self
            .provider
            .send_raw_transaction(&signed_tx)
            .await
            .map_err(|e| classify("submit", e, GatewayError::Rejected))?;
        Ok(*pending.tx_hash())
    }

    async fn wait_confirmed(&self, tx_hash: TxHash) -> Result<Receipt, GatewayError> {
        let deadline = Instant::now() + self.confirm_timeout;

        loop {
            let lookup = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(GatewayError::Cancelled),
                _ = sleep_until(deadline) => {
                    return Err(GatewayError::ConfirmationTimeout(tx_hash, self.confirm_timeout))
                }
                res = self.provider.get_transaction_receipt(tx_hash) => res,
            };

            match lookup {
                Ok(Some(receipt)) => {
                    return Ok(Receipt {
                        tx_hash,
                        success: receipt.status(),
                        block_number: receipt.block_number,
                        gas_used: receipt.gas_used,
                    });
                }
                Ok(None) => debug!("{} not mined yet", tx_hash),
                Err(e) => debug!("Receipt lookup for {} failed: {}", tx_hash, e),
            }

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(GatewayError::Cancelled),
                _ = sleep_until(deadline) => {
                    return Err(GatewayError::ConfirmationTimeout(tx_hash, self.confirm_timeout))
                }
                _ = sleep(self.poll_interval) => {}
            }
        }
    }
}
