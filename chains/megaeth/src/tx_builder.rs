//! Fee-market transaction assembly and signing.

use crate::gateway::{ChainGateway, GatewayError};
use alloy::consensus::{SignableTransaction, TxEip1559, TxEnvelope};
use alloy::eips::Encodable2718;
use alloy::primitives::{Address, Bytes, TxKind, U256};
use alloy::signers::Signer;
use alloy::signers::local::PrivateKeySigner;
use anyhow::{Context, Result};
use thiserror::Error;

/// Build failure, tagged with the stage that failed.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("nonce fetch failed: {0}")]
    Nonce(GatewayError),

    #[error("chain id fetch failed: {0}")]
    ChainId(GatewayError),

    #[error("base fee fetch failed: {0}")]
    BaseFee(GatewayError),

    #[error("priority fee suggestion failed: {0}")]
    PriorityFee(GatewayError),

    #[error("gas estimation failed: {0}")]
    GasEstimate(GatewayError),

    #[error("fee cap overflows: base fee {base_fee} + priority fee {priority_fee}")]
    FeeOverflow { base_fee: u128, priority_fee: u128 },
}

impl BuildError {
    pub fn stage(&self) -> &'static str {
        match self {
            BuildError::Nonce(_) => "nonce",
            BuildError::ChainId(_) => "chain id",
            BuildError::BaseFee(_) => "base fee",
            BuildError::PriorityFee(_) => "priority fee",
            BuildError::GasEstimate(_) => "gas estimate",
            BuildError::FeeOverflow { .. } => "fee cap",
        }
    }

    /// True when the call itself is invalid rather than the network flaky.
    pub fn is_revert(&self) -> bool {
        matches!(
            self,
            BuildError::GasEstimate(GatewayError::EstimationReverted(_))
        )
    }
}

/// Fee cap is base fee plus tip, with no buffer on top.
///
/// Keeps overpayment at zero; a base-fee spike between build and inclusion
/// can get the transaction rejected as underpriced.
pub fn fee_cap(base_fee: u128, priority_fee: u128) -> Result<u128, BuildError> {
    base_fee
        .checked_add(priority_fee)
        .ok_or(BuildError::FeeOverflow {
            base_fee,
            priority_fee,
        })
}

pub struct TransactionBuilder<'a, G: ?Sized> {
    gateway: &'a G,
}

impl<'a, G: ChainGateway + ?Sized> TransactionBuilder<'a, G> {
    pub fn new(gateway: &'a G) -> Self {
        Self { gateway }
    }

    /// Reads nonce, chain id, base fee, tip and gas limit in that order and
    /// assembles an unsigned EIP-1559 transaction. The first failing read
    /// aborts the build; later reads are not issued.
    pub async fn build(&self, to: Address, data: Bytes, value: U256) -> Result<TxEip1559, BuildError> {
        let nonce = self.gateway.pending_nonce().await.map_err(BuildError::Nonce)?;
        let chain_id = self.gateway.chain_id().await.map_err(BuildError::ChainId)?;
        let base_fee = self
            .gateway
            .latest_base_fee()
            .await
            .map_err(BuildError::BaseFee)?;
        let priority_fee = self
            .gateway
            .suggest_priority_fee()
            .await
            .map_err(BuildError::PriorityFee)?;
        let gas_limit = self
            .gateway
            .estimate_gas(to, value, data.clone())
            .await
            .map_err(BuildError::GasEstimate)?;

        Ok(TxEip1559 {
            chain_id,
            nonce,
            gas_limit,
            max_fee_per_gas: fee_cap(base_fee, priority_fee)?,
            max_priority_fee_per_gas: priority_fee,
            to: TxKind::Call(to),
            value,
            access_list: Default::default(),
            input: data,
        })
    }
}

/// Signs `tx` and returns its EIP-2718 encoding, ready for broadcast.
pub async fn sign_transaction(signer: &PrivateKeySigner, tx: TxEip1559) -> Result<Bytes> {
    let hash = tx.signature_hash();
    let signature = signer
        .sign_hash(&hash)
        .await
        .context("Failed to sign transaction")?;

    let envelope = TxEnvelope::from(tx.into_signed(signature));
    Ok(envelope.encoded_2718().into())
}
