//! Descriptor-driven NFT mint.
//!
//! Build, sign, submit and wait for the receipt, then report the transaction
//! to the verification endpoint. A reverted receipt fails the account; a
//! rejected verification event only downgrades it to unverified.

use crate::accounts::AccountData;
use crate::context::RunContext;
use crate::gateway::ChainGateway;
use crate::tx_builder::{TransactionBuilder, sign_transaction};
use crate::verify::Verifier;
use crate::workflows::MintCall;
use alloy::signers::local::PrivateKeySigner;
use anyhow::Result;
use core_logic::TaskResult;
use tracing::{info, warn};

pub async fn run<M: MintCall + ?Sized>(
    ctx: &RunContext,
    account: &AccountData,
    mint: &M,
) -> Result<TaskResult> {
    let signer = match account.require_signer() {
        Ok(s) => s,
        Err(_) => {
            warn!("{} | {} has no signing key", ctx.label(account), account.log_data());
            return Ok(TaskResult::failed("no signing key"));
        }
    };
    let gateway = ctx.gateway(account)?;
    let verifier = ctx.verifier();

    mint_with(&gateway, signer, mint, Some(&verifier), &ctx.label(account)).await
}

/// Runs one mint against any [`ChainGateway`].
pub async fn mint_with<G, M>(
    gateway: &G,
    signer: &PrivateKeySigner,
    mint: &M,
    verifier: Option<&Verifier>,
    label: &str,
) -> Result<TaskResult>
where
    G: ChainGateway + ?Sized,
    M: MintCall + ?Sized,
{
    let name = mint.display_name();
    let contract = mint.contract_address();
    let call_data = mint.build_call_data(gateway.address());

    match gateway.balance().await {
        Ok(balance) if balance < mint.value() => {
            return Ok(TaskResult::failed(format!(
                "{}: balance {} wei is below the mint price {} wei",
                name,
                balance,
                mint.value()
            )));
        }
        Ok(_) => {}
        // estimation will surface a real funding problem
        Err(e) => warn!("{} | {} | Balance check skipped: {}", label, name, e),
    }

    let tx = match TransactionBuilder::new(gateway)
        .build(contract, call_data, mint.value())
        .await
    {
        Ok(tx) => tx,
        Err(e) => {
            if e.is_revert() {
                warn!("{} | {} | Mint would revert, nothing sent", label, name);
            }
            return Ok(TaskResult::failed(format!("{}: {}", name, e)));
        }
    };
    let chain_id = tx.chain_id;

    let raw = sign_transaction(signer, tx).await?;
    let tx_hash = match gateway.submit(raw).await {
        Ok(hash) => hash,
        Err(e) => return Ok(TaskResult::failed(format!("{}: submit: {}", name, e))),
    };
    info!("{} | {} | Transaction sent: {}", label, name, tx_hash);

    let receipt = match gateway.wait_confirmed(tx_hash).await {
        Ok(r) => r,
        Err(e) => {
            return Ok(TaskResult::failed(format!("{}: {}", name, e))
                .with_tx_hash(tx_hash.to_string()));
        }
    };
    if !receipt.success {
        return Ok(TaskResult::failed(format!("{}: transaction reverted", name))
            .with_tx_hash(tx_hash.to_string()));
    }
    info!(
        "{} | {} | Confirmed in block {}",
        label,
        name,
        receipt
            .block_number
            .map_or_else(|| "?".to_string(), |b| b.to_string())
    );

    let message = format!("{} minted", name);
    let Some(verifier) = verifier else {
        return Ok(TaskResult::success(message).with_tx_hash(tx_hash.to_string()));
    };

    match verifier
        .report(
            chain_id,
            contract,
            tx_hash,
            gateway.address(),
            &format!("{} | [verify]", label),
        )
        .await
    {
        Ok(()) => Ok(TaskResult::success(message).with_tx_hash(tx_hash.to_string())),
        Err(e) => {
            warn!("{} | {} | Verification failed: {}", label, name, e);
            Ok(
                TaskResult::unverified(message, format!("verification: {}", e))
                    .with_tx_hash(tx_hash.to_string()),
            )
        }
    }
}
