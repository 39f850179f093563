//! Post-mint "transaction sent" event for the thirdweb analytics endpoint.
//!
//! Best effort: the mint is already on-chain when this runs, so a failure
//! here downgrades the result to unverified instead of failing it.

use crate::http::send_json;
use alloy::primitives::{Address, TxHash};
use anyhow::anyhow;
use core_logic::{Attempt, ClientPool, RetryError, RetryExecutor};
use reqwest::header::{CONTENT_TYPE, ORIGIN, REFERER, USER_AGENT};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const THIRDWEB_CLIENT_ID: &str = "154af4b042b6a335e64ef7636462b86d";
const SDK_VERSION: &str = "5.105.16";
const BROWSER_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TransactionEvent {
    source: &'static str,
    action: &'static str,
    chain_id: u64,
    client_id: &'static str,
    contract_address: String,
    transaction_hash: String,
    wallet_address: String,
    wallet_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct EventResponse {
    #[serde(default)]
    message: String,
}

pub struct Verifier {
    url: String,
    clients: Arc<ClientPool>,
    executor: RetryExecutor,
}

impl Verifier {
    pub fn new(url: &str, clients: Arc<ClientPool>, executor: RetryExecutor) -> Self {
        Self {
            url: url.to_string(),
            clients,
            executor,
        }
    }

    pub async fn report(
        &self,
        chain_id: u64,
        contract: Address,
        tx_hash: TxHash,
        wallet: Address,
        label: &str,
    ) -> Result<(), RetryError> {
        let event = TransactionEvent {
            source: "sdk",
            action: "transaction:sent",
            chain_id,
            client_id: THIRDWEB_CLIENT_ID,
            contract_address: contract.to_string(),
            transaction_hash: tx_hash.to_string(),
            wallet_address: wallet.to_string(),
            wallet_type: "io.rabby",
        };
        let payload = serde_json::to_vec(&event).map_err(|e| RetryError::Fatal(e.into()))?;
        let payload = &payload;

        self.executor
            .run(label, |_| async move {
                let client = match self.clients.next() {
                    Ok(c) => c,
                    Err(e) => return Attempt::Fatal(e.into()),
                };
                let request = client
                    .post(&self.url)
                    .header(CONTENT_TYPE, "text/plain;charset=UTF-8")
                    .header(ORIGIN, "https://morkie.xyz")
                    .header(REFERER, "https://morkie.xyz/")
                    .header(USER_AGENT, BROWSER_UA)
                    .header("x-client-id", THIRDWEB_CLIENT_ID)
                    .header("x-sdk-name", "unified-sdk")
                    .header("x-sdk-os", "win")
                    .header("x-sdk-platform", "browser")
                    .header("x-sdk-version", SDK_VERSION)
                    .body(payload.clone());

                let (status, resp): (_, EventResponse) = match send_json(request, &self.url).await {
                    Ok(r) => r,
                    Err(e) => return Attempt::Retryable(e.into()),
                };
                if !status.is_success() {
                    return Attempt::Retryable(anyhow!(
                        "Wrong Response Status Code: {}",
                        status.as_u16()
                    ));
                }
                if resp.message != "OK" {
                    return Attempt::Fatal(anyhow!("event not accepted: '{}'", resp.message));
                }
                Attempt::Success(())
            })
            .await
    }
}
