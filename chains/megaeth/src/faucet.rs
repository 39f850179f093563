//! MegaETH faucet claim endpoint.

use crate::http::post_json;
use alloy::primitives::Address;
use anyhow::anyhow;
use core_logic::{Attempt, ClientPool, NetworkError, RetryError, RetryExecutor};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

#[derive(Serialize)]
struct ClaimRequest<'a> {
    addr: String,
    token: &'a str,
}

#[derive(Debug, Deserialize)]
struct ClaimResponse {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    message: String,
}

pub struct FaucetClient {
    url: String,
    clients: Arc<ClientPool>,
    executor: RetryExecutor,
}

impl FaucetClient {
    pub fn new(url: &str, clients: Arc<ClientPool>, executor: RetryExecutor) -> Self {
        Self {
            url: url.to_string(),
            clients,
            executor,
        }
    }

    /// Submits the solved captcha token for `address`.
    ///
    /// Transport failures and non-2xx answers are retried. An explicit
    /// `success: false` is final.
    pub async fn claim(&self, address: Address, token: &str, label: &str) -> Result<(), RetryError> {
        let body = ClaimRequest {
            addr: address.to_string(),
            token,
        };
        let body = &body;

        self.executor
            .run(label, |_| async move {
                let client = match self.clients.next() {
                    Ok(c) => c,
                    Err(e) => return Attempt::Fatal(e.into()),
                };
                let (status, resp): (_, ClaimResponse) =
                    match post_json(&client, &self.url, body).await {
                        Ok(r) => r,
                        Err(e) => return Attempt::Retryable(e.into()),
                    };

                if resp.success == Some(false) {
                    return Attempt::Fatal(
                        NetworkError::Rejected {
                            endpoint: self.url.clone(),
                            reason: format!("faucet refused the claim: {}", resp.message),
                        }
                        .into(),
                    );
                }
                if !status.is_success() {
                    return Attempt::Retryable(anyhow!(
                        "Wrong Response Status Code: {}",
                        status.as_u16()
                    ));
                }
                if resp.success.is_none() {
                    return Attempt::Retryable(anyhow!("response carried no success flag"));
                }
                if !resp.message.is_empty() {
                    return Attempt::Retryable(anyhow!("faucet answered: {}", resp.message));
                }

                info!("{} | Tokens claimed", label);
                Attempt::Success(())
            })
            .await
    }
}
