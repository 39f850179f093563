use crate::accounts::AccountData;
use crate::captcha::CaptchaSolver;
use crate::config::Settings;
use crate::faucet::FaucetClient;
use crate::gateway::RpcGateway;
use crate::verify::Verifier;
use anyhow::Result;
use core_logic::{ClientPool, ProgressCounter, RetryExecutor, RetryPolicy};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Everything a workflow needs that is shared across accounts.
///
/// Built once before the scheduler starts; workers only read from it.
pub struct RunContext {
    pub settings: Arc<Settings>,
    pub clients: Arc<ClientPool>,
    pub progress: Arc<ProgressCounter>,
    pub cancel: CancellationToken,
}

impl RunContext {
    pub fn new(
        settings: Settings,
        clients: ClientPool,
        total_accounts: usize,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            settings: Arc::new(settings),
            clients: Arc::new(clients),
            progress: Arc::new(ProgressCounter::new(total_accounts as u64)),
            cancel,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::from(self.settings.retry)
    }

    pub fn executor(&self) -> RetryExecutor {
        RetryExecutor::new(self.retry_policy(), self.cancel.clone())
    }

    /// `[done/total] | 0xabc…`, the prefix of every per-account log line.
    pub fn label(&self, account: &AccountData) -> String {
        format!("{} | {}", self.progress.tag(), account.address())
    }

    pub fn captcha_solver(&self) -> CaptchaSolver {
        CaptchaSolver::new(
            &self.settings.endpoints.capmonster_url,
            &self.settings.capmonster_api_key,
            self.clients.clone(),
            self.executor(),
        )
    }

    pub fn faucet(&self) -> FaucetClient {
        FaucetClient::new(
            &self.settings.endpoints.faucet_url,
            self.clients.clone(),
            self.executor(),
        )
    }

    /// One attempt only; the event is informational.
    pub fn verifier(&self) -> Verifier {
        Verifier::new(
            &self.settings.endpoints.verify_url,
            self.clients.clone(),
            RetryExecutor::new(
                RetryPolicy::single().with_deadline(self.retry_policy().deadline),
                self.cancel.clone(),
            ),
        )
    }

    /// A fresh chain connection for `account`, over the next pooled transport.
    pub fn gateway(&self, account: &AccountData) -> Result<RpcGateway> {
        let http = self.clients.next()?;
        RpcGateway::connect(
            &self.settings.endpoints.rpc_url,
            http,
            account.address(),
            self.cancel.clone(),
        )
    }
}
