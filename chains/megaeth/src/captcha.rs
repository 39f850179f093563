//! CapMonster Cloud client for the faucet's Turnstile challenge.
//!
//! Every call goes through the shared [`RetryExecutor`] and takes a fresh
//! transport from the client pool on each attempt.

use crate::http::post_json;
use anyhow::anyhow;
use core_logic::{Attempt, ClientPool, NetworkError, RetryError, RetryExecutor};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

pub const TURNSTILE_WEBSITE_URL: &str = "https://testnet.megaeth.com/#1";
pub const TURNSTILE_WEBSITE_KEY: &str = "0x4AAAAAABA4JXCaw9E2Py-9";
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/128.0.0.0 Safari/537.36";

/// Balance (USD) the account must exceed before a task is created.
pub const MIN_BALANCE: f64 = 0.01;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ClientKeyRequest<'a> {
    client_key: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateTaskRequest<'a> {
    client_key: &'a str,
    task: TurnstileTask<'a>,
}

#[derive(Serialize)]
struct TurnstileTask<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    #[serde(rename = "websiteURL")]
    website_url: &'a str,
    #[serde(rename = "websiteKey")]
    website_key: &'a str,
    #[serde(rename = "userAgent")]
    user_agent: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TaskResultRequest<'a> {
    client_key: &'a str,
    task_id: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BalanceResponse {
    #[serde(default)]
    error_id: i64,
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    balance: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateTaskResponse {
    #[serde(default)]
    error_id: i64,
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    task_id: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskResultResponse {
    #[serde(default)]
    error_id: i64,
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    status: String,
    #[serde(default)]
    solution: Option<Solution>,
}

#[derive(Debug, Deserialize)]
struct Solution {
    #[serde(default)]
    token: String,
}

fn rejected(endpoint: &str, error_code: Option<String>) -> anyhow::Error {
    NetworkError::Rejected {
        endpoint: endpoint.to_string(),
        reason: error_code.unwrap_or_else(|| "unknown error".to_string()),
    }
    .into()
}

pub struct CaptchaSolver {
    base_url: String,
    api_key: String,
    clients: Arc<ClientPool>,
    executor: RetryExecutor,
}

impl CaptchaSolver {
    pub fn new(
        base_url: &str,
        api_key: &str,
        clients: Arc<ClientPool>,
        executor: RetryExecutor,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            clients,
            executor,
        }
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/{}", self.base_url, method)
    }

    /// Succeeds once the service balance exceeds [`MIN_BALANCE`].
    ///
    /// A non-2xx status is only logged; the body is still inspected.
    pub async fn check_balance(&self, label: &str) -> Result<f64, RetryError> {
        let url = self.endpoint("getBalance");
        let body = ClientKeyRequest {
            client_key: &self.api_key,
        };
        let (url, body) = (&url, &body);

        self.executor
            .run(label, |_| async move {
                let client = match self.clients.next() {
                    Ok(c) => c,
                    Err(e) => return Attempt::Fatal(e.into()),
                };
                let (status, resp): (_, BalanceResponse) =
                    match post_json(&client, url, body).await {
                        Ok(r) => r,
                        Err(e) => return Attempt::Retryable(e.into()),
                    };
                if !status.is_success() {
                    warn!("{} | Wrong Response Status Code: {}", label, status.as_u16());
                }

                if resp.error_id != 0 {
                    return Attempt::Fatal(rejected(url, resp.error_code));
                }
                if resp.balance > MIN_BALANCE {
                    info!("{} | Balance: {}", label, resp.balance);
                    Attempt::Success(resp.balance)
                } else {
                    Attempt::Retryable(anyhow!("insufficient balance: {}", resp.balance))
                }
            })
            .await
    }

    pub async fn create_task(&self, label: &str) -> Result<u64, RetryError> {
        let url = self.endpoint("createTask");
        let body = CreateTaskRequest {
            client_key: &self.api_key,
            task: TurnstileTask {
                kind: "TurnstileTask",
                website_url: TURNSTILE_WEBSITE_URL,
                website_key: TURNSTILE_WEBSITE_KEY,
                user_agent: USER_AGENT,
            },
        };
        let (url, body) = (&url, &body);

        self.executor
            .run(label, |_| async move {
                let client = match self.clients.next() {
                    Ok(c) => c,
                    Err(e) => return Attempt::Fatal(e.into()),
                };
                let (status, resp): (_, CreateTaskResponse) =
                    match post_json(&client, url, body).await {
                        Ok(r) => r,
                        Err(e) => return Attempt::Retryable(e.into()),
                    };
                if !status.is_success() {
                    warn!("{} | Wrong Response Status Code: {}", label, status.as_u16());
                }

                if resp.error_id != 0 {
                    return Attempt::Fatal(rejected(url, resp.error_code));
                }
                match resp.task_id {
                    Some(task_id) => {
                        info!("{} | Task created: {}", label, task_id);
                        Attempt::Success(task_id)
                    }
                    None => Attempt::Retryable(anyhow!("response carried no taskId")),
                }
            })
            .await
    }

    /// Polls until the task is ready. `processing` is retried.
    pub async fn task_result(&self, task_id: u64, label: &str) -> Result<String, RetryError> {
        let url = self.endpoint("getTaskResult");
        let body = TaskResultRequest {
            client_key: &self.api_key,
            task_id,
        };
        let (url, body) = (&url, &body);

        self.executor
            .run(label, |_| async move {
                let client = match self.clients.next() {
                    Ok(c) => c,
                    Err(e) => return Attempt::Fatal(e.into()),
                };
                let (status, resp): (_, TaskResultResponse) =
                    match post_json(&client, url, body).await {
                        Ok(r) => r,
                        Err(e) => return Attempt::Retryable(e.into()),
                    };
                if !status.is_success() {
                    warn!("{} | Wrong Response Status Code: {}", label, status.as_u16());
                }

                if resp.error_id != 0 {
                    return Attempt::Fatal(rejected(url, resp.error_code));
                }
                match resp.status.as_str() {
                    "ready" => match resp.solution {
                        Some(solution) if !solution.token.is_empty() => {
                            info!("{} | Captcha solved", label);
                            Attempt::Success(solution.token)
                        }
                        _ => Attempt::Fatal(anyhow!("task ready without a solution token")),
                    },
                    "processing" => Attempt::Retryable(anyhow!("captcha is still processing")),
                    other => Attempt::Retryable(anyhow!("unexpected task status '{}'", other)),
                }
            })
            .await
    }

    /// Balance check, task creation and polling in one go.
    pub async fn solve(&self, label: &str) -> Result<String, RetryError> {
        self.check_balance(&format!("{} | [checkBalance]", label))
            .await?;
        let task_id = self
            .create_task(&format!("{} | [createTask]", label))
            .await?;
        self.task_result(task_id, &format!("{} | [resultCaptcha]", label))
            .await
    }
}
