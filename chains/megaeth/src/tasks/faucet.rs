//! Faucet claim: solve the Turnstile captcha, then hand the token to the faucet.

use crate::accounts::AccountData;
use crate::context::RunContext;
use anyhow::Result;
use core_logic::TaskResult;

pub async fn run(ctx: &RunContext, account: &AccountData) -> Result<TaskResult> {
    if !ctx.settings.has_captcha_key() {
        return Ok(TaskResult::failed("captcha API key is not configured"));
    }

    let label = ctx.label(account);

    let token = match ctx.captcha_solver().solve(&label).await {
        Ok(token) => token,
        Err(e) if e.is_cancelled() => return Ok(TaskResult::failed("cancelled")),
        Err(e) => return Ok(TaskResult::failed(format!("captcha: {:#}", e))),
    };

    match ctx
        .faucet()
        .claim(account.address(), &token, &format!("{} | [faucet]", label))
        .await
    {
        Ok(()) => Ok(TaskResult::success(format!(
            "Faucet claimed for {}",
            account.address()
        ))),
        Err(e) if e.is_cancelled() => Ok(TaskResult::failed("cancelled")),
        Err(e) => Ok(TaskResult::failed(format!("faucet: {:#}", e))),
    }
}
