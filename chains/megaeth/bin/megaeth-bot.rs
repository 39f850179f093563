use anyhow::{Context, Result, bail};
use clap::Parser;
use core_logic::{
    ClientPool, ProxyManager, Scheduler, setup_logger, spawn_shutdown_listener,
    utils::client_pool::DEFAULT_CLIENT_TIMEOUT,
};
use dialoguer::{Input, Select, theme::ColorfulTheme};
use dotenv::dotenv;
use megaeth_bot::{RunContext, Settings, WorkflowKind, WorkflowTask, load_accounts};
use rand::seq::SliceRandom;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to config.toml
    #[arg(short, long, default_value = "config/config.toml")]
    config: String,

    /// One private key or address per line
    #[arg(short, long, default_value = "config/private_keys.txt")]
    accounts: String,

    #[arg(short, long, default_value = "config/proxies.txt")]
    proxies: String,

    /// Concurrent accounts; prompted for when neither this nor the config sets it
    #[arg(short, long)]
    threads: Option<usize>,

    /// Workflow menu name or slug, e.g. "faucet" or "megamafia"
    #[arg(short, long)]
    workflow: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // RUST_LOG may come from .env, so it has to be loaded before the filter is built
    dotenv().ok();
    let _log_guard = setup_logger("megaeth");

    let args = Args::parse();

    // 1. Config
    let settings = Settings::from_path(&args.config).context("Failed to load config")?;
    info!("Loaded config from {}", args.config);

    // 2. Proxies and transports
    let proxies = ProxyManager::load_proxies(&args.proxies)?;
    let clients = ClientPool::from_proxies(&proxies, DEFAULT_CLIENT_TIMEOUT)
        .context("Failed to build client pool")?;

    // 3. Accounts
    let mut accounts = load_accounts(&args.accounts)?;
    if accounts.is_empty() {
        bail!("No accounts found in {}", args.accounts);
    }
    if settings.shuffle_accs {
        accounts.shuffle(&mut rand::thread_rng());
    }
    info!("Found {} accounts", accounts.len());

    // 4. Threads
    let threads = match args.threads.or(settings.threads) {
        Some(t) => t,
        None => {
            let input: String = Input::with_theme(&ColorfulTheme::default())
                .with_prompt("Number of threads")
                .default("1".to_string())
                .interact_text()
                .context("Failed to read thread count")?;
            input
                .trim()
                .parse()
                .with_context(|| format!("Invalid thread count '{}'", input.trim()))?
        }
    };
    if threads == 0 {
        bail!("Thread count must be at least 1");
    }

    // 5. Workflow
    let kind = match &args.workflow {
        Some(name) => name.parse::<WorkflowKind>()?,
        None => {
            let items: Vec<&str> = WorkflowKind::ALL.iter().map(|k| k.menu_name()).collect();
            let idx = Select::with_theme(&ColorfulTheme::default())
                .with_prompt("Choose a workflow")
                .items(&items)
                .default(0)
                .interact()
                .context("Failed to read workflow selection")?;
            WorkflowKind::ALL[idx]
        }
    };
    let workflow = kind.workflow();
    workflow.check_settings(&settings)?;
    info!("Selected workflow: {}", kind);

    // 6. Run
    let cancel = CancellationToken::new();
    spawn_shutdown_listener(cancel.clone());

    let start_delay = settings.delay_before_start.sample();
    let delay_between = settings.delay_between_accs;
    let total = accounts.len();

    let ctx = Arc::new(RunContext::new(settings, clients, total, cancel.clone()));
    let task = Arc::new(WorkflowTask::new(workflow, ctx.clone()));
    let scheduler = Scheduler::new(threads, delay_between, cancel.clone());

    if !start_delay.is_zero() {
        info!("Sleeping {}s before start", start_delay.as_secs());
        tokio::select! {
            _ = cancel.cancelled() => {
                warn!("Shutdown requested before start");
                return Ok(());
            }
            _ = tokio::time::sleep(start_delay) => {}
        }
    }

    let summary = scheduler
        .run(accounts, task, ctx.progress.clone())
        .await;

    if cancel.is_cancelled() {
        warn!(
            "Run interrupted: {} of {} accounts finished",
            summary.finished(),
            total
        );
    } else {
        info!("The work has been successfully finished");
    }

    Ok(())
}
