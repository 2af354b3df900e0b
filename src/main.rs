// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use clap::Parser;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;
use testnet_autopilot::app::config::GlobalSettings;
use testnet_autopilot::app::logging::setup_logging;
use testnet_autopilot::common::clock::{Sleeper, TokioSleeper};
use testnet_autopilot::domain::error::AppError;
use testnet_autopilot::infrastructure::data::inputs::{load_proxies, load_wallets};
use testnet_autopilot::infrastructure::network::points_api::HttpApiConnector;
use testnet_autopilot::infrastructure::network::provider::{HttpConnector, ProviderFactory};
use testnet_autopilot::infrastructure::network::receipt::ReceiptWaiter;
use testnet_autopilot::services::actions::ActionExecutor;
use testnet_autopilot::services::cycle::{CycleLoop, CycleSummary};
use testnet_autopilot::services::points::{SessionAuthenticator, TaskVerifier};
use testnet_autopilot::services::scheduler::Scheduler;
use tokio_util::sync::CancellationToken;
use url::Url;

#[derive(Parser, Debug)]
#[command(author, version, about = "testnet autopilot")]
struct Cli {
    /// Path to config file (default: config.{toml,yaml,...})
    #[arg(long)]
    config: Option<String>,

    /// Run a single cycle and exit instead of looping forever
    #[arg(long, default_value_t = false)]
    once: bool,

    /// Verbose logging (overrides config/env)
    #[arg(long, default_value_t = false)]
    debug: bool,
}

fn build(
    settings: &GlobalSettings,
    once: bool,
    sleeper: Arc<dyn Sleeper>,
) -> Result<CycleLoop, AppError> {
    let rpc_url = Url::parse(&settings.rpc_url)
        .map_err(|e| AppError::Config(format!("Invalid RPC URL: {}", e)))?;
    let api_url = Url::parse(&settings.api_base_url)
        .map_err(|e| AppError::Config(format!("Invalid API base URL: {}", e)))?;
    let retry = settings.retry_settings();

    let providers = ProviderFactory::new(
        Arc::new(HttpConnector::new(settings.request_timeout())),
        rpc_url,
        settings.chain_id,
        retry.provider,
        sleeper.clone(),
    );
    let api = Arc::new(HttpApiConnector::new(
        api_url,
        settings.api_referer.clone(),
        settings.invite_code.clone(),
        settings.request_timeout(),
    ));
    let executor = ActionExecutor::new(
        settings.action_policy()?,
        retry,
        ReceiptWaiter::new(retry.receipt, sleeper.clone()),
        sleeper.clone(),
    );
    let verifier = TaskVerifier::new(settings.task_ids(), retry.verify, sleeper.clone());
    let scheduler = Scheduler::new(
        settings.run_policy(),
        SessionAuthenticator::new(settings.login_message.clone()),
        api,
        providers,
        executor,
        verifier,
        sleeper.clone(),
    );

    let wallets = load_wallets(&settings.wallet_path());
    let proxies = load_proxies(&settings.proxy_path());
    Ok(CycleLoop::new(
        scheduler,
        wallets,
        proxies,
        settings.cycle_policy(once),
        sleeper,
    ))
}

async fn run(
    settings: &GlobalSettings,
    once: bool,
    shutdown: CancellationToken,
) -> Result<CycleSummary, AppError> {
    let sleeper: Arc<dyn Sleeper> = Arc::new(TokioSleeper::new(shutdown));
    let cycle = build(settings, once, sleeper)?;
    let mut rng = StdRng::from_entropy();
    cycle.run(&mut rng).await
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let cli = Cli::parse();

    let settings = GlobalSettings::load_with_path(cli.config.as_deref())?;
    setup_logging(if cli.debug || settings.debug {
        "debug"
    } else {
        "info"
    });
    tracing::info!(
        target: "config",
        chain_id = settings.chain_id,
        rpc = %settings.rpc_url,
        api = %settings.api_base_url,
        "Settings loaded"
    );

    let shutdown = CancellationToken::new();
    {
        let shutdown_on_ctrlc = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!(target: "shutdown", "Ctrl+C received; requesting graceful shutdown");
                shutdown_on_ctrlc.cancel();
            }
        });
    }

    match run(&settings, cli.once, shutdown.clone()).await {
        Ok(summary) => {
            tracing::info!(
                target: "shutdown",
                cycles = summary.cycles,
                passes = summary.wallet_passes,
                skipped = summary.wallets_skipped,
                "Orchestrator stopped"
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!(target: "shutdown", error = %e, "Fatal error");
            if settings.keep_alive_on_error {
                tracing::warn!(target: "shutdown", "keep_alive_on_error set; waiting for termination");
                shutdown.cancelled().await;
            }
            Err(e)
        }
    }
}
