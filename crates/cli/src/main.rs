mod config_commands;

use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use {
    anyhow::Context,
    clap::{Parser, Subcommand},
    courier_config::{CourierConfig, Severity},
    courier_dispatch::{DispatchPolicy, Dispatcher, HandlerSet, run_ingestion},
    tokio_util::sync::CancellationToken,
    tracing::{error, info, warn},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "courier", version, about = "Telegram bot update dispatcher")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file (skips discovery of ./courier.toml and ~/.config/courier/).
    #[arg(long, global = true, env = "COURIER_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to Telegram and handle updates until interrupted (default).
    Run,
    /// Validate the configuration, including the bot token, without connecting.
    Check,
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    match cli.command {
        None | Some(Commands::Run) => run(cli.config.as_deref()).await,
        Some(Commands::Check) => config_commands::check(cli.config.as_deref()),
    }
}

/// Load the config file and layer environment overrides on top.
pub(crate) fn load(explicit: Option<&Path>) -> anyhow::Result<(CourierConfig, Option<PathBuf>)> {
    let (mut config, path) = courier_config::discover_and_load(explicit)?;
    courier_config::apply_env_overrides(&mut config);
    Ok((config, path))
}

async fn run(explicit: Option<&Path>) -> anyhow::Result<()> {
    info!(version = env!("CARGO_PKG_VERSION"), "courier starting");

    let (config, path) = load(explicit)?;
    match &path {
        Some(path) => info!(path = %path.display(), "loaded config"),
        None => info!("no config file found, using defaults"),
    }
    courier_config::require_token(&config)?;

    let report = courier_config::validate(&config);
    for d in &report.diagnostics {
        match d.severity {
            Severity::Error => error!(path = d.path, "{}", d.message),
            Severity::Warning => warn!(path = d.path, "{}", d.message),
        }
    }
    if report.has_errors() {
        anyhow::bail!(
            "configuration has {} error(s); run `courier check` for details",
            report.count(Severity::Error)
        );
    }

    let (poller, outbound) = courier_telegram::connect(&config.telegram)
        .await
        .context("failed to connect to telegram")?;

    let dispatcher = Dispatcher::new(
        HandlerSet::builtin(&config.replies),
        Arc::new(outbound),
        DispatchPolicy::from(&config.dispatch),
    );

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "cannot listen for ctrl-c, stop the process another way");
                return;
            }
            info!("shutdown requested");
            cancel.cancel();
        }
    });

    let outcome = run_ingestion(
        poller,
        &dispatcher,
        cancel,
        Duration::from_secs(config.telegram.poll_retry_secs),
    )
    .await;

    let grace = Duration::from_secs(config.dispatch.shutdown_grace_secs);
    let drained = dispatcher.shutdown(grace).await;

    let dispatched = outcome.context("update polling failed")?;
    info!(dispatched, drained, "courier stopped");
    Ok(())
}
