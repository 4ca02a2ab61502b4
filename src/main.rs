use anyhow::Context;
use clap::Parser;
use momentumbot::config::BotConfig;
use momentumbot::gateway::{BrokerGateway, BrokerSession, HttpGateway, PaperGateway};
use momentumbot::shutdown::Shutdown;
use momentumbot::trade_loop::TradeLoop;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Single-symbol momentum trader for an MT5 terminal bridge
#[derive(Debug, Parser)]
#[command(name = "momentumbot", version)]
struct Cli {
    /// Config file (TOML, JSON or YAML); environment variables override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Use live market data but fill orders locally
    #[arg(long)]
    paper: bool,

    /// Run a single cycle and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    setup_logging();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("❌ {:#}", e);
            ExitCode::FAILURE
        }
    }
}

// ============================================================================
// Initialization Functions
// ============================================================================

fn setup_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("momentumbot=info"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    tracing::info!("🚀 MomentumBot starting");

    let config = BotConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    config.validate(true)?;
    log_configuration(&config, cli.paper);

    let gateway = HttpGateway::new(
        config.broker.bridge_url.clone(),
        Duration::from_secs(config.broker.request_timeout_secs),
    )?;

    // Installed before login so Ctrl+C during startup still closes the session
    let shutdown = Shutdown::on_ctrl_c();

    if cli.paper {
        trade(PaperGateway::new(gateway), &config, shutdown, cli.once).await
    } else {
        trade(gateway, &config, shutdown, cli.once).await
    }
}

fn log_configuration(config: &BotConfig, paper: bool) {
    tracing::info!("\n📊 Configuration:");
    tracing::info!("  Mode: {}", if paper { "PAPER" } else { "LIVE" });
    tracing::info!("  Bridge: {}", config.broker.bridge_url);
    tracing::info!(
        "  Symbol: {} ({}, {}h window, ~{} candles)",
        config.trading.symbol,
        config.trading.timeframe,
        config.trading.lookback_hours,
        config.trading.lookback_hours.saturating_mul(60)
            / u64::from(config.trading.timeframe.minutes())
    );
    tracing::info!("  Side: {:?} ({})", config.trading.side_mode, config.trading.fixed_side);
    tracing::info!("  Equity read: {:?}", config.trading.equity_mode);
    tracing::info!("  Threshold: {}%", config.risk.price_threshold_pct);
    tracing::info!("  Stop Loss: {}%", config.risk.stop_loss_pct);
    tracing::info!("  Take Profit: {}%", config.risk.take_profit_pct);
    tracing::info!("  Cooldown: {}s", config.risk.cooldown_secs);
    tracing::info!(
        "  Equity per trade: {}%",
        config.risk.equity_fraction_per_trade * 100.0
    );
}

/// Hold the terminal session for the whole run and release it on every exit path
async fn trade<G: BrokerGateway>(
    gateway: G,
    config: &BotConfig,
    shutdown: Shutdown,
    once: bool,
) -> anyhow::Result<()> {
    let session = BrokerSession::open(gateway, &config.broker)
        .await
        .context("Terminal login failed")?;

    let result = if shutdown.is_triggered() {
        tracing::info!("Interrupted during startup, not trading");
        Ok(())
    } else {
        drive(&session, config, shutdown, once).await
    };

    session.close().await;
    result
}

async fn drive<G: BrokerGateway>(
    session: &BrokerSession<G>,
    config: &BotConfig,
    shutdown: Shutdown,
    once: bool,
) -> anyhow::Result<()> {
    let equity = session
        .gateway()
        .account_equity()
        .await
        .context("Could not load the account equity level")?;
    tracing::info!("  Equity: {:.2}", equity);

    let mut trade_loop = TradeLoop::new(session.gateway(), config, equity, shutdown)?;

    if once {
        match trade_loop.run_cycle().await {
            Ok(outcome) => tracing::info!("Cycle outcome: {:?}", outcome),
            Err(e) => tracing::warn!("Cycle skipped: {}", e),
        }
        return Ok(());
    }

    tracing::info!("\nPress Ctrl+C to stop...\n");
    let iterations = trade_loop.run().await;
    tracing::info!("👋 MomentumBot stopped after {} iterations", iterations);

    Ok(())
}
