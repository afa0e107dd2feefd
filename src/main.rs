//! Quant signals - command-line entry point
//!
//! Each subcommand loads series from CSV, runs one calculator and prints the
//! resulting record as JSON on stdout. Logs go to stderr and, as JSON lines,
//! to `logs/quant-signals.{command}.{timestamp}.jsonl`.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use quant_signals::Config;

mod commands;

#[derive(Parser, Debug)]
#[command(name = "quant-signals")]
#[command(about = "Regime, risk-tier, sizing, pair and skill signals from market series", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file (defaults apply if it does not exist)
    #[arg(short, long, global = true, default_value = "config.json")]
    config: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Detect the volatility regime of a symbol
    Regime {
        #[arg(short, long)]
        symbol: String,
    },

    /// Dynamic beta and lead/lag of a dependent symbol against a driver
    Beta {
        /// Driver symbol (e.g. the upstream supplier)
        #[arg(long)]
        driver: String,

        /// Dependent symbol
        #[arg(long)]
        dependent: String,
    },

    /// Scan a universe for mean-reverting pairs
    Pairs {
        /// Symbols to scan (comma-separated). E.g., "AAPL,MSFT,NVDA"
        #[arg(short, long)]
        symbols: String,
    },

    /// Composite risk tier from current market readings
    Defcon {
        #[arg(long)]
        vix: Option<f64>,

        /// Net dealer gamma exposure (billions)
        #[arg(long)]
        gex: Option<f64>,

        #[arg(long)]
        vpin: Option<f64>,

        /// Global liquidity z-score
        #[arg(long)]
        gli_z: Option<f64>,

        /// Benchmark symbol for regime detection
        #[arg(long)]
        symbol: Option<String>,

        /// Historical win rate; with --avg-win/--avg-loss adds a Kelly size
        #[arg(long, requires_all = ["avg_win", "avg_loss"])]
        win_rate: Option<f64>,

        #[arg(long)]
        avg_win: Option<f64>,

        #[arg(long)]
        avg_loss: Option<f64>,
    },

    /// Regime-adjusted Kelly position size
    Kelly {
        #[arg(long)]
        win_rate: f64,

        #[arg(long)]
        avg_win: f64,

        #[arg(long)]
        avg_loss: f64,

        /// Regime name (TREND_BULL, RANGE_BOUND, PANIC_BEAR, EVENT_DRIVEN)
        #[arg(long, default_value = "RANGE_BOUND")]
        regime: String,

        #[arg(long, default_value = "20")]
        vix: f64,
    },

    /// Skill-versus-luck assessment of a strategy return series
    Skill {
        /// CSV file whose close column holds per-period strategy returns
        #[arg(short, long)]
        returns: PathBuf,

        /// Configurations tried before this one (overrides config)
        #[arg(long)]
        n_trials: Option<usize>,

        /// Walk-forward / CPCV splits
        #[arg(long, default_value = "5")]
        splits: usize,
    },

    /// Order-flow toxicity of a symbol
    Vpin {
        #[arg(short, long)]
        symbol: String,
    },

    /// Factor crowding and liquidity screen
    Crowding {
        /// Symbols held (comma-separated)
        #[arg(short, long)]
        symbols: String,

        /// Position notional
        #[arg(long)]
        notional: f64,

        /// Average daily traded value of a representative symbol
        #[arg(long)]
        avg_volume: f64,

        /// Deflated Sharpe Ratio of the strategy
        #[arg(long)]
        dsr: f64,

        /// Alpha half-life in weeks
        #[arg(long, default_value = "inf")]
        alpha_half_life: f64,
    },

    /// Check how much of a signal's alpha is left before executing it
    AlphaDecay {
        /// Expected return at signal time (0.05 = 5%)
        #[arg(long)]
        initial_alpha: f64,

        #[arg(long)]
        entry: f64,

        #[arg(long)]
        target: f64,

        #[arg(long)]
        current: f64,
    },
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Regime { .. } => "regime",
            Commands::Beta { .. } => "beta",
            Commands::Pairs { .. } => "pairs",
            Commands::Defcon { .. } => "defcon",
            Commands::Kelly { .. } => "kelly",
            Commands::Skill { .. } => "skill",
            Commands::Vpin { .. } => "vpin",
            Commands::Crowding { .. } => "crowding",
            Commands::AlphaDecay { .. } => "alpha_decay",
        }
    }
}

/// Directory that receives one JSON-lines log file per invocation
const LOG_DIR: &str = "logs";

/// Install the subscriber: compact human output on stderr, JSON lines on disk.
///
/// Without `RUST_LOG` only this crate's events pass; `--verbose` lowers the
/// crate's level to debug. Returns the log file path.
fn init_tracing(verbose: bool, command_name: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(LOG_DIR)
        .with_context(|| format!("Failed to create log directory {}", LOG_DIR))?;

    let started = chrono::Utc::now().format("%Y%m%dT%H%M%SZ");
    let log_filename = format!("quant-signals.{}.{}.jsonl", command_name, started);
    let log_path = PathBuf::from(LOG_DIR).join(&log_filename);

    let crate_level = if verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,quant_signals={}", crate_level)));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_writer(std::io::stderr)
        .with_target(false);

    let json_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(tracing_appender::rolling::never(LOG_DIR, &log_filename))
        .with_current_span(false)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(json_layer)
        .init();

    Ok(log_path)
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let log_path = init_tracing(cli.verbose, cli.command.name())?;
    debug!(log = %log_path.display(), command = cli.command.name(), "tracing initialised");

    let config = Config::load_or_default(&cli.config)?;

    match cli.command {
        Commands::Regime { symbol } => commands::regime::run(&config, &symbol),

        Commands::Beta { driver, dependent } => commands::beta::run(&config, &driver, &dependent),

        Commands::Pairs { symbols } => commands::pairs::run(&config, &symbols),

        Commands::Defcon {
            vix,
            gex,
            vpin,
            gli_z,
            symbol,
            win_rate,
            avg_win,
            avg_loss,
        } => commands::defcon::run(
            &config,
            commands::defcon::DefconArgs {
                vix,
                gex,
                vpin,
                gli_z,
                symbol,
                win_rate,
                avg_win,
                avg_loss,
            },
        ),

        Commands::Kelly {
            win_rate,
            avg_win,
            avg_loss,
            regime,
            vix,
        } => commands::kelly::run(&config, win_rate, avg_win, avg_loss, &regime, vix),

        Commands::Skill {
            returns,
            n_trials,
            splits,
        } => commands::skill::run(&config, &returns, n_trials, splits),

        Commands::Vpin { symbol } => commands::vpin::run(&config, &symbol),

        Commands::Crowding {
            symbols,
            notional,
            avg_volume,
            dsr,
            alpha_half_life,
        } => commands::crowding::run(&config, &symbols, notional, avg_volume, dsr, alpha_half_life),

        Commands::AlphaDecay {
            initial_alpha,
            entry,
            target,
            current,
        } => commands::crowding::run_alpha_decay(initial_alpha, entry, target, current),
    }
}
