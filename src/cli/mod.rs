//! Command-line interface

mod backtest;
mod run;

use crate::config::Config;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::warn;

#[derive(Parser)]
#[command(name = "tick-straddle", version, about = "Tick-driven two-way straddle trading engine")]
pub struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Trade live against the exchange feed
    Run,
    /// Replay historical ticks and print performance metrics
    Backtest {
        /// CSV tick file (timestamp_ms,symbol,price[,bid,ask,volume])
        #[arg(short, long)]
        data: PathBuf,
        /// Restrict the replay to one symbol
        #[arg(short, long)]
        symbol: Option<String>,
        /// Also write the full report (trades, equity curve) as JSON
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Validate the configuration and print the effective values
    Config,
}

pub async fn execute() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // A missing file means documented defaults; a malformed one fails fast
    let config = if cli.config.exists() {
        Config::load(&cli.config)?
    } else {
        warn!(path = %cli.config.display(), "config file not found, using defaults");
        let config = Config::default();
        config.validate()?;
        config
    };

    match cli.command {
        Command::Run => run::run(config).await,
        Command::Backtest {
            data,
            symbol,
            report,
        } => backtest::run(config, &data, symbol.as_deref(), report.as_deref()),
        Command::Config => {
            println!("{config:#?}");
            Ok(())
        }
    }
}
