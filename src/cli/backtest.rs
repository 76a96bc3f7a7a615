//! Backtest entry point

use crate::backtest::Simulator;
use crate::config::Config;
use crate::data;
use crate::telemetry;
use anyhow::Context;
use std::path::Path;
use tracing::info;

pub fn run(
    config: Config,
    data_path: &Path,
    symbol: Option<&str>,
    report_path: Option<&Path>,
) -> anyhow::Result<()> {
    telemetry::init_logging(&config.telemetry.log_level);

    let ticks = data::load_ticks(data_path, symbol)?;
    info!(ticks = ticks.len(), path = %data_path.display(), "loaded historical ticks");

    let report = Simulator::new(config).run(ticks);
    println!("{}", report.summary);

    if let Some(path) = report_path {
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(path, json)
            .with_context(|| format!("writing report to {}", path.display()))?;
        info!(path = %path.display(), "report written");
    }
    Ok(())
}
