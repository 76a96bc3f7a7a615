//! Logging and metrics

mod logging;
pub mod metrics;

pub use logging::init_logging;

use crate::config::TelemetryConfig;

/// Initialize logging and, when enabled, the Prometheus exporter
pub fn init(config: &TelemetryConfig) -> anyhow::Result<()> {
    init_logging(&config.log_level);
    if config.metrics_enabled {
        metrics::init_metrics(config.metrics_port)?;
    }
    Ok(())
}
