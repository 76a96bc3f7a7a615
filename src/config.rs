//! Configuration types for tick-straddle
//!
//! Every threshold has a documented default so a partial TOML file degrades
//! to known behavior per parameter. Malformed TOML fails fast at startup;
//! `validate` rejects values the engine cannot run without.

use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub account: AccountConfig,
    #[serde(default)]
    pub costs: CostConfig,
    #[serde(default)]
    pub indicators: IndicatorConfig,
    #[serde(default)]
    pub signal: SignalConfig,
    #[serde(default)]
    pub trailing: TrailConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub data: DataConfig,
    /// Per-symbol tuned overrides; empirically calibrated constants that do
    /// not generalize across symbols without re-calibration
    #[serde(default)]
    pub symbols: HashMap<String, SymbolOverrides>,
}

/// Engine scheduling configuration
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Symbols to trade
    #[serde(default = "default_symbols")]
    pub symbols: Vec<String>,
    /// Re-evaluate entry/exit signals every Nth tick (trailing stops run on
    /// every tick regardless)
    #[serde(default = "default_signal_every_ticks")]
    pub signal_every_ticks: u64,
    /// Tick buffer capacity per symbol
    #[serde(default = "default_buffer_capacity")]
    pub buffer_capacity: usize,
    /// Watchdog reporting interval for per-symbol message rate and staleness
    #[serde(default = "default_watchdog_secs")]
    pub watchdog_secs: u64,
}

/// Account configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AccountConfig {
    /// Starting balance in quote currency
    #[serde(default = "default_starting_balance")]
    pub starting_balance: Decimal,
    /// Fraction of balance allocated per leg at entry
    #[serde(default = "default_size_fraction")]
    pub size_fraction: Decimal,
    /// Minimum notional per leg
    #[serde(default = "default_min_notional")]
    pub min_notional: Decimal,
}

/// Fee and slippage model configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CostConfig {
    /// Fee as fraction of notional, charged on open and close of each leg
    #[serde(default = "default_fee_rate")]
    pub fee_rate: Decimal,
    /// Slippage as fraction of price, applied against the trader on each fill
    #[serde(default = "default_slippage_rate")]
    pub slippage_rate: Decimal,
    /// P&L leverage multiplier
    #[serde(default = "default_leverage")]
    pub leverage: Decimal,
}

/// Indicator window configuration
#[derive(Debug, Clone, Deserialize)]
pub struct IndicatorConfig {
    /// Main lookback window in seconds (time-based, not count-based)
    #[serde(default = "default_window_secs")]
    pub window_secs: i64,
    /// Short window for trend comparison in seconds
    #[serde(default = "default_short_window_secs")]
    pub short_window_secs: i64,
    /// Band half-width as a multiple of volatility
    #[serde(default = "default_band_k")]
    pub band_k: Decimal,
    /// Relative short-vs-long VWAP threshold (percent) for trend classification
    #[serde(default = "default_trend_threshold_pct")]
    pub trend_threshold_pct: Decimal,
    /// Number of most-recent ticks used for the mean spread
    #[serde(default = "default_spread_ticks")]
    pub spread_ticks: usize,
}

/// Signal generation configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SignalConfig {
    /// Minimum buffered ticks before any signal is evaluated
    #[serde(default = "default_min_ticks")]
    pub min_ticks: usize,
    /// Primary ("hybrid") volatility gate: volatility as percent of price
    /// must exceed this
    #[serde(default = "default_hybrid_vol_pct")]
    pub hybrid_vol_pct: Decimal,
    /// Secondary fee/ATR-style gate: mean absolute delta as percent of price
    /// must exceed this. Both gates must pass.
    #[serde(default = "default_atr_vol_pct")]
    pub atr_vol_pct: Decimal,
    /// Band position entry window, lower bound
    #[serde(default = "default_band_entry_low")]
    pub band_entry_low: Decimal,
    /// Band position entry window, upper bound
    #[serde(default = "default_band_entry_high")]
    pub band_entry_high: Decimal,
    /// Selective variant: require momentum magnitude above a non-zero floor
    #[serde(default = "default_true")]
    pub selective: bool,
    /// Momentum floor in percent per second
    #[serde(default = "default_momentum_floor_pct")]
    pub momentum_floor_pct: Decimal,
    /// Exit when volatility falls below this fraction of the secondary measure
    #[serde(default = "default_quiet_fraction")]
    pub quiet_fraction: Decimal,
    /// Exit when band position falls below this
    #[serde(default = "default_band_exit_low")]
    pub band_exit_low: Decimal,
    /// Exit when band position rises above this
    #[serde(default = "default_band_exit_high")]
    pub band_exit_high: Decimal,
    /// Minimum dwell between entries for the same symbol, in seconds
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: i64,
    /// Confidence attached to entry signals
    #[serde(default = "default_entry_confidence")]
    pub entry_confidence: Decimal,
}

/// Trailing-stop configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TrailConfig {
    /// Hard stop as percent loss of notional (positive number)
    #[serde(default = "default_hard_stop_pct")]
    pub hard_stop_pct: Decimal,
    /// Base trailing-distance multiplier applied to volatility
    #[serde(default = "default_base_multiplier")]
    pub base_multiplier: Decimal,
    /// Floor the multiplier shrinks toward as profit accelerates
    #[serde(default = "default_min_multiplier")]
    pub min_multiplier: Decimal,
    /// Unrealized profit percent where the multiplier starts shrinking
    #[serde(default = "default_accel_start_pct")]
    pub accel_start_pct: Decimal,
    /// Unrealized profit percent where the multiplier reaches its floor
    #[serde(default = "default_accel_full_pct")]
    pub accel_full_pct: Decimal,
}

/// Tick feed configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    /// WebSocket stream base URL
    #[serde(default = "default_ws_url")]
    pub ws_url: String,
    /// REST base URL for on-demand queries
    #[serde(default = "default_rest_url")]
    pub rest_url: String,
    /// Maximum reconnection attempts before the symbol's feed is declared dead
    #[serde(default = "default_max_reconnects")]
    pub max_reconnects: u32,
    /// Initial reconnect backoff in seconds (doubles per attempt)
    #[serde(default = "default_initial_backoff_secs")]
    pub initial_backoff_secs: u64,
    /// Backoff cap in seconds
    #[serde(default = "default_max_backoff_secs")]
    pub max_backoff_secs: u64,
    /// A connection delivering no message within this many seconds is stale
    #[serde(default = "default_stale_feed_secs")]
    pub stale_feed_secs: u64,
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
}

/// Result snapshot configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    /// Directory for trade records and performance snapshots
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Write one JSON record per completed trade
    #[serde(default = "default_true")]
    pub record_trades: bool,
    /// Periodic performance snapshot interval in seconds
    #[serde(default = "default_snapshot_interval_secs")]
    pub snapshot_interval_secs: u64,
}

/// Per-symbol overrides for the empirically tuned thresholds
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SymbolOverrides {
    pub hybrid_vol_pct: Option<Decimal>,
    pub atr_vol_pct: Option<Decimal>,
    pub momentum_floor_pct: Option<Decimal>,
    pub cooldown_secs: Option<i64>,
    pub hard_stop_pct: Option<Decimal>,
    pub base_multiplier: Option<Decimal>,
}

fn default_symbols() -> Vec<String> {
    vec!["BTCUSDT".to_string()]
}
fn default_signal_every_ticks() -> u64 {
    10
}
fn default_buffer_capacity() -> usize {
    10_000
}
fn default_watchdog_secs() -> u64 {
    60
}
fn default_starting_balance() -> Decimal {
    Decimal::new(10_000, 0)
}
fn default_size_fraction() -> Decimal {
    Decimal::new(2, 2) // 0.02 = 2% of balance per leg
}
fn default_min_notional() -> Decimal {
    Decimal::new(10, 0)
}
fn default_fee_rate() -> Decimal {
    Decimal::new(5, 4) // 0.0005 = 5 bps per transaction
}
fn default_slippage_rate() -> Decimal {
    Decimal::new(5, 4)
}
fn default_leverage() -> Decimal {
    Decimal::ONE
}
fn default_window_secs() -> i64 {
    600
}
fn default_short_window_secs() -> i64 {
    60
}
fn default_band_k() -> Decimal {
    Decimal::TWO
}
fn default_trend_threshold_pct() -> Decimal {
    Decimal::new(5, 1) // 0.5%
}
fn default_spread_ticks() -> usize {
    20
}
fn default_min_ticks() -> usize {
    100
}
fn default_hybrid_vol_pct() -> Decimal {
    Decimal::new(2, 2) // 0.02% of price
}
fn default_atr_vol_pct() -> Decimal {
    Decimal::new(15, 3) // 0.015% of price
}
fn default_band_entry_low() -> Decimal {
    Decimal::new(48, 2)
}
fn default_band_entry_high() -> Decimal {
    Decimal::new(52, 2)
}
fn default_momentum_floor_pct() -> Decimal {
    Decimal::new(1, 3) // 0.001 %/s
}
fn default_quiet_fraction() -> Decimal {
    Decimal::new(5, 2) // 5%
}
fn default_band_exit_low() -> Decimal {
    Decimal::new(15, 2)
}
fn default_band_exit_high() -> Decimal {
    Decimal::new(85, 2)
}
fn default_cooldown_secs() -> i64 {
    300
}
fn default_entry_confidence() -> Decimal {
    Decimal::new(95, 2)
}
fn default_hard_stop_pct() -> Decimal {
    Decimal::new(15, 1) // 1.5%
}
fn default_base_multiplier() -> Decimal {
    Decimal::new(22, 1) // 2.2
}
fn default_min_multiplier() -> Decimal {
    Decimal::new(18, 1) // 1.8
}
fn default_accel_start_pct() -> Decimal {
    Decimal::ONE
}
fn default_accel_full_pct() -> Decimal {
    Decimal::new(3, 0)
}
fn default_ws_url() -> String {
    "wss://stream.binance.com:9443/ws".to_string()
}
fn default_rest_url() -> String {
    "https://api.binance.com".to_string()
}
fn default_max_reconnects() -> u32 {
    10
}
fn default_initial_backoff_secs() -> u64 {
    1
}
fn default_max_backoff_secs() -> u64 {
    60
}
fn default_stale_feed_secs() -> u64 {
    30
}
fn default_metrics_port() -> u16 {
    9090
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./out")
}
fn default_snapshot_interval_secs() -> u64 {
    300
}
fn default_true() -> bool {
    true
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            symbols: default_symbols(),
            signal_every_ticks: default_signal_every_ticks(),
            buffer_capacity: default_buffer_capacity(),
            watchdog_secs: default_watchdog_secs(),
        }
    }
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            starting_balance: default_starting_balance(),
            size_fraction: default_size_fraction(),
            min_notional: default_min_notional(),
        }
    }
}

impl Default for CostConfig {
    fn default() -> Self {
        Self {
            fee_rate: default_fee_rate(),
            slippage_rate: default_slippage_rate(),
            leverage: default_leverage(),
        }
    }
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            window_secs: default_window_secs(),
            short_window_secs: default_short_window_secs(),
            band_k: default_band_k(),
            trend_threshold_pct: default_trend_threshold_pct(),
            spread_ticks: default_spread_ticks(),
        }
    }
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            min_ticks: default_min_ticks(),
            hybrid_vol_pct: default_hybrid_vol_pct(),
            atr_vol_pct: default_atr_vol_pct(),
            band_entry_low: default_band_entry_low(),
            band_entry_high: default_band_entry_high(),
            selective: true,
            momentum_floor_pct: default_momentum_floor_pct(),
            quiet_fraction: default_quiet_fraction(),
            band_exit_low: default_band_exit_low(),
            band_exit_high: default_band_exit_high(),
            cooldown_secs: default_cooldown_secs(),
            entry_confidence: default_entry_confidence(),
        }
    }
}

impl Default for TrailConfig {
    fn default() -> Self {
        Self {
            hard_stop_pct: default_hard_stop_pct(),
            base_multiplier: default_base_multiplier(),
            min_multiplier: default_min_multiplier(),
            accel_start_pct: default_accel_start_pct(),
            accel_full_pct: default_accel_full_pct(),
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            ws_url: default_ws_url(),
            rest_url: default_rest_url(),
            max_reconnects: default_max_reconnects(),
            initial_backoff_secs: default_initial_backoff_secs(),
            max_backoff_secs: default_max_backoff_secs(),
            stale_feed_secs: default_stale_feed_secs(),
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            metrics_port: default_metrics_port(),
            log_level: default_log_level(),
            metrics_enabled: true,
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            record_trades: true,
            snapshot_interval_secs: default_snapshot_interval_secs(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file, failing fast on malformed input
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the engine cannot run with. Per-parameter fallbacks are
    /// handled by serde defaults; this guards the fallback-critical ones.
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.account.starting_balance > Decimal::ZERO,
            "account.starting_balance must be positive"
        );
        anyhow::ensure!(
            self.account.size_fraction > Decimal::ZERO && self.account.size_fraction <= Decimal::ONE,
            "account.size_fraction must be in (0, 1]"
        );
        anyhow::ensure!(
            self.costs.fee_rate >= Decimal::ZERO,
            "costs.fee_rate must be non-negative"
        );
        anyhow::ensure!(
            self.costs.slippage_rate >= Decimal::ZERO,
            "costs.slippage_rate must be non-negative"
        );
        anyhow::ensure!(
            self.costs.leverage >= Decimal::ONE,
            "costs.leverage must be at least 1"
        );
        anyhow::ensure!(
            self.engine.signal_every_ticks >= 1,
            "engine.signal_every_ticks must be at least 1"
        );
        anyhow::ensure!(
            !self.engine.symbols.is_empty(),
            "engine.symbols must not be empty"
        );
        anyhow::ensure!(
            self.engine.buffer_capacity >= self.signal.min_ticks,
            "engine.buffer_capacity must hold at least signal.min_ticks ticks"
        );
        anyhow::ensure!(
            self.indicators.window_secs > 0 && self.indicators.short_window_secs > 0,
            "indicator windows must be positive"
        );
        anyhow::ensure!(
            self.signal.band_entry_low < self.signal.band_entry_high,
            "signal.band_entry_low must be below signal.band_entry_high"
        );
        anyhow::ensure!(
            self.trailing.min_multiplier <= self.trailing.base_multiplier,
            "trailing.min_multiplier must not exceed trailing.base_multiplier"
        );
        Ok(())
    }

    /// Signal configuration for a symbol, with per-symbol overrides applied
    pub fn signal_for(&self, symbol: &str) -> SignalConfig {
        let mut cfg = self.signal.clone();
        if let Some(o) = self.symbols.get(symbol) {
            if let Some(v) = o.hybrid_vol_pct {
                cfg.hybrid_vol_pct = v;
            }
            if let Some(v) = o.atr_vol_pct {
                cfg.atr_vol_pct = v;
            }
            if let Some(v) = o.momentum_floor_pct {
                cfg.momentum_floor_pct = v;
            }
            if let Some(v) = o.cooldown_secs {
                cfg.cooldown_secs = v;
            }
        }
        cfg
    }

    /// Trailing configuration for a symbol, with per-symbol overrides applied
    pub fn trailing_for(&self, symbol: &str) -> TrailConfig {
        let mut cfg = self.trailing.clone();
        if let Some(o) = self.symbols.get(symbol) {
            if let Some(v) = o.hard_stop_pct {
                cfg.hard_stop_pct = v;
            }
            if let Some(v) = o.base_multiplier {
                cfg.base_multiplier = v;
            }
        }
        cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.engine.symbols, vec!["BTCUSDT"]);
        assert_eq!(config.engine.signal_every_ticks, 10);
        assert_eq!(config.engine.buffer_capacity, 10_000);
        assert_eq!(config.signal.cooldown_secs, 300);
        assert_eq!(config.signal.min_ticks, 100);
        assert_eq!(config.trailing.hard_stop_pct, dec!(1.5));
        assert_eq!(config.indicators.window_secs, 600);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_overrides() {
        let toml = r#"
            [engine]
            symbols = ["ETHUSDT", "SOLUSDT"]
            signal_every_ticks = 5

            [signal]
            hybrid_vol_pct = 0.03
            cooldown_secs = 120

            [costs]
            fee_rate = 0.001
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.engine.symbols.len(), 2);
        assert_eq!(config.engine.signal_every_ticks, 5);
        assert_eq!(config.signal.hybrid_vol_pct, dec!(0.03));
        assert_eq!(config.signal.cooldown_secs, 120);
        assert_eq!(config.costs.fee_rate, dec!(0.001));
        // Untouched fields keep defaults
        assert_eq!(config.signal.band_entry_low, dec!(0.48));
        assert_eq!(config.costs.slippage_rate, dec!(0.0005));
    }

    #[test]
    fn test_per_symbol_overrides() {
        let toml = r#"
            [symbols.ETHUSDT]
            hybrid_vol_pct = 0.05
            cooldown_secs = 600
            hard_stop_pct = 2.0
        "#;

        let config: Config = toml::from_str(toml).unwrap();

        let eth = config.signal_for("ETHUSDT");
        assert_eq!(eth.hybrid_vol_pct, dec!(0.05));
        assert_eq!(eth.cooldown_secs, 600);
        // Non-overridden signal field keeps the default
        assert_eq!(eth.atr_vol_pct, dec!(0.015));

        let eth_trail = config.trailing_for("ETHUSDT");
        assert_eq!(eth_trail.hard_stop_pct, dec!(2.0));

        // A symbol with no override table gets plain defaults
        let btc = config.signal_for("BTCUSDT");
        assert_eq!(btc.hybrid_vol_pct, dec!(0.02));
    }

    #[test]
    fn test_validate_rejects_zero_balance() {
        let mut config = Config::default();
        config.account.starting_balance = Decimal::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_size_fraction() {
        let mut config = Config::default();
        config.account.size_fraction = dec!(1.5);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_signal_cadence() {
        let mut config = Config::default();
        config.engine.signal_every_ticks = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_small_buffer() {
        let mut config = Config::default();
        config.engine.buffer_capacity = 50; // below min_ticks
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_malformed_toml_fails_fast() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "this is [ not toml").unwrap();
        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn test_load_nonexistent() {
        assert!(Config::load("/nonexistent/path/config.toml").is_err());
    }
}
