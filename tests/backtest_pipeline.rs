//! End-to-end replay through the public API: CSV on disk, loader, simulator,
//! persisted trade records.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::io::Write;
use tick_straddle::backtest::Simulator;
use tick_straddle::config::{Config, DataConfig};
use tick_straddle::data::{load_ticks, Recorder};
use tick_straddle::position::TradeRecord;

/// Quiet until 120s, then a volatility spike with varying delta magnitudes
fn spike_price(i: i64) -> Decimal {
    if i < 120 {
        dec!(100) + Decimal::new(i % 3, 3)
    } else {
        let mag = match i % 3 {
            0 => dec!(0.2),
            1 => dec!(0.5),
            _ => dec!(0.9),
        };
        if i % 2 == 0 {
            dec!(100) + mag
        } else {
            dec!(100) - mag
        }
    }
}

fn write_spike_csv() -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "timestamp_ms,symbol,price,bid,ask,volume").unwrap();
    let base_ms: i64 = 1_717_200_000_000;
    for i in 0..300 {
        let price = spike_price(i);
        writeln!(
            file,
            "{},BTCUSDT,{},{},{},1000",
            base_ms + i * 1000,
            price,
            price - dec!(0.01),
            price + dec!(0.01),
        )
        .unwrap();
    }
    file
}

fn spike_config() -> Config {
    let mut config = Config::default();
    config.signal.band_entry_low = Decimal::ZERO;
    config.signal.band_entry_high = Decimal::ONE;
    config.signal.selective = false;
    config
}

#[test]
fn csv_to_settled_trades() {
    let file = write_spike_csv();
    let ticks = load_ticks(file.path(), Some("BTCUSDT")).unwrap();
    assert_eq!(ticks.len(), 300);

    let report = Simulator::new(spike_config()).run(ticks);
    assert!(report.summary.trade_count >= 1);
    assert_eq!(
        report.summary.final_balance,
        report.summary.starting_balance + report.summary.total_pnl
    );

    // Persist and read back every settled trade
    let out = tempfile::tempdir().unwrap();
    let recorder = Recorder::new(&DataConfig {
        output_dir: out.path().to_path_buf(),
        record_trades: true,
        snapshot_interval_secs: 300,
    })
    .unwrap();
    for trade in &report.trades {
        recorder.record_trade(trade).unwrap();
    }

    let content = std::fs::read_to_string(out.path().join("trades.jsonl")).unwrap();
    let parsed: Vec<TradeRecord> = content
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(parsed.len(), report.trades.len());
    assert_eq!(parsed[0].net_pnl, report.trades[0].net_pnl);
}

#[test]
fn unknown_symbol_trades_nothing() {
    let file = write_spike_csv();
    let ticks = load_ticks(file.path(), Some("DOGEUSDT")).unwrap();
    assert!(ticks.is_empty());

    let report = Simulator::new(spike_config()).run(ticks);
    assert_eq!(report.summary.trade_count, 0);
    assert_eq!(report.summary.total_pnl, Decimal::ZERO);
}

#[test]
fn config_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
            [engine]
            symbols = ["ETHUSDT"]

            [signal]
            cooldown_secs = 120

            [account]
            starting_balance = 5000
        "#,
    )
    .unwrap();

    let config = Config::load(&path).unwrap();
    assert_eq!(config.engine.symbols, vec!["ETHUSDT"]);
    assert_eq!(config.signal.cooldown_secs, 120);
    assert_eq!(config.account.starting_balance, dec!(5000));
}
