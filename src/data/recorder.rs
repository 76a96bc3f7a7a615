//! Trade and snapshot persistence
//!
//! Append-only JSON lines, one file for settled trades and one for periodic
//! performance snapshots. Purely observational; nothing in the engine reads
//! these back.

use crate::account::PerformanceSnapshot;
use crate::config::DataConfig;
use crate::position::TradeRecord;
use anyhow::Context;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

pub struct Recorder {
    trades_path: PathBuf,
    snapshots_path: PathBuf,
    record_trades: bool,
}

impl Recorder {
    pub fn new(config: &DataConfig) -> anyhow::Result<Self> {
        fs::create_dir_all(&config.output_dir)
            .with_context(|| format!("creating output dir {}", config.output_dir.display()))?;
        Ok(Self {
            trades_path: config.output_dir.join("trades.jsonl"),
            snapshots_path: config.output_dir.join("snapshots.jsonl"),
            record_trades: config.record_trades,
        })
    }

    pub fn record_trade(&self, record: &TradeRecord) -> anyhow::Result<()> {
        if !self.record_trades {
            return Ok(());
        }
        append_json(&self.trades_path, record)
    }

    pub fn record_snapshot(&self, snapshot: &PerformanceSnapshot) -> anyhow::Result<()> {
        append_json(&self.snapshots_path, snapshot)
    }
}

fn append_json<T: serde::Serialize>(path: &PathBuf, value: &T) -> anyhow::Result<()> {
    let mut file: File = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening {}", path.display()))?;
    let line = serde_json::to_string(value)?;
    writeln!(file, "{line}")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::{CloseReason, LegClose, Side};
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn sample_record() -> TradeRecord {
        let close = LegClose {
            side: Side::Long,
            entry_price: dec!(100),
            exit_price: dec!(101),
            size: dec!(1),
            exit_time: Utc::now(),
            gross_pnl: dec!(1),
            fees: dec!(0.2),
            net_pnl: dec!(0.8),
            reason: CloseReason::Signal,
        };
        TradeRecord {
            pair_id: Uuid::new_v4(),
            symbol: "BTCUSDT".to_string(),
            entry_price: dec!(100),
            entry_time: Utc::now(),
            exit_time: Utc::now(),
            first_close: close.clone(),
            second_close: close,
            net_pnl: dec!(1.6),
            total_fees: dec!(0.4),
            hold_secs: 60,
        }
    }

    #[test]
    fn test_trades_appended_as_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = Recorder::new(&DataConfig {
            output_dir: dir.path().to_path_buf(),
            record_trades: true,
            snapshot_interval_secs: 300,
        })
        .unwrap();

        recorder.record_trade(&sample_record()).unwrap();
        recorder.record_trade(&sample_record()).unwrap();

        let content = fs::read_to_string(dir.path().join("trades.jsonl")).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        // Round-trips back into a record
        let parsed: TradeRecord = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(parsed.symbol, "BTCUSDT");
        assert_eq!(parsed.net_pnl, dec!(1.6));
    }

    #[test]
    fn test_trade_recording_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = Recorder::new(&DataConfig {
            output_dir: dir.path().to_path_buf(),
            record_trades: false,
            snapshot_interval_secs: 300,
        })
        .unwrap();

        recorder.record_trade(&sample_record()).unwrap();
        assert!(!dir.path().join("trades.jsonl").exists());
    }
}
