//! Fixed-capacity, time-ordered tick buffer
//!
//! One buffer per symbol, owned exclusively by that symbol's pipeline. At
//! ~10 ticks/second the default capacity of 10,000 covers roughly 16 minutes.

use crate::feed::Tick;
use chrono::Duration;
use std::collections::VecDeque;

/// Ring buffer of the most recent ticks for one symbol
#[derive(Debug)]
pub struct TickBuffer {
    ticks: VecDeque<Tick>,
    capacity: usize,
}

impl TickBuffer {
    /// Create a buffer holding at most `capacity` ticks
    pub fn new(capacity: usize) -> Self {
        Self {
            ticks: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a tick, evicting the oldest entry when at capacity
    pub fn push(&mut self, tick: Tick) {
        if self.ticks.len() == self.capacity {
            self.ticks.pop_front();
        }
        self.ticks.push_back(tick);
    }

    /// The last `n` ticks (or fewer) in timestamp order, oldest first
    pub fn recent(&self, n: usize) -> Vec<&Tick> {
        let start = self.ticks.len().saturating_sub(n);
        self.ticks.range(start..).collect()
    }

    /// All ticks within `window` of the newest tick's timestamp, oldest first
    pub fn window(&self, window: Duration) -> Vec<&Tick> {
        let Some(last) = self.ticks.back() else {
            return vec![];
        };
        let cutoff = last.timestamp - window;

        let mut out: Vec<&Tick> = self
            .ticks
            .iter()
            .rev()
            .take_while(|t| t.timestamp >= cutoff)
            .collect();
        out.reverse();
        out
    }

    /// Most recent tick
    pub fn last(&self) -> Option<&Tick> {
        self.ticks.back()
    }

    /// Number of buffered ticks
    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    /// Whether the buffer holds no ticks
    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn tick_at(secs: i64, price: Decimal) -> Tick {
        // Fixed base so window boundaries are exact, not wall-clock dependent
        let base = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        Tick {
            symbol: "BTCUSDT".to_string(),
            timestamp: base + Duration::seconds(secs),
            price,
            bid: price - dec!(0.5),
            bid_qty: dec!(1),
            ask: price + dec!(0.5),
            ask_qty: dec!(1),
            volume_24h: dec!(1000),
            quote_volume_24h: dec!(100000),
            change_pct_24h: dec!(0),
        }
    }

    #[test]
    fn test_push_and_len() {
        let mut buf = TickBuffer::new(10);
        assert!(buf.is_empty());

        buf.push(tick_at(0, dec!(100)));
        buf.push(tick_at(1, dec!(101)));
        assert_eq!(buf.len(), 2);
        assert_eq!(buf.last().unwrap().price, dec!(101));
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut buf = TickBuffer::new(3);
        for i in 0..5 {
            buf.push(tick_at(i, Decimal::from(100 + i)));
        }

        assert_eq!(buf.len(), 3);
        // Oldest two evicted; front is now price 102
        assert_eq!(buf.recent(3)[0].price, dec!(102));
        assert_eq!(buf.last().unwrap().price, dec!(104));
    }

    #[test]
    fn test_recent_returns_in_order() {
        let mut buf = TickBuffer::new(10);
        for i in 0..5 {
            buf.push(tick_at(i, Decimal::from(100 + i)));
        }

        let recent = buf.recent(3);
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].price, dec!(102));
        assert_eq!(recent[2].price, dec!(104));
    }

    #[test]
    fn test_recent_fewer_than_requested() {
        let mut buf = TickBuffer::new(10);
        buf.push(tick_at(0, dec!(100)));

        assert_eq!(buf.recent(5).len(), 1);
    }

    #[test]
    fn test_window_filters_by_time() {
        let mut buf = TickBuffer::new(100);
        for i in 0..30 {
            buf.push(tick_at(i, dec!(100)));
        }

        // Newest tick is at t=29; a 10s window spans t=19..=29
        let window = buf.window(Duration::seconds(10));
        assert_eq!(window.len(), 11);
        assert!(window.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[test]
    fn test_window_empty_buffer() {
        let buf = TickBuffer::new(10);
        assert!(buf.window(Duration::seconds(60)).is_empty());
    }

    #[test]
    fn test_window_wider_than_history() {
        let mut buf = TickBuffer::new(10);
        buf.push(tick_at(0, dec!(100)));
        buf.push(tick_at(1, dec!(101)));

        assert_eq!(buf.window(Duration::seconds(3600)).len(), 2);
    }
}
