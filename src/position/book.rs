//! Open-pair tracking and stop evaluation
//!
//! At most one open pair per symbol. Both legs open atomically at the same
//! size; every tick updates peak/trough tracking and evaluates stops for the
//! affected symbol. The first leg to close arms the survivor's breakeven
//! requirement; the pair settles as a unit when the second leg closes.

use super::trailing::trail_distance;
use super::types::{CloseReason, Leg, LegClose, OpenPair, Side, TradeRecord};
use crate::config::TrailConfig;
use crate::costs::CostModel;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use tracing::{info, warn};
use uuid::Uuid;

/// Event emitted by the book; the owner forwards settlements to the account
#[derive(Debug, Clone)]
pub enum PairEvent {
    LegClosed {
        symbol: String,
        pair_id: Uuid,
        close: LegClose,
    },
    PairSettled(TradeRecord),
}

/// All open pairs, keyed by symbol
#[derive(Debug, Default)]
pub struct PairBook {
    pairs: HashMap<String, OpenPair>,
}

impl PairBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_open(&self, symbol: &str) -> bool {
        self.pairs.contains_key(symbol)
    }

    pub fn open_pair_count(&self) -> usize {
        self.pairs.len()
    }

    pub fn open_symbols(&self) -> Vec<String> {
        self.pairs.keys().cloned().collect()
    }

    pub fn get(&self, symbol: &str) -> Option<&OpenPair> {
        self.pairs.get(symbol)
    }

    /// Open a LONG and SHORT leg together at the current price.
    ///
    /// A second open for a symbol that already has a pair is a logged no-op;
    /// it indicates a caller-side bug, not a fatal condition. Returns the new
    /// pair id on success.
    pub fn open_pair(
        &mut self,
        symbol: &str,
        price: Decimal,
        time: DateTime<Utc>,
        size: Decimal,
        confidence: Decimal,
        costs: &CostModel,
    ) -> Option<Uuid> {
        if self.pairs.contains_key(symbol) {
            warn!(symbol, "open requested but a pair is already open, ignoring");
            return None;
        }
        if price <= Decimal::ZERO || size <= Decimal::ZERO {
            warn!(symbol, %price, %size, "refusing to open with non-positive price or size");
            return None;
        }

        let id = Uuid::new_v4();
        let make_leg = |side: Side| {
            let fill = costs.entry_fill(side, price);
            Leg {
                pair_id: id,
                symbol: symbol.to_string(),
                side,
                entry_price: fill,
                size,
                entry_time: time,
                extreme_price: fill,
                confidence,
                open_fee: costs.fee(fill, size),
                breakeven_target: None,
                breakeven_reached: false,
                been_in_profit: false,
            }
        };

        let pair = OpenPair {
            id,
            symbol: symbol.to_string(),
            entry_price: price,
            entry_time: time,
            long: Some(make_leg(Side::Long)),
            short: Some(make_leg(Side::Short)),
            first_close: None,
            second_close: None,
        };

        info!(symbol, pair_id = %id, %price, %size, "pair opened");
        self.pairs.insert(symbol.to_string(), pair);
        Some(id)
    }

    /// Update extremes and evaluate stops for the symbol at this tick.
    ///
    /// With zero volatility the stop checks are skipped for the tick; the
    /// trailing distance would be degenerate and the regime is still warming
    /// up. Extremes keep tracking either way.
    pub fn on_tick(
        &mut self,
        symbol: &str,
        price: Decimal,
        time: DateTime<Utc>,
        volatility: Decimal,
        trail: &TrailConfig,
        costs: &CostModel,
    ) -> Vec<PairEvent> {
        let Some(pair) = self.pairs.get_mut(symbol) else {
            return vec![];
        };

        let mut events = Vec::new();

        // LONG is evaluated before SHORT so a tick that breaches both legs'
        // stops closes them in a deterministic order
        for side in [Side::Long, Side::Short] {
            let leg = match side {
                Side::Long => pair.long.as_mut(),
                Side::Short => pair.short.as_mut(),
            };
            let Some(leg) = leg else { continue };

            leg.update_extreme(price);
            if leg.gross_pnl(price, costs.leverage) > Decimal::ZERO {
                leg.been_in_profit = true;
            }

            if volatility.is_zero() {
                continue;
            }

            let reason = if pair.first_close.is_some() {
                survivor_stop(leg, price, volatility, trail, costs)
            } else {
                ordinary_stop(leg, price, volatility, trail, costs)
            };

            if let Some(reason) = reason {
                let close = close_leg(pair, side, price, time, reason, costs);
                events.push(PairEvent::LegClosed {
                    symbol: symbol.to_string(),
                    pair_id: pair.id,
                    close,
                });
            }
        }

        if pair.open_legs() == 0 {
            events.push(Self::settle(self.pairs.remove(symbol).unwrap_or_else(|| {
                unreachable!("pair present above")
            })));
        }
        events
    }

    /// Close whatever legs remain open for the symbol at the given price.
    /// A close for a symbol with no open pair is a logged no-op.
    pub fn close_pair(
        &mut self,
        symbol: &str,
        price: Decimal,
        time: DateTime<Utc>,
        reason: CloseReason,
        costs: &CostModel,
    ) -> Vec<PairEvent> {
        let Some(mut pair) = self.pairs.remove(symbol) else {
            warn!(symbol, "close requested but no pair is open, ignoring");
            return vec![];
        };

        let mut events = Vec::new();
        for side in [Side::Long, Side::Short] {
            let open = match side {
                Side::Long => pair.long.is_some(),
                Side::Short => pair.short.is_some(),
            };
            if open {
                let close = close_leg(&mut pair, side, price, time, reason, costs);
                events.push(PairEvent::LegClosed {
                    symbol: symbol.to_string(),
                    pair_id: pair.id,
                    close,
                });
            }
        }

        events.push(Self::settle(pair));
        events
    }

    fn settle(pair: OpenPair) -> PairEvent {
        let first = pair
            .first_close
            .expect("settling a pair requires both closes");
        let second = pair
            .second_close
            .expect("settling a pair requires both closes");

        let net_pnl = first.net_pnl + second.net_pnl;
        let total_fees = first.fees + second.fees;
        let exit_time = second.exit_time;
        let record = TradeRecord {
            pair_id: pair.id,
            symbol: pair.symbol,
            entry_price: pair.entry_price,
            entry_time: pair.entry_time,
            exit_time,
            first_close: first,
            second_close: second,
            net_pnl,
            total_fees,
            hold_secs: (exit_time - pair.entry_time).num_seconds(),
        };
        info!(
            symbol = %record.symbol,
            pair_id = %record.pair_id,
            net_pnl = %record.net_pnl,
            reason = %record.second_close.reason,
            "pair settled"
        );
        PairEvent::PairSettled(record)
    }
}

/// Stop decision for a leg whose sibling is still open
fn ordinary_stop(
    leg: &Leg,
    price: Decimal,
    volatility: Decimal,
    trail: &TrailConfig,
    costs: &CostModel,
) -> Option<CloseReason> {
    let pnl_pct = leg.pnl_pct(price, costs.leverage);

    if pnl_pct <= -trail.hard_stop_pct {
        return Some(CloseReason::HardStop);
    }
    if leg.been_in_profit && leg.pullback(price) >= trail_distance(volatility, pnl_pct, trail) {
        return Some(CloseReason::TrailingStop);
    }
    None
}

/// Stop decision for the surviving leg after its sibling closed first.
///
/// Until the breakeven requirement is met, any unrealized loss closes the leg
/// (the combined pair P&L would otherwise sink below the first leg's realized
/// loss alone). Reaching the requirement flips the leg back to ordinary
/// trailing logic permanently, with the trail measured from that point.
fn survivor_stop(
    leg: &mut Leg,
    price: Decimal,
    volatility: Decimal,
    trail: &TrailConfig,
    costs: &CostModel,
) -> Option<CloseReason> {
    if leg.breakeven_reached {
        return ordinary_stop(leg, price, volatility, trail, costs);
    }

    let gross = leg.gross_pnl(price, costs.leverage);
    if let Some(target) = leg.breakeven_target {
        if gross >= target {
            leg.breakeven_reached = true;
            leg.been_in_profit = true;
            leg.extreme_price = price;
            info!(
                symbol = %leg.symbol,
                side = %leg.side,
                %target,
                "survivor reached breakeven, trailing from here"
            );
            return None;
        }
    }

    if gross < Decimal::ZERO {
        return Some(CloseReason::SetProtection);
    }
    None
}

/// Remove the leg from the pair, price its exit, and record the close.
/// The first close also arms the sibling's breakeven requirement.
fn close_leg(
    pair: &mut OpenPair,
    side: Side,
    price: Decimal,
    time: DateTime<Utc>,
    reason: CloseReason,
    costs: &CostModel,
) -> LegClose {
    let leg = match side {
        Side::Long => pair.long.take(),
        Side::Short => pair.short.take(),
    }
    .expect("close_leg called for an open leg");

    let fill = costs.exit_fill(side, price);
    let gross_pnl = leg.gross_pnl(fill, costs.leverage);
    let fees = leg.open_fee + costs.fee(fill, leg.size);
    let close = LegClose {
        side,
        entry_price: leg.entry_price,
        exit_price: fill,
        size: leg.size,
        exit_time: time,
        gross_pnl,
        fees,
        net_pnl: gross_pnl - fees,
        reason,
    };

    info!(
        symbol = %leg.symbol,
        side = %side,
        exit = %fill,
        gross = %gross_pnl,
        %reason,
        "leg closed"
    );

    if pair.first_close.is_none() {
        // Survivor must recover the realized gross loss plus this leg's
        // round-trip fees before it is allowed to trail normally
        let target = (-close.gross_pnl).max(Decimal::ZERO) + close.fees;
        let sibling = match side {
            Side::Long => pair.short.as_mut(),
            Side::Short => pair.long.as_mut(),
        };
        if let Some(sibling) = sibling {
            sibling.breakeven_target = Some(target);
        }
        pair.first_close = Some(close.clone());
    } else {
        pair.second_close = Some(close.clone());
    }
    close
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn frictionless() -> CostModel {
        CostModel::zero()
    }

    fn fee_only() -> CostModel {
        CostModel {
            fee_rate: dec!(0.001),
            slippage_rate: Decimal::ZERO,
            leverage: Decimal::ONE,
        }
    }

    fn trail() -> TrailConfig {
        TrailConfig {
            hard_stop_pct: dec!(1.5),
            base_multiplier: dec!(2.2),
            min_multiplier: dec!(1.8),
            accel_start_pct: dec!(1),
            accel_full_pct: dec!(3),
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc::now()
    }

    fn open(book: &mut PairBook, price: Decimal, size: Decimal, costs: &CostModel) {
        book.open_pair("BTCUSDT", price, t0(), size, dec!(0.95), costs)
            .expect("pair should open");
    }

    #[test]
    fn test_open_creates_both_legs() {
        let mut book = PairBook::new();
        open(&mut book, dec!(100), dec!(1), &frictionless());

        let pair = book.get("BTCUSDT").unwrap();
        assert_eq!(pair.open_legs(), 2);
        assert_eq!(pair.long.as_ref().unwrap().entry_price, dec!(100));
        assert_eq!(pair.short.as_ref().unwrap().entry_price, dec!(100));
        assert_eq!(book.open_pair_count(), 1);
    }

    #[test]
    fn test_second_open_is_noop() {
        let mut book = PairBook::new();
        open(&mut book, dec!(100), dec!(1), &frictionless());

        let id = book.get("BTCUSDT").unwrap().id;
        assert!(book
            .open_pair("BTCUSDT", dec!(101), t0(), dec!(1), dec!(0.95), &frictionless())
            .is_none());
        // Original pair untouched
        assert_eq!(book.get("BTCUSDT").unwrap().id, id);
        assert_eq!(book.open_pair_count(), 1);
    }

    #[test]
    fn test_open_rejects_non_positive_inputs() {
        let mut book = PairBook::new();
        assert!(book
            .open_pair("BTCUSDT", Decimal::ZERO, t0(), dec!(1), dec!(0.95), &frictionless())
            .is_none());
        assert!(book
            .open_pair("BTCUSDT", dec!(100), t0(), Decimal::ZERO, dec!(0.95), &frictionless())
            .is_none());
        assert!(!book.has_open("BTCUSDT"));
    }

    #[test]
    fn test_entry_slippage_worsens_both_legs() {
        let costs = CostModel {
            fee_rate: Decimal::ZERO,
            slippage_rate: dec!(0.01),
            leverage: Decimal::ONE,
        };
        let mut book = PairBook::new();
        open(&mut book, dec!(100), dec!(1), &costs);

        let pair = book.get("BTCUSDT").unwrap();
        assert_eq!(pair.long.as_ref().unwrap().entry_price, dec!(101.00));
        assert_eq!(pair.short.as_ref().unwrap().entry_price, dec!(99.00));
    }

    #[test]
    fn test_hard_stop_closes_long_before_short() {
        let mut book = PairBook::new();
        open(&mut book, dec!(100), dec!(1), &frictionless());

        // -1.6% breaches the long's hard stop; the short is up 1.6%
        let events = book.on_tick(
            "BTCUSDT",
            dec!(98.4),
            t0(),
            dec!(0.5),
            &trail(),
            &frictionless(),
        );

        assert_eq!(events.len(), 1);
        match &events[0] {
            PairEvent::LegClosed { close, .. } => {
                assert_eq!(close.side, Side::Long);
                assert_eq!(close.reason, CloseReason::HardStop);
                assert_eq!(close.gross_pnl, dec!(-1.6));
            }
            other => panic!("expected LegClosed, got {other:?}"),
        }

        let pair = book.get("BTCUSDT").unwrap();
        assert!(pair.long.is_none());
        assert!(pair.short.is_some());
        assert!(pair.first_close.is_some());
    }

    #[test]
    fn test_breakeven_target_is_loss_plus_round_trip_fees() {
        let costs = fee_only();
        let mut book = PairBook::new();
        open(&mut book, dec!(100), dec!(10), &costs);

        // -2% hard-stops the long: gross -20, open fee 1.00, close fee 0.98
        let events = book.on_tick("BTCUSDT", dec!(98), t0(), dec!(0.5), &trail(), &costs);
        assert_eq!(events.len(), 1);

        let survivor = book.get("BTCUSDT").unwrap().short.as_ref().unwrap();
        assert_eq!(survivor.breakeven_target, Some(dec!(21.980)));
        assert!(!survivor.breakeven_reached);
    }

    #[test]
    fn test_set_protection_when_survivor_goes_negative() {
        // Fees push the breakeven target above the survivor's +1.6 gross, so
        // it is still in breakeven-recovery mode when the price reverses
        let costs = fee_only();
        let mut book = PairBook::new();
        open(&mut book, dec!(100), dec!(1), &costs);

        // Long hard-stops at -1.6; short survives, short of its target
        book.on_tick("BTCUSDT", dec!(98.4), t0(), dec!(0.5), &trail(), &costs);
        let survivor = book.get("BTCUSDT").unwrap().short.as_ref().unwrap();
        assert!(!survivor.breakeven_reached);

        // Price recovers above entry: survivor short is now losing
        let events = book.on_tick("BTCUSDT", dec!(100.5), t0(), dec!(0.5), &trail(), &costs);

        assert_eq!(events.len(), 2);
        match &events[0] {
            PairEvent::LegClosed { close, .. } => {
                assert_eq!(close.side, Side::Short);
                assert_eq!(close.reason, CloseReason::SetProtection);
            }
            other => panic!("expected LegClosed, got {other:?}"),
        }
        match &events[1] {
            PairEvent::PairSettled(record) => {
                // long: -1.6 gross, 0.1984 fees; short: -0.5 gross, 0.2005 fees
                assert_eq!(record.net_pnl, dec!(-2.4989));
                assert_eq!(record.total_fees, dec!(0.3989));
            }
            other => panic!("expected PairSettled, got {other:?}"),
        }
        assert!(!book.has_open("BTCUSDT"));
    }

    #[test]
    fn test_survivor_never_set_protected_after_breakeven() {
        let mut book = PairBook::new();
        open(&mut book, dec!(100), dec!(1), &frictionless());

        // Long hard-stops at -1.6; short's breakeven target is 1.6
        book.on_tick("BTCUSDT", dec!(98.4), t0(), dec!(0.5), &trail(), &frictionless());

        // Survivor short reaches its target (gross +1.6 at 98.4 already,
        // evaluated on the next tick); extreme resets here
        let events = book.on_tick(
            "BTCUSDT",
            dec!(98.4),
            t0(),
            dec!(0.5),
            &trail(),
            &frictionless(),
        );
        assert!(events.is_empty());
        let survivor = book.get("BTCUSDT").unwrap().short.as_ref().unwrap();
        assert!(survivor.breakeven_reached);
        assert_eq!(survivor.extreme_price, dec!(98.4));

        // An adverse move now trails out, it does not SET-protect
        let events = book.on_tick(
            "BTCUSDT",
            dec!(99.6),
            t0(),
            dec!(0.5),
            &trail(),
            &frictionless(),
        );
        let reasons: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                PairEvent::LegClosed { close, .. } => Some(close.reason),
                _ => None,
            })
            .collect();
        assert!(!reasons.contains(&CloseReason::SetProtection));
    }

    #[test]
    fn test_trailing_stop_after_profit() {
        // Hard stop widened so the short leg stays open while the long runs
        let trail_cfg = TrailConfig {
            hard_stop_pct: dec!(50),
            ..trail()
        };
        let mut book = PairBook::new();
        open(&mut book, dec!(100), dec!(1), &frictionless());

        // Long rallies to 105: in profit, peak 105, no pullback yet
        let events = book.on_tick("BTCUSDT", dec!(105), t0(), dec!(0.5), &trail_cfg, &frictionless());
        assert!(events.is_empty());

        // Pullback to 104: 1.0 against a trail distance of 0.5 * 1.8 = 0.9
        // (profit 4% is past full acceleration). The winner trails out first;
        // the losing short then fails breakeven recovery on the same tick and
        // the pair settles flat.
        let events = book.on_tick("BTCUSDT", dec!(104), t0(), dec!(0.5), &trail_cfg, &frictionless());
        let closed: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                PairEvent::LegClosed { close, .. } => Some(close),
                _ => None,
            })
            .collect();
        assert_eq!(closed.len(), 2);
        assert_eq!(closed[0].side, Side::Long);
        assert_eq!(closed[0].reason, CloseReason::TrailingStop);
        assert_eq!(closed[0].gross_pnl, dec!(4));
        assert_eq!(closed[1].side, Side::Short);
        assert_eq!(closed[1].reason, CloseReason::SetProtection);

        match events.last().unwrap() {
            PairEvent::PairSettled(record) => assert_eq!(record.net_pnl, Decimal::ZERO),
            other => panic!("expected PairSettled, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_volatility_skips_stop_checks() {
        let mut book = PairBook::new();
        open(&mut book, dec!(100), dec!(1), &frictionless());

        // Deep breach of the hard stop, but no volatility estimate yet
        let events = book.on_tick(
            "BTCUSDT",
            dec!(90),
            t0(),
            Decimal::ZERO,
            &trail(),
            &frictionless(),
        );
        assert!(events.is_empty());
        assert_eq!(book.get("BTCUSDT").unwrap().open_legs(), 2);

        // Extremes still tracked through the quiet tick
        assert_eq!(
            book.get("BTCUSDT").unwrap().short.as_ref().unwrap().extreme_price,
            dec!(90)
        );
    }

    #[test]
    fn test_on_tick_other_symbol_is_noop() {
        let mut book = PairBook::new();
        open(&mut book, dec!(100), dec!(1), &frictionless());

        let events = book.on_tick("ETHUSDT", dec!(1), t0(), dec!(0.5), &trail(), &frictionless());
        assert!(events.is_empty());
        assert_eq!(book.get("BTCUSDT").unwrap().open_legs(), 2);
    }

    #[test]
    fn test_close_pair_settles_both_legs() {
        let mut book = PairBook::new();
        open(&mut book, dec!(100), dec!(1), &frictionless());

        let events = book.close_pair("BTCUSDT", dec!(101), t0(), CloseReason::Signal, &frictionless());
        assert_eq!(events.len(), 3);

        match &events[2] {
            PairEvent::PairSettled(record) => {
                // +1 long, -1 short, frictionless: flat
                assert_eq!(record.net_pnl, Decimal::ZERO);
                assert_eq!(record.total_fees, Decimal::ZERO);
                assert_eq!(record.first_close.reason, CloseReason::Signal);
            }
            other => panic!("expected PairSettled, got {other:?}"),
        }
        assert!(!book.has_open("BTCUSDT"));
    }

    #[test]
    fn test_close_pair_without_open_is_noop() {
        let mut book = PairBook::new();
        let events = book.close_pair("BTCUSDT", dec!(100), t0(), CloseReason::Signal, &frictionless());
        assert!(events.is_empty());
    }

    #[test]
    fn test_round_trip_costs_four_fee_events() {
        let costs = fee_only();
        let mut book = PairBook::new();
        open(&mut book, dec!(100), dec!(1), &costs);

        let events = book.close_pair("BTCUSDT", dec!(100), t0(), CloseReason::Signal, &costs);
        match events.last().unwrap() {
            PairEvent::PairSettled(record) => {
                // Two opens and two closes at 100 notional, 0.1 each
                assert_eq!(record.total_fees, dec!(0.400));
                assert_eq!(record.net_pnl, dec!(-0.400));
            }
            other => panic!("expected PairSettled, got {other:?}"),
        }
    }

    #[test]
    fn test_slippage_round_trip_identity() {
        // Flat price, 1% slippage, 0.1% fee: each leg loses exactly two
        // slippage increments, and four fee events are charged in total
        let costs = CostModel {
            fee_rate: dec!(0.001),
            slippage_rate: dec!(0.01),
            leverage: Decimal::ONE,
        };
        let mut book = PairBook::new();
        open(&mut book, dec!(100), dec!(1), &costs);

        let events = book.close_pair("BTCUSDT", dec!(100), t0(), CloseReason::Signal, &costs);
        match events.last().unwrap() {
            PairEvent::PairSettled(record) => {
                // long: in at 101, out at 99; short: in at 99, out at 101
                assert_eq!(record.first_close.gross_pnl, dec!(-2.0000));
                assert_eq!(record.second_close.gross_pnl, dec!(-2.0000));
                // fees on 101 + 99 notional at open, 99 + 101 at close
                assert_eq!(record.total_fees, dec!(0.400000));
                assert_eq!(
                    record.net_pnl,
                    record.first_close.gross_pnl + record.second_close.gross_pnl
                        - record.total_fees
                );
            }
            other => panic!("expected PairSettled, got {other:?}"),
        }
    }

    #[test]
    fn test_symbol_reusable_after_settlement() {
        let mut book = PairBook::new();
        open(&mut book, dec!(100), dec!(1), &frictionless());
        book.close_pair("BTCUSDT", dec!(100), t0(), CloseReason::Signal, &frictionless());

        assert!(book
            .open_pair("BTCUSDT", dec!(100), t0(), dec!(1), dec!(0.95), &frictionless())
            .is_some());
    }
}

