//! Property tests for portfolio and performance invariants.
//!
//! Uses proptest to verify:
//! 1. Fill accounting: cash and total track signed cost plus commission
//! 2. Account identity: after a re-mark, total equals cash plus market value
//! 3. Drawdown invariant: non-negative, and zero drawdown means zero duration
//! 4. Order policy totality: every (signal, quantity) pair maps per the table
//! 5. Equity curve idempotence

use std::collections::HashMap;

use chrono::{Duration, TimeZone, Utc};
use heartbeat_core::portfolio::{naive_order, Holdings, HoldingsSnapshot, NAIVE_ORDER_QUANTITY};
use heartbeat_core::{
    drawdowns, Bar, Direction, EquityCurve, EventQueue, FillEvent, HistoricBarFeed, MarketData,
    MarketDataProvider, MarketEvent, Portfolio, SignalEvent, SignalType, Timestamp,
};
use proptest::prelude::*;

// ── Strategies (proptest) ────────────────────────────────────────────

fn t0() -> Timestamp {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

fn arb_direction() -> impl Strategy<Value = Direction> {
    prop_oneof![Just(Direction::Buy), Just(Direction::Sell)]
}

fn arb_signal_type() -> impl Strategy<Value = SignalType> {
    prop_oneof![
        Just(SignalType::Long),
        Just(SignalType::Short),
        Just(SignalType::Exit)
    ]
}

fn arb_fill() -> impl Strategy<Value = FillEvent> {
    (arb_direction(), 1u64..1_000, 1.0..500.0_f64, 0.0..10.0_f64).prop_map(
        |(direction, quantity, price, commission)| FillEvent {
            timestamp: t0(),
            symbol: "X".into(),
            exchange: "ARCA".into(),
            quantity,
            direction,
            fill_cost: (price * 100.0).round() / 100.0,
            commission: (commission * 100.0).round() / 100.0,
        },
    )
}

fn single_bar_feed(price: f64) -> HistoricBarFeed {
    let bar = Bar {
        symbol: "X".into(),
        timestamp: t0() + Duration::days(1),
        open: price,
        high: price,
        low: price,
        close: price,
        volume: 0,
        adj_close: price,
    };
    let mut bars = HashMap::new();
    bars.insert("X".to_string(), vec![bar]);
    HistoricBarFeed::new(vec!["X".into()], bars).unwrap()
}

// ── 1-2. Fill accounting ─────────────────────────────────────────────

proptest! {
    /// Cash and total move by exactly the signed cost plus commission.
    #[test]
    fn fills_preserve_cash_accounting(fills in prop::collection::vec(arb_fill(), 1..40)) {
        let initial = 100_000.0;
        let mut portfolio = Portfolio::new(vec!["X".into()], initial, t0());

        let mut expected_cash = initial;
        let mut expected_commission = 0.0;
        let mut expected_qty = 0i64;
        for fill in &fills {
            portfolio.update_fill(fill).unwrap();
            expected_cash -= fill.signed_cost() + fill.commission;
            expected_commission += fill.commission;
            expected_qty += fill.direction.sign() * fill.quantity as i64;
        }

        let h = portfolio.current_holdings();
        prop_assert!((h.cash - expected_cash).abs() < 1e-6);
        prop_assert!((h.total - expected_cash).abs() < 1e-6);
        prop_assert!((h.commission - expected_commission).abs() < 1e-6);
        prop_assert_eq!(portfolio.current_position("X"), expected_qty);
    }

    /// After re-marking, total == cash + quantity * price.
    #[test]
    fn remark_restores_account_identity(
        fills in prop::collection::vec(arb_fill(), 0..20),
        price in 1.0..500.0_f64,
    ) {
        let mut portfolio = Portfolio::new(vec!["X".into()], 50_000.0, t0());
        for fill in &fills {
            portfolio.update_fill(fill).unwrap();
        }

        let queue = EventQueue::new();
        let mut feed = single_bar_feed(price);
        prop_assert!(feed.update_bars(&queue.sender()).unwrap());
        let timestamp = feed.latest_timestamp("X").unwrap();
        portfolio.update_timeindex(&MarketEvent { timestamp }, &feed);

        let snap = portfolio.holdings_history().last().unwrap();
        let qty = portfolio.current_position("X") as f64;
        let expected = snap.holdings.cash + qty * price;
        prop_assert!((snap.holdings.total - expected).abs() < 1e-6);
        prop_assert_eq!(snap.timestamp, timestamp);
    }
}

// ── 3. Drawdown invariant ────────────────────────────────────────────

proptest! {
    #[test]
    fn drawdown_is_non_negative_and_duration_resets(
        equity in prop::collection::vec(0.1..10.0_f64, 1..200),
    ) {
        let dd = drawdowns(&equity);
        prop_assert_eq!(dd.drawdown.len(), equity.len());
        for (d, dur) in dd.drawdown.iter().zip(&dd.duration) {
            prop_assert!(*d >= 0.0);
            if *d == 0.0 {
                prop_assert_eq!(*dur, 0);
            }
        }
        let max = dd.drawdown.iter().cloned().fold(0.0, f64::max);
        prop_assert_eq!(dd.max_drawdown, max);
        prop_assert_eq!(dd.max_duration, dd.duration.iter().copied().max().unwrap_or(0));
    }
}

// ── 4. Order policy totality ─────────────────────────────────────────

proptest! {
    #[test]
    fn naive_policy_is_total(signal_type in arb_signal_type(), qty in -1_000i64..1_000) {
        let signal = SignalEvent::new("X", t0(), signal_type);
        let order = naive_order(&signal, qty);

        match (signal_type, qty) {
            (SignalType::Long, 0) => {
                let o = order.unwrap();
                prop_assert_eq!(o.direction, Direction::Buy);
                prop_assert_eq!(o.quantity, NAIVE_ORDER_QUANTITY);
            }
            (SignalType::Short, 0) => {
                let o = order.unwrap();
                prop_assert_eq!(o.direction, Direction::Sell);
                prop_assert_eq!(o.quantity, NAIVE_ORDER_QUANTITY);
            }
            (SignalType::Exit, q) if q != 0 => {
                let o = order.unwrap();
                prop_assert_eq!(o.quantity, q.unsigned_abs());
                // Exiting always moves the position back to flat.
                prop_assert_eq!(q + o.direction.sign() * o.quantity as i64, 0);
            }
            _ => prop_assert!(order.is_none()),
        }
    }
}

// ── 5. Equity curve idempotence ──────────────────────────────────────

proptest! {
    #[test]
    fn equity_curve_is_idempotent(totals in prop::collection::vec(1_000.0..200_000.0_f64, 1..100)) {
        let history: Vec<HoldingsSnapshot> = totals
            .iter()
            .enumerate()
            .map(|(i, &total)| HoldingsSnapshot {
                timestamp: t0() + Duration::days(i as i64),
                holdings: Holdings::flat(1, total),
            })
            .collect();
        let symbols = vec!["X".to_string()];

        let first = EquityCurve::from_holdings(&symbols, &history);
        let second = EquityCurve::from_holdings(&symbols, &history);
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(first.points()[0].equity_curve, 1.0);

        let last = first.points().last().unwrap();
        prop_assert!((last.equity_curve - totals[totals.len() - 1] / totals[0]).abs() < 1e-6);
    }
}
