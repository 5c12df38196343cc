//! Property tests for engulfing signal derivation.
//!
//! Uses proptest to verify:
//! 1. Entry/exit match the two-bar engulfing definitions one day late
//! 2. Entry and exit never fire on the same day
//! 3. Output length equals input length, first two positions are false
//! 4. Fewer than two valid observations never signal
//! 5. Parallel derivation matches per-symbol derivation

use engulfing::domain::price_table::{PriceSeries, PriceTable};
use engulfing::domain::signal::{derive_all, derive_signals};
use proptest::prelude::*;
use std::collections::BTreeMap;

// ── Strategies (proptest) ────────────────────────────────────────────

/// Coarse prices so engulfing patterns occur often; about one in eight missing.
fn arb_price() -> impl Strategy<Value = Option<f64>> {
    prop::option::weighted(0.88, (1u32..20).prop_map(f64::from))
}

fn arb_series(max_len: usize) -> impl Strategy<Value = PriceSeries> {
    prop::collection::vec((arb_price(), arb_price()), 0..max_len).prop_map(|bars| PriceSeries {
        open: bars.iter().map(|b| b.0).collect(),
        close: bars.iter().map(|b| b.1).collect(),
    })
}

fn bullish(o2: f64, c2: f64, o1: f64, c1: f64) -> bool {
    o2 > c2 && o1 < c2 && c1 > o2
}

fn bearish(o2: f64, c2: f64, o1: f64, c1: f64) -> bool {
    c2 > o2 && o1 > c2 && c1 < o2
}

/// Evaluate `pattern` on bars `t - 2` and `t - 1`; false if any value is missing.
fn expected(series: &PriceSeries, t: usize, pattern: fn(f64, f64, f64, f64) -> bool) -> bool {
    if t < 2 {
        return false;
    }
    match (
        series.open[t - 2],
        series.close[t - 2],
        series.open[t - 1],
        series.close[t - 1],
    ) {
        (Some(o2), Some(c2), Some(o1), Some(c1)) => pattern(o2, c2, o1, c1),
        _ => false,
    }
}

// ── 1. Definitions ───────────────────────────────────────────────────

proptest! {
    #[test]
    fn entry_and_exit_follow_definitions(series in arb_series(60)) {
        let signals = derive_signals(&series);
        for t in 0..series.len() {
            prop_assert_eq!(signals.entry[t], expected(&series, t, bullish), "entry at {}", t);
            prop_assert_eq!(signals.exit[t], expected(&series, t, bearish), "exit at {}", t);
        }
    }
}

// ── 2. Mutual exclusivity ────────────────────────────────────────────

proptest! {
    #[test]
    fn entry_and_exit_never_coincide(series in arb_series(60)) {
        let signals = derive_signals(&series);
        for t in 0..series.len() {
            prop_assert!(!(signals.entry[t] && signals.exit[t]), "both fired at {}", t);
        }
    }
}

// ── 3. Shape ─────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn length_preserved_and_warmup_false(series in arb_series(40)) {
        let signals = derive_signals(&series);
        prop_assert_eq!(signals.len(), series.len());
        prop_assert_eq!(signals.exit.len(), series.len());
        for t in 0..series.len().min(2) {
            prop_assert!(!signals.entry[t]);
            prop_assert!(!signals.exit[t]);
        }
    }
}

// ── 4. Sparse listings ───────────────────────────────────────────────

proptest! {
    #[test]
    fn single_observation_never_signals(
        len in 1usize..30,
        pos in 0usize..30,
        open in 1u32..20,
        close in 1u32..20,
    ) {
        let mut series = PriceSeries::missing(len);
        let pos = pos % len;
        series.open[pos] = Some(f64::from(open));
        series.close[pos] = Some(f64::from(close));

        let signals = derive_signals(&series);
        prop_assert_eq!(signals.entry_count(), 0);
        prop_assert_eq!(signals.exit_count(), 0);
    }
}

// ── 5. Determinism across symbols ────────────────────────────────────

proptest! {
    #[test]
    fn derive_all_matches_per_symbol(
        a in arb_series(30),
        b in arb_series(30),
        c in arb_series(30),
    ) {
        let len = a.len().min(b.len()).min(c.len());
        let trim = |s: &PriceSeries| PriceSeries {
            open: s.open[..len].to_vec(),
            close: s.close[..len].to_vec(),
        };
        let series: BTreeMap<String, PriceSeries> = [("A", &a), ("B", &b), ("C", &c)]
            .into_iter()
            .map(|(k, s)| (k.to_string(), trim(s)))
            .collect();
        let start = chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let table = PriceTable {
            dates: (0..len as i64).map(|i| start + chrono::Duration::days(i)).collect(),
            series,
        };

        let first = derive_all(&table);
        let second = derive_all(&table);
        prop_assert_eq!(&first, &second);
        for (symbol, s) in &table.series {
            prop_assert_eq!(&first[symbol], &derive_signals(s));
        }
    }
}
