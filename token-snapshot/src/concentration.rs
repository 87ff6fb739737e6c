//! Distribution-concentration metrics over a [`Snapshot`].
//!
//! All metrics are defined to return zero for an empty snapshot or a zero
//! total supply instead of dividing by zero.

use crate::Snapshot;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Gini coefficient over holder balances, in `[0, 1]`.
///
/// Uses the sorted-rank formula `G = (2 * Σ i*x_i - (n + 1) * Σ x) / (n * Σ x)`
/// with balances sorted ascending and ranks starting at 1. The numerator is
/// computed in exact integer decimals so the result cannot dip below zero
/// through rounding.
pub fn gini(snapshot: &Snapshot) -> Decimal {
    let mut balances: Vec<u64> = snapshot.balances().values().copied().collect();
    if balances.is_empty() {
        return Decimal::ZERO;
    }
    balances.sort_unstable();

    let total: Decimal = balances.iter().map(|b| Decimal::from(*b)).sum();
    if total.is_zero() {
        return Decimal::ZERO;
    }

    let n = Decimal::from(balances.len() as u64);
    let weighted_sum: Decimal = balances
        .iter()
        .enumerate()
        .map(|(i, balance)| Decimal::from(i as u64 + 1) * Decimal::from(*balance))
        .sum();

    (dec!(2) * weighted_sum - (n + Decimal::ONE) * total) / (n * total)
}

/// Minimal number of top-balance holders whose cumulative share strictly
/// exceeds `threshold` (a fraction of total supply, e.g. `dec!(0.5)`).
///
/// Returns 0 for an empty snapshot; returns the holder count when the
/// threshold is never exceeded (e.g. `threshold >= 1`).
pub fn nakamoto_coefficient(snapshot: &Snapshot, threshold: Decimal) -> usize {
    let total = snapshot.total_supply();
    if total == 0 {
        return 0;
    }

    let target = threshold * Decimal::from(total);
    let mut cumulative = Decimal::ZERO;
    for (count, (_, balance)) in snapshot.holders_by_balance_desc().into_iter().enumerate() {
        cumulative += Decimal::from(balance);
        if cumulative > target {
            return count + 1;
        }
    }
    snapshot.len()
}

/// Herfindahl-Hirschman index: the sum of squared percentage shares, on the
/// usual 0-10_000 scale (10_000 = a single holder owns everything).
pub fn hhi(snapshot: &Snapshot) -> Decimal {
    let total = snapshot.total_supply();
    if total == 0 {
        return Decimal::ZERO;
    }
    let total = Decimal::from(total);

    snapshot
        .balances()
        .values()
        .map(|balance| {
            let share_pct = Decimal::from(*balance) / total * dec!(100);
            share_pct * share_pct
        })
        .sum()
}

/// Theil T index (0 = perfect equality). Needs a natural logarithm so it is
/// computed in f64, unlike the other metrics which stay in exact decimals.
pub fn theil(snapshot: &Snapshot) -> f64 {
    let n = snapshot.len();
    let total = snapshot.total_supply();
    if n == 0 || total == 0 {
        return 0.0;
    }
    let mean = total as f64 / n as f64;

    snapshot
        .balances()
        .values()
        .filter(|balance| **balance > 0)
        .map(|balance| {
            let ratio = *balance as f64 / mean;
            ratio * ratio.ln()
        })
        .sum::<f64>()
        / n as f64
}

/// Palma ratio: top-10% holders' share over bottom-40% holders' share.
///
/// The top decile contains at least one holder. Returns 0 when the bottom
/// 40% is empty or holds nothing.
pub fn palma(snapshot: &Snapshot) -> Decimal {
    let holders = snapshot.holders_by_balance_desc();
    let n = holders.len();
    let top_count = (n + 9) / 10;
    let bottom_count = n * 4 / 10;
    if bottom_count == 0 {
        return Decimal::ZERO;
    }

    let top_sum: Decimal = holders
        .iter()
        .take(top_count)
        .map(|(_, balance)| Decimal::from(*balance))
        .sum();
    let bottom_sum: Decimal = holders
        .iter()
        .skip(n - bottom_count)
        .map(|(_, balance)| Decimal::from(*balance))
        .sum();

    if bottom_sum.is_zero() {
        return Decimal::ZERO;
    }
    top_sum / bottom_sum
}
