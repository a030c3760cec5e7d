/// Prosim Engine - Quantity Arithmetic
///
/// Inventory, hours and money are fractional `f64` values. Every
/// comparison that decides a rule goes through the tolerance here so that
/// accumulated rounding never flips an outcome.

use crate::error::{SimError, SimResult};

/// Absolute tolerance for quantity comparisons.
pub const EPSILON: f64 = 1e-6;

/// `true` when `a` and `b` agree within [`EPSILON`], scaled for large values.
pub fn approx_eq(a: f64, b: f64) -> bool {
    let scale = a.abs().max(b.abs()).max(1.0);
    (a - b).abs() <= EPSILON * scale
}

/// Snap values within tolerance of zero to exactly zero.
pub fn snap_zero(value: f64) -> f64 {
    if value.abs() <= EPSILON {
        0.0
    } else {
        value
    }
}

/// Add `amount` to a pool. Negative amounts are a defect.
pub fn checked_deposit(pool: f64, amount: f64, label: &str) -> SimResult<f64> {
    if !amount.is_finite() || amount < -EPSILON {
        return Err(SimError::consistency(
            "non_negative_flow",
            format!("{}: deposit of {} is not a non-negative quantity", label, amount),
        ));
    }
    Ok(pool + amount.max(0.0))
}

/// Remove `amount` from a pool. Overdrawing is a defect, never clamped here.
pub fn checked_withdraw(pool: f64, amount: f64, label: &str) -> SimResult<f64> {
    if !amount.is_finite() || amount < -EPSILON {
        return Err(SimError::consistency(
            "non_negative_flow",
            format!("{}: withdrawal of {} is not a non-negative quantity", label, amount),
        ));
    }
    let remaining = pool - amount.max(0.0);
    if remaining < -EPSILON {
        return Err(SimError::consistency(
            "non_negative_pool",
            format!("{}: withdrawing {:.3} from {:.3} goes negative", label, amount, pool),
        ));
    }
    Ok(snap_zero(remaining).max(0.0))
}

/// Round to `places` decimals (report presentation only).
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
