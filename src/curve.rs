//! Sigmoid (S-curve) disbursement model
//!
//! Construction draws start slowly, accelerate through the middle of the
//! build and taper off near completion. The logistic curve
//! `1 / (1 + e^(-k(x - m)))` captures that shape. `x` is the blended
//! completion/time progress and the curve output is the share of the
//! undisbursed commitment expected to be out the door.

use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};

/// Default steepness
pub const DEFAULT_STEEPNESS: f64 = 12.0;

/// Default midpoint
pub const DEFAULT_MIDPOINT: f64 = 0.5;

/// Logistic curve parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SCurve {
    /// Steepness `k`
    pub steepness: f64,
    /// Midpoint `m`, where the curve is exactly 0.5
    pub midpoint: f64,
}

impl SCurve {
    pub const fn new(steepness: f64, midpoint: f64) -> Self {
        Self { steepness, midpoint }
    }

    /// Curve value at progress `x`
    pub fn value(&self, x: f64) -> f64 {
        1.0 / (1.0 + (-self.steepness * (x - self.midpoint)).exp())
    }
}

impl Default for SCurve {
    fn default() -> Self {
        Self::new(DEFAULT_STEEPNESS, DEFAULT_MIDPOINT)
    }
}

/// Blend construction completion with elapsed time, clamped to [0, 1]
pub fn total_progress(completion: f64, time_progress: f64) -> f64 {
    let progress = completion + time_progress * (1.0 - completion);
    if progress.is_nan() {
        return 0.0;
    }
    progress.clamp(0.0, 1.0)
}

/// `outstanding + undisbursed * share`, unrounded, saturating at `Decimal::MAX`
pub fn disbursed_balance(outstanding: Decimal, undisbursed: Decimal, share: f64) -> Decimal {
    let share = Decimal::from_f64(share.clamp(0.0, 1.0)).unwrap_or(Decimal::ZERO);
    outstanding.saturating_add(undisbursed.saturating_mul(share))
}

/// Projected outstanding balance under `curve`, unrounded
pub fn project_balance(
    curve: &SCurve,
    outstanding: Decimal,
    undisbursed: Decimal,
    completion: f64,
    time_progress: f64,
) -> Decimal {
    let progress = total_progress(completion, time_progress);
    disbursed_balance(outstanding, undisbursed, curve.value(progress))
}

/// Round a money amount to cents, half-up
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
