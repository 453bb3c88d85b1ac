//! One evaluator per rule kind.
//!
//! Each evaluator is a pure function of (snapshot, ledger, config) plus the
//! session clock; none of them read a wall clock or mutate anything. Config
//! problems surface as [`RuleOutcome::Unavailable`], never as a fabricated
//! safe result.

use crate::fixedpoint::{Micros, MICROS_SCALE};

pub mod consistency;
pub mod daily_loss;
pub mod hours;
pub mod overall_loss;
pub mod position_size;
pub mod trailing;

/// Format a dollar amount for warning text: sign, thousands-free, two
/// decimals, truncated.
pub(crate) fn dollars(m: Micros) -> String {
    let raw = m.raw();
    let sign = if raw < 0 { "-" } else { "" };
    let mag = raw.unsigned_abs();
    let whole = mag / MICROS_SCALE as u64;
    let cents = (mag % MICROS_SCALE as u64) / 10_000;
    format!("{sign}${whole}.{cents:02}")
}
