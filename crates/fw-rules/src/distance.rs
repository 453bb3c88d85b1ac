//! Uniform status banding.
//!
//! Every rule reports the same way: a signed remaining buffer against a
//! threshold, a clamped buffer percentage, and a status derived from fixed
//! bands. Keeping the banding in one place is what makes statuses comparable
//! across rules.

use crate::fixedpoint::{Micros, Pct};
use crate::types::RuleStatus;

/// Caution begins below 50% of buffer remaining.
pub const CAUTION_BAND: Pct = Pct::from_whole(50);
/// Critical begins below 20% of buffer remaining.
pub const CRITICAL_BAND: Pct = Pct::from_whole(20);

/// Band a signed remaining buffer against its threshold.
///
/// Violated exactly when the buffer is negative. A zero buffer is critical,
/// not violated: the account is at the line, not over it. The returned
/// percentage is clamped to [0, 100].
pub fn band(remaining: Micros, threshold: Micros) -> (RuleStatus, Pct) {
    let pct = Pct::from_ratio(remaining, threshold);
    let status = if remaining.is_negative() {
        RuleStatus::Violated
    } else if pct >= CAUTION_BAND {
        RuleStatus::Safe
    } else if pct >= CRITICAL_BAND {
        RuleStatus::Caution
    } else {
        RuleStatus::Critical
    };
    (status, pct)
}
