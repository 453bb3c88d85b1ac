//! Overall (account-lifetime) max loss.

use crate::classify::{recoverability_for, severity_for};
use crate::config::OverallMaxLossConfig;
use crate::distance::band;
use crate::fixedpoint::Micros;
use crate::rules::dollars;
use crate::snapshot::AccountSnapshot;
use crate::types::{DistanceToViolation, RuleKind, RuleOutcome, RuleResult, RuleStatus};

pub fn evaluate(snap: &AccountSnapshot, cfg: &OverallMaxLossConfig) -> RuleOutcome {
    // from_starting_balance: loss is the full equity decline from the starting
    // balance. Otherwise only booked losses count.
    let loss = if cfg.from_starting_balance {
        snap.starting_balance.saturating_sub(snap.equity)
    } else if snap.realized_pnl.is_negative() {
        snap.realized_pnl.abs()
    } else {
        Micros::ZERO
    };

    let remaining = cfg.max_loss.saturating_sub(loss);
    let (status, pct) = band(remaining, cfg.max_loss);

    let mut warnings = Vec::new();
    match status {
        RuleStatus::Violated => warnings.push(format!(
            "overall max loss breached: {} against limit {}",
            dollars(loss),
            dollars(cfg.max_loss)
        )),
        RuleStatus::Critical => warnings.push(format!(
            "overall loss approaching limit: {} of {} used",
            dollars(loss),
            dollars(cfg.max_loss)
        )),
        RuleStatus::Caution => warnings.push(format!(
            "overall loss at {} of {} allowed",
            dollars(loss),
            dollars(cfg.max_loss)
        )),
        RuleStatus::Safe => {}
    }

    let recovery_path = matches!(status, RuleStatus::Caution | RuleStatus::Critical)
        .then(|| format!("keep further losses under {}", dollars(remaining)));

    RuleOutcome::Evaluated(RuleResult {
        rule: RuleKind::OverallMaxLoss,
        current_value: loss,
        threshold: cfg.max_loss,
        remaining_buffer: remaining,
        buffer_percent: pct,
        status,
        distance: DistanceToViolation::Dollars(remaining),
        warnings,
        recoverable: recoverability_for(RuleKind::OverallMaxLoss, status),
        severity: severity_for(RuleKind::OverallMaxLoss, status),
        recovery_path,
    })
}
