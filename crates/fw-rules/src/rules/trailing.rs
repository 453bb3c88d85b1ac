//! Trailing drawdown: maximum decline from the high-water mark.

use crate::classify::{recoverability_for, severity_for};
use crate::config::TrailingDrawdownConfig;
use crate::distance::band;
use crate::fixedpoint::Micros;
use crate::ledger::LedgerState;
use crate::rules::dollars;
use crate::snapshot::AccountSnapshot;
use crate::types::{DistanceToViolation, RuleKind, RuleOutcome, RuleResult, RuleStatus};

pub struct TrailingEvaluation {
    pub outcome: RuleOutcome,
    /// Profit target reached; the ledger should re-base its high-water mark
    /// at the next ingest.
    pub reset_high_water_mark: bool,
}

pub fn evaluate(
    snap: &AccountSnapshot,
    ledger: &LedgerState,
    cfg: &TrailingDrawdownConfig,
) -> TrailingEvaluation {
    let Some(hwm) = ledger.high_water_mark() else {
        return TrailingEvaluation {
            outcome: RuleOutcome::Unavailable {
                reason: "no ledger history for account".to_string(),
            },
            reset_high_water_mark: false,
        };
    };

    let reference = if cfg.include_unrealized_pnl { snap.equity } else { snap.balance };
    let drawdown = hwm.saturating_sub(reference);
    let threshold = hwm.percent_of(cfg.max_drawdown_percent);
    let remaining = threshold.saturating_sub(drawdown);
    let (status, pct) = band(remaining, threshold);

    // The equity level at which the account is lost.
    let floor = hwm.saturating_sub(threshold);

    let mut warnings = Vec::new();
    match status {
        RuleStatus::Violated => warnings.push(format!(
            "trailing drawdown breached: equity {} below floor {}",
            dollars(reference),
            dollars(floor)
        )),
        RuleStatus::Critical => warnings.push(format!(
            "trailing drawdown critical: {} of buffer left before floor {}",
            dollars(remaining),
            dollars(floor)
        )),
        RuleStatus::Caution => warnings.push(format!(
            "trailing drawdown at {} of {} allowed",
            dollars(drawdown),
            dollars(threshold)
        )),
        RuleStatus::Safe => {}
    }

    let recovery_path = (status != RuleStatus::Safe && status != RuleStatus::Violated)
        .then(|| format!("reduce open risk / lock in equity above {}", dollars(floor)));

    let reset = cfg.reset_on_profit_target
        && cfg.profit_target_percent.is_some_and(|target| {
            let goal = snap
                .starting_balance
                .saturating_add(snap.starting_balance.percent_of(target));
            snap.equity >= goal
        });

    TrailingEvaluation {
        outcome: RuleOutcome::Evaluated(RuleResult {
            rule: RuleKind::TrailingDrawdown,
            current_value: drawdown,
            threshold,
            remaining_buffer: remaining,
            buffer_percent: pct,
            status,
            distance: DistanceToViolation::Dollars(remaining),
            warnings,
            recoverable: recoverability_for(RuleKind::TrailingDrawdown, status),
            severity: severity_for(RuleKind::TrailingDrawdown, status),
            recovery_path,
        }),
        reset_high_water_mark: reset,
    }
}
