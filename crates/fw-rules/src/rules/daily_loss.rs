//! Daily loss limit, reset at a firm-local wall-clock time.

use crate::calendar::SessionClock;
use crate::classify::{recoverability_for, severity_for};
use crate::config::DailyLossLimitConfig;
use crate::distance::band;
use crate::fixedpoint::Micros;
use crate::ledger::LedgerState;
use crate::rules::dollars;
use crate::snapshot::AccountSnapshot;
use crate::types::{DistanceToViolation, RuleKind, RuleOutcome, RuleResult, RuleStatus};

pub fn evaluate(
    snap: &AccountSnapshot,
    ledger: &LedgerState,
    cfg: &DailyLossLimitConfig,
) -> RuleOutcome {
    let clock = match SessionClock::new(&cfg.timezone, &cfg.reset_time) {
        Ok(clock) => clock,
        Err(err) => {
            return RuleOutcome::Unavailable {
                reason: format!("daily loss limit config: {err}"),
            }
        }
    };

    let today = clock.trading_date(snap.ts_utc);
    // Today's realized bucket only; open-position marks are priced by the
    // trailing and overall loss rules.
    let daily_pnl = ledger.daily_realized(today).unwrap_or(Micros::ZERO);

    let remaining = cfg.max_loss.saturating_add(daily_pnl);
    let (status, pct) = band(remaining, cfg.max_loss);

    let mut warnings = Vec::new();
    match status {
        RuleStatus::Violated => warnings.push(format!(
            "daily loss limit breached: {} against limit {}",
            dollars(daily_pnl),
            dollars(cfg.max_loss)
        )),
        RuleStatus::Critical => warnings.push(format!(
            "daily loss approaching limit: {} of {} used",
            dollars(daily_pnl.abs()),
            dollars(cfg.max_loss)
        )),
        RuleStatus::Caution => warnings.push(format!(
            "daily loss at {} of {} allowed",
            dollars(daily_pnl.abs()),
            dollars(cfg.max_loss)
        )),
        RuleStatus::Safe => {}
    }

    let recovery_path = match status {
        RuleStatus::Violated => Some(format!(
            "trading resumes at the next daily reset, {}",
            clock.next_reset_display(snap.ts_utc)
        )),
        RuleStatus::Critical | RuleStatus::Caution => Some(format!(
            "keep further losses under {} until the {} reset",
            dollars(remaining),
            clock.next_reset_display(snap.ts_utc)
        )),
        RuleStatus::Safe => None,
    };

    RuleOutcome::Evaluated(RuleResult {
        rule: RuleKind::DailyLossLimit,
        current_value: daily_pnl,
        threshold: cfg.max_loss,
        remaining_buffer: remaining,
        buffer_percent: pct,
        status,
        distance: DistanceToViolation::Dollars(remaining),
        warnings,
        recoverable: recoverability_for(RuleKind::DailyLossLimit, status),
        severity: severity_for(RuleKind::DailyLossLimit, status),
        recovery_path,
    })
}
