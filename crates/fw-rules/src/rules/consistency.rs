//! Consistency rule: caps how much of total profit one day may contribute.
//!
//! The only rule whose threshold depends on aggregate history, so it is
//! recomputed from the full daily ledger every evaluation rather than
//! tracked incrementally.

use crate::classify::{recoverability_for, severity_for};
use crate::config::ConsistencyConfig;
use crate::distance::band;
use crate::fixedpoint::{Micros, Pct};
use crate::ledger::LedgerState;
use crate::types::{DistanceToViolation, RuleKind, RuleOutcome, RuleResult, RuleStatus};

pub fn evaluate(ledger: &LedgerState, cfg: &ConsistencyConfig) -> RuleOutcome {
    let history = ledger.daily_realized_history();

    // Not enough history yet: the ratio is meaningless on day one, when any
    // single profitable day is 100% of profit by definition.
    if let Some(min_days) = cfg.min_trades_per_day {
        if (history.len() as u32) < min_days {
            return deferred(cfg, history.len(), min_days);
        }
    }

    let total: Micros = history
        .values()
        .fold(Micros::ZERO, |acc, v| acc.saturating_add(*v));
    let best_day = history.values().copied().max().unwrap_or(Micros::ZERO);

    // Nothing earned yet; there is no profit distribution to police.
    if total <= Micros::ZERO || best_day <= Micros::ZERO {
        return RuleOutcome::Evaluated(RuleResult {
            rule: RuleKind::Consistency,
            current_value: Micros::ZERO,
            threshold: Micros::new(cfg.max_daily_profit_percent.raw()),
            remaining_buffer: Micros::new(cfg.max_daily_profit_percent.raw()),
            buffer_percent: Pct::HUNDRED,
            status: RuleStatus::Safe,
            distance: DistanceToViolation::Percent(cfg.max_daily_profit_percent),
            warnings: Vec::new(),
            recoverable: recoverability_for(RuleKind::Consistency, RuleStatus::Safe),
            severity: severity_for(RuleKind::Consistency, RuleStatus::Safe),
            recovery_path: None,
        });
    }

    let share = Pct::ratio_unclamped(best_day, total);
    // All scalar fields for this rule are percentage points, not dollars.
    let current = Micros::new(share.raw());
    let threshold = Micros::new(cfg.max_daily_profit_percent.raw());
    let remaining = threshold.saturating_sub(current);
    let (status, pct) = band(remaining, threshold);

    let mut warnings = Vec::new();
    match status {
        RuleStatus::Violated => warnings.push(format!(
            "largest day is {share} of total profit, cap is {}",
            cfg.max_daily_profit_percent
        )),
        RuleStatus::Critical | RuleStatus::Caution => warnings.push(format!(
            "largest day at {share} of total profit, cap is {}",
            cfg.max_daily_profit_percent
        )),
        RuleStatus::Safe => {}
    }

    let recovery_path = (status != RuleStatus::Safe)
        .then(|| "spread profits across more trading days to dilute the largest day".to_string());

    RuleOutcome::Evaluated(RuleResult {
        rule: RuleKind::Consistency,
        current_value: current,
        threshold,
        remaining_buffer: remaining,
        buffer_percent: pct,
        status,
        distance: DistanceToViolation::Percent(Pct::new(remaining.raw())),
        warnings,
        recoverable: recoverability_for(RuleKind::Consistency, status),
        severity: severity_for(RuleKind::Consistency, status),
        recovery_path,
    })
}

fn deferred(cfg: &ConsistencyConfig, have: usize, need: u32) -> RuleOutcome {
    RuleOutcome::Evaluated(RuleResult {
        rule: RuleKind::Consistency,
        current_value: Micros::ZERO,
        threshold: Micros::new(cfg.max_daily_profit_percent.raw()),
        remaining_buffer: Micros::new(cfg.max_daily_profit_percent.raw()),
        buffer_percent: Pct::HUNDRED,
        status: RuleStatus::Safe,
        distance: DistanceToViolation::Percent(cfg.max_daily_profit_percent),
        warnings: vec![format!(
            "consistency assessment deferred: {have} of {need} trading days recorded"
        )],
        recoverable: recoverability_for(RuleKind::Consistency, RuleStatus::Safe),
        severity: severity_for(RuleKind::Consistency, RuleStatus::Safe),
        recovery_path: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::SessionClock;
    use crate::snapshot::AccountSnapshot;
    use crate::types::Recoverability;
    use std::collections::BTreeMap;

    fn cfg(cap: i64) -> ConsistencyConfig {
        ConsistencyConfig {
            enabled: true,
            max_daily_profit_percent: Pct::from_whole(cap),
            min_trades_per_day: None,
        }
    }

    fn ledger_with_days(days: &[(&str, i64)]) -> LedgerState {
        let mut ledger = LedgerState::new();
        let clock = SessionClock::utc_midnight();
        let mut hint = BTreeMap::new();
        for (date, pnl) in days {
            hint.insert(date.parse().unwrap(), Micros::from_whole(*pnl));
        }
        let snap = AccountSnapshot {
            account_id: "acct-1".to_string(),
            ts_utc: "2024-02-01T00:00:00Z".parse().unwrap(),
            equity: Micros::from_whole(50_000),
            balance: Micros::from_whole(50_000),
            realized_pnl: Micros::ZERO,
            unrealized_pnl: Micros::ZERO,
            starting_balance: Micros::from_whole(50_000),
            positions: Vec::new(),
            daily_pnl_hint: hint,
        };
        ledger.ingest(&snap, &clock).unwrap();
        ledger
    }

    #[test]
    fn one_dominant_day_violates_the_cap() {
        // 2,000 of 2,500 total = 80% against a 50% cap.
        let ledger = ledger_with_days(&[("2024-01-10", 2_000), ("2024-01-11", 500)]);
        let out = evaluate(&ledger, &cfg(50));
        let r = out.as_result().unwrap();
        assert_eq!(r.status, RuleStatus::Violated);
        assert_eq!(r.recoverable, Recoverability::Conditional);
        assert!(r.remaining_buffer.is_negative());
    }

    #[test]
    fn evenly_spread_profit_is_safe() {
        let ledger = ledger_with_days(&[
            ("2024-01-10", 500),
            ("2024-01-11", 500),
            ("2024-01-12", 500),
            ("2024-01-13", 500),
        ]);
        let out = evaluate(&ledger, &cfg(50));
        let r = out.as_result().unwrap();
        // Best day is 25% of total, half the cap.
        assert_eq!(r.status, RuleStatus::Safe);
        assert_eq!(r.buffer_percent, Pct::from_whole(50));
    }

    #[test]
    fn net_loss_history_has_nothing_to_police() {
        let ledger = ledger_with_days(&[("2024-01-10", 300), ("2024-01-11", -900)]);
        let out = evaluate(&ledger, &cfg(50));
        let r = out.as_result().unwrap();
        assert_eq!(r.status, RuleStatus::Safe);
        assert_eq!(r.buffer_percent, Pct::HUNDRED);
    }

    #[test]
    fn loss_days_inflate_the_best_day_share() {
        // Best day 1,000; net total 1,250 -> 80% of realized profit-to-date.
        let ledger = ledger_with_days(&[
            ("2024-01-10", 1_000),
            ("2024-01-11", -250),
            ("2024-01-12", 500),
        ]);
        let out = evaluate(&ledger, &cfg(50));
        assert_eq!(out.status(), Some(RuleStatus::Violated));
    }

    #[test]
    fn assessment_defers_until_enough_days() {
        let mut c = cfg(50);
        c.min_trades_per_day = Some(5);
        let ledger = ledger_with_days(&[("2024-01-10", 2_000), ("2024-01-11", 100)]);
        let out = evaluate(&ledger, &c);
        let r = out.as_result().unwrap();
        assert_eq!(r.status, RuleStatus::Safe);
        assert!(r.warnings[0].contains("deferred"), "{:?}", r.warnings);
    }
}
