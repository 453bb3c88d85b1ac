//! Worst-of aggregation, headroom summary, and alert diffing.

use crate::fixedpoint::Micros;
use crate::types::{
    AccountRiskState, Alert, AlertSeverity, MaxAllowedRisk, RuleKind, RuleOutcome, RuleStatus,
};
use std::collections::BTreeMap;

/// Worst status among evaluated rules. Unavailable rules do not participate:
/// they are surfaced on their own and must not drag the overall level toward
/// safe or toward violated on no data.
pub fn overall_level(rules: &BTreeMap<RuleKind, RuleOutcome>) -> RuleStatus {
    rules
        .values()
        .filter_map(RuleOutcome::status)
        .max()
        .unwrap_or(RuleStatus::Safe)
}

const LOSS_RULES: [RuleKind; 3] = [
    RuleKind::TrailingDrawdown,
    RuleKind::DailyLossLimit,
    RuleKind::OverallMaxLoss,
];

/// How much more the account can lose (tightest loss-rule buffer) and how
/// many more contracts it can hold. `None` when no relevant rule produced a
/// reading.
pub fn max_allowed_risk(rules: &BTreeMap<RuleKind, RuleOutcome>) -> MaxAllowedRisk {
    let max_loss = LOSS_RULES
        .iter()
        .filter_map(|kind| rules.get(kind))
        .filter_map(RuleOutcome::as_result)
        .map(|r| r.remaining_buffer.max(Micros::ZERO))
        .min();

    let max_contracts = rules
        .get(&RuleKind::MaxPositionSize)
        .and_then(RuleOutcome::as_result)
        .map(|r| match r.distance {
            crate::types::DistanceToViolation::Contracts(n) => n.max(0),
            _ => 0,
        });

    MaxAllowedRisk { max_loss, max_contracts }
}

pub fn alert_severity(status: Option<RuleStatus>) -> AlertSeverity {
    match status {
        Some(RuleStatus::Violated) => AlertSeverity::Violated,
        Some(RuleStatus::Critical) => AlertSeverity::Critical,
        Some(RuleStatus::Caution) => AlertSeverity::Warning,
        Some(RuleStatus::Safe) => AlertSeverity::Info,
        // Lost visibility into a rule is itself worth flagging.
        None => AlertSeverity::Warning,
    }
}

/// Diff two consecutive risk states and emit one alert per rule whose status
/// changed. With no previous state, rules are diffed against an implicit
/// safe baseline, so an account that arrives already in trouble alerts
/// immediately while a clean first evaluation stays quiet.
pub fn diff_alerts(prev: Option<&AccountRiskState>, next: &AccountRiskState) -> Vec<Alert> {
    let mut alerts = Vec::new();
    for (kind, outcome) in &next.rules {
        let prev_status = match prev {
            Some(state) => state.rules.get(kind).and_then(RuleOutcome::status),
            None => Some(RuleStatus::Safe),
        };
        let new_status = outcome.status();
        if prev_status == new_status {
            continue;
        }
        let message = match outcome {
            RuleOutcome::Evaluated(r) => r
                .warnings
                .first()
                .cloned()
                .unwrap_or_else(|| format!("{kind} status changed to {}", r.status)),
            RuleOutcome::Unavailable { reason } => {
                format!("{kind} evaluation unavailable: {reason}")
            }
        };
        alerts.push(Alert {
            account_id: next.account_id.clone(),
            rule: *kind,
            previous: prev_status,
            status: new_status,
            severity: alert_severity(new_status),
            message,
            ts_utc: next.ts_utc,
        });
    }
    alerts
}
