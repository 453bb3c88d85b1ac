//! Position size cap, in contracts, with an optional per-trade risk check.

use crate::classify::{recoverability_for, severity_for};
use crate::config::{MaxPositionSizeConfig, RiskBasis};
use crate::distance::band;
use crate::fixedpoint::Micros;
use crate::ledger::LedgerState;
use crate::rules::dollars;
use crate::snapshot::AccountSnapshot;
use crate::types::{DistanceToViolation, RuleKind, RuleOutcome, RuleResult, RuleStatus};

pub fn evaluate(
    snap: &AccountSnapshot,
    ledger: &LedgerState,
    cfg: &MaxPositionSizeConfig,
) -> RuleOutcome {
    if cfg.max_contracts <= 0 {
        return RuleOutcome::Unavailable {
            reason: format!("max_contracts must be positive, got {}", cfg.max_contracts),
        };
    }

    let total = snap.total_contracts();
    let remaining_contracts = cfg.max_contracts - total;
    let (mut status, pct) = band(
        Micros::from_whole(remaining_contracts),
        Micros::from_whole(cfg.max_contracts),
    );

    let mut warnings = Vec::new();
    match status {
        RuleStatus::Violated => warnings.push(format!(
            "position size breached: {total} contracts open, cap is {}",
            cfg.max_contracts
        )),
        RuleStatus::Critical | RuleStatus::Caution => warnings.push(format!(
            "position size at {total} of {} contracts",
            cfg.max_contracts
        )),
        RuleStatus::Safe => {}
    }

    // Per-trade risk check: any single position whose adverse excursion (or
    // live loss, per config) exceeds the limit escalates to critical.
    if let Some(limit) = cfg.max_risk_per_trade {
        for pos in &snap.positions {
            let risk = match cfg.risk_basis {
                RiskBasis::PeakExcursion => ledger
                    .token_for(&pos.symbol, pos.opened_at)
                    .and_then(|tok| ledger.lifecycle(tok))
                    .map(|lc| lc.peak_adverse_excursion)
                    .unwrap_or(pos.peak_unrealized_loss)
                    .abs(),
                RiskBasis::LiveUnrealized => {
                    if pos.unrealized_pnl.is_negative() {
                        pos.unrealized_pnl.abs()
                    } else {
                        Micros::ZERO
                    }
                }
            };
            if risk > limit {
                warnings.insert(
                    0,
                    format!(
                        "per-trade risk on {} is {}, over the {} limit",
                        pos.symbol,
                        dollars(risk),
                        dollars(limit)
                    ),
                );
                if status < RuleStatus::Critical {
                    status = RuleStatus::Critical;
                }
            }
        }
    }

    let recovery_path = (status >= RuleStatus::Caution)
        .then(|| format!("reduce position to at most {} contracts", cfg.max_contracts));

    RuleOutcome::Evaluated(RuleResult {
        rule: RuleKind::MaxPositionSize,
        current_value: Micros::from_whole(total),
        threshold: Micros::from_whole(cfg.max_contracts),
        remaining_buffer: Micros::from_whole(remaining_contracts),
        buffer_percent: pct,
        status,
        distance: DistanceToViolation::Contracts(remaining_contracts),
        warnings,
        recoverable: recoverability_for(RuleKind::MaxPositionSize, status),
        severity: severity_for(RuleKind::MaxPositionSize, status),
        recovery_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixedpoint::Pct;
    use crate::snapshot::Position;
    use crate::types::Recoverability;
    use std::collections::BTreeMap;

    fn cfg(max: i64) -> MaxPositionSizeConfig {
        MaxPositionSizeConfig {
            enabled: true,
            max_contracts: max,
            max_risk_per_trade: None,
            risk_basis: RiskBasis::PeakExcursion,
        }
    }

    fn snap_with(positions: Vec<Position>) -> AccountSnapshot {
        AccountSnapshot {
            account_id: "acct-1".to_string(),
            ts_utc: "2024-01-02T12:00:00Z".parse().unwrap(),
            equity: Micros::from_whole(50_000),
            balance: Micros::from_whole(50_000),
            realized_pnl: Micros::ZERO,
            unrealized_pnl: Micros::ZERO,
            starting_balance: Micros::from_whole(50_000),
            positions,
            daily_pnl_hint: BTreeMap::new(),
        }
    }

    fn pos(symbol: &str, qty: i64, upnl: i64, peak: i64) -> Position {
        Position {
            symbol: symbol.to_string(),
            quantity: qty,
            avg_price: Micros::from_whole(100),
            current_price: Micros::from_whole(100),
            unrealized_pnl: Micros::from_whole(upnl),
            opened_at: "2024-01-02T11:00:00Z".parse().unwrap(),
            peak_unrealized_loss: Micros::from_whole(peak),
        }
    }

    #[test]
    fn flat_account_has_full_buffer() {
        let out = evaluate(&snap_with(vec![]), &LedgerState::new(), &cfg(10));
        let r = out.as_result().unwrap();
        assert_eq!(r.status, RuleStatus::Safe);
        assert_eq!(r.buffer_percent, Pct::HUNDRED);
        assert_eq!(r.distance, DistanceToViolation::Contracts(10));
    }

    #[test]
    fn shorts_count_by_absolute_size() {
        let snap = snap_with(vec![pos("ES", 6, 0, 0), pos("NQ", -6, 0, 0)]);
        let out = evaluate(&snap, &LedgerState::new(), &cfg(10));
        let r = out.as_result().unwrap();
        assert_eq!(r.status, RuleStatus::Violated);
        assert_eq!(r.remaining_buffer, Micros::from_whole(-2));
        assert_eq!(r.recoverable, Recoverability::Recoverable);
    }

    #[test]
    fn nine_of_ten_contracts_is_critical() {
        let snap = snap_with(vec![pos("ES", 9, 0, 0)]);
        let out = evaluate(&snap, &LedgerState::new(), &cfg(10));
        assert_eq!(out.status(), Some(RuleStatus::Critical));
    }

    #[test]
    fn per_trade_risk_breach_escalates_to_critical() {
        let mut c = cfg(10);
        c.max_risk_per_trade = Some(Micros::from_whole(500));
        // Small position, but its excursion hint is past the limit.
        let snap = snap_with(vec![pos("ES", 2, -100, -650)]);
        let out = evaluate(&snap, &LedgerState::new(), &c);
        let r = out.as_result().unwrap();
        assert_eq!(r.status, RuleStatus::Critical);
        assert!(r.warnings[0].contains("per-trade risk"), "{:?}", r.warnings);
    }

    #[test]
    fn live_unrealized_basis_ignores_past_excursion() {
        let mut c = cfg(10);
        c.max_risk_per_trade = Some(Micros::from_whole(500));
        c.risk_basis = RiskBasis::LiveUnrealized;
        // Was down 650 earlier, currently only 100 under water.
        let snap = snap_with(vec![pos("ES", 2, -100, -650)]);
        let out = evaluate(&snap, &LedgerState::new(), &c);
        assert_eq!(out.status(), Some(RuleStatus::Safe));
    }

    #[test]
    fn nonpositive_cap_is_unavailable() {
        let out = evaluate(&snap_with(vec![]), &LedgerState::new(), &cfg(0));
        assert!(matches!(out, RuleOutcome::Unavailable { .. }));
    }
}
