//! The evaluation pipeline for one rule set.
//!
//! An engine is built once per resolved rule set and is immutable; all
//! per-account mutable state stays in the caller's [`LedgerState`]. The only
//! mutation on the evaluation path is the explicit ledger ingest that
//! precedes assessment.

use crate::aggregate::{diff_alerts, max_allowed_risk, overall_level};
use crate::calendar::SessionClock;
use crate::config::RuleSetConfig;
use crate::ledger::{IngestError, LedgerState};
use crate::rules;
use crate::snapshot::AccountSnapshot;
use crate::types::{AccountRiskState, Alert, RuleKind};
use std::collections::BTreeMap;

#[derive(Debug)]
pub struct Evaluation {
    pub state: AccountRiskState,
    /// One alert per rule whose status changed from the previous state.
    pub alerts: Vec<Alert>,
    /// Profit target reached; the high-water mark will re-base on the next
    /// accepted snapshot.
    pub high_water_mark_reset: bool,
}

#[derive(Debug)]
pub struct RuleEngine {
    config: RuleSetConfig,
    clock: SessionClock,
}

impl RuleEngine {
    pub fn new(config: RuleSetConfig) -> Self {
        let clock = config.session_clock();
        Self { config, clock }
    }

    pub fn config(&self) -> &RuleSetConfig {
        &self.config
    }

    pub fn session_clock(&self) -> &SessionClock {
        &self.clock
    }

    /// Ingest a snapshot into the ledger, assess every enabled rule, and diff
    /// alerts against the previous state. A rejected snapshot leaves both the
    /// ledger and the previous risk state untouched.
    pub fn evaluate(
        &self,
        ledger: &mut LedgerState,
        snap: &AccountSnapshot,
        prev: Option<&AccountRiskState>,
    ) -> Result<Evaluation, IngestError> {
        ledger.ingest(snap, &self.clock)?;
        let (state, reset_hwm) = self.assess(ledger, snap);
        if reset_hwm {
            ledger.stage_high_water_mark_reset();
        }
        let alerts = diff_alerts(prev, &state);
        Ok(Evaluation { state, alerts, high_water_mark_reset: reset_hwm })
    }

    /// Pure assessment of an already-ingested snapshot. Calling this twice
    /// with the same inputs yields identical states.
    pub fn assess(&self, ledger: &LedgerState, snap: &AccountSnapshot) -> (AccountRiskState, bool) {
        let mut rules = BTreeMap::new();
        let mut reset_hwm = false;

        if let Some(cfg) = enabled(&self.config.trailing_drawdown, |c| c.enabled) {
            let eval = rules::trailing::evaluate(snap, ledger, cfg);
            reset_hwm = eval.reset_high_water_mark;
            rules.insert(RuleKind::TrailingDrawdown, eval.outcome);
        }
        if let Some(cfg) = enabled(&self.config.daily_loss_limit, |c| c.enabled) {
            rules.insert(
                RuleKind::DailyLossLimit,
                rules::daily_loss::evaluate(snap, ledger, cfg),
            );
        }
        if let Some(cfg) = enabled(&self.config.overall_max_loss, |c| c.enabled) {
            rules.insert(
                RuleKind::OverallMaxLoss,
                rules::overall_loss::evaluate(snap, cfg),
            );
        }
        if let Some(cfg) = enabled(&self.config.max_position_size, |c| c.enabled) {
            rules.insert(
                RuleKind::MaxPositionSize,
                rules::position_size::evaluate(snap, ledger, cfg),
            );
        }
        if let Some(cfg) = enabled(&self.config.trading_hours, |c| c.enabled) {
            rules.insert(RuleKind::TradingHours, rules::hours::evaluate(snap, cfg));
        }
        if let Some(cfg) = enabled(&self.config.consistency, |c| c.enabled) {
            rules.insert(RuleKind::Consistency, rules::consistency::evaluate(ledger, cfg));
        }

        let overall = overall_level(&rules);
        let max_allowed = max_allowed_risk(&rules);
        let state = AccountRiskState {
            account_id: snap.account_id.clone(),
            ts_utc: snap.ts_utc,
            equity: snap.equity,
            balance: snap.balance,
            rules,
            overall,
            max_allowed,
        };
        (state, reset_hwm)
    }
}

fn enabled<T>(slot: &Option<T>, is_on: impl Fn(&T) -> bool) -> Option<&T> {
    slot.as_ref().filter(|c| is_on(c))
}
