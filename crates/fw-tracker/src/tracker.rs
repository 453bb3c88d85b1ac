//! Per-account orchestration: resolve the rule set once, own the ledger and
//! the previous risk state, and turn wire snapshots into risk states.

use crate::error::TrackerError;
use crate::parse::parse_snapshot;
use fw_audit::{AuditKind, AuditWriter};
use fw_registry::{rule_set_hash, RuleSetRegistry};
use fw_rules::{
    AccountRiskState, Evaluation, LedgerState, RuleEngine, RuleOutcome, RuleStatus,
};
use serde_json::json;
use tracing::{debug, info, warn};

#[derive(Debug)]
pub struct AccountTracker {
    account_id: String,
    engine: RuleEngine,
    rule_set_hash: String,
    ledger: LedgerState,
    last_state: Option<AccountRiskState>,
}

impl AccountTracker {
    /// Resolve the rule set for an account and build its tracker. `version`
    /// of `None` takes the newest published rule set.
    pub fn new(
        account_id: &str,
        registry: &RuleSetRegistry,
        firm: &str,
        account_type: &str,
        version: Option<&str>,
    ) -> Result<Self, TrackerError> {
        let config = match version {
            Some(v) => registry.resolve(firm, account_type, v)?,
            None => registry.resolve_latest(firm, account_type)?,
        };
        let rule_set_hash = rule_set_hash(config);
        info!(
            account_id,
            firm,
            account_type,
            version = %config.version,
            rule_set_hash = %rule_set_hash,
            "rule set resolved"
        );
        Ok(Self {
            account_id: account_id.to_string(),
            engine: RuleEngine::new(config.clone()),
            rule_set_hash,
            ledger: LedgerState::new(),
            last_state: None,
        })
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    pub fn rule_set_hash(&self) -> &str {
        &self.rule_set_hash
    }

    pub fn last_state(&self) -> Option<&AccountRiskState> {
        self.last_state.as_ref()
    }

    pub fn ledger(&self) -> &LedgerState {
        &self.ledger
    }

    /// Seed the ledger's high-water mark when registering an account with
    /// known prior history. Only meaningful before the first snapshot.
    pub fn seed_high_water_mark(&mut self, hwm: fw_rules::Micros) {
        self.ledger.seed_high_water_mark(hwm);
    }

    /// Process one wire snapshot: validate, ingest, evaluate, diff. On any
    /// error the ledger and the last risk state are unchanged.
    pub fn ingest(
        &mut self,
        wire: &fw_schemas::AccountSnapshot,
        mut audit: Option<&mut AuditWriter>,
    ) -> Result<Evaluation, TrackerError> {
        let snap = match parse_snapshot(wire) {
            Ok(snap) => snap,
            Err(err) => {
                warn!(account_id = %self.account_id, error = %err, "snapshot rejected");
                self.audit_rejection(audit.as_deref_mut(), &err);
                return Err(err);
            }
        };

        let eval = match self.engine.evaluate(&mut self.ledger, &snap, self.last_state.as_ref()) {
            Ok(eval) => eval,
            Err(err) => {
                let err = TrackerError::from(err);
                warn!(account_id = %self.account_id, error = %err, "snapshot rejected");
                self.audit_rejection(audit.as_deref_mut(), &err);
                return Err(err);
            }
        };

        debug!(
            account_id = %self.account_id,
            ts = %eval.state.ts_utc,
            overall = %eval.state.overall,
            alerts = eval.alerts.len(),
            "snapshot evaluated"
        );
        if let Some(writer) = audit {
            self.audit_evaluation(writer, &eval);
        }

        self.last_state = Some(eval.state.clone());
        Ok(eval)
    }

    fn audit_rejection(&self, audit: Option<&mut AuditWriter>, err: &TrackerError) {
        let Some(writer) = audit else { return };
        let at = self
            .ledger
            .last_ts()
            .unwrap_or_else(|| chrono::DateTime::<chrono::Utc>::default());
        if let Err(audit_err) = writer.append(
            &self.account_id,
            at,
            AuditKind::SnapshotRejected,
            json!({ "reason": err.to_string() }),
        ) {
            warn!(account_id = %self.account_id, error = %audit_err, "audit append failed");
        }
    }

    fn audit_evaluation(&self, writer: &mut AuditWriter, eval: &Evaluation) {
        let ts = eval.state.ts_utc;
        for alert in &eval.alerts {
            let kind = match alert.status {
                Some(RuleStatus::Violated) => AuditKind::RuleViolated,
                Some(_) => AuditKind::StatusChanged,
                None => AuditKind::EvaluationUnavailable,
            };
            let payload = match &eval.state.rules[&alert.rule] {
                RuleOutcome::Evaluated(r) => json!({
                    "rule": alert.rule.as_str(),
                    "from": alert.previous.map(|s| s.as_str()),
                    "to": alert.status.map(|s| s.as_str()),
                    "remaining_buffer": r.remaining_buffer.to_string(),
                    "buffer_percent": r.buffer_percent.to_string(),
                    "message": alert.message,
                }),
                RuleOutcome::Unavailable { reason } => json!({
                    "rule": alert.rule.as_str(),
                    "from": alert.previous.map(|s| s.as_str()),
                    "reason": reason,
                }),
            };
            if let Err(err) = writer.append(&self.account_id, ts, kind, payload) {
                warn!(account_id = %self.account_id, error = %err, "audit append failed");
            }
        }
        if eval.high_water_mark_reset {
            let payload = json!({
                "high_water_mark": self.ledger.high_water_mark().map(|m| m.to_string()),
            });
            if let Err(err) =
                writer.append(&self.account_id, ts, AuditKind::HighWaterMarkReset, payload)
            {
                warn!(account_id = %self.account_id, error = %err, "audit append failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fw_audit::verify_hash_chain;
    use fw_registry::RuleSetRegistry;
    use fw_schemas::WireTimestamp;
    use std::collections::BTreeMap;

    fn registry() -> RuleSetRegistry {
        RuleSetRegistry::with_builtin_presets()
    }

    fn wire(ts: &str, equity: &str, realized: &str) -> fw_schemas::AccountSnapshot {
        fw_schemas::AccountSnapshot {
            account_id: "acct-1".to_string(),
            timestamp: WireTimestamp::Rfc3339(ts.to_string()),
            equity: equity.to_string(),
            balance: equity.to_string(),
            realized_pnl: realized.to_string(),
            unrealized_pnl: "0.00".to_string(),
            starting_balance: "50000.00".to_string(),
            positions: Vec::new(),
            daily_pnl_by_date: BTreeMap::new(),
        }
    }

    #[test]
    fn unknown_rule_set_fails_construction() {
        let err = AccountTracker::new("acct-1", &registry(), "enron", "eval", None).unwrap_err();
        assert!(matches!(err, TrackerError::RuleSetNotFound(_)));
    }

    #[test]
    fn tracks_state_across_snapshots() {
        let reg = registry();
        let mut tracker =
            AccountTracker::new("acct-1", &reg, "topstep", "eval", Some("1.0")).unwrap();

        let first = tracker
            .ingest(&wire("2024-01-02T12:00:00Z", "50000.00", "0.00"), None)
            .unwrap();
        assert!(first.alerts.is_empty());

        // Down $600: the $1,000 daily limit moves to caution.
        let second = tracker
            .ingest(&wire("2024-01-02T12:30:00Z", "49400.00", "-600.00"), None)
            .unwrap();
        assert_eq!(second.alerts.len(), 1);
        assert!(tracker.last_state().is_some());
    }

    #[test]
    fn rejected_snapshot_leaves_last_state_untouched() {
        let reg = registry();
        let mut tracker =
            AccountTracker::new("acct-1", &reg, "topstep", "eval", Some("1.0")).unwrap();
        tracker
            .ingest(&wire("2024-01-02T12:00:00Z", "50000.00", "0.00"), None)
            .unwrap();
        let before = tracker.last_state().cloned();

        // Malformed money field.
        let err = tracker
            .ingest(&wire("2024-01-02T12:30:00Z", "NaN", "0.00"), None)
            .unwrap_err();
        assert!(matches!(err, TrackerError::InvalidSnapshot { .. }));

        // Stale timestamp.
        let err = tracker
            .ingest(&wire("2024-01-02T11:00:00Z", "49000.00", "-1000.00"), None)
            .unwrap_err();
        assert!(matches!(err, TrackerError::OutOfOrder(_)));

        assert_eq!(tracker.last_state().cloned(), before);
    }

    #[test]
    fn audit_trail_records_transitions_and_verifies() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("risk-audit.jsonl");
        let mut writer = AuditWriter::new(&path, true).unwrap();

        let reg = registry();
        let mut tracker =
            AccountTracker::new("acct-1", &reg, "topstep", "eval", Some("1.0")).unwrap();
        tracker
            .ingest(&wire("2024-01-02T12:00:00Z", "50000.00", "0.00"), Some(&mut writer))
            .unwrap();
        tracker
            .ingest(&wire("2024-01-02T12:30:00Z", "48900.00", "-1100.00"), Some(&mut writer))
            .unwrap();
        // Rejected snapshot is audited too.
        let _ = tracker.ingest(&wire("2024-01-02T12:00:00Z", "48900.00", "-1100.00"), Some(&mut writer));

        assert!(writer.seq() >= 2);
        assert!(matches!(
            verify_hash_chain(&path).unwrap(),
            fw_audit::VerifyResult::Valid { .. }
        ));
    }
}
