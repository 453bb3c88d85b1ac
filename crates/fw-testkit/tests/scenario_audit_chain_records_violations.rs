use fw_audit::{verify_hash_chain, AuditKind, AuditWriter, VerifyResult};
use fw_registry::RuleSetRegistry;
use fw_rules::RuleStatus;
use fw_testkit::{feed, wire_snapshot};
use fw_tracker::AccountTracker;

// Every violation alert must land in the audit log as a hash-chained event
// that survives verification after the writer is gone.
#[test]
fn scenario_violations_are_chained_into_the_audit_log() {
    fw_testkit::init_test_logging();

    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("audit.jsonl");

    let mut registry = RuleSetRegistry::new();
    registry.insert(fw_sim::reference_rule_set()).unwrap();
    let mut tracker =
        AccountTracker::new("acct-audit", &registry, "simfirm", "eval_50k", None).unwrap();

    {
        let mut audit = AuditWriter::new(&log, true).unwrap();
        let warmup = wire_snapshot("acct-audit", "2024-01-02T14:30:00Z", "52000.00", "2000.00");
        tracker.ingest(&warmup, Some(&mut audit)).unwrap();

        let crash = wire_snapshot("acct-audit", "2024-01-02T15:30:00Z", "49100.00", "-900.00");
        let eval = tracker.ingest(&crash, Some(&mut audit)).unwrap();
        assert_eq!(eval.state.overall, RuleStatus::Violated);
        assert!(audit.seq() >= 1);
    }

    let content = std::fs::read_to_string(&log).unwrap();
    assert!(content.contains(AuditKind::RuleViolated.as_str()));
    assert!(content.contains("trailing_drawdown"));

    match verify_hash_chain(&log).unwrap() {
        VerifyResult::Valid { lines } => assert!(lines >= 1),
        VerifyResult::Broken { line, reason } => panic!("chain broke at {line}: {reason}"),
    }
}

// Flipping one byte anywhere in the log must be caught.
#[test]
fn scenario_tampered_audit_log_fails_verification() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("audit.jsonl");

    let mut registry = RuleSetRegistry::new();
    registry.insert(fw_sim::reference_rule_set()).unwrap();
    let mut tracker =
        AccountTracker::new("acct-audit", &registry, "simfirm", "eval_50k", None).unwrap();

    let mut audit = AuditWriter::new(&log, true).unwrap();
    feed(
        &mut tracker,
        &[wire_snapshot("acct-audit", "2024-01-02T14:30:00Z", "52000.00", "2000.00")],
    )
    .unwrap();
    tracker
        .ingest(
            &wire_snapshot("acct-audit", "2024-01-02T15:30:00Z", "49100.00", "-900.00"),
            Some(&mut audit),
        )
        .unwrap();
    drop(audit);

    let content = std::fs::read_to_string(&log).unwrap();
    let tampered = content.replacen("trailing_drawdown", "trailing_drawdowns", 1);
    assert_ne!(content, tampered);
    std::fs::write(&log, tampered).unwrap();

    assert!(matches!(
        verify_hash_chain(&log).unwrap(),
        VerifyResult::Broken { .. }
    ));
}
