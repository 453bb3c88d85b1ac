use fw_audit::{verify_hash_chain, AuditKind, AuditWriter, VerifyResult};
use fw_registry::RuleSetRegistry;
use fw_rules::RuleStatus;
use fw_testkit::wire_snapshot;
use fw_tracker::{AccountTracker, TrackerError};

// A snapshot older than the last accepted one is rejected without touching
// ledger or published state, and the rejection lands in the audit log.
#[test]
fn scenario_stale_snapshot_leaves_state_untouched() {
    fw_testkit::init_test_logging();

    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("audit.jsonl");
    let mut audit = AuditWriter::new(&log, true).unwrap();

    let registry = RuleSetRegistry::with_builtin_presets();
    let mut tracker =
        AccountTracker::new("acct-ooo", &registry, "topstep", "eval", Some("1.0")).unwrap();

    tracker
        .ingest(
            &wire_snapshot("acct-ooo", "2024-01-02T14:00:00Z", "49600.00", "-400.00"),
            Some(&mut audit),
        )
        .unwrap();
    let hwm_before = tracker.ledger().high_water_mark();
    let state_before = tracker.last_state().cloned();

    let err = tracker
        .ingest(
            &wire_snapshot("acct-ooo", "2024-01-02T13:59:00Z", "48000.00", "-2000.00"),
            Some(&mut audit),
        )
        .unwrap_err();
    assert!(matches!(err, TrackerError::OutOfOrder(_)));

    // Nothing moved.
    assert_eq!(tracker.ledger().high_water_mark(), hwm_before);
    assert_eq!(tracker.last_state().cloned(), state_before);

    // The next in-order snapshot is accepted as if the stale one never came.
    let eval = tracker
        .ingest(
            &wire_snapshot("acct-ooo", "2024-01-02T14:01:00Z", "49600.00", "-400.00"),
            Some(&mut audit),
        )
        .unwrap();
    assert_eq!(eval.state.overall, RuleStatus::Safe);

    let content = std::fs::read_to_string(&log).unwrap();
    assert!(content.contains(AuditKind::SnapshotRejected.as_str()));
    match verify_hash_chain(&log).unwrap() {
        VerifyResult::Valid { lines } => assert!(lines >= 1),
        VerifyResult::Broken { line, reason } => panic!("chain broke at {line}: {reason}"),
    }
}

// A malformed snapshot (no parseable money fields) is also a rejection, not
// a panic, and carries the offending field name.
#[test]
fn scenario_unparseable_snapshot_names_the_field() {
    let registry = RuleSetRegistry::with_builtin_presets();
    let mut tracker =
        AccountTracker::new("acct-ooo", &registry, "topstep", "eval", Some("1.0")).unwrap();

    let mut bad = wire_snapshot("acct-ooo", "2024-01-02T14:00:00Z", "49600.00", "-400.00");
    bad.equity = "not-a-number".to_string();

    let err = tracker.ingest(&bad, None).unwrap_err();
    match err {
        TrackerError::InvalidSnapshot { field, .. } => assert_eq!(field, "equity"),
        other => panic!("unexpected error: {other}"),
    }
    assert!(tracker.last_state().is_none());
}
