use fw_registry::RuleSetRegistry;
use fw_rules::{Micros, RuleKind, RuleStatus};
use fw_testkit::wire_snapshot;
use fw_tracker::{AccountTracker, CoalescingInbox};

// When snapshots arrive faster than they are evaluated, the inbox keeps only
// the newest per account and the tracker never sees the superseded ones.
#[test]
fn scenario_burst_of_snapshots_collapses_to_the_newest() {
    fw_testkit::init_test_logging();

    let mut inbox = CoalescingInbox::new();
    assert!(!inbox.push(wire_snapshot("acct-a", "2024-01-02T12:00:00Z", "50000.00", "0.00")));
    assert!(inbox.push(wire_snapshot("acct-a", "2024-01-02T12:00:05Z", "49700.00", "-300.00")));
    assert!(inbox.push(wire_snapshot("acct-a", "2024-01-02T12:00:10Z", "49400.00", "-600.00")));
    assert!(!inbox.push(wire_snapshot("acct-b", "2024-01-02T12:00:10Z", "50100.00", "100.00")));
    assert_eq!(inbox.len(), 2);

    let registry = RuleSetRegistry::with_builtin_presets();
    let mut tracker =
        AccountTracker::new("acct-a", &registry, "topstep", "eval", Some("1.0")).unwrap();

    let snap = inbox.take("acct-a").unwrap();
    let eval = tracker.ingest(&snap, None).unwrap();

    // Only the 12:00:10 snapshot was evaluated; the ledger attributes no
    // intra-burst deltas because the intermediate snapshots never landed.
    assert_eq!(eval.state.equity, Micros::from_whole(49_400));
    let daily = eval.state.rules[&RuleKind::DailyLossLimit].as_result().unwrap();
    assert_eq!(daily.status, RuleStatus::Safe);
    assert_eq!(daily.current_value, Micros::ZERO);

    // acct-b is still queued.
    assert_eq!(inbox.len(), 1);
    assert!(inbox.take("acct-b").is_some());
    assert!(inbox.is_empty());
}
