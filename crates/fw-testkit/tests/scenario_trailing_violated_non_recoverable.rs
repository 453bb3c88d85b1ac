use fw_rules::{Micros, Recoverability, RuleEngine, RuleKind, RuleStatus};
use fw_sim::{reference_rule_set, synthesize, ScenarioId};

// $50k account, 5% trailing drawdown, high-water mark pushed to $52,000:
// the floor sits at $49,400 and any equity below it is a terminal breach.
#[test]
fn scenario_trailing_violated_is_terminal() {
    fw_testkit::init_test_logging();

    let engine = RuleEngine::new(reference_rule_set());
    let eval = synthesize(ScenarioId::TrailingViolated).run(&engine).unwrap();

    let trailing = eval.state.rules[&RuleKind::TrailingDrawdown].as_result().unwrap();
    assert_eq!(trailing.status, RuleStatus::Violated);
    assert_eq!(trailing.recoverable, Recoverability::NonRecoverable);
    assert_eq!(trailing.threshold, Micros::from_whole(2_600));
    assert!(trailing.remaining_buffer.is_negative());

    assert_eq!(eval.state.overall, RuleStatus::Violated);
    // No loss headroom remains once a loss rule is breached.
    assert_eq!(eval.state.max_allowed.max_loss, Some(Micros::ZERO));
}

#[test]
fn scenario_equity_exactly_at_the_floor_is_critical_not_violated() {
    let engine = RuleEngine::new(reference_rule_set());
    let fixture = synthesize(ScenarioId::TrailingViolated);

    let mut ledger = fw_rules::LedgerState::new();
    let first = engine.evaluate(&mut ledger, &fixture.warmup[0], None).unwrap();

    let mut at_floor = fixture.snapshot.clone();
    at_floor.equity = Micros::from_whole(49_400);
    at_floor.balance = at_floor.equity;
    let eval = engine.evaluate(&mut ledger, &at_floor, Some(&first.state)).unwrap();

    let trailing = eval.state.rules[&RuleKind::TrailingDrawdown].as_result().unwrap();
    assert_eq!(trailing.remaining_buffer, Micros::ZERO);
    assert_eq!(trailing.status, RuleStatus::Critical);
}
