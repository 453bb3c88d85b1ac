use chrono::NaiveDate;
use fw_rules::config::{RuleSetConfig, TrailingDrawdownConfig};
use fw_rules::{LedgerState, Micros, Pct, RuleEngine, RuleKind, RuleStatus};

fn rule_set_with_reset() -> RuleSetConfig {
    RuleSetConfig {
        firm: "simfirm".to_string(),
        account_type: "funded".to_string(),
        version: "1.0".to_string(),
        effective_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        trailing_drawdown: Some(TrailingDrawdownConfig {
            enabled: true,
            max_drawdown_percent: Pct::from_whole(5),
            include_unrealized_pnl: true,
            reset_on_profit_target: true,
            profit_target_percent: Some(Pct::from_whole(6)),
        }),
        daily_loss_limit: None,
        overall_max_loss: None,
        max_position_size: None,
        trading_hours: None,
        consistency: None,
    }
}

fn snap(ts: &str, equity: i64) -> fw_rules::snapshot::AccountSnapshot {
    fw_rules::snapshot::AccountSnapshot {
        account_id: "acct-reset".to_string(),
        ts_utc: ts.parse().unwrap(),
        equity: Micros::from_whole(equity),
        balance: Micros::from_whole(equity),
        realized_pnl: Micros::ZERO,
        unrealized_pnl: Micros::ZERO,
        starting_balance: Micros::from_whole(50_000),
        positions: Vec::new(),
        daily_pnl_hint: Default::default(),
    }
}

// Hitting the 6% profit target ($53,000 on a $50k account) re-bases the
// high-water mark at the next snapshot instead of trailing the peak.
#[test]
fn scenario_profit_target_rebases_the_drawdown_floor() {
    fw_testkit::init_test_logging();

    let engine = RuleEngine::new(rule_set_with_reset());
    let mut ledger = LedgerState::new();

    let first = engine
        .evaluate(&mut ledger, &snap("2024-01-02T10:00:00Z", 50_000), None)
        .unwrap();
    assert!(!first.high_water_mark_reset);

    // Target reached: the reset is staged for the next ingest.
    let second = engine
        .evaluate(&mut ledger, &snap("2024-01-02T11:00:00Z", 53_100), Some(&first.state))
        .unwrap();
    assert!(second.high_water_mark_reset);
    assert_eq!(ledger.high_water_mark(), Some(Micros::from_whole(53_100)));

    // Without the reset this equity would sit $55 from the old floor of
    // $50,445; re-based, the mark follows the account down and the rule is
    // fully safe again.
    let third = engine
        .evaluate(&mut ledger, &snap("2024-01-02T12:00:00Z", 50_500), Some(&second.state))
        .unwrap();
    assert_eq!(ledger.high_water_mark(), Some(Micros::from_whole(50_500)));

    let trailing = third.state.rules[&RuleKind::TrailingDrawdown].as_result().unwrap();
    assert_eq!(trailing.status, RuleStatus::Safe);
    assert_eq!(trailing.buffer_percent, Pct::HUNDRED);
    assert_eq!(trailing.current_value, Micros::ZERO);
}

// Below the target nothing is staged and the mark ratchets as usual.
#[test]
fn scenario_below_target_the_mark_only_ratchets() {
    let engine = RuleEngine::new(rule_set_with_reset());
    let mut ledger = LedgerState::new();

    let first = engine
        .evaluate(&mut ledger, &snap("2024-01-02T10:00:00Z", 52_999), None)
        .unwrap();
    assert!(!first.high_water_mark_reset);

    engine
        .evaluate(&mut ledger, &snap("2024-01-02T11:00:00Z", 51_000), Some(&first.state))
        .unwrap();
    assert_eq!(ledger.high_water_mark(), Some(Micros::from_whole(52_999)));
}
