//! fw-sim
//!
//! Deterministic scenario fixtures for exercising the rule evaluators without
//! live trading data. A scenario only manufactures input (warmup snapshots
//! plus the snapshot under evaluation); the real engine does all the judging.

use chrono::{DateTime, Utc};
use fw_rules::config::{
    ConsistencyConfig, DailyLossLimitConfig, MaxPositionSizeConfig, OverallMaxLossConfig,
    RiskBasis, RuleSetConfig, TrailingDrawdownConfig,
};
use fw_rules::snapshot::{AccountSnapshot, Position};
use fw_rules::{Evaluation, IngestError, LedgerState, Micros, Pct, RuleEngine};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// The closed set of scenario ids, versioned independently of rule sets.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioId {
    Normal,
    HighProfit,
    ApproachingDailyLoss,
    NearDrawdown,
    TrailingViolated,
}

impl ScenarioId {
    pub const ALL: [ScenarioId; 5] = [
        ScenarioId::Normal,
        ScenarioId::HighProfit,
        ScenarioId::ApproachingDailyLoss,
        ScenarioId::NearDrawdown,
        ScenarioId::TrailingViolated,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScenarioId::Normal => "normal",
            ScenarioId::HighProfit => "high_profit",
            ScenarioId::ApproachingDailyLoss => "approaching_daily_loss",
            ScenarioId::NearDrawdown => "near_drawdown",
            ScenarioId::TrailingViolated => "trailing_violated",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ScenarioId::Normal => "modest intraday loss, all rules safe",
            ScenarioId::HighProfit => "up 10% with an open winner, far from every limit",
            ScenarioId::ApproachingDailyLoss => "85% of the daily loss limit used",
            ScenarioId::NearDrawdown => "4.8% drawdown against a 5% trailing limit",
            ScenarioId::TrailingViolated => "equity below the trailing drawdown floor",
        }
    }
}

impl fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownScenario {
    pub raw: String,
}

impl fmt::Display for UnknownScenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown scenario {:?}; valid ids: ", self.raw)?;
        for (i, id) in ScenarioId::ALL.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(id.as_str())?;
        }
        Ok(())
    }
}

impl std::error::Error for UnknownScenario {}

impl FromStr for ScenarioId {
    type Err = UnknownScenario;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ScenarioId::ALL
            .iter()
            .find(|id| id.as_str() == s)
            .copied()
            .ok_or_else(|| UnknownScenario { raw: s.to_string() })
    }
}

/// Manufactured input for one scenario: warmup snapshots that seed the ledger
/// (high-water mark, daily buckets), then the snapshot to evaluate.
#[derive(Debug, Clone)]
pub struct ScenarioFixture {
    pub scenario: ScenarioId,
    pub warmup: Vec<AccountSnapshot>,
    pub snapshot: AccountSnapshot,
}

impl ScenarioFixture {
    /// Feed the fixture through a real engine, warmup first.
    pub fn run(&self, engine: &RuleEngine) -> Result<Evaluation, IngestError> {
        let mut ledger = LedgerState::new();
        let mut prev = None;
        for snap in &self.warmup {
            let eval = engine.evaluate(&mut ledger, snap, prev.as_ref())?;
            prev = Some(eval.state);
        }
        engine.evaluate(&mut ledger, &self.snapshot, prev.as_ref())
    }
}

/// The $50k evaluation rule set the scenarios are calibrated against.
pub fn reference_rule_set() -> RuleSetConfig {
    RuleSetConfig {
        firm: "simfirm".to_string(),
        account_type: "eval_50k".to_string(),
        version: "1.0".to_string(),
        effective_date: chrono::NaiveDate::default(),
        trailing_drawdown: Some(TrailingDrawdownConfig {
            enabled: true,
            max_drawdown_percent: Pct::from_whole(5),
            include_unrealized_pnl: true,
            reset_on_profit_target: false,
            profit_target_percent: None,
        }),
        daily_loss_limit: Some(DailyLossLimitConfig {
            enabled: true,
            max_loss: Micros::from_whole(1_000),
            reset_time: "17:00".to_string(),
            timezone: "America/Chicago".to_string(),
        }),
        overall_max_loss: Some(OverallMaxLossConfig {
            enabled: true,
            max_loss: Micros::from_whole(4_000),
            from_starting_balance: true,
        }),
        max_position_size: Some(MaxPositionSizeConfig {
            enabled: true,
            max_contracts: 10,
            max_risk_per_trade: None,
            risk_basis: RiskBasis::PeakExcursion,
        }),
        trading_hours: None,
        consistency: None,
    }
}

const STARTING_BALANCE: i64 = 50_000;

fn ts(s: &str) -> DateTime<Utc> {
    s.parse().unwrap_or_default()
}

fn snap(scenario: ScenarioId, at: &str, equity: Micros, realized: Micros) -> AccountSnapshot {
    AccountSnapshot {
        account_id: format!("sim-{scenario}"),
        ts_utc: ts(at),
        equity,
        balance: equity,
        realized_pnl: realized,
        unrealized_pnl: Micros::ZERO,
        starting_balance: Micros::from_whole(STARTING_BALANCE),
        positions: Vec::new(),
        daily_pnl_hint: BTreeMap::new(),
    }
}

fn es_position(at: &str, quantity: i64, unrealized: i64, peak_loss: i64) -> Position {
    Position {
        symbol: "ES 03-26".to_string(),
        quantity,
        avg_price: Micros::from_whole(4_000),
        current_price: if unrealized >= 0 {
            Micros::from_whole(4_001)
        } else {
            Micros::from_whole(3_999)
        },
        unrealized_pnl: Micros::from_whole(unrealized),
        opened_at: ts(at),
        peak_unrealized_loss: Micros::from_whole(peak_loss),
    }
}

// All scenarios use a Tuesday morning in Chicago (08:30/09:30 local), so the
// warmup and the evaluated snapshot share one trading day.
const WARMUP_TS: &str = "2024-01-02T14:30:00Z";
const EVAL_TS: &str = "2024-01-02T15:30:00Z";
const OPENED_TS: &str = "2024-01-02T14:35:00Z";

/// Build the fixture for a scenario id.
pub fn synthesize(scenario: ScenarioId) -> ScenarioFixture {
    let flat_start = snap(
        scenario,
        WARMUP_TS,
        Micros::from_whole(STARTING_BALANCE),
        Micros::ZERO,
    );
    match scenario {
        // Down $500 on the day: daily buffer 50%, trailing drawdown at 20%
        // of its allowance.
        ScenarioId::Normal => {
            let eval = snap(
                scenario,
                EVAL_TS,
                Micros::from_whole(49_500),
                Micros::from_whole(-500),
            );
            ScenarioFixture { scenario, warmup: vec![flat_start], snapshot: eval }
        }
        // Up 10% with an open winner riding.
        ScenarioId::HighProfit => {
            let mut eval = snap(
                scenario,
                EVAL_TS,
                Micros::from_whole(55_000),
                Micros::from_whole(4_500),
            );
            eval.balance = Micros::from_whole(54_500);
            eval.unrealized_pnl = Micros::from_whole(500);
            eval.positions = vec![es_position(OPENED_TS, 2, 500, 0)];
            ScenarioFixture { scenario, warmup: vec![flat_start], snapshot: eval }
        }
        // $850 of a $1,000 daily limit used: bufferPercent 15, critical.
        ScenarioId::ApproachingDailyLoss => {
            let eval = snap(
                scenario,
                EVAL_TS,
                Micros::from_whole(49_150),
                Micros::from_whole(-850),
            );
            ScenarioFixture { scenario, warmup: vec![flat_start], snapshot: eval }
        }
        // 4.8% down against a 5% limit, with an open loser.
        ScenarioId::NearDrawdown => {
            let mut eval = snap(
                scenario,
                EVAL_TS,
                Micros::from_whole(47_600),
                Micros::from_whole(-2_000),
            );
            eval.balance = Micros::from_whole(48_000);
            eval.unrealized_pnl = Micros::from_whole(-400);
            eval.positions = vec![es_position(OPENED_TS, 2, -400, -400)];
            ScenarioFixture { scenario, warmup: vec![flat_start], snapshot: eval }
        }
        // The warmup pushes the high-water mark to $52,000; the evaluated
        // snapshot sits $300 below the $49,400 floor.
        ScenarioId::TrailingViolated => {
            let peak = snap(
                scenario,
                WARMUP_TS,
                Micros::from_whole(52_000),
                Micros::from_whole(2_000),
            );
            let eval = snap(
                scenario,
                EVAL_TS,
                Micros::from_whole(49_100),
                Micros::from_whole(-900),
            );
            ScenarioFixture { scenario, warmup: vec![peak], snapshot: eval }
        }
    }
}
