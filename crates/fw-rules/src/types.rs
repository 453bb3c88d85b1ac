//! Result vocabulary shared by every evaluator and the aggregator.

use crate::fixedpoint::{Micros, Pct};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The closed set of rule kinds. The rule set is fixed and exhaustively known
/// at compile time; the aggregator dispatches over this enum, never over
/// open-ended trait objects.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    TrailingDrawdown,
    DailyLossLimit,
    OverallMaxLoss,
    MaxPositionSize,
    TradingHours,
    Consistency,
}

impl RuleKind {
    pub const ALL: [RuleKind; 6] = [
        RuleKind::TrailingDrawdown,
        RuleKind::DailyLossLimit,
        RuleKind::OverallMaxLoss,
        RuleKind::MaxPositionSize,
        RuleKind::TradingHours,
        RuleKind::Consistency,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RuleKind::TrailingDrawdown => "trailing_drawdown",
            RuleKind::DailyLossLimit => "daily_loss_limit",
            RuleKind::OverallMaxLoss => "overall_max_loss",
            RuleKind::MaxPositionSize => "max_position_size",
            RuleKind::TradingHours => "trading_hours",
            RuleKind::Consistency => "consistency",
        }
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-rule status. Declaration order is severity order; the derived `Ord`
/// gives the aggregator its worst-of fold (`safe < caution < critical <
/// violated`).
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleStatus {
    Safe,
    Caution,
    Critical,
    Violated,
}

impl RuleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleStatus::Safe => "safe",
            RuleStatus::Caution => "caution",
            RuleStatus::Critical => "critical",
            RuleStatus::Violated => "violated",
        }
    }
}

impl fmt::Display for RuleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether the account can return to compliance without firm intervention.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recoverability {
    Recoverable,
    /// Recoverable, but not until some boundary passes (e.g. the next daily
    /// reset). The recovery path states the boundary.
    Conditional,
    NonRecoverable,
}

/// Severity tier attached to a rule result.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    None,
    Low,
    Medium,
    High,
    Critical,
}

/// Distance to violation in the rule's native unit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceToViolation {
    Dollars(Micros),
    Contracts(i64),
    /// Percentage points of headroom (consistency rule).
    Percent(Pct),
    TimeRemaining { seconds: i64 },
}

/// One evaluated rule.
///
/// `remaining_buffer` is signed: negative means the rule is already violated.
/// `buffer_percent` is always clamped to [0, 100]. Scalar fields are in the
/// rule's native unit at 1e-6 scale (dollars for loss rules, contracts for
/// position size, seconds for trading hours, percentage points for
/// consistency); `distance` names the unit explicitly.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleResult {
    pub rule: RuleKind,
    pub current_value: Micros,
    pub threshold: Micros,
    pub remaining_buffer: Micros,
    pub buffer_percent: Pct,
    pub status: RuleStatus,
    pub distance: DistanceToViolation,
    /// Ordered most severe first.
    pub warnings: Vec<String>,
    pub recoverable: Recoverability,
    pub severity: Severity,
    pub recovery_path: Option<String>,
}

/// Outcome slot for one rule in the risk state.
///
/// A failed evaluator is surfaced as `Unavailable` — never as a fabricated
/// safe reading — and never aborts evaluation of the other rules.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleOutcome {
    Evaluated(RuleResult),
    Unavailable { reason: String },
}

impl RuleOutcome {
    pub fn status(&self) -> Option<RuleStatus> {
        match self {
            RuleOutcome::Evaluated(r) => Some(r.status),
            RuleOutcome::Unavailable { .. } => None,
        }
    }

    pub fn as_result(&self) -> Option<&RuleResult> {
        match self {
            RuleOutcome::Evaluated(r) => Some(r),
            RuleOutcome::Unavailable { .. } => None,
        }
    }
}

/// Safe headroom summary across rules: how much more the account can lose or
/// hold right now without tripping anything.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaxAllowedRisk {
    /// Minimum of the loss-rule buffers (trailing, daily, overall).
    pub max_loss: Option<Micros>,
    /// Contracts headroom from the position-size rule (0 when violated).
    pub max_contracts: Option<i64>,
}

/// The engine's output for one snapshot. The presentation layer renders these
/// values verbatim; it never recomputes status, buffer, or classification.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRiskState {
    pub account_id: String,
    pub ts_utc: DateTime<Utc>,
    pub equity: Micros,
    pub balance: Micros,
    pub rules: BTreeMap<RuleKind, RuleOutcome>,
    /// Worst status among enabled, evaluated rules.
    pub overall: RuleStatus,
    pub max_allowed: MaxAllowedRisk,
}

/// Alert severity, mapped from the rule status that triggered the transition.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Info,
    Warning,
    Critical,
    Violated,
}

/// Emitted only on a status transition for a given (account, rule).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub account_id: String,
    pub rule: RuleKind,
    pub previous: Option<RuleStatus>,
    pub status: Option<RuleStatus>,
    pub severity: AlertSeverity,
    pub message: String,
    pub ts_utc: DateTime<Utc>,
}
