//! Rule-set configuration shapes.
//!
//! A [`RuleSetConfig`] is resolved once per evaluation by the registry and is
//! read-only input from the engine's point of view. Every rule block is
//! optional and carries its own `enabled` flag, mirroring how firms publish
//! different rule mixes per account type.

use crate::calendar::SessionClock;
use crate::fixedpoint::{Micros, Pct};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrailingDrawdownConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Maximum drawdown from the high-water mark, e.g. 5 for 5%.
    pub max_drawdown_percent: Pct,
    /// true: measure against equity; false: against balance.
    #[serde(default = "default_true")]
    pub include_unrealized_pnl: bool,
    #[serde(default)]
    pub reset_on_profit_target: bool,
    #[serde(default)]
    pub profit_target_percent: Option<Pct>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyLossLimitConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub max_loss: Micros,
    /// "HH:MM" wall-clock reset in `timezone`.
    pub reset_time: String,
    /// IANA name, e.g. "America/Chicago".
    pub timezone: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverallMaxLossConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub max_loss: Micros,
    /// true: loss measured as starting balance minus equity;
    /// false: realized losses only.
    #[serde(default = "default_true")]
    pub from_starting_balance: bool,
}

/// Which input the per-trade risk check reads.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskBasis {
    /// Ledger-tracked peak adverse excursion per position lifecycle.
    PeakExcursion,
    /// The position's current unrealized loss.
    LiveUnrealized,
}

impl Default for RiskBasis {
    fn default() -> Self {
        RiskBasis::PeakExcursion
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaxPositionSizeConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub max_contracts: i64,
    #[serde(default)]
    pub max_risk_per_trade: Option<Micros>,
    #[serde(default)]
    pub risk_basis: RiskBasis,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayOfWeek {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

impl DayOfWeek {
    pub fn matches(&self, wd: chrono::Weekday) -> bool {
        use chrono::Weekday::*;
        matches!(
            (self, wd),
            (DayOfWeek::Mon, Mon)
                | (DayOfWeek::Tue, Tue)
                | (DayOfWeek::Wed, Wed)
                | (DayOfWeek::Thu, Thu)
                | (DayOfWeek::Fri, Fri)
                | (DayOfWeek::Sat, Sat)
                | (DayOfWeek::Sun, Sun)
        )
    }
}

/// One allowed trading window, local to the rule's timezone.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradingWindow {
    pub days: Vec<DayOfWeek>,
    /// "HH:MM" inclusive start.
    pub start: String,
    /// "HH:MM" exclusive end.
    pub end: String,
}

fn default_warning_margin() -> i64 {
    15
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradingHoursConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Empty = no window restriction; only `forced_close_time` applies.
    #[serde(default)]
    pub allowed_windows: Vec<TradingWindow>,
    pub timezone: String,
    /// "HH:MM" daily deadline by which positions must be flat.
    #[serde(default)]
    pub forced_close_time: Option<String>,
    /// Minutes of runway below which the status degrades to caution.
    #[serde(default = "default_warning_margin")]
    pub warning_margin_minutes: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsistencyConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Cap on the largest single day's profit as % of total profit.
    pub max_daily_profit_percent: Pct,
    /// Assessment is deferred until this many trading days of history exist.
    #[serde(default)]
    pub min_trades_per_day: Option<u32>,
}

/// Complete rule set for one (firm, account type, version).
///
/// Immutable once loaded; the registry hands out shared references and never
/// mutates a published version.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSetConfig {
    pub firm: String,
    pub account_type: String,
    pub version: String,
    pub effective_date: NaiveDate,
    #[serde(default)]
    pub trailing_drawdown: Option<TrailingDrawdownConfig>,
    #[serde(default)]
    pub daily_loss_limit: Option<DailyLossLimitConfig>,
    #[serde(default)]
    pub overall_max_loss: Option<OverallMaxLossConfig>,
    #[serde(default)]
    pub max_position_size: Option<MaxPositionSizeConfig>,
    #[serde(default)]
    pub trading_hours: Option<TradingHoursConfig>,
    #[serde(default)]
    pub consistency: Option<ConsistencyConfig>,
}

impl RuleSetConfig {
    /// The session clock that defines this rule set's trading-day boundaries.
    ///
    /// Taken from the daily-loss rule when present (that rule owns the reset
    /// semantics); otherwise UTC midnight. Falls back to UTC midnight when the
    /// configured timezone/time cannot be parsed — the daily-loss evaluator
    /// itself reports the broken config as unavailable.
    pub fn session_clock(&self) -> SessionClock {
        self.daily_loss_limit
            .as_ref()
            .and_then(|d| SessionClock::new(&d.timezone, &d.reset_time).ok())
            .unwrap_or_else(SessionClock::utc_midnight)
    }
}
