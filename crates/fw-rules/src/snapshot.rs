//! Engine-side account snapshot.
//!
//! This is the parsed, fixed-point form of the wire contract: the tracker
//! validates the wire shape, converts decimal strings to [`Micros`], and
//! hands the engine one of these. Evaluators only ever see this type.

use crate::fixedpoint::Micros;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One open position. Quantity sign: positive = long, negative = short.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub quantity: i64,
    pub avg_price: Micros,
    pub current_price: Micros,
    pub unrealized_pnl: Micros,
    pub opened_at: DateTime<Utc>,
    /// Collector-side MAE hint (≤ 0); the ledger's per-lifecycle tracking is
    /// authoritative.
    pub peak_unrealized_loss: Micros,
}

/// One validated account snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub account_id: String,
    pub ts_utc: DateTime<Utc>,
    pub equity: Micros,
    pub balance: Micros,
    pub realized_pnl: Micros,
    pub unrealized_pnl: Micros,
    pub starting_balance: Micros,
    pub positions: Vec<Position>,
    /// Best-effort daily-PnL hint keyed by firm-timezone trading date. Only
    /// consulted for dates the ledger has never seen.
    #[serde(default)]
    pub daily_pnl_hint: BTreeMap<NaiveDate, Micros>,
}

impl AccountSnapshot {
    /// Gross open size: Σ|quantity| across positions, in contracts.
    pub fn total_contracts(&self) -> i64 {
        self.positions.iter().map(|p| p.quantity.abs()).sum()
    }

    pub fn has_open_positions(&self) -> bool {
        !self.positions.is_empty()
    }
}
