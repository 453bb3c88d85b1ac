//! fw-schemas
//!
//! Wire contracts for the ingestion boundary.
//!
//! Every upstream collector (platform add-on, mock feed, replay) converts its
//! telemetry into [`AccountSnapshot`] before it reaches the engine. Monetary
//! values travel as decimal strings so upstream precision is preserved exactly
//! until the tracker parses them into fixed-point micros; timestamps travel as
//! RFC-3339 strings or epoch milliseconds.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Snapshot timestamp as it appears on the wire: either epoch milliseconds or
/// an RFC-3339 string. Collectors pick whichever their platform emits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireTimestamp {
    EpochMillis(i64),
    Rfc3339(String),
}

impl WireTimestamp {
    /// Resolve to UTC. Returns `None` for unparsable strings or millis
    /// outside the representable range.
    pub fn to_utc(&self) -> Option<DateTime<Utc>> {
        match self {
            WireTimestamp::EpochMillis(ms) => Utc.timestamp_millis_opt(*ms).single(),
            WireTimestamp::Rfc3339(s) => DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
        }
    }
}

/// One open position as reported by the platform collector.
///
/// Quantity sign convention: positive = long, negative = short.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionSnapshot {
    pub symbol: String,
    pub quantity: i64,
    pub avg_price: String,
    pub current_price: String,
    pub unrealized_pnl: String,
    pub opened_at: WireTimestamp,
    /// Worst unrealized loss the collector has observed for this position
    /// (MAE hint; the ledger tracks its own authoritative value).
    #[serde(default)]
    pub peak_unrealized_loss: Option<String>,
}

/// One account snapshot per ingestion call.
///
/// The `daily_pnl_by_date` map is a best-effort hint from the collector
/// (keys are `YYYY-MM-DD` firm-timezone dates). The engine's own ledger is
/// authoritative; the hint is only used to backfill dates the ledger has
/// never seen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub account_id: String,
    pub timestamp: WireTimestamp,
    pub equity: String,
    pub balance: String,
    pub realized_pnl: String,
    pub unrealized_pnl: String,
    pub starting_balance: String,
    #[serde(default)]
    pub positions: Vec<PositionSnapshot>,
    #[serde(default)]
    pub daily_pnl_by_date: BTreeMap<String, String>,
}
