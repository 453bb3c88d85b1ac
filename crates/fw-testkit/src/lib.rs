//! fw-testkit
//!
//! Shared helpers for the scenario tests under `tests/`: wire snapshot
//! builders, a feed runner that pushes a sequence of snapshots through a
//! tracker, and test logging setup.

use fw_rules::Evaluation;
use fw_schemas::{AccountSnapshot, PositionSnapshot, WireTimestamp};
use fw_tracker::{AccountTracker, TrackerError};
use std::collections::BTreeMap;
use std::sync::Once;

static INIT_LOGGING: Once = Once::new();

/// Install a test subscriber once per process; controlled by `RUST_LOG`.
pub fn init_test_logging() {
    INIT_LOGGING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Flat $50k wire snapshot at the given RFC-3339 timestamp.
pub fn wire_snapshot(account_id: &str, ts: &str, equity: &str, realized: &str) -> AccountSnapshot {
    AccountSnapshot {
        account_id: account_id.to_string(),
        timestamp: WireTimestamp::Rfc3339(ts.to_string()),
        equity: equity.to_string(),
        balance: equity.to_string(),
        realized_pnl: realized.to_string(),
        unrealized_pnl: "0.00".to_string(),
        starting_balance: "50000.00".to_string(),
        positions: Vec::new(),
        daily_pnl_by_date: BTreeMap::new(),
    }
}

/// Attach one open position and fold its unrealized PnL into the snapshot.
pub fn with_position(
    mut snap: AccountSnapshot,
    symbol: &str,
    quantity: i64,
    unrealized: &str,
    opened_at: &str,
) -> AccountSnapshot {
    snap.unrealized_pnl = unrealized.to_string();
    snap.positions.push(PositionSnapshot {
        symbol: symbol.to_string(),
        quantity,
        avg_price: "4000.00".to_string(),
        current_price: "4000.00".to_string(),
        unrealized_pnl: unrealized.to_string(),
        opened_at: WireTimestamp::Rfc3339(opened_at.to_string()),
        peak_unrealized_loss: None,
    });
    snap
}

/// Push snapshots through a tracker in order, returning every evaluation.
/// Fails fast on the first rejection.
pub fn feed(
    tracker: &mut AccountTracker,
    snapshots: &[AccountSnapshot],
) -> Result<Vec<Evaluation>, TrackerError> {
    let mut out = Vec::with_capacity(snapshots.len());
    for snap in snapshots {
        out.push(tracker.ingest(snap, None)?);
    }
    Ok(out)
}
