//! fw-tracker
//!
//! The ingestion-side shell around the pure rule engine: wire snapshot
//! validation, per-account tracking (ledger + previous state), snapshot
//! coalescing, and the audit hookup. Each account is owned by exactly one
//! tracker; different accounts share nothing and may run in parallel.

mod error;
mod inbox;
mod parse;
mod tracker;

pub use error::TrackerError;
pub use inbox::CoalescingInbox;
pub use parse::parse_snapshot;
pub use tracker::AccountTracker;
