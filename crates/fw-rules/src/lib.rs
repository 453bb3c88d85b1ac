//! fw-rules
//!
//! Prop-firm rule evaluation:
//! - Trailing drawdown against the high-water mark
//! - Daily loss limit with firm-timezone resets
//! - Overall max loss
//! - Position size caps and per-trade risk
//! - Trading hours windows and forced close
//! - Consistency (largest-day profit share)
//!
//! Deterministic, pure logic. No IO, no wall clock; the only mutable state is
//! the per-account ledger, updated exclusively by snapshot ingestion.

pub mod aggregate;
pub mod calendar;
pub mod classify;
pub mod config;
pub mod distance;
mod engine;
pub mod fixedpoint;
pub mod ledger;
pub mod rules;
pub mod snapshot;
mod types;

pub use engine::{Evaluation, RuleEngine};
pub use fixedpoint::{Micros, ParseFixedError, Pct};
pub use ledger::{IngestError, LedgerState, PositionToken};
pub use types::*;
