//! Per-account derived state.
//!
//! Everything the evaluators need that a single snapshot cannot provide lives
//! here: the high-water mark, realized PnL bucketed by trading date, and one
//! lifecycle record per open position. The ledger is fed snapshots in strict
//! timestamp order and is the only mutable state in the crate.

use crate::calendar::SessionClock;
use crate::fixedpoint::Micros;
use crate::snapshot::AccountSnapshot;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::BTreeMap;
use std::fmt;

/// Rejected snapshot. The caller decides whether to drop or surface it; the
/// ledger is left untouched either way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestError {
    /// Timestamp not strictly after the last accepted snapshot.
    OutOfOrder {
        last: DateTime<Utc>,
        got: DateTime<Utc>,
    },
}

impl fmt::Display for IngestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfOrder { last, got } => {
                write!(f, "snapshot at {got} is not after last accepted {last}")
            }
        }
    }
}

impl std::error::Error for IngestError {}

/// Opaque handle for one position lifecycle. Tokens are unique per ledger and
/// never reused, so a close-and-reopen of the same symbol at the same size is
/// a new lifecycle with a fresh excursion history.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PositionToken(u64);

/// What the ledger remembers about one open position.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PositionLifecycle {
    pub symbol: String,
    pub opened_at: DateTime<Utc>,
    /// Worst unrealized PnL observed over the lifecycle (≤ 0).
    pub peak_adverse_excursion: Micros,
}

#[derive(Clone, Debug, Default)]
pub struct LedgerState {
    high_water_mark: Option<Micros>,
    last_ts: Option<DateTime<Utc>>,
    last_realized: Option<Micros>,
    /// Realized PnL attributed to each trading date seen so far.
    daily_realized: BTreeMap<NaiveDate, Micros>,
    open: BTreeMap<PositionToken, PositionLifecycle>,
    next_token: u64,
    hwm_reset_staged: bool,
}

impl LedgerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the high-water mark when resuming an account with known history.
    /// Ingestion still ratchets it upward from here.
    pub fn seed_high_water_mark(&mut self, hwm: Micros) {
        self.high_water_mark = Some(hwm);
    }

    /// Arm a trailing-drawdown floor reset. Applied at the next ingest: the
    /// high-water mark is re-based to that snapshot's equity.
    pub fn stage_high_water_mark_reset(&mut self) {
        self.hwm_reset_staged = true;
    }

    pub fn high_water_mark(&self) -> Option<Micros> {
        self.high_water_mark
    }

    pub fn last_ts(&self) -> Option<DateTime<Utc>> {
        self.last_ts
    }

    /// Realized PnL attributed to `date`, if that trading date has been seen.
    pub fn daily_realized(&self, date: NaiveDate) -> Option<Micros> {
        self.daily_realized.get(&date).copied()
    }

    pub fn daily_realized_history(&self) -> &BTreeMap<NaiveDate, Micros> {
        &self.daily_realized
    }

    pub fn trading_days_seen(&self) -> usize {
        self.daily_realized.len()
    }

    /// The lifecycle for a position identified by its wire identity.
    pub fn token_for(&self, symbol: &str, opened_at: DateTime<Utc>) -> Option<PositionToken> {
        self.open
            .iter()
            .find(|(_, lc)| lc.symbol == symbol && lc.opened_at == opened_at)
            .map(|(tok, _)| *tok)
    }

    pub fn lifecycle(&self, token: PositionToken) -> Option<&PositionLifecycle> {
        self.open.get(&token)
    }

    pub fn open_lifecycles(&self) -> impl Iterator<Item = (PositionToken, &PositionLifecycle)> {
        self.open.iter().map(|(t, lc)| (*t, lc))
    }

    /// Fold one snapshot into the ledger. Rejects anything not strictly after
    /// the last accepted timestamp; on rejection the ledger is unchanged.
    pub fn ingest(
        &mut self,
        snap: &AccountSnapshot,
        clock: &SessionClock,
    ) -> Result<(), IngestError> {
        if let Some(last) = self.last_ts {
            if snap.ts_utc <= last {
                return Err(IngestError::OutOfOrder { last, got: snap.ts_utc });
            }
        }

        // Staged floor reset re-bases before the monotone ratchet so the new
        // mark is exactly this snapshot's equity.
        if self.hwm_reset_staged {
            self.high_water_mark = Some(snap.equity);
            self.hwm_reset_staged = false;
        }
        let hwm = self.high_water_mark.get_or_insert(snap.starting_balance);
        if snap.equity > *hwm {
            *hwm = snap.equity;
        }

        // Collector hints only fill dates the ledger has never observed.
        for (date, pnl) in &snap.daily_pnl_hint {
            self.daily_realized.entry(*date).or_insert(*pnl);
        }

        let today = clock.trading_date(snap.ts_utc);
        match self.last_realized {
            Some(prev) => {
                let delta = snap.realized_pnl.saturating_sub(prev);
                let bucket = self.daily_realized.entry(today).or_insert(Micros::ZERO);
                *bucket = bucket.saturating_add(delta);
            }
            // First snapshot: cumulative realized PnL cannot be attributed to
            // a date, so today starts at zero unless a hint filled it.
            None => {
                self.daily_realized.entry(today).or_insert(Micros::ZERO);
            }
        }
        self.last_realized = Some(snap.realized_pnl);

        self.sync_positions(snap);
        self.last_ts = Some(snap.ts_utc);
        Ok(())
    }

    fn sync_positions(&mut self, snap: &AccountSnapshot) {
        // Lifecycles absent from the snapshot are closed and forgotten.
        self.open.retain(|_, lc| {
            snap.positions
                .iter()
                .any(|p| p.symbol == lc.symbol && p.opened_at == lc.opened_at)
        });

        for pos in &snap.positions {
            let worst_now = if pos.unrealized_pnl < pos.peak_unrealized_loss {
                pos.unrealized_pnl
            } else {
                pos.peak_unrealized_loss
            };
            let existing = self.token_for(&pos.symbol, pos.opened_at);
            match existing.and_then(|tok| self.open.get_mut(&tok)) {
                Some(lc) => {
                    if worst_now < lc.peak_adverse_excursion {
                        lc.peak_adverse_excursion = worst_now;
                    }
                }
                None => {
                    let tok = PositionToken(self.next_token);
                    self.next_token += 1;
                    self.open.insert(
                        tok,
                        PositionLifecycle {
                            symbol: pos.symbol.clone(),
                            opened_at: pos.opened_at,
                            peak_adverse_excursion: worst_now.min(Micros::ZERO),
                        },
                    );
                }
            }
        }
    }
}
