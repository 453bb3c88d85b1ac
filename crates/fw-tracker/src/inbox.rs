//! Per-account snapshot coalescing.
//!
//! If snapshots arrive faster than an account can be evaluated, only the
//! latest pending one matters: risk state is a function of the most recent
//! snapshot plus the ledger, and the ledger only accepts strictly increasing
//! timestamps anyway. Superseded snapshots are dropped, never ledger
//! mutations.

use std::collections::BTreeMap;

#[derive(Default)]
pub struct CoalescingInbox {
    pending: BTreeMap<String, fw_schemas::AccountSnapshot>,
}

impl CoalescingInbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a snapshot, replacing any pending one for the same account.
    /// Returns true when an older pending snapshot was superseded.
    pub fn push(&mut self, snapshot: fw_schemas::AccountSnapshot) -> bool {
        self.pending
            .insert(snapshot.account_id.clone(), snapshot)
            .is_some()
    }

    /// Take the pending snapshot for one account.
    pub fn take(&mut self, account_id: &str) -> Option<fw_schemas::AccountSnapshot> {
        self.pending.remove(account_id)
    }

    /// Drain everything, one snapshot per account.
    pub fn drain(&mut self) -> Vec<fw_schemas::AccountSnapshot> {
        std::mem::take(&mut self.pending).into_values().collect()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
