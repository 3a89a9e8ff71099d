//! Per-identity retry accounting

use std::collections::HashMap;

use reauth_domain::RequestId;

/// Remaining retries per request identity.
///
/// Counters are unsigned and `decrement` saturates, so a counter can never go
/// negative. An identity without an entry has no budget; the dispatcher
/// creates a fresh entry on the next `execute`.
#[derive(Debug, Default)]
pub struct RetryLedger {
    entries: HashMap<RequestId, u32>,
}

impl RetryLedger {
    /// Empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an entry with `budget` retries unless one already exists.
    ///
    /// Returns `true` when a new entry was created. An existing counter is
    /// left untouched so re-dispatch never resets an in-progress count.
    pub fn ensure(&mut self, id: &RequestId, budget: u32) -> bool {
        if self.entries.contains_key(id) {
            return false;
        }
        self.entries.insert(id.clone(), budget);
        true
    }

    /// Spend one retry. No-op for absent entries and for exhausted ones.
    pub fn decrement(&mut self, id: &RequestId) {
        if let Some(remaining) = self.entries.get_mut(id) {
            *remaining = remaining.saturating_sub(1);
        }
    }

    /// Drop the entry. Returns the counter it held, if any.
    pub fn remove(&mut self, id: &RequestId) -> Option<u32> {
        self.entries.remove(id)
    }

    /// Retries left; `0` when absent.
    pub fn remaining(&self, id: &RequestId) -> u32 {
        self.entries.get(id).copied().unwrap_or(0)
    }

    /// `true` while `id` has an entry, exhausted or not.
    pub fn contains(&self, id: &RequestId) -> bool {
        self.entries.contains_key(id)
    }

    /// Same as `remaining`, but distinguishes "absent" from "exhausted".
    pub fn get(&self, id: &RequestId) -> Option<u32> {
        self.entries.get(id).copied()
    }

    /// Number of tracked identities.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` when no identity is tracked.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use reauth_domain::{HttpMethod, RequestDescriptor};

    use super::*;

    fn id(path: &str) -> RequestId {
        RequestDescriptor::builder(HttpMethod::Get, format!("https://api.test{path}"))
            .build()
            .unwrap()
            .id()
            .clone()
    }

    #[test]
    fn ensure_creates_once_and_preserves_count() {
        let mut ledger = RetryLedger::new();
        let a = id("/a");

        assert!(ledger.ensure(&a, 3));
        ledger.decrement(&a);
        assert!(!ledger.ensure(&a, 3));
        assert_eq!(ledger.remaining(&a), 2);
    }

    #[test]
    fn decrement_saturates_at_zero() {
        let mut ledger = RetryLedger::new();
        let a = id("/a");
        ledger.ensure(&a, 1);

        ledger.decrement(&a);
        ledger.decrement(&a);
        ledger.decrement(&a);

        assert_eq!(ledger.remaining(&a), 0);
        assert_eq!(ledger.get(&a), Some(0));
        assert!(ledger.contains(&a));
    }

    #[test]
    fn absent_entries_report_zero() {
        let mut ledger = RetryLedger::new();
        let a = id("/a");

        ledger.decrement(&a);
        assert_eq!(ledger.remaining(&a), 0);
        assert_eq!(ledger.get(&a), None);
        assert!(ledger.is_empty());
    }

    #[test]
    fn remove_forgets_identity() {
        let mut ledger = RetryLedger::new();
        let a = id("/a");
        let b = id("/b");
        ledger.ensure(&a, 3);
        ledger.ensure(&b, 3);

        assert_eq!(ledger.remove(&a), Some(3));
        assert_eq!(ledger.remove(&a), None);
        assert_eq!(ledger.len(), 1);

        // A later dispatch starts over with the full budget.
        assert!(ledger.ensure(&a, 3));
        assert_eq!(ledger.remaining(&a), 3);
    }
}
