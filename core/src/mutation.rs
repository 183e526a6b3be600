//! Mutation wrapper with a per-key in-flight guard.
//!
//! One `Mutation` tracks one kind of write (create, update or delete). It
//! records the status of the most recent settlement and refuses to start a
//! second request for a key that is still in flight, so a double-tapped
//! button produces one request instead of two racing completions.

use std::collections::HashSet;
use std::hash::Hash;

use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationStatus {
    Idle,
    Pending,
    Success,
    Error,
}

#[derive(Debug)]
pub struct Mutation<K> {
    in_flight: HashSet<K>,
    status: MutationStatus,
    error: Option<ApiError>,
}

impl<K> Default for Mutation<K> {
    fn default() -> Self {
        Self {
            in_flight: HashSet::new(),
            status: MutationStatus::Idle,
            error: None,
        }
    }
}

impl<K: Eq + Hash> Mutation<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a request for `key`. Returns `false` when one is already pending.
    pub fn begin(&mut self, key: K) -> bool {
        if !self.in_flight.insert(key) {
            return false;
        }
        self.status = MutationStatus::Pending;
        true
    }

    pub fn is_pending(&self, key: &K) -> bool {
        self.in_flight.contains(key)
    }

    pub fn succeed(&mut self, key: &K) {
        self.in_flight.remove(key);
        self.status = self.settled(MutationStatus::Success);
        self.error = None;
    }

    pub fn fail(&mut self, key: &K, error: ApiError) {
        self.in_flight.remove(key);
        self.status = self.settled(MutationStatus::Error);
        self.error = Some(error);
    }

    pub fn status(&self) -> MutationStatus {
        self.status
    }

    pub fn error(&self) -> Option<&ApiError> {
        self.error.as_ref()
    }

    fn settled(&self, status: MutationStatus) -> MutationStatus {
        if self.in_flight.is_empty() {
            status
        } else {
            MutationStatus::Pending
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_key_is_refused_while_pending() {
        let mut m: Mutation<u64> = Mutation::new();
        assert!(m.begin(1));
        assert!(!m.begin(1));
        assert!(m.begin(2));
        assert_eq!(m.status(), MutationStatus::Pending);
    }

    #[test]
    fn key_can_be_reused_after_settling() {
        let mut m: Mutation<()> = Mutation::new();
        assert!(m.begin(()));
        m.succeed(&());
        assert_eq!(m.status(), MutationStatus::Success);
        assert!(m.begin(()));
    }

    #[test]
    fn status_stays_pending_until_every_key_settles() {
        let mut m: Mutation<u64> = Mutation::new();
        m.begin(1);
        m.begin(2);
        m.fail(&1, ApiError::NotFound);
        assert_eq!(m.status(), MutationStatus::Pending);
        assert_eq!(m.error(), Some(&ApiError::NotFound));
        m.succeed(&2);
        assert_eq!(m.status(), MutationStatus::Success);
        assert!(m.error().is_none());
    }
}
