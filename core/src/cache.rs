//! Keyed query cache with staleness and invalidation.
//!
//! # Design
//! `QueryCache` is an explicit context object: the shell creates exactly one,
//! passes it by `&mut` to the handlers that need it and clears it on
//! shutdown. It never performs I/O itself. Callers ask it whether a fetch is
//! due, allocate a `RequestId`, register the fetch with `begin_fetch`, and
//! feed the result back with `resolve`.
//!
//! At most one fetch per key is in flight. `begin_fetch` coalesces a second
//! request into the pending one. `restart_fetch` supersedes it instead, so a
//! refetch forced after a write never settles with a list read before the
//! write landed.

use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

use crate::dispatch::RequestId;
use crate::error::ApiError;

/// Identifies one cached query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey(String);

impl QueryKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The post collection.
    pub fn posts() -> Self {
        Self::new("posts")
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    /// How long data stays fresh after a successful fetch. Zero means stale
    /// immediately.
    pub stale_time: Duration,
    pub refetch_on_focus: bool,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            stale_time: Duration::ZERO,
            refetch_on_focus: true,
        }
    }
}

#[derive(Debug)]
struct QueryEntry<T> {
    options: QueryOptions,
    data: Option<T>,
    error: Option<ApiError>,
    updated_at: Option<Instant>,
    invalidated: bool,
    in_flight: Option<RequestId>,
    observers: usize,
}

impl<T> QueryEntry<T> {
    fn new(options: QueryOptions) -> Self {
        Self {
            options,
            data: None,
            error: None,
            updated_at: None,
            invalidated: false,
            in_flight: None,
            observers: 0,
        }
    }

    fn is_stale(&self) -> bool {
        match self.updated_at {
            None => true,
            Some(_) if self.invalidated => true,
            Some(at) => at.elapsed() >= self.options.stale_time,
        }
    }
}

/// Read-only view of one entry, used for rendering.
#[derive(Debug)]
pub struct QueryState<'a, T> {
    pub data: Option<&'a T>,
    pub error: Option<&'a ApiError>,
    /// A fetch is pending and there is no data to show yet.
    pub is_loading: bool,
    pub is_fetching: bool,
}

#[derive(Debug)]
pub struct QueryCache<T> {
    entries: HashMap<QueryKey, QueryEntry<T>>,
}

impl<T> Default for QueryCache<T> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<T> QueryCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer for `key`, creating the entry with `options` if
    /// needed. Returns `true` when the caller should fetch: the entry is
    /// stale and nothing is in flight.
    pub fn observe(&mut self, key: &QueryKey, options: QueryOptions) -> bool {
        let entry = self
            .entries
            .entry(key.clone())
            .or_insert_with(|| QueryEntry::new(options));
        entry.options = options;
        entry.observers += 1;
        entry.is_stale() && entry.in_flight.is_none()
    }

    pub fn unobserve(&mut self, key: &QueryKey) {
        if let Some(entry) = self.entries.get_mut(key) {
            entry.observers = entry.observers.saturating_sub(1);
        }
    }

    /// Record `id` as the in-flight fetch for `key`. Returns `false`, leaving
    /// the pending fetch in place, when one is already in flight.
    pub fn begin_fetch(&mut self, key: &QueryKey, id: RequestId) -> bool {
        let entry = self
            .entries
            .entry(key.clone())
            .or_insert_with(|| QueryEntry::new(QueryOptions::default()));
        if let Some(pending) = entry.in_flight {
            tracing::debug!(%key, %pending, "fetch already in flight, coalescing");
            return false;
        }
        tracing::debug!(%key, %id, "fetch started");
        entry.in_flight = Some(id);
        true
    }

    /// Record `id` as the in-flight fetch for `key`, superseding any fetch
    /// already pending. The superseded result is dropped by `resolve`.
    pub fn restart_fetch(&mut self, key: &QueryKey, id: RequestId) {
        let entry = self
            .entries
            .entry(key.clone())
            .or_insert_with(|| QueryEntry::new(QueryOptions::default()));
        if let Some(pending) = entry.in_flight.replace(id) {
            tracing::debug!(%key, %pending, %id, "fetch superseded");
        } else {
            tracing::debug!(%key, %id, "fetch started");
        }
    }

    pub fn is_fetching(&self, key: &QueryKey) -> bool {
        self.entries
            .get(key)
            .is_some_and(|entry| entry.in_flight.is_some())
    }

    /// Apply the result of fetch `id`. Results for anything but the current
    /// in-flight fetch are dropped. Returns whether the result was applied.
    ///
    /// A failure keeps the last known-good data next to the error.
    pub fn resolve(&mut self, key: &QueryKey, id: RequestId, result: Result<T, ApiError>) -> bool {
        let Some(entry) = self.entries.get_mut(key) else {
            return false;
        };
        if entry.in_flight != Some(id) {
            tracing::debug!(%key, %id, "dropping result of superseded fetch");
            return false;
        }
        entry.in_flight = None;
        match result {
            Ok(data) => {
                entry.data = Some(data);
                entry.error = None;
                entry.updated_at = Some(Instant::now());
                entry.invalidated = false;
            }
            Err(err) => entry.error = Some(err),
        }
        true
    }

    pub fn is_stale(&self, key: &QueryKey) -> bool {
        self.entries.get(key).is_none_or(QueryEntry::is_stale)
    }

    /// Whether regaining focus should refetch `key`.
    pub fn should_refetch_on_focus(&self, key: &QueryKey) -> bool {
        self.entries.get(key).is_some_and(|entry| {
            entry.options.refetch_on_focus
                && entry.observers > 0
                && entry.is_stale()
                && entry.in_flight.is_none()
        })
    }

    /// Mark `key` stale regardless of its age. Returns `true` when the key
    /// has observers, i.e. an active screen should refetch it now.
    pub fn invalidate(&mut self, key: &QueryKey) -> bool {
        let Some(entry) = self.entries.get_mut(key) else {
            return false;
        };
        entry.invalidated = true;
        tracing::debug!(%key, observers = entry.observers, "invalidated");
        entry.observers > 0
    }

    pub fn state(&self, key: &QueryKey) -> QueryState<'_, T> {
        match self.entries.get(key) {
            Some(entry) => QueryState {
                data: entry.data.as_ref(),
                error: entry.error.as_ref(),
                is_loading: entry.in_flight.is_some() && entry.data.is_none(),
                is_fetching: entry.in_flight.is_some(),
            },
            None => QueryState {
                data: None,
                error: None,
                is_loading: false,
                is_fetching: false,
            },
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry. In-flight results arriving afterwards are ignored.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
