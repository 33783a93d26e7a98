//! Read-mostly cache of the `states` reference table.
//!
//! Lookups load an `Arc<StateSnapshot>` with one atomic read; a refresh swaps a
//! new snapshot in and readers see either the old or the new one, never a mix.
//!
//! - Starts empty; the first lookup triggers a load.
//! - A snapshot older than the TTL is reloaded on the next lookup.
//! - A miss on a fresh snapshot reloads once (a state may have been added).
//! - [`StateCache::invalidate`] forces the next lookup to reload.
//!
//! Each [`crate::resolver::CityResolver`] owns its cache.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use arc_swap::ArcSwapOption;
use tracing::debug;

use crate::{error::StoreResult, models::StateRow, store::ProfileStore};

/// Immutable view of the states table at one point in time.
#[derive(Debug, Clone)]
pub struct StateSnapshot {
    /// Rows as loaded.
    pub states: Vec<StateRow>,
    /// When the rows were loaded.
    pub loaded_at: Instant,
}

impl StateSnapshot {
    /// Find a state whose code or full name equals `token`, ignoring case.
    pub fn find(&self, token: &str) -> Option<&StateRow> {
        let token = token.trim().to_lowercase();
        if token.is_empty() {
            return None;
        }
        self.states
            .iter()
            .find(|s| s.code.to_lowercase() == token || s.name.to_lowercase() == token)
    }
}

/// TTL cache in front of [`ProfileStore::list_states`].
#[derive(Debug)]
pub struct StateCache {
    ttl: Duration,
    snapshot: ArcSwapOption<StateSnapshot>,
}

impl StateCache {
    /// Empty cache whose snapshots live for `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            snapshot: ArcSwapOption::empty(),
        }
    }

    /// Current snapshot, if any (may be stale).
    pub fn snapshot(&self) -> Option<Arc<StateSnapshot>> {
        self.snapshot.load_full()
    }

    /// Drop the snapshot so the next lookup reloads.
    pub fn invalidate(&self) {
        self.snapshot.store(None);
    }

    /// Reload from the store and swap the result in.
    pub async fn refresh(&self, store: &dyn ProfileStore) -> StoreResult<Arc<StateSnapshot>> {
        let states = store.list_states().await?;
        debug!(count = states.len(), "state cache refreshed");
        let snap = Arc::new(StateSnapshot {
            states,
            loaded_at: Instant::now(),
        });
        self.snapshot.store(Some(Arc::clone(&snap)));
        Ok(snap)
    }

    /// Resolve a state code or name, reloading at most once.
    pub async fn lookup(&self, store: &dyn ProfileStore, token: &str) -> StoreResult<Option<StateRow>> {
        let (snap, fresh) = match self.snapshot.load_full() {
            Some(s) if s.loaded_at.elapsed() < self.ttl => (s, false),
            _ => (self.refresh(store).await?, true),
        };
        if let Some(hit) = snap.find(token) {
            return Ok(Some(hit.clone()));
        }
        if fresh {
            return Ok(None);
        }
        Ok(self.refresh(store).await?.find(token).cloned())
    }
}
