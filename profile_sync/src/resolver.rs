//! Free-text city → city id, creating the city row when needed.
//!
//! Input is what the UI stores in the aggregate's `cities` list:
//! `"City - ST"`, `"City, State name"`, or a bare `"City"`.
//!
//! Resolution order:
//! 1. partial, case-insensitive name match (restricted to the state when one is
//!    given; the shortest name wins so an exact match beats a superset)
//! 2. resolve the state by code or full name through the [`StateCache`]
//! 3. create the city under that state
//!
//! Nothing here fails outward. Every store error or unresolvable input ends
//! as `None` plus a log line; states are never created.

use std::{sync::Arc, time::Duration};

use tracing::{debug, info, warn};

use crate::{
    error::{StoreError, StoreResult},
    reference::StateCache,
    store::ProfileStore,
};

/// Split `"City - ST"` / `"City, ST"` into trimmed `(city, state_token)`.
///
/// `" - "` is tried before `", "`; without either delimiter the token is empty.
pub fn split_city_input(raw: &str) -> (&str, &str) {
    let (city, token) = raw
        .split_once(" - ")
        .or_else(|| raw.split_once(", "))
        .unwrap_or((raw, ""));
    (city.trim(), token.trim())
}

/// Entity resolver for service cities.
pub struct CityResolver {
    store: Arc<dyn ProfileStore>,
    states: StateCache,
}

impl std::fmt::Debug for CityResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CityResolver")
            .field("states", &self.states)
            .finish_non_exhaustive()
    }
}

impl CityResolver {
    /// Resolver over `store` with a state cache of lifetime `state_ttl`.
    pub fn new(store: Arc<dyn ProfileStore>, state_ttl: Duration) -> Self {
        Self {
            store,
            states: StateCache::new(state_ttl),
        }
    }

    /// The resolver's state cache.
    pub fn states(&self) -> &StateCache {
        &self.states
    }

    /// Resolve one free-text city. `None` means "skip this city".
    pub async fn resolve_city(&self, raw: &str) -> Option<i32> {
        let (city, token) = split_city_input(raw);
        if city.is_empty() {
            debug!(input = raw, "empty city name");
            return None;
        }
        let token = (!token.is_empty()).then_some(token);

        match self.try_resolve(city, token).await {
            Ok(id) => id,
            Err(err) => {
                warn!(input = raw, error = %err, "city resolution failed");
                None
            }
        }
    }

    async fn try_resolve(&self, city: &str, token: Option<&str>) -> StoreResult<Option<i32>> {
        if let Some(id) = self.store.find_city(city, token).await? {
            return Ok(Some(id));
        }
        let Some(token) = token else {
            warn!(city, "no matching city and no state given");
            return Ok(None);
        };
        let Some(state) = self.states.lookup(self.store.as_ref(), token).await? else {
            warn!(city, state = token, "unknown state");
            return Ok(None);
        };

        // the token may have been a full state name; match again by code
        if !state.code.eq_ignore_ascii_case(token) {
            if let Some(id) = self.store.find_city(city, Some(&state.code)).await? {
                return Ok(Some(id));
            }
        }

        match self.store.insert_city(city, state.id).await {
            Ok(id) => {
                info!(city, state = %state.code, city_id = id, "created city");
                Ok(Some(id))
            }
            Err(StoreError::UniqueViolation(_)) => {
                debug!(city, "city created concurrently; looking it up again");
                self.store.find_city(city, Some(&state.code)).await
            }
            Err(err) => Err(err),
        }
    }
}
