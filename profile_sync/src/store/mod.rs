//! Store abstraction over the relational backend.
//!
//! This module defines the [`ProfileStore`] trait, the only boundary between
//! the persistence layer and the database: per-table reads, whole-row
//! upserts, set replacement for the two many-rows relations, and the handful
//! of reference-data lookups the city resolver needs.
//!
//! Implementations:
//! - [`sqlite::SqliteStore`]: diesel over an r2d2 pool; each call runs on a
//!   blocking worker so concurrent reads really overlap
//! - [`memory::MemoryStore`]: in-process tables with call counters and
//!   failure injection, used by tests
//!
//! Stores are injected as `Arc<dyn ProfileStore>`; nothing here keeps
//! process-wide state.
//!
//! Single-row fetches return [`StoreError::NotFound`](crate::error::StoreError::NotFound)
//! when the row is missing. Deciding that absence is not an error belongs to
//! the caller (see [`crate::reader`]).

pub mod memory;
pub mod sqlite;

use async_trait::async_trait;

use crate::{
    error::StoreResult,
    models::{
        CertificationRow, GalleryRow, IdentityPatch, IdentityRow, ProfileRow, ServiceCityRow,
        SpecialtyRow, StateRow, TrainerProfileRow, UserId,
    },
    reconcile::RelationDiff,
};

/// Diff applied to a trainer's specialties, keyed by sport id.
pub type SpecialtyDiff = RelationDiff<i32, SpecialtyRow>;
/// Diff applied to a trainer's service cities, keyed by city id.
pub type CityDiff = RelationDiff<i32, ()>;

/// Query/mutation surface of the relational store.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Identity row for `user`.
    async fn fetch_identity(&self, user: &UserId) -> StoreResult<IdentityRow>;

    /// Profile row for `user`.
    async fn fetch_profile(&self, user: &UserId) -> StoreResult<ProfileRow>;

    /// Trainer profile row for `user`.
    async fn fetch_trainer_profile(&self, user: &UserId) -> StoreResult<TrainerProfileRow>;

    /// Specialties for `user`, primary first, then by sport id.
    async fn fetch_specialties(&self, user: &UserId) -> StoreResult<Vec<SpecialtyRow>>;

    /// Service cities for `user`, joined with city name and state code, by city id.
    async fn fetch_service_cities(&self, user: &UserId) -> StoreResult<Vec<ServiceCityRow>>;

    /// Up to `limit` gallery assets under `path_prefix`, newest first.
    async fn fetch_gallery(
        &self,
        user: &UserId,
        path_prefix: &str,
        limit: i64,
    ) -> StoreResult<Vec<GalleryRow>>;

    /// Certifications for `user`, most recent issue date first, undated last.
    async fn fetch_certifications(&self, user: &UserId) -> StoreResult<Vec<CertificationRow>>;

    /// Apply the writable identity columns.
    async fn update_identity(&self, user: &UserId, patch: &IdentityPatch) -> StoreResult<()>;

    /// Insert or fully overwrite the profile row.
    async fn upsert_profile(&self, row: &ProfileRow) -> StoreResult<()>;

    /// Insert or fully overwrite the trainer profile row.
    async fn upsert_trainer_profile(&self, row: &TrainerProfileRow) -> StoreResult<()>;

    /// Make the specialty set equal to `rows`, atomically. Returns what changed.
    async fn replace_specialties(
        &self,
        user: &UserId,
        rows: &[SpecialtyRow],
    ) -> StoreResult<SpecialtyDiff>;

    /// Make the service-city set equal to `city_ids`, atomically. Returns what changed.
    async fn replace_service_cities(&self, user: &UserId, city_ids: &[i32])
    -> StoreResult<CityDiff>;

    /// First city whose name contains `name` (case-insensitive), optionally
    /// restricted to the state with code `state_code`. Shortest name wins.
    async fn find_city(&self, name: &str, state_code: Option<&str>) -> StoreResult<Option<i32>>;

    /// Every state row.
    async fn list_states(&self) -> StoreResult<Vec<StateRow>>;

    /// Create a city under `state_id`, returning its id.
    async fn insert_city(&self, name: &str, state_id: i32) -> StoreResult<i32>;
}

/// Pick the city for a [`ProfileStore::find_city`] lookup out of `(id, name)`
/// candidates. Names are folded with full Unicode lowercasing, so `"SÃO"`
/// matches `"São"`. The shortest matching name wins, then the lowest id.
pub fn closest_city<'a, I>(candidates: I, name: &str) -> Option<i32>
where
    I: IntoIterator<Item = (i32, &'a str)>,
{
    let needle = name.to_lowercase();
    candidates
        .into_iter()
        .filter(|(_, candidate)| candidate.to_lowercase().contains(&needle))
        .min_by_key(|(id, candidate)| (candidate.chars().count(), *id))
        .map(|(id, _)| id)
}
