//! In-process [`ProfileStore`] with call counters and failure injection.
//!
//! Tables are plain maps behind one `tokio::sync::Mutex`. Tests seed rows with
//! the `put_*` helpers, arm failures with [`MemoryStore::fail`], and assert on
//! [`MemoryStore::calls`] to count how often an operation ran.

use std::{
    collections::{BTreeMap, HashMap},
    sync::Mutex as StdMutex,
    time::Duration,
};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{
    error::{StoreError, StoreResult},
    models::{
        CertificationRow, CityRow, GalleryRow, IdentityPatch, IdentityRow, ProfileRow,
        ServiceCityRow, SpecialtyRow, StateRow, TrainerProfileRow, UserId,
    },
    reconcile::{
        make_diff,
        want::{wanted_cities, wanted_specialties},
    },
    store::{CityDiff, ProfileStore, SpecialtyDiff, closest_city},
};

/// Store operations that can be counted and made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    /// [`ProfileStore::fetch_identity`]
    FetchIdentity,
    /// [`ProfileStore::fetch_profile`]
    FetchProfile,
    /// [`ProfileStore::fetch_trainer_profile`]
    FetchTrainerProfile,
    /// [`ProfileStore::fetch_specialties`]
    FetchSpecialties,
    /// [`ProfileStore::fetch_service_cities`]
    FetchServiceCities,
    /// [`ProfileStore::fetch_gallery`]
    FetchGallery,
    /// [`ProfileStore::fetch_certifications`]
    FetchCertifications,
    /// [`ProfileStore::update_identity`]
    UpdateIdentity,
    /// [`ProfileStore::upsert_profile`]
    UpsertProfile,
    /// [`ProfileStore::upsert_trainer_profile`]
    UpsertTrainerProfile,
    /// [`ProfileStore::replace_specialties`]
    ReplaceSpecialties,
    /// [`ProfileStore::replace_service_cities`]
    ReplaceServiceCities,
    /// [`ProfileStore::find_city`]
    FindCity,
    /// [`ProfileStore::list_states`]
    ListStates,
    /// [`ProfileStore::insert_city`]
    InsertCity,
}

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<String, IdentityRow>,
    profiles: BTreeMap<String, ProfileRow>,
    trainer_profiles: BTreeMap<String, TrainerProfileRow>,
    specialties: BTreeMap<String, BTreeMap<i32, SpecialtyRow>>,
    service_cities: BTreeMap<String, BTreeMap<i32, ()>>,
    certifications: BTreeMap<String, Vec<CertificationRow>>,
    gallery: BTreeMap<String, Vec<GalleryRow>>,
    states: BTreeMap<i32, StateRow>,
    cities: BTreeMap<i32, CityRow>,
}

/// Fake relational store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    failures: StdMutex<HashMap<Op, StoreError>>,
    calls: StdMutex<HashMap<Op, usize>>,
    delay: StdMutex<HashMap<Op, Duration>>,
}

impl MemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every future call of `op` fail with `err` until [`Self::heal`].
    pub fn fail(&self, op: Op, err: StoreError) {
        lock(&self.failures).insert(op, err);
    }

    /// Stop failing `op`.
    pub fn heal(&self, op: Op) {
        lock(&self.failures).remove(&op);
    }

    /// Sleep for `delay` at the start of every call of `op`.
    pub fn slow(&self, op: Op, delay: Duration) {
        lock(&self.delay).insert(op, delay);
    }

    /// How many times `op` was called (including failed calls).
    pub fn calls(&self, op: Op) -> usize {
        lock(&self.calls).get(&op).copied().unwrap_or(0)
    }

    async fn enter(&self, op: Op) -> StoreResult<()> {
        *lock(&self.calls).entry(op).or_insert(0) += 1;
        let delay = lock(&self.delay).get(&op).copied();
        if let Some(d) = delay {
            tokio::time::sleep(d).await;
        }
        match lock(&self.failures).get(&op) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    /// Seed or overwrite an identity row.
    pub async fn put_identity(&self, row: IdentityRow) {
        self.tables.lock().await.users.insert(row.id.clone(), row);
    }

    /// Seed or overwrite a profile row.
    pub async fn put_profile(&self, row: ProfileRow) {
        self.tables.lock().await.profiles.insert(row.user_id.clone(), row);
    }

    /// Seed or overwrite a trainer profile row.
    pub async fn put_trainer_profile(&self, row: TrainerProfileRow) {
        self.tables
            .lock()
            .await
            .trainer_profiles
            .insert(row.user_id.clone(), row);
    }

    /// Seed a specialty row.
    pub async fn put_specialty(&self, row: SpecialtyRow) {
        self.tables
            .lock()
            .await
            .specialties
            .entry(row.trainer_id.clone())
            .or_default()
            .insert(row.sport_id, row);
    }

    /// Link a trainer to a city.
    pub async fn put_service_city(&self, trainer: &str, city_id: i32) {
        self.tables
            .lock()
            .await
            .service_cities
            .entry(trainer.to_string())
            .or_default()
            .insert(city_id, ());
    }

    /// Seed a certification row.
    pub async fn put_certification(&self, row: CertificationRow) {
        self.tables
            .lock()
            .await
            .certifications
            .entry(row.trainer_id.clone())
            .or_default()
            .push(row);
    }

    /// Seed a gallery row.
    pub async fn put_gallery(&self, row: GalleryRow) {
        self.tables
            .lock()
            .await
            .gallery
            .entry(row.trainer_id.clone())
            .or_default()
            .push(row);
    }

    /// Seed a state row.
    pub async fn put_state(&self, row: StateRow) {
        self.tables.lock().await.states.insert(row.id, row);
    }

    /// Seed a city row.
    pub async fn put_city(&self, row: CityRow) {
        self.tables.lock().await.cities.insert(row.id, row);
    }

    /// Snapshot of a stored profile row.
    pub async fn profile(&self, user: &str) -> Option<ProfileRow> {
        self.tables.lock().await.profiles.get(user).cloned()
    }

    /// Snapshot of a stored trainer profile row.
    pub async fn trainer_profile(&self, user: &str) -> Option<TrainerProfileRow> {
        self.tables.lock().await.trainer_profiles.get(user).cloned()
    }

    /// Snapshot of a stored identity row.
    pub async fn identity(&self, user: &str) -> Option<IdentityRow> {
        self.tables.lock().await.users.get(user).cloned()
    }

    /// City ids currently linked to `trainer`.
    pub async fn service_city_ids(&self, trainer: &str) -> Vec<i32> {
        self.tables
            .lock()
            .await
            .service_cities
            .get(trainer)
            .map(|m| m.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Every city row.
    pub async fn cities(&self) -> Vec<CityRow> {
        self.tables.lock().await.cities.values().cloned().collect()
    }
}

fn lock<T>(m: &StdMutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn fetch_identity(&self, user: &UserId) -> StoreResult<IdentityRow> {
        self.enter(Op::FetchIdentity).await?;
        let t = self.tables.lock().await;
        t.users.get(user.as_str()).cloned().ok_or(StoreError::NotFound)
    }

    async fn fetch_profile(&self, user: &UserId) -> StoreResult<ProfileRow> {
        self.enter(Op::FetchProfile).await?;
        let t = self.tables.lock().await;
        t.profiles.get(user.as_str()).cloned().ok_or(StoreError::NotFound)
    }

    async fn fetch_trainer_profile(&self, user: &UserId) -> StoreResult<TrainerProfileRow> {
        self.enter(Op::FetchTrainerProfile).await?;
        let t = self.tables.lock().await;
        t.trainer_profiles
            .get(user.as_str())
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn fetch_specialties(&self, user: &UserId) -> StoreResult<Vec<SpecialtyRow>> {
        self.enter(Op::FetchSpecialties).await?;
        let t = self.tables.lock().await;
        let mut rows: Vec<SpecialtyRow> = t
            .specialties
            .get(user.as_str())
            .map(|m| m.values().cloned().collect())
            .unwrap_or_default();
        rows.sort_by_key(|r| (!r.is_primary, r.sport_id));
        Ok(rows)
    }

    async fn fetch_service_cities(&self, user: &UserId) -> StoreResult<Vec<ServiceCityRow>> {
        self.enter(Op::FetchServiceCities).await?;
        let t = self.tables.lock().await;
        let Some(ids) = t.service_cities.get(user.as_str()) else {
            return Ok(Vec::new());
        };
        Ok(ids
            .keys()
            .map(|city_id| {
                let city = t.cities.get(city_id);
                ServiceCityRow {
                    city_id: *city_id,
                    city_name: city.map(|c| c.name.clone()),
                    state_code: city
                        .and_then(|c| t.states.get(&c.state_id))
                        .map(|s| s.code.clone()),
                }
            })
            .collect())
    }

    async fn fetch_gallery(
        &self,
        user: &UserId,
        path_prefix: &str,
        limit: i64,
    ) -> StoreResult<Vec<GalleryRow>> {
        self.enter(Op::FetchGallery).await?;
        let t = self.tables.lock().await;
        let mut rows: Vec<GalleryRow> = t
            .gallery
            .get(user.as_str())
            .map(|v| {
                v.iter()
                    .filter(|g| g.path.starts_with(path_prefix))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(rows)
    }

    async fn fetch_certifications(&self, user: &UserId) -> StoreResult<Vec<CertificationRow>> {
        self.enter(Op::FetchCertifications).await?;
        let t = self.tables.lock().await;
        let mut rows = t
            .certifications
            .get(user.as_str())
            .cloned()
            .unwrap_or_default();
        // newest first, undated last
        rows.sort_by(|a, b| match (&a.issue_date, &b.issue_date) {
            (Some(x), Some(y)) => y.cmp(x),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });
        Ok(rows)
    }

    async fn update_identity(&self, user: &UserId, patch: &IdentityPatch) -> StoreResult<()> {
        self.enter(Op::UpdateIdentity).await?;
        let mut t = self.tables.lock().await;
        let row = t.users.get_mut(user.as_str()).ok_or(StoreError::NotFound)?;
        row.phone = patch.phone.clone();
        Ok(())
    }

    async fn upsert_profile(&self, row: &ProfileRow) -> StoreResult<()> {
        self.enter(Op::UpsertProfile).await?;
        let mut t = self.tables.lock().await;
        if let Some(city) = row.city_id {
            if !t.cities.contains_key(&city) {
                return Err(StoreError::ForeignKeyViolation(format!("city {city}")));
            }
        }
        t.profiles.insert(row.user_id.clone(), row.clone());
        Ok(())
    }

    async fn upsert_trainer_profile(&self, row: &TrainerProfileRow) -> StoreResult<()> {
        self.enter(Op::UpsertTrainerProfile).await?;
        let mut t = self.tables.lock().await;
        t.trainer_profiles.insert(row.user_id.clone(), row.clone());
        Ok(())
    }

    async fn replace_specialties(
        &self,
        user: &UserId,
        rows: &[SpecialtyRow],
    ) -> StoreResult<SpecialtyDiff> {
        self.enter(Op::ReplaceSpecialties).await?;
        let mut t = self.tables.lock().await;
        let wanted = wanted_specialties(rows);
        let current = t.specialties.entry(user.to_string()).or_default();
        let diff = make_diff(current, &wanted);
        *current = wanted;
        Ok(diff)
    }

    async fn replace_service_cities(&self, user: &UserId, city_ids: &[i32]) -> StoreResult<CityDiff> {
        self.enter(Op::ReplaceServiceCities).await?;
        let mut t = self.tables.lock().await;
        if let Some(missing) = city_ids.iter().find(|id| !t.cities.contains_key(id)) {
            return Err(StoreError::ForeignKeyViolation(format!("city {missing}")));
        }
        let wanted = wanted_cities(city_ids);
        let current = t.service_cities.entry(user.to_string()).or_default();
        let diff = make_diff(current, &wanted);
        *current = wanted;
        Ok(diff)
    }

    async fn find_city(&self, name: &str, state_code: Option<&str>) -> StoreResult<Option<i32>> {
        self.enter(Op::FindCity).await?;
        let t = self.tables.lock().await;
        let candidates = t
            .cities
            .values()
            .filter(|c| match state_code {
                None => true,
                Some(code) => t
                    .states
                    .get(&c.state_id)
                    .is_some_and(|s| s.code.eq_ignore_ascii_case(code)),
            })
            .map(|c| (c.id, c.name.as_str()));
        Ok(closest_city(candidates, name))
    }

    async fn list_states(&self) -> StoreResult<Vec<StateRow>> {
        self.enter(Op::ListStates).await?;
        Ok(self.tables.lock().await.states.values().cloned().collect())
    }

    async fn insert_city(&self, name: &str, state_id: i32) -> StoreResult<i32> {
        self.enter(Op::InsertCity).await?;
        let mut t = self.tables.lock().await;
        if !t.states.contains_key(&state_id) {
            return Err(StoreError::ForeignKeyViolation(format!("state {state_id}")));
        }
        if t.cities.values().any(|c| c.name == name && c.state_id == state_id) {
            return Err(StoreError::UniqueViolation(format!("city {name}")));
        }
        let id = t.cities.keys().next_back().copied().unwrap_or(0) + 1;
        t.cities.insert(
            id,
            CityRow {
                id,
                name: name.to_string(),
                state_id,
            },
        );
        Ok(id)
    }
}
