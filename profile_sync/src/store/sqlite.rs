//! Diesel-backed [`ProfileStore`].
//!
//! Diesel connections are synchronous, so every call checks a connection out
//! of the r2d2 pool on a blocking worker. Concurrent calls from the reader
//! therefore run on separate connections and overlap.

use async_trait::async_trait;
use diesel::{prelude::*, result::Error as DieselError};

use crate::{
    db::connection::{SqlitePool, build_pool},
    error::{StoreError, StoreResult},
    models::{
        CertificationRow, GalleryRow, IdentityPatch, IdentityRow, NewCity, ProfileRow,
        ServiceCityRow, SpecialtyRow, StateRow, TrainerProfileRow, UserId,
    },
    reconcile::{
        apply::{apply_city_diff, apply_specialty_diff},
        make_diff,
        read::{current_cities, current_specialties},
        want::{wanted_cities, wanted_specialties},
    },
    schema::{
        certifications, cities, gallery_assets, profiles, states, trainer_cities,
        trainer_profiles, trainer_specialties, users,
    },
    store::{CityDiff, ProfileStore, SpecialtyDiff, closest_city},
};

/// Default pool size; one connection per concurrent profile read plus headroom.
pub const DEFAULT_POOL_SIZE: u32 = 8;

/// SQLite store over a connection pool.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore")
            .field("state", &self.pool.state())
            .finish()
    }
}

impl SqliteStore {
    /// Open a pool against `database_url` (`sqlite:` URL or bare path).
    ///
    /// The schema must already be migrated, see [`crate::db::migrate::run_all`].
    pub fn open(database_url: &str) -> StoreResult<Self> {
        Ok(Self {
            pool: build_pool(database_url, DEFAULT_POOL_SIZE)?,
        })
    }

    async fn with_conn<T, F>(&self, f: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut SqliteConnection) -> StoreResult<T> + Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            f(&mut conn)
        })
        .await?
    }
}

/// Escape `%`, `_` and the escape character itself for a LIKE pattern.
fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[async_trait]
impl ProfileStore for SqliteStore {
    async fn fetch_identity(&self, user: &UserId) -> StoreResult<IdentityRow> {
        let id = user.to_string();
        self.with_conn(move |conn| {
            Ok(users::table
                .find(id)
                .select(IdentityRow::as_select())
                .first(conn)?)
        })
        .await
    }

    async fn fetch_profile(&self, user: &UserId) -> StoreResult<ProfileRow> {
        let id = user.to_string();
        self.with_conn(move |conn| {
            Ok(profiles::table
                .find(id)
                .select(ProfileRow::as_select())
                .first(conn)?)
        })
        .await
    }

    async fn fetch_trainer_profile(&self, user: &UserId) -> StoreResult<TrainerProfileRow> {
        let id = user.to_string();
        self.with_conn(move |conn| {
            Ok(trainer_profiles::table
                .find(id)
                .select(TrainerProfileRow::as_select())
                .first(conn)?)
        })
        .await
    }

    async fn fetch_specialties(&self, user: &UserId) -> StoreResult<Vec<SpecialtyRow>> {
        let id = user.to_string();
        self.with_conn(move |conn| {
            Ok(trainer_specialties::table
                .filter(trainer_specialties::trainer_id.eq(id))
                .order((
                    trainer_specialties::is_primary.desc(),
                    trainer_specialties::sport_id.asc(),
                ))
                .select(SpecialtyRow::as_select())
                .load(conn)?)
        })
        .await
    }

    async fn fetch_service_cities(&self, user: &UserId) -> StoreResult<Vec<ServiceCityRow>> {
        let id = user.to_string();
        self.with_conn(move |conn| {
            Ok(trainer_cities::table
                .left_join(cities::table.left_join(states::table))
                .filter(trainer_cities::trainer_id.eq(id))
                .order(trainer_cities::city_id.asc())
                .select((
                    trainer_cities::city_id,
                    cities::name.nullable(),
                    states::code.nullable(),
                ))
                .load::<ServiceCityRow>(conn)?)
        })
        .await
    }

    async fn fetch_gallery(
        &self,
        user: &UserId,
        path_prefix: &str,
        limit: i64,
    ) -> StoreResult<Vec<GalleryRow>> {
        let id = user.to_string();
        let pattern = format!("{}%", escape_like(path_prefix));
        self.with_conn(move |conn| {
            Ok(gallery_assets::table
                .filter(gallery_assets::trainer_id.eq(id))
                .filter(gallery_assets::path.like(pattern).escape('\\'))
                .order((gallery_assets::created_at.desc(), gallery_assets::id.asc()))
                .limit(limit)
                .select(GalleryRow::as_select())
                .load(conn)?)
        })
        .await
    }

    async fn fetch_certifications(&self, user: &UserId) -> StoreResult<Vec<CertificationRow>> {
        let id = user.to_string();
        self.with_conn(move |conn| {
            Ok(certifications::table
                .filter(certifications::trainer_id.eq(id))
                // undated rows sort last
                .order((
                    certifications::issue_date.is_null().asc(),
                    certifications::issue_date.desc(),
                    certifications::id.asc(),
                ))
                .select(CertificationRow::as_select())
                .load(conn)?)
        })
        .await
    }

    async fn update_identity(&self, user: &UserId, patch: &IdentityPatch) -> StoreResult<()> {
        let id = user.to_string();
        let patch = patch.clone();
        self.with_conn(move |conn| {
            let n = diesel::update(users::table.find(id))
                .set(&patch)
                .execute(conn)?;
            if n == 0 {
                return Err(StoreError::NotFound);
            }
            Ok(())
        })
        .await
    }

    async fn upsert_profile(&self, row: &ProfileRow) -> StoreResult<()> {
        let row = row.clone();
        self.with_conn(move |conn| {
            diesel::insert_into(profiles::table)
                .values(&row)
                .on_conflict(profiles::user_id)
                .do_update()
                .set(&row)
                .execute(conn)?;
            Ok(())
        })
        .await
    }

    async fn upsert_trainer_profile(&self, row: &TrainerProfileRow) -> StoreResult<()> {
        let row = row.clone();
        self.with_conn(move |conn| {
            diesel::insert_into(trainer_profiles::table)
                .values(&row)
                .on_conflict(trainer_profiles::user_id)
                .do_update()
                .set(&row)
                .execute(conn)?;
            Ok(())
        })
        .await
    }

    async fn replace_specialties(
        &self,
        user: &UserId,
        rows: &[SpecialtyRow],
    ) -> StoreResult<SpecialtyDiff> {
        let id = user.to_string();
        let wanted = wanted_specialties(rows);
        self.with_conn(move |conn| {
            let diff = conn.immediate_transaction(|conn| {
                let current = current_specialties(conn, &id)?;
                let diff = make_diff(&current, &wanted);
                apply_specialty_diff(conn, &id, &diff)?;
                Ok::<_, DieselError>(diff)
            })?;
            Ok(diff)
        })
        .await
    }

    async fn replace_service_cities(&self, user: &UserId, city_ids: &[i32]) -> StoreResult<CityDiff> {
        let id = user.to_string();
        let wanted = wanted_cities(city_ids);
        self.with_conn(move |conn| {
            let diff = conn.immediate_transaction(|conn| {
                let current = current_cities(conn, &id)?;
                let diff = make_diff(&current, &wanted);
                apply_city_diff(conn, &id, &diff)?;
                Ok::<_, DieselError>(diff)
            })?;
            Ok(diff)
        })
        .await
    }

    async fn find_city(&self, name: &str, state_code: Option<&str>) -> StoreResult<Option<i32>> {
        // SQLite folds ASCII only, so names are matched in Rust.
        // State codes are ASCII; LIKE without wildcards is a case-insensitive equality.
        let needle = name.to_string();
        let code_pattern = state_code.map(escape_like);
        self.with_conn(move |conn| {
            let mut query = cities::table
                .inner_join(states::table)
                .select((cities::id, cities::name))
                .into_boxed();
            if let Some(code) = code_pattern {
                query = query.filter(states::code.like(code).escape('\\'));
            }
            let candidates: Vec<(i32, String)> = query.load(conn)?;
            Ok(closest_city(
                candidates.iter().map(|(id, city)| (*id, city.as_str())),
                &needle,
            ))
        })
        .await
    }

    async fn list_states(&self) -> StoreResult<Vec<StateRow>> {
        self.with_conn(|conn| {
            Ok(states::table
                .order(states::id.asc())
                .select(StateRow::as_select())
                .load(conn)?)
        })
        .await
    }

    async fn insert_city(&self, name: &str, state_id: i32) -> StoreResult<i32> {
        let name = name.to_string();
        self.with_conn(move |conn| {
            Ok(diesel::insert_into(cities::table)
                .values(NewCity {
                    name: &name,
                    state_id,
                })
                .returning(cities::id)
                .get_result::<i32>(conn)?)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::escape_like;

    #[test]
    fn like_metacharacters_are_escaped() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("Rio"), "Rio");
    }
}
