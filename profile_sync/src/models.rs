//! Row types for the normalized trainer-profile tables.
//!
//! These types mirror the tables defined in the embedded migrations and in
//! [`crate::schema`]. They are shared by every [`crate::store::ProfileStore`]
//! implementation, so the in-memory store and the SQLite store exchange the
//! exact same shapes:
//! - [`crate::schema::users`]: account identity (only `phone` is writable here)
//! - [`crate::schema::profiles`]: one public profile row per account
//! - [`crate::schema::trainer_profiles`]: trainer-only numeric attributes
//! - [`crate::schema::trainer_specialties`]: many sports per trainer
//! - [`crate::schema::trainer_cities`]: many service cities per trainer
//! - [`crate::schema::certifications`] / [`crate::schema::gallery_assets`]: read-only here
//!
//! Upsert payloads derive `AsChangeset` with `treat_none_as_null`, because
//! profile rows are written as a whole: a cleared field must become `NULL`
//! instead of being skipped.

use std::fmt;

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schema::*;

/// Opaque account identifier (the auth subsystem's user id).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Wrap a raw id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// A row in [`crate::schema::users`].
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Insertable, Serialize, Deserialize)]
#[diesel(table_name = users, check_for_backend(diesel::sqlite::Sqlite))]
pub struct IdentityRow {
    /// Account id (primary key).
    pub id: String,
    /// Login email; owned by the auth subsystem.
    pub email: String,
    /// Contact phone; the only identity column this crate writes.
    pub phone: Option<String>,
}

/// The writable slice of [`IdentityRow`].
#[derive(Debug, Clone, Default, PartialEq, Eq, AsChangeset, Serialize)]
#[diesel(table_name = users, treat_none_as_null = true)]
pub struct IdentityPatch {
    /// New phone value; `None` clears it.
    pub phone: Option<String>,
}

/// A row in [`crate::schema::profiles`]. Upserted as a whole.
#[derive(
    Debug, Clone, Default, PartialEq, Eq, Queryable, Selectable, Insertable, AsChangeset, Serialize, Deserialize,
)]
#[diesel(table_name = profiles, check_for_backend(diesel::sqlite::Sqlite), treat_none_as_null = true)]
#[diesel(primary_key(user_id))]
pub struct ProfileRow {
    /// FK to [`IdentityRow::id`]; also the primary key.
    pub user_id: String,
    /// Explicit display name; wins over first/last name.
    pub display_name: Option<String>,
    /// Given name.
    pub first_name: Option<String>,
    /// Family name.
    pub last_name: Option<String>,
    /// Free-text biography.
    pub bio: Option<String>,
    /// Public avatar URL.
    pub avatar_url: Option<String>,
    /// Instagram profile link.
    pub instagram_url: Option<String>,
    /// Home city (FK to [`CityRow::id`]).
    pub city_id: Option<i32>,
}

/// A row in [`crate::schema::trainer_profiles`]. Upserted as a whole.
#[derive(
    Debug, Clone, Default, PartialEq, Eq, Queryable, Selectable, Insertable, AsChangeset, Serialize, Deserialize,
)]
#[diesel(table_name = trainer_profiles, check_for_backend(diesel::sqlite::Sqlite), treat_none_as_null = true)]
#[diesel(primary_key(user_id))]
pub struct TrainerProfileRow {
    /// FK to [`IdentityRow::id`]; also the primary key.
    pub user_id: String,
    /// Continuous years of experience.
    pub experience_years: Option<i32>,
    /// Typical response time in hours.
    pub response_time_hours: Option<i32>,
    /// Number of students coached so far.
    pub total_students: Option<i32>,
    /// "online" / "in_person" / "hybrid"; not interpreted here.
    pub service_mode: Option<String>,
}

/// A row in [`crate::schema::trainer_specialties`].
///
/// The pair `(trainer_id, sport_id)` is the primary key.
#[derive(
    Debug, Clone, PartialEq, Eq, Queryable, Selectable, Insertable, AsChangeset, Serialize, Deserialize,
)]
#[diesel(table_name = trainer_specialties, check_for_backend(diesel::sqlite::Sqlite), treat_none_as_null = true)]
#[diesel(primary_key(trainer_id, sport_id))]
pub struct SpecialtyRow {
    /// FK to [`IdentityRow::id`].
    pub trainer_id: String,
    /// FK to the sports reference table.
    pub sport_id: i32,
    /// Free-form level label ("beginner", "advanced", ...).
    pub experience_level: String,
    /// Years practising this sport.
    pub years_of_experience: Option<i32>,
    /// At most one specialty is expected to be primary; not enforced.
    pub is_primary: bool,
}

/// One service city of a trainer, joined with its city and state names.
///
/// `city_name` is `None` when the join found no city row.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Serialize, Deserialize)]
pub struct ServiceCityRow {
    /// FK to [`CityRow::id`].
    pub city_id: i32,
    /// Joined [`CityRow::name`].
    pub city_name: Option<String>,
    /// Joined [`StateRow::code`].
    pub state_code: Option<String>,
}

/// A row in [`crate::schema::certifications`].
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Insertable, Serialize, Deserialize)]
#[diesel(table_name = certifications, check_for_backend(diesel::sqlite::Sqlite))]
pub struct CertificationRow {
    /// Database primary key.
    pub id: i32,
    /// FK to [`IdentityRow::id`].
    pub trainer_id: String,
    /// Degree or course title.
    pub name: String,
    /// Issuing institution.
    pub institution: Option<String>,
    /// Issue date, `YYYY-MM-DD`.
    pub issue_date: Option<String>,
    /// Modeled category: "university" | "course". `NULL` for legacy rows.
    pub category: Option<String>,
}

/// A row in [`crate::schema::gallery_assets`].
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Insertable, Serialize, Deserialize)]
#[diesel(table_name = gallery_assets, check_for_backend(diesel::sqlite::Sqlite))]
pub struct GalleryRow {
    /// Asset id.
    pub id: String,
    /// FK to [`IdentityRow::id`].
    pub trainer_id: String,
    /// Storage path; gallery media lives under `{prefix}/{trainer_id}/`.
    pub path: String,
    /// Public URL.
    pub url: String,
    /// Alt text.
    pub alt: Option<String>,
    /// Pixel width.
    pub width: Option<i32>,
    /// Pixel height.
    pub height: Option<i32>,
    /// Upload timestamp in RFC3339 UTC.
    pub created_at: String,
}

/// A row in [`crate::schema::states`]. Reference data; never written here.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Insertable, Serialize, Deserialize)]
#[diesel(table_name = states, check_for_backend(diesel::sqlite::Sqlite))]
pub struct StateRow {
    /// Database primary key.
    pub id: i32,
    /// Short code, e.g. "SP".
    pub code: String,
    /// Full name, e.g. "São Paulo".
    pub name: String,
}

/// A row in [`crate::schema::cities`]. Shared reference data.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Insertable, Serialize, Deserialize)]
#[diesel(table_name = cities, check_for_backend(diesel::sqlite::Sqlite))]
pub struct CityRow {
    /// Database primary key.
    pub id: i32,
    /// City name as entered when the row was created.
    pub name: String,
    /// FK to [`StateRow::id`].
    pub state_id: i32,
}

/// Insertable form of [`CityRow`]; the id is assigned by the database.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = cities)]
pub struct NewCity<'a> {
    /// City name.
    pub name: &'a str,
    /// FK to [`StateRow::id`].
    pub state_id: i32,
}

/// Insertable row for [`crate::schema::trainer_cities`].
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = trainer_cities)]
pub struct NewServiceCity<'a> {
    /// FK to [`IdentityRow::id`].
    pub trainer_id: &'a str,
    /// FK to [`CityRow::id`].
    pub city_id: i32,
}
