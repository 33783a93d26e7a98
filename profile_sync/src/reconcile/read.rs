//! Stored side of a reconcile.

use std::collections::BTreeMap;

use diesel::prelude::*;

use crate::models::SpecialtyRow;
use crate::schema::{trainer_cities, trainer_specialties};

/// Current specialty set for a trainer, keyed by sport id.
pub fn current_specialties(
    conn: &mut SqliteConnection,
    trainer: &str,
) -> QueryResult<BTreeMap<i32, SpecialtyRow>> {
    let rows = trainer_specialties::table
        .filter(trainer_specialties::trainer_id.eq(trainer))
        .select(SpecialtyRow::as_select())
        .load(conn)?;
    Ok(rows.into_iter().map(|r| (r.sport_id, r)).collect())
}

/// Current service-city set for a trainer, keyed by city id.
pub fn current_cities(
    conn: &mut SqliteConnection,
    trainer: &str,
) -> QueryResult<BTreeMap<i32, ()>> {
    let ids = trainer_cities::table
        .filter(trainer_cities::trainer_id.eq(trainer))
        .select(trainer_cities::city_id)
        .load::<i32>(conn)?;
    Ok(ids.into_iter().map(|id| (id, ())).collect())
}
