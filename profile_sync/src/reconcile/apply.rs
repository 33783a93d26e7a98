//! Statement emission for a computed diff.

use diesel::prelude::*;

use crate::models::NewServiceCity;
use crate::schema::{trainer_cities as tc, trainer_specialties as ts};
use crate::store::{CityDiff, SpecialtyDiff};

/// Apply a specialty diff inside the current transaction.
/// Deletes run first so a re-keyed row never collides with its old self.
pub fn apply_specialty_diff(
    conn: &mut SqliteConnection,
    trainer: &str,
    diff: &SpecialtyDiff,
) -> QueryResult<()> {
    for sport in &diff.delete {
        diesel::delete(
            ts::table.filter(ts::trainer_id.eq(trainer).and(ts::sport_id.eq(sport))),
        )
        .execute(conn)?;
    }

    for row in diff.upsert.values() {
        diesel::insert_into(ts::table)
            .values(row)
            .on_conflict((ts::trainer_id, ts::sport_id))
            .do_update()
            .set(row)
            .execute(conn)?;
    }
    Ok(())
}

/// Apply a service-city diff inside the current transaction.
pub fn apply_city_diff(conn: &mut SqliteConnection, trainer: &str, diff: &CityDiff) -> QueryResult<()> {
    for city in &diff.delete {
        diesel::delete(tc::table.filter(tc::trainer_id.eq(trainer).and(tc::city_id.eq(city))))
            .execute(conn)?;
    }

    for city_id in diff.upsert.keys() {
        diesel::insert_into(tc::table)
            .values(NewServiceCity {
                trainer_id: trainer,
                city_id: *city_id,
            })
            .on_conflict_do_nothing()
            .execute(conn)?;
    }
    Ok(())
}
