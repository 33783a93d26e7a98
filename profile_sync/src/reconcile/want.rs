//! Wanted side of a reconcile, built from submitted rows.

use std::collections::BTreeMap;

use crate::models::SpecialtyRow;

/// Wanted specialty set keyed by sport id. The first row for a sport wins.
pub fn wanted_specialties(rows: &[SpecialtyRow]) -> BTreeMap<i32, SpecialtyRow> {
    let mut out = BTreeMap::new();
    for row in rows {
        out.entry(row.sport_id).or_insert_with(|| row.clone());
    }
    out
}

/// Wanted service-city set keyed by city id.
pub fn wanted_cities(city_ids: &[i32]) -> BTreeMap<i32, ()> {
    city_ids.iter().map(|id| (*id, ())).collect()
}
