mod common;
use common::{assert_sqlite_pragmas, fk_check_empty, seed_reference, seed_user, setup_db};

use diesel::QueryableByName;
use diesel::prelude::*;
use diesel::sql_query;
use diesel::sql_types::Integer;
use profile_sync::db::connection::connect_sqlite;

#[derive(QueryableByName)]
struct TblCnt {
    #[diesel(sql_type = Integer)]
    cnt: i32,
}

#[test]
fn migrations_apply_and_pragmas_are_set() {
    let (db, mut conn) = setup_db();

    // WAL is a persistent property of the .db file; FKs/timeout are per-connection
    assert_sqlite_pragmas(&mut conn);
    let mut second = connect_sqlite(&format!("sqlite:{}", db.path)).expect("connect second");
    assert_sqlite_pragmas(&mut second);

    let tbls: TblCnt = sql_query(
        "SELECT COUNT(*) AS cnt
            FROM sqlite_master
            WHERE type='table'
            AND name IN ('states','cities','sports','users','profiles','trainer_profiles',
                         'trainer_specialties','trainer_cities','certifications','gallery_assets');",
    )
    .get_result(&mut conn)
    .unwrap();
    assert_eq!(tbls.cnt, 10, "expected every profile table to be present");

    seed_reference(&mut conn);
    seed_user(&mut conn, "u1");
    fk_check_empty(&mut conn);
}

#[test]
fn city_names_are_unique_per_state() {
    let (_db, mut conn) = setup_db();
    seed_reference(&mut conn);

    let dup = sql_query("INSERT INTO cities (name, state_id) VALUES ('São Paulo', 1);").execute(&mut conn);
    assert!(dup.is_err(), "same name in the same state must be rejected");

    sql_query("INSERT INTO cities (name, state_id) VALUES ('São Paulo', 2);")
        .execute(&mut conn)
        .expect("same name in another state is fine");
}

#[test]
fn deleting_a_user_cascades_to_profile_rows() {
    let (_db, mut conn) = setup_db();
    seed_reference(&mut conn);
    seed_user(&mut conn, "u1");
    sql_query("INSERT INTO profiles (user_id, bio) VALUES ('u1', 'hi');")
        .execute(&mut conn)
        .unwrap();
    sql_query("INSERT INTO trainer_cities (trainer_id, city_id) VALUES ('u1', 2);")
        .execute(&mut conn)
        .unwrap();

    sql_query("DELETE FROM users WHERE id = 'u1';").execute(&mut conn).unwrap();

    let left: TblCnt = sql_query(
        "SELECT (SELECT COUNT(*) FROM profiles) + (SELECT COUNT(*) FROM trainer_cities) AS cnt;",
    )
    .get_result(&mut conn)
    .unwrap();
    assert_eq!(left.cnt, 0);
    // the shared city row survives
    assert_eq!(common::count_cities(&mut conn), 3);
}
