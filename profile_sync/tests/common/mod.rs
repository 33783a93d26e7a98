#![allow(dead_code)]

use std::{path::PathBuf, sync::Arc};

use diesel::QueryableByName;
use diesel::prelude::*;
use diesel::sql_types::{Integer, Text};
use profile_sync::db::{connection, migrate};
use profile_sync::models::{CityRow, IdentityRow, StateRow};
use profile_sync::schema::{cities, sports, states, users};
use profile_sync::store::{ProfileStore, sqlite::SqliteStore};
use tempfile::TempDir;

#[derive(QueryableByName)]
struct JournalMode {
    #[diesel(sql_type = Text)]
    journal_mode: String,
}
#[derive(QueryableByName)]
struct ForeignKeys {
    #[diesel(sql_type = Integer)]
    foreign_keys: i32,
}
#[derive(QueryableByName)]
struct BusyTimeout {
    #[diesel(sql_type = Integer, column_name = "timeout")]
    busy_timeout: i32,
}
#[derive(QueryableByName, Debug)]
struct FkViolation {
    #[diesel(sql_type = Text, column_name = "table")]
    table_name: String,
}

pub struct TestDb {
    _dir: TempDir,    // keep alive for the life of the test
    pub path: String, // <tmpdir>/test.db
}

impl TestDb {
    pub fn store(&self) -> Arc<dyn ProfileStore> {
        Arc::new(SqliteStore::open(&self.path).expect("open pool"))
    }
}

pub fn setup_db() -> (TestDb, SqliteConnection) {
    let dir = TempDir::new().expect("tempdir");
    let mut p = PathBuf::from(dir.path());
    p.push("test.db");
    let path = p.to_string_lossy().to_string();

    migrate::run_all(&path).expect("migrations");

    let conn = connection::connect_sqlite(&path).expect("connect");
    (TestDb { _dir: dir, path }, conn)
}

pub fn assert_sqlite_pragmas(conn: &mut SqliteConnection) {
    use diesel::sql_query;

    let jm: JournalMode = sql_query("PRAGMA journal_mode;").get_result(conn).unwrap();
    assert_eq!(jm.journal_mode.to_lowercase(), "wal"); // WAL is persistent per DB file

    let fk: ForeignKeys = sql_query("PRAGMA foreign_keys;").get_result(conn).unwrap();
    assert_eq!(fk.foreign_keys, 1);

    let bt: BusyTimeout = sql_query("PRAGMA busy_timeout;").get_result(conn).unwrap();
    assert_eq!(bt.busy_timeout, 5000);
}

pub fn fk_check_empty(conn: &mut SqliteConnection) {
    let rows: Vec<FkViolation> = diesel::sql_query("PRAGMA foreign_key_check;")
        .load(conn)
        .unwrap();
    assert!(rows.is_empty(), "foreign key violations: {rows:?}");
}

/// States SP(1), RJ(2), AM(3); cities São Paulo(1), Rio de Janeiro(2),
/// São Paulo de Olivença(3); sports 1..=3.
pub fn seed_reference(conn: &mut SqliteConnection) {
    let st = [
        StateRow { id: 1, code: "SP".into(), name: "São Paulo".into() },
        StateRow { id: 2, code: "RJ".into(), name: "Rio de Janeiro".into() },
        StateRow { id: 3, code: "AM".into(), name: "Amazonas".into() },
    ];
    diesel::insert_into(states::table).values(&st[..]).execute(conn).unwrap();

    let ct = [
        CityRow { id: 1, name: "São Paulo".into(), state_id: 1 },
        CityRow { id: 2, name: "Rio de Janeiro".into(), state_id: 2 },
        CityRow { id: 3, name: "São Paulo de Olivença".into(), state_id: 3 },
    ];
    diesel::insert_into(cities::table).values(&ct[..]).execute(conn).unwrap();

    for (id, name) in [(1, "Running"), (2, "Swimming"), (3, "CrossFit")] {
        diesel::insert_into(sports::table)
            .values((sports::id.eq(id), sports::name.eq(name)))
            .execute(conn)
            .unwrap();
    }
}

pub fn seed_user(conn: &mut SqliteConnection, id: &str) {
    diesel::insert_into(users::table)
        .values(&IdentityRow {
            id: id.into(),
            email: format!("{id}@example.com"),
            phone: None,
        })
        .execute(conn)
        .unwrap();
}

pub fn count_cities(conn: &mut SqliteConnection) -> i64 {
    cities::table.count().get_result(conn).unwrap()
}
