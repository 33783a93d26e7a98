//! SQLite connection helpers.
//!
//! Provides [`connect_sqlite`] for one-off connections (migrations, seeding)
//! and [`build_pool`] for the r2d2 pool behind
//! [`crate::store::sqlite::SqliteStore`]. Every connection gets
//! `foreign_keys=ON` and a 5000ms `busy_timeout`; WAL is a database-level
//! setting applied once by [`crate::db::migrate::run_sqlite`].
//!
//! Example:
//! ```no_run
//! use profile_sync::db::connection::connect_sqlite;
//!
//! let path = std::env::temp_dir().join("profile_sync_example.db");
//! let _conn = connect_sqlite(path.to_str().unwrap()).expect("open sqlite");
//! ```

use diesel::{
    Connection, SqliteConnection,
    connection::SimpleConnection,
    r2d2::{ConnectionManager, CustomizeConnection, Pool, PoolError},
};

/// Pool type used by the SQLite store.
pub type SqlitePool = Pool<ConnectionManager<SqliteConnection>>;

const CONNECTION_PRAGMAS: &str = "PRAGMA foreign_keys=ON; PRAGMA busy_timeout=5000;";

/// Accept `sqlite://path`, `sqlite:path`, or a bare path.
pub fn sqlite_path(database_url: &str) -> &str {
    database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))
        .unwrap_or(database_url)
}

/// Open a SQLite connection and apply connection-wide PRAGMAs.
pub fn connect_sqlite(database_url: &str) -> anyhow::Result<SqliteConnection> {
    let mut conn = SqliteConnection::establish(sqlite_path(database_url))?;
    conn.batch_execute(CONNECTION_PRAGMAS)?;
    Ok(conn)
}

/// Applies [`CONNECTION_PRAGMAS`] to every pooled connection as it is opened.
#[derive(Debug, Clone, Copy)]
struct SqlitePragmas;

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for SqlitePragmas {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
        conn.batch_execute(CONNECTION_PRAGMAS)
            .map_err(diesel::r2d2::Error::QueryError)
    }
}

/// Build a connection pool of at most `max_size` connections.
pub fn build_pool(database_url: &str, max_size: u32) -> Result<SqlitePool, PoolError> {
    let manager = ConnectionManager::<SqliteConnection>::new(sqlite_path(database_url));
    Pool::builder()
        .max_size(max_size)
        .connection_customizer(Box::new(SqlitePragmas))
        .build(manager)
}
