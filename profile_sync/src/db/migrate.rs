//! Embedded schema migrations.

use anyhow::{anyhow, bail};
use diesel::{Connection, SqliteConnection, connection::SimpleConnection};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};

use super::connection::sqlite_path;

/// Embedded Diesel migrations bundled with this crate.
///
/// These are applied by [`run_sqlite`] to bring the schema up to date.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Runs pending migrations on the SQLite database at `url`.
///
/// Also switches the database to WAL journaling, which persists in the file.
pub fn run_sqlite(url: &str) -> anyhow::Result<()> {
    let mut conn = SqliteConnection::establish(sqlite_path(url))?;
    conn.batch_execute("PRAGMA journal_mode=WAL;")?;
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|e| anyhow!(e))?;
    Ok(())
}

/// Runs pending migrations for `database_url`.
///
/// Accepts `sqlite:` URLs and bare file paths. Server URLs are rejected: the
/// schema uses SQLite-only column affinities.
pub fn run_all(database_url: &str) -> anyhow::Result<()> {
    if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        bail!("Unsupported DATABASE_URL (only SQLite is built in): {database_url}");
    }
    run_sqlite(database_url)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn migrations_apply_on_temp_file() {
        let temp = tempfile::NamedTempFile::new().unwrap();
        let path = temp.path().to_string_lossy().to_string();

        run_all(&format!("sqlite:{path}")).expect("migration run");
        // second run is a no-op
        run_sqlite(&path).expect("idempotent");

        let mut conn = SqliteConnection::establish(&path).unwrap();
        conn.batch_execute("INSERT INTO states (id, code, name) VALUES (1, 'SP', 'São Paulo')")
            .unwrap();
    }

    #[test]
    fn postgres_urls_are_rejected() {
        assert!(run_all("postgres://localhost/db").is_err());
    }
}
