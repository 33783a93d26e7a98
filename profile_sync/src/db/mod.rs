//! Database utilities for connections and schema migrations.
//!
//! This module provides:
//! - Connection helpers: [`connection::connect_sqlite`] and the pooled
//!   [`connection::build_pool`], both applying foreign_keys=ON and a 5000ms busy_timeout.
//! - Embedded Diesel migrations and runners: [`migrate::run_sqlite`] and
//!   [`migrate::run_all`] (accepts `sqlite:` URLs or bare paths).
//!
//! Example:
//! ```no_run
//! use profile_sync::db::{connection, migrate};
//!
//! let db_path = std::env::temp_dir().join("profile_sync_example.db");
//! migrate::run_all(db_path.to_str().unwrap()).expect("migrations");
//! let _conn = connection::connect_sqlite(db_path.to_str().unwrap()).expect("connect");
//! ```

pub mod connection;
pub mod migrate;
