//! Hybrid persistence for trainer profiles.
//!
//! A trainer profile is stored across several normalized tables (identity,
//! profile, trainer profile, specialties, service cities, certifications,
//! gallery) but edited by the UI as one flat [`view::TrainerProfileView`].
//! This crate moves data between the two shapes:
//!
//! - [`reader::load_raw`] reads every table concurrently
//! - [`transform::to_view`] / [`transform::to_schema`] map rows ↔ aggregate
//! - [`writer::save_profile`] writes the tables back with partial-failure
//!   tolerance and resolves free-text cities in the background
//! - [`synchronizer::ProfileSynchronizer`] ties it together: load once, edit,
//!   save, reset
//!
//! Storage sits behind [`store::ProfileStore`]; [`store::sqlite::SqliteStore`]
//! is the diesel implementation and [`store::memory::MemoryStore`] the
//! in-process one used by tests.

#![deny(missing_docs)]

pub mod bucket;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod reader;
pub mod reconcile;
pub mod reference;
pub mod resolver;
#[allow(missing_docs)]
pub mod schema;
pub mod store;
pub mod synchronizer;
pub mod transform;
pub mod view;
pub mod writer;
