//! Set reconciliation for the many-rows relations (specialties, service cities).
//!
//! ## What this does
//! - Builds the **wanted** set from the rows a save submits ([`want`]).
//! - Reads the **current** set for the trainer ([`read`], SQLite only).
//! - Computes a **diff**: rows to insert or update, keys to delete ([`diff`]).
//! - Applies the diff with the minimal number of statements ([`apply`]).
//!
//! ## Transactions & consistency
//! The SQLite store runs read + diff + apply inside one `BEGIN IMMEDIATE`
//! transaction, so the relation is never observed half-replaced and never
//! momentarily empty. The result is the same as a delete-all-then-insert:
//! after a replace the stored set equals the submitted set exactly.

pub mod apply;
pub mod diff;
pub mod read;
pub mod want;

pub use diff::{RelationDiff, make_diff};
