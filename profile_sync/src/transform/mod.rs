//! Pure mappings between the normalized rows and the flat aggregate.
//!
//! - [`to_view`] folds a [`crate::reader::RawProfile`] into a
//!   [`crate::view::TrainerProfileView`]
//! - [`to_schema`] splits a view back into per-table patches
//!
//! Both directions read bucket labels from [`crate::bucket`], so a label the
//! reader produces is always one the writer understands. Neither direction
//! can fail: missing or malformed values become empty strings or `NULL`.

mod to_schema;
mod to_view;

pub use to_schema::{SchemaPatch, to_schema};
pub use to_view::{display_name, issue_year, to_view};

use crate::config::SyncConfig;

/// Settings for [`to_view`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformConfig {
    /// Lowercase substrings marking an uncategorized certification as a degree.
    pub university_keywords: Vec<String>,
}

impl Default for TransformConfig {
    fn default() -> Self {
        TransformConfig::from(&SyncConfig::default())
    }
}

impl From<&SyncConfig> for TransformConfig {
    fn from(cfg: &SyncConfig) -> Self {
        Self {
            university_keywords: cfg.university_keywords.clone(),
        }
    }
}
