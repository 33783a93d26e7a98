//! Synchronizer configuration: parsing, normalization, and loading.
//!
//! Settings come from a TOML file (all keys optional) and can be layered with
//! the process environment:
//! - `database_url`: SQLite path used by the CLI and [`crate::store::sqlite::SqliteStore`]
//! - `gallery_limit`: maximum gallery rows loaded per profile
//! - `gallery_prefix`: storage prefix that marks a media row as gallery content
//! - `state_cache_ttl_secs`: lifetime of the state lookup snapshot
//! - `university_keywords`: substrings that classify an uncategorized certification as a degree
//!
//! Entrypoints:
//! - Parse + normalize from a TOML string: [`load_config_str`]
//! - Parse + normalize from a file path: [`load_config_path`]
//! - Environment overrides: [`SyncConfig::apply_env`]

use std::{collections::HashSet, time::Duration};

use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};
use shared_utils::env::{get_env_var, get_env_var_opt, parse_env_var};

/// Environment variable overriding [`SyncConfig::database_url`].
pub const ENV_DATABASE_URL: &str = "PROFILE_SYNC_DATABASE_URL";
/// Environment variable overriding [`SyncConfig::gallery_limit`].
pub const ENV_GALLERY_LIMIT: &str = "PROFILE_SYNC_GALLERY_LIMIT";

/// Top-level configuration for the persistence layer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyncConfig {
    /// SQLite database path or `sqlite:` URL.
    pub database_url: String,
    /// Maximum gallery assets loaded per profile (newest first).
    pub gallery_limit: i64,
    /// Gallery media lives under `{gallery_prefix}/{user_id}/`.
    pub gallery_prefix: String,
    /// How long a loaded state list is trusted before a refresh.
    pub state_cache_ttl_secs: u64,
    /// Case-insensitive substrings marking a legacy certification as a university degree.
    pub university_keywords: Vec<String>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            database_url: "profile_sync.db".to_string(),
            gallery_limit: 50,
            gallery_prefix: "trainers".to_string(),
            state_cache_ttl_secs: 600,
            university_keywords: ["university", "college", "universidade", "faculdade"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl SyncConfig {
    /// State cache lifetime as a [`Duration`].
    pub fn state_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.state_cache_ttl_secs)
    }

    /// Layer `PROFILE_SYNC_*` environment variables over the current values.
    pub fn apply_env(&mut self) -> anyhow::Result<()> {
        if let Some(url) = get_env_var_opt(ENV_DATABASE_URL) {
            self.database_url = url;
        }
        if let Some(limit) = parse_env_var::<i64>(ENV_GALLERY_LIMIT)? {
            self.gallery_limit = limit;
        }
        normalize_config(self)
    }

    /// Defaults plus environment overrides, for running without a config file.
    /// `PROFILE_SYNC_DATABASE_URL` is required.
    pub fn from_env() -> anyhow::Result<Self> {
        let mut cfg = Self {
            database_url: get_env_var(ENV_DATABASE_URL)?,
            ..Self::default()
        };
        cfg.apply_env()?;
        Ok(cfg)
    }
}

/// Normalize a configuration in place.
///
/// - Trims `database_url` and `gallery_prefix` (and strips trailing `/` from the prefix)
/// - Lowercases, trims, and de-duplicates keywords, preserving first occurrence order
///
/// Errors:
/// - Empty `database_url`
/// - `gallery_limit` outside `1..=500`
pub fn normalize_config(cfg: &mut SyncConfig) -> anyhow::Result<()> {
    cfg.database_url = cfg.database_url.trim().to_string();
    if cfg.database_url.is_empty() {
        bail!("database_url cannot be empty");
    }
    if !(1..=500).contains(&cfg.gallery_limit) {
        bail!("gallery_limit must be between 1 and 500, got {}", cfg.gallery_limit);
    }
    cfg.gallery_prefix = cfg.gallery_prefix.trim().trim_end_matches('/').to_string();

    let mut seen = HashSet::new();
    cfg.university_keywords = std::mem::take(&mut cfg.university_keywords)
        .into_iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty() && seen.insert(k.clone()))
        .collect();
    Ok(())
}

/// Parse and normalize a configuration from a TOML string.
pub fn load_config_str(toml_str: &str) -> anyhow::Result<SyncConfig> {
    let mut cfg: SyncConfig = toml::from_str(toml_str).context("failed to parse config TOML")?;
    normalize_config(&mut cfg).context("invalid configuration")?;
    Ok(cfg)
}

/// Read a configuration TOML file from disk, parse, and normalize it.
pub fn load_config_path(path: impl AsRef<std::path::Path>) -> anyhow::Result<SyncConfig> {
    let text = std::fs::read_to_string(path.as_ref())
        .with_context(|| format!("read config file {}", path.as_ref().display()))?;
    load_config_str(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_gives_defaults() {
        let cfg = load_config_str("").unwrap();
        assert_eq!(cfg, SyncConfig::default());
        assert_eq!(cfg.gallery_limit, 50);
    }

    #[test]
    fn keywords_are_normalized_and_deduped() {
        let cfg = load_config_str(
            r#"
            gallery_prefix = "media/trainers/"
            university_keywords = [" University", "university", "INSTITUTO", ""]
            "#,
        )
        .unwrap();
        assert_eq!(cfg.gallery_prefix, "media/trainers");
        assert_eq!(cfg.university_keywords, vec!["university", "instituto"]);
    }

    #[test]
    fn rejects_unknown_keys_and_bad_limits() {
        assert!(load_config_str("galery_limit = 3").is_err());
        let err = load_config_str("gallery_limit = 0").unwrap_err();
        assert!(format!("{err:#}").contains("gallery_limit"));
    }
}
