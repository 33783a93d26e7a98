//! Environment-variable lookups with structured errors.
//!
//! Configuration loaders use these helpers to layer process environment on top
//! of file-based settings without sprinkling `std::env::var` error handling
//! through every call site.

use std::str::FromStr;

use thiserror::Error;

/// Errors raised while reading settings from the process environment.
#[derive(Debug, Error)]
pub enum EnvVarError {
    /// An environment variable required by the application is not set.
    #[error("Missing environment variable: {0}")]
    Missing(String),

    /// The variable is set but its value could not be parsed.
    #[error("Invalid value for environment variable {name}: {value:?}")]
    Invalid {
        /// Variable name.
        name: String,
        /// Raw value as found in the environment.
        value: String,
    },
}

/// Reads an environment variable, returning a structured error if it's missing.
///
/// Values that are empty or only whitespace count as missing.
pub fn get_env_var(name: &str) -> Result<String, EnvVarError> {
    required(name, process_env)
}

/// Reads an optional environment variable; blank values are treated as unset.
pub fn get_env_var_opt(name: &str) -> Option<String> {
    optional(name, process_env)
}

/// Reads and parses an optional environment variable.
///
/// Returns `Ok(None)` when the variable is unset, and an error when it is set
/// to something `T` cannot parse.
pub fn parse_env_var<T: FromStr>(name: &str) -> Result<Option<T>, EnvVarError> {
    parsed(name, process_env)
}

fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn optional(name: &str, lookup: impl FnOnce(&str) -> Option<String>) -> Option<String> {
    lookup(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required(name: &str, lookup: impl FnOnce(&str) -> Option<String>) -> Result<String, EnvVarError> {
    optional(name, lookup).ok_or_else(|| EnvVarError::Missing(name.to_string()))
}

fn parsed<T: FromStr>(
    name: &str,
    lookup: impl FnOnce(&str) -> Option<String>,
) -> Result<Option<T>, EnvVarError> {
    match optional(name, lookup) {
        None => Ok(None),
        Some(raw) => raw.parse::<T>().map(Some).map_err(|_| EnvVarError::Invalid {
            name: name.to_string(),
            value: raw,
        }),
    }
}
