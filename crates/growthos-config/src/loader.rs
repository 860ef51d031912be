//! Config file discovery and layered loading.
//!
//! 1. Parse embedded `defaults.toml` → base
//! 2. Merge the explicit file, or `~/.growthos/config.toml` if it exists
//! 3. Apply `GROWTHOS_*` env var overrides
//! 4. Deserialize merged tree → `Config`
//! 5. Validate

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::env::{apply_env_overrides, collect_env_vars};
use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;
use crate::validate;

/// Embedded default configuration.
const DEFAULTS_TOML: &str = include_str!("defaults.toml");

/// Load the configuration using the process environment.
///
/// An explicit `path` must exist. Without one, the user config is merged
/// only if present.
///
/// # Errors
///
/// Returns a [`ConfigError`] if a file cannot be read or parsed, an
/// environment override is malformed, or validation fails.
pub fn load(path: Option<&Path>) -> ConfigResult<Config> {
    load_with_env(path, &collect_env_vars())
}

/// Load the configuration with an explicit set of environment variables.
///
/// # Errors
///
/// Same as [`load`].
pub fn load_with_env<S: ::std::hash::BuildHasher>(
    path: Option<&Path>,
    env_vars: &HashMap<String, String, S>,
) -> ConfigResult<Config> {
    let mut merged: toml::Value =
        toml::from_str(DEFAULTS_TOML).map_err(|e| ConfigError::ParseError {
            path: "<embedded defaults>".to_owned(),
            source: e,
        })?;

    match path {
        Some(p) => {
            let overlay = read_file(p)?;
            deep_merge(&mut merged, &overlay);
            info!(path = %p.display(), "loaded config");
        },
        None => {
            if let Some(user_path) = user_config_path()
                && user_path.is_file()
            {
                let overlay = read_file(&user_path)?;
                deep_merge(&mut merged, &overlay);
                info!(path = %user_path.display(), "loaded user config");
            }
        },
    }

    let applied = apply_env_overrides(&mut merged, env_vars)?;
    if applied > 0 {
        debug!(count = applied, "applied env overrides");
    }

    let config: Config = merged.try_into().map_err(|e| ConfigError::ParseError {
        path: "<merged config>".to_owned(),
        source: e,
    })?;

    validate(&config)?;
    Ok(config)
}

/// `~/.growthos/config.toml`, if a home directory is known.
fn user_config_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|dirs| dirs.home_dir().join(".growthos").join("config.toml"))
}

fn read_file(path: &Path) -> ConfigResult<toml::Value> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.display().to_string(),
        source: e,
    })?;
    toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: path.display().to_string(),
        source: e,
    })
}

/// Recursively deep-merge `overlay` into `base`.
///
/// Tables merge per key; scalars and arrays from the overlay replace the
/// base value.
fn deep_merge(base: &mut toml::Value, overlay: &toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                if let Some(base_val) = base_table.get_mut(key) {
                    deep_merge(base_val, overlay_val);
                } else {
                    base_table.insert(key.clone(), overlay_val.clone());
                }
            }
        },
        (base, overlay) => {
            *base = overlay.clone();
        },
    }
}
