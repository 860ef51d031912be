//! `GROWTHOS_*` environment variable overrides.

use std::collections::HashMap;

use tracing::debug;

use crate::error::{ConfigError, ConfigResult};

/// Prefix shared by every recognised environment variable.
pub const ENV_PREFIX: &str = "GROWTHOS_";

/// How the raw string is turned into a TOML value.
#[derive(Clone, Copy)]
enum Kind {
    Str,
    Int,
    Float,
}

/// Mapping from environment variable name to config field path.
struct EnvMapping {
    var_name: &'static str,
    field_path: &'static str,
    kind: Kind,
}

const ENV_MAPPINGS: &[EnvMapping] = &[
    EnvMapping {
        var_name: "GROWTHOS_BIND",
        field_path: "server.bind",
        kind: Kind::Str,
    },
    EnvMapping {
        var_name: "GROWTHOS_LOG_LEVEL",
        field_path: "logging.level",
        kind: Kind::Str,
    },
    EnvMapping {
        var_name: "GROWTHOS_LOG_FORMAT",
        field_path: "logging.format",
        kind: Kind::Str,
    },
    EnvMapping {
        var_name: "GROWTHOS_LOG_TARGET",
        field_path: "logging.target",
        kind: Kind::Str,
    },
    EnvMapping {
        var_name: "GROWTHOS_LOG_DIR",
        field_path: "logging.directory",
        kind: Kind::Str,
    },
    EnvMapping {
        var_name: "GROWTHOS_MAX_STEP_DELAY_MS",
        field_path: "simulation.max_step_delay_ms",
        kind: Kind::Int,
    },
    EnvMapping {
        var_name: "GROWTHOS_TIME_SCALE",
        field_path: "simulation.time_scale",
        kind: Kind::Float,
    },
    EnvMapping {
        var_name: "GROWTHOS_CATALOG",
        field_path: "simulation.catalog_path",
        kind: Kind::Str,
    },
];

/// Collect all `GROWTHOS_*` variables from the process environment.
pub(crate) fn collect_env_vars() -> HashMap<String, String> {
    std::env::vars()
        .filter(|(k, _)| k.starts_with(ENV_PREFIX))
        .collect()
}

/// Apply environment overrides on top of the merged file layers.
///
/// Returns the number of variables applied.
pub(crate) fn apply_env_overrides<S: ::std::hash::BuildHasher>(
    merged: &mut toml::Value,
    env_vars: &HashMap<String, String, S>,
) -> ConfigResult<usize> {
    let mut count: usize = 0;

    for mapping in ENV_MAPPINGS {
        let Some(raw) = env_vars.get(mapping.var_name) else {
            continue;
        };
        let value = parse_value(mapping, raw)?;
        debug!(
            var = mapping.var_name,
            field = mapping.field_path,
            "applying env var override"
        );
        set_field(merged, mapping.field_path, value);
        count = count.saturating_add(1);
    }

    Ok(count)
}

fn parse_value(mapping: &EnvMapping, raw: &str) -> ConfigResult<toml::Value> {
    let raw = raw.trim();
    match mapping.kind {
        Kind::Str => Ok(toml::Value::String(raw.to_owned())),
        Kind::Int => raw
            .parse::<i64>()
            .map(toml::Value::Integer)
            .map_err(|e| ConfigError::EnvError {
                var_name: mapping.var_name.to_owned(),
                message: format!("expected an integer: {e}"),
            }),
        Kind::Float => raw
            .parse::<f64>()
            .map(toml::Value::Float)
            .map_err(|e| ConfigError::EnvError {
                var_name: mapping.var_name.to_owned(),
                message: format!("expected a number: {e}"),
            }),
    }
}

/// Set a dotted path in the tree, creating intermediate tables.
fn set_field(root: &mut toml::Value, path: &str, value: toml::Value) {
    let mut current = root;
    let mut parts = path.split('.').peekable();

    while let Some(part) = parts.next() {
        if !current.is_table() {
            *current = toml::Value::Table(toml::map::Map::new());
        }
        let toml::Value::Table(table) = current else {
            return;
        };
        if parts.peek().is_none() {
            table.insert(part.to_owned(), value);
            return;
        }
        current = table
            .entry(part.to_owned())
            .or_insert_with(|| toml::Value::Table(toml::map::Map::new()));
    }
}
