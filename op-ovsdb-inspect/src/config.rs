//! Inspector configuration
//!
//! Flags win over `OVSDB_*` variables. Those may also be supplied by an env
//! file (`$OVSDB_INSPECT_ENV_FILE`, else the first of `ENV_FILE_PATHS` that
//! exists), which only fills in variables the process does not already have.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info, warn};

/// Environment files tried in order when `OVSDB_INSPECT_ENV_FILE` is unset
pub const ENV_FILE_PATHS: &[&str] = &["/etc/op-ovsdb/environment", ".env"];

/// Default schema file (`OVSDB_SCHEMA_PATH`)
pub const SCHEMA_PATH_VAR: &str = "OVSDB_SCHEMA_PATH";
/// Default output format (`OVSDB_INSPECT_FORMAT`)
pub const FORMAT_VAR: &str = "OVSDB_INSPECT_FORMAT";
/// Add `_uuid`/`_version` by default (`OVSDB_INSPECT_INTERNAL_COLUMNS`)
pub const INTERNAL_COLUMNS_VAR: &str = "OVSDB_INSPECT_INTERNAL_COLUMNS";
/// Explicit env file, tried before `ENV_FILE_PATHS`
pub const ENV_FILE_VAR: &str = "OVSDB_INSPECT_ENV_FILE";

/// Report output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("unknown output format '{}'", other)),
        }
    }
}

/// Defaults taken from the environment, before flags are applied
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InspectConfig {
    pub schema_path: Option<PathBuf>,
    pub format: OutputFormat,
    pub internal_columns: bool,
}

impl InspectConfig {
    pub fn from_env() -> Self {
        let format = match get_config_opt(FORMAT_VAR) {
            Some(raw) => raw.parse().unwrap_or_else(|e| {
                warn!("Ignoring {}: {}", FORMAT_VAR, e);
                OutputFormat::default()
            }),
            None => OutputFormat::default(),
        };

        Self {
            schema_path: get_config_opt(SCHEMA_PATH_VAR).map(PathBuf::from),
            format,
            internal_columns: get_config_bool(INTERNAL_COLUMNS_VAR, false),
        }
    }
}

/// Apply the inspector's environment file, if any. Returns the file used.
pub fn load_environment() -> Option<PathBuf> {
    let explicit = get_config_opt(ENV_FILE_VAR).map(PathBuf::from);
    let found = explicit
        .into_iter()
        .chain(ENV_FILE_PATHS.iter().map(PathBuf::from))
        .find_map(|candidate| load_env_file(&candidate));

    if found.is_none() {
        debug!("Inspector defaults come from the process environment only");
    }
    found
}

/// Apply `path` on top of the process environment; `None` if it is absent
/// or unreadable
pub fn load_env_file(path: &Path) -> Option<PathBuf> {
    if !path.is_file() {
        return None;
    }

    let content = fs::read_to_string(path)
        .map_err(|e| warn!("Cannot read inspector env file {}: {}", path.display(), e))
        .ok()?;

    let (applied, kept) = apply_assignments(content.lines().filter_map(parse_assignment));
    info!(
        "Inspector env file {}: {} applied, {} kept from environment",
        path.display(),
        applied,
        kept
    );
    Some(path.to_path_buf())
}

/// Set each variable that is not already present; returns (applied, kept)
fn apply_assignments(assignments: impl Iterator<Item = (String, String)>) -> (usize, usize) {
    assignments.fold((0, 0), |(applied, kept), (key, value)| {
        if std::env::var_os(&key).is_some() {
            debug!("{} already set, ignoring env file value", key);
            (applied, kept + 1)
        } else {
            debug!("{} set from env file", key);
            std::env::set_var(&key, &value);
            (applied + 1, kept)
        }
    })
}

/// One `[export ]NAME=value` line; blanks and `#` comments yield `None`.
/// Values may be wrapped in matching single or double quotes.
fn parse_assignment(line: &str) -> Option<(String, String)> {
    let line = line.trim();
    if line.starts_with('#') {
        return None;
    }
    let line = line.strip_prefix("export ").unwrap_or(line);
    let (name, value) = line.split_once('=')?;
    let name = name.trim();
    if name.is_empty() || name.contains(char::is_whitespace) {
        return None;
    }
    Some((name.to_string(), unquote(value.trim()).to_string()))
}

fn unquote(value: &str) -> &str {
    ['"', '\'']
        .iter()
        .find_map(|q| value.strip_prefix(*q)?.strip_suffix(*q))
        .unwrap_or(value)
}

/// Value of `key`, treating an empty variable as unset
pub fn get_config_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// On/off switch; unrecognised values fall back to `default` with a warning
pub fn get_config_bool(key: &str, default: bool) -> bool {
    let Some(raw) = get_config_opt(key) else {
        return default;
    };
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => {
            warn!("{}={} is not a switch value, using {}", key, raw, default);
            default
        }
    }
}
