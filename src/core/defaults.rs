use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};
use crate::paths;
use crate::template::TemplateOptions;
use crate::utils::io::read_file;

/// Root configuration structure for typedash.json
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TypedashConfig {
    #[serde(default)]
    pub defaults: Defaults,
}

/// All configurable defaults that can be overridden via typedash.json
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Defaults {
    /// Options used when compiling templates from the CLI.
    #[serde(default)]
    pub template: TemplateOptions,

    #[serde(default)]
    pub wildcard: WildcardConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct WildcardConfig {
    /// Regex flags applied when a pattern carries none of its own, e.g. `"i"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flags: Option<String>,
}

// =============================================================================
// Loading functions
// =============================================================================

/// Load defaults, merging file config with built-in defaults.
pub fn load_defaults() -> Defaults {
    load_config().defaults
}

/// Load the full typedash.json config. A missing file yields the built-in
/// defaults; an unreadable or invalid one is reported and ignored.
pub fn load_config() -> TypedashConfig {
    let path = match paths::typedash_json() {
        Ok(path) => path,
        Err(_) => return TypedashConfig::default(),
    };
    if !path.exists() {
        return TypedashConfig::default();
    }
    match load_config_from(&path) {
        Ok(config) => config,
        Err(err) => {
            crate::log_status!("config", "Ignoring {}: {}", path.display(), err);
            TypedashConfig::default()
        }
    }
}

/// Parse a config file at `path`.
pub fn load_config_from(path: &Path) -> Result<TypedashConfig> {
    let content = read_file(path, &format!("read {}", path.display()))?;
    serde_json::from_str(&content)
        .map_err(|e| Error::config_invalid_json(path.display().to_string(), e))
}

/// Get the path to typedash.json (for display purposes)
pub fn config_path() -> Result<String> {
    Ok(paths::typedash_json()?.display().to_string())
}

/// Whether typedash.json exists at the resolved path.
pub fn config_exists() -> bool {
    paths::typedash_json().map(|p| p.exists()).unwrap_or(false)
}

/// Get built-in defaults (ignoring any file config)
pub fn builtin_defaults() -> Defaults {
    Defaults::default()
}
