use crate::error::{Error, Result};
use std::env;
use std::path::PathBuf;

/// Environment variable that points at an explicit config file.
pub const CONFIG_ENV: &str = "TYPEDASH_CONFIG";

/// Base typedash config directory (~/.config/typedash/ on all platforms)
pub fn typedash() -> Result<PathBuf> {
    #[cfg(windows)]
    {
        let appdata = env::var("APPDATA").map_err(|_| {
            Error::internal_unexpected("APPDATA environment variable not set on Windows")
        })?;
        Ok(PathBuf::from(appdata).join("typedash"))
    }

    #[cfg(not(windows))]
    {
        let home = env::var("HOME").map_err(|_| {
            Error::internal_unexpected("HOME environment variable not set on Unix-like system")
        })?;
        Ok(PathBuf::from(home).join(".config").join("typedash"))
    }
}

/// Config file path; `$TYPEDASH_CONFIG` wins over the default location.
pub fn typedash_json() -> Result<PathBuf> {
    match env::var_os(CONFIG_ENV) {
        Some(path) if !path.is_empty() => Ok(PathBuf::from(path)),
        _ => Ok(typedash()?.join("typedash.json")),
    }
}
