//! Application data paths.

use std::env;
use std::path::PathBuf;

use thiserror::Error;

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "PROMPTDESK_DATA_DIR";

const APP_DIR_NAME: &str = "promptdesk";
const SETTINGS_FILE_NAME: &str = "settings.json";

#[derive(Debug, Error)]
pub enum PathError {
    /// Could not determine the system data directory.
    #[error("Cannot determine system data directory")]
    NoDataDir,
}

/// Root directory for application data.
///
/// Resolution order:
/// 1. `PROMPTDESK_DATA_DIR` environment variable
/// 2. System data directory (e.g. `~/.local/share/promptdesk`)
pub fn data_root() -> Result<PathBuf, PathError> {
    resolve_data_root(env::var_os(DATA_DIR_ENV).map(PathBuf::from))
}

/// Path of the persisted settings file.
pub fn settings_path() -> Result<PathBuf, PathError> {
    Ok(data_root()?.join(SETTINGS_FILE_NAME))
}

fn resolve_data_root(override_dir: Option<PathBuf>) -> Result<PathBuf, PathError> {
    if let Some(dir) = override_dir.filter(|d| !d.as_os_str().is_empty()) {
        return Ok(dir);
    }
    dirs::data_local_dir()
        .map(|d| d.join(APP_DIR_NAME))
        .ok_or(PathError::NoDataDir)
}
