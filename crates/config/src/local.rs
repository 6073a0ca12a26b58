// Where local state lives on disk
//
// Defaults follow the platform data/config dirs. Each location can be
// overridden through an environment variable (useful for CI and tests).

use std::env;
use std::path::PathBuf;

/// File name of the local settings database
pub const SETTINGS_FILE_NAME: &str = "DrawXsettings.db";

/// Declared schema version of the settings database.
/// Bump whenever a persisted settings field is added or changed.
pub const SCHEMA_VERSION: u32 = 2;

/// Overrides the settings database location
pub const SETTINGS_PATH_ENV: &str = "DRAWX_SETTINGS_PATH";

/// Overrides the logged-in sessions directory
pub const SESSIONS_DIR_ENV: &str = "DRAWX_SESSIONS_DIR";

const APP_DIR: &str = "drawx";

/// How to open the local settings store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalSettingsConfig {
    pub path: PathBuf,
    pub schema_version: u32,
}

impl LocalSettingsConfig {
    /// Config for a database at an explicit path, at the current schema version
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            schema_version: SCHEMA_VERSION,
        }
    }
}

impl Default for LocalSettingsConfig {
    fn default() -> Self {
        Self::at(settings_path())
    }
}

/// Settings database path: `$DRAWX_SETTINGS_PATH`, else the platform data dir
pub fn settings_path() -> PathBuf {
    env_path(SETTINGS_PATH_ENV).unwrap_or_else(|| {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join(SETTINGS_FILE_NAME)
    })
}

/// Directory holding one file per logged-in identity
pub fn sessions_dir() -> PathBuf {
    env_path(SESSIONS_DIR_ENV).unwrap_or_else(|| {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join("sessions")
    })
}

fn env_path(name: &str) -> Option<PathBuf> {
    env::var_os(name).filter(|v| !v.is_empty()).map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_path_uses_current_schema() {
        let config = LocalSettingsConfig::at("/tmp/drawx/test.db");
        assert_eq!(config.path, PathBuf::from("/tmp/drawx/test.db"));
        assert_eq!(config.schema_version, SCHEMA_VERSION);
    }

    #[test]
    fn test_default_paths_are_namespaced() {
        // Only meaningful when the overrides are not set in the environment
        if env::var_os(SETTINGS_PATH_ENV).is_none() {
            let path = settings_path();
            assert!(path.ends_with(PathBuf::from(APP_DIR).join(SETTINGS_FILE_NAME)));
        }
        if env::var_os(SESSIONS_DIR_ENV).is_none() {
            assert!(sessions_dir().ends_with("drawx/sessions"));
        }
    }
}
