// Local settings model and configuration

pub mod local;
pub mod settings;

pub use local::{LocalSettingsConfig, SCHEMA_VERSION, SETTINGS_FILE_NAME};
pub use settings::{normalize_server_host, Settings, DEFAULT_SERVER_PORT};
