//! `drawx-settings` — the process-wide local settings cache.
//!
//! One [`SettingsCache`] per process owns the settings store. The settings
//! record is loaded (or created) on first access, served from memory after
//! that, and only ever changed inside a store write transaction.
//!
//! ```no_run
//! use drawx_config::LocalSettingsConfig;
//! use drawx_session::FileSessionRegistry;
//! use drawx_settings::SettingsCache;
//!
//! # fn main() -> Result<(), drawx_settings::SettingsError> {
//! let cache = SettingsCache::init_local_settings(
//!     &LocalSettingsConfig::default(),
//!     FileSessionRegistry::new(drawx_config::local::sessions_dir()),
//! )?;
//!
//! let changed = cache.update_credentials("example.com", "alice", "secret")?;
//! assert_eq!(cache.settings()?.server_host.as_deref(), Some("example.com:9080"));
//! # let _ = changed;
//! # Ok(())
//! # }
//! ```

mod cache;
mod error;
mod login;

pub use cache::SettingsCache;
pub use error::SettingsError;
pub use login::LoginState;

pub use drawx_config::Settings;
pub use drawx_session::{Identity, SessionError, SessionRegistry};
