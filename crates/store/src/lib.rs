//! `drawx-store` — local settings storage.
//!
//! A single SQLite file holding the one settings row. Schema version is
//! tracked in `PRAGMA user_version`; there are no migrations beyond
//! stamping the declared version.

mod error;
mod store;

pub use error::StoreError;
pub use store::{SettingsStore, StoredSettings, WriteTxn};
