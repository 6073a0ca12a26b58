//! CLI Exit Code Registry
//!
//! Single source of truth for `drawx` exit codes. Scripts rely on them.
//!
//! | Range   | Domain     | Description                              |
//! |---------|------------|------------------------------------------|
//! | 0       | Universal  | Success                                  |
//! | 1       | Universal  | General error (unspecified)              |
//! | 2       | Universal  | CLI usage error (bad args)               |
//! | 10-19   | store      | Local settings store codes               |
//! | 20-29   | session    | Logged-in identity codes                 |

use drawx_settings::{SessionError, SettingsError};
use drawx_store::StoreError;

// =============================================================================
// Universal (0-2)
// =============================================================================

pub const EXIT_SUCCESS: u8 = 0;

/// General error. Prefer a specific code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error: bad or missing arguments.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Store (10-19)
// =============================================================================

/// Settings store cannot be opened or created.
pub const EXIT_STORE_OPEN: u8 = 10;

/// Settings store is inconsistent (duplicate records, newer schema).
pub const EXIT_STORE_INVALID: u8 = 11;

/// A read or write transaction failed.
pub const EXIT_STORE_WRITE: u8 = 12;

// =============================================================================
// Session (20-29)
// =============================================================================

/// Session records could not be read.
pub const EXIT_SESSION_READ: u8 = 20;

/// More than one user is logged in.
pub const EXIT_SESSION_AMBIGUOUS: u8 = 21;

/// Map a SettingsError to its exit code.
pub fn settings_exit_code(err: &SettingsError) -> u8 {
    match err {
        SettingsError::EmptyServerHost => EXIT_USAGE,
        SettingsError::Store(store) => match store {
            StoreError::CreateDir { .. } | StoreError::Open { .. } => EXIT_STORE_OPEN,
            StoreError::SchemaTooNew { .. } | StoreError::DuplicateSettings { .. } => EXIT_STORE_INVALID,
            StoreError::RecordMissing { .. } | StoreError::Sqlite(_) => EXIT_STORE_WRITE,
        },
    }
}

/// Map a SessionError to its exit code.
pub fn session_exit_code(err: &SessionError) -> u8 {
    match err {
        SessionError::MultipleSessions { .. } => EXIT_SESSION_AMBIGUOUS,
        SessionError::Io { .. } | SessionError::Parse { .. } => EXIT_SESSION_READ,
    }
}
