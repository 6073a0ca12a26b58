use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A logged-in user, as recorded by the sync client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// User name on the sync server
    pub user: String,
    /// Server the user is logged in to (e.g., "http://example.com:9080")
    pub server_url: String,
    pub logged_in_at: DateTime<Utc>,
}

/// Error type for identity lookups.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// More than one identity is logged in, so "the current one" is undefined
    #[error("{count} users are logged in; cannot pick the current one")]
    MultipleSessions { count: usize },
    /// Session record could not be read
    #[error("cannot read session {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Session record is not valid JSON
    #[error("malformed session {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Source of the current logged-in identity.
pub trait SessionRegistry {
    /// The single logged-in identity, `None` if nobody is logged in.
    ///
    /// Fails with [`SessionError::MultipleSessions`] when more than one
    /// identity is active.
    fn current_identity(&self) -> Result<Option<Identity>, SessionError>;
}

impl<T: SessionRegistry + ?Sized> SessionRegistry for &T {
    fn current_identity(&self) -> Result<Option<Identity>, SessionError> {
        (**self).current_identity()
    }
}

impl<T: SessionRegistry + ?Sized> SessionRegistry for Arc<T> {
    fn current_identity(&self) -> Result<Option<Identity>, SessionError> {
        (**self).current_identity()
    }
}
