// Local settings record
// Persisted by drawx-store, cached by drawx-settings

use std::fmt;

use serde::{Deserialize, Serialize};

/// Port assumed when a server host is entered without one.
pub const DEFAULT_SERVER_PORT: u16 = 9080;

/// The single settings record: sync server address and login credentials.
///
/// The password is kept in cleartext because the sync server expects it
/// verbatim at login. `Debug` redacts it.
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// `host:port` of the sync server, `None` until first configured
    pub server_host: Option<String>,

    pub username: String,

    #[serde(skip_serializing)]
    pub password: String,
}

impl Settings {
    /// True iff host, username and password are all non-empty.
    pub fn has_credentials(&self) -> bool {
        self.server_host.as_deref().is_some_and(|h| !h.is_empty())
            && !self.username.is_empty()
            && !self.password.is_empty()
    }

    /// Whether storing these (already normalized) values would change the record.
    ///
    /// An unset host always counts as a change.
    pub fn credentials_differ(&self, host: &str, username: &str, password: &str) -> bool {
        match self.server_host.as_deref() {
            None => true,
            Some(current) => current != host || self.username != username || self.password != password,
        }
    }

    /// Port part of `server_host`, falling back to the default port
    pub fn server_port(&self) -> u16 {
        self.server_host
            .as_deref()
            .and_then(|h| h.rsplit_once(':'))
            .and_then(|(_, port)| port.parse().ok())
            .unwrap_or(DEFAULT_SERVER_PORT)
    }

    /// Host part of `server_host`, without the port
    pub fn server_name(&self) -> Option<&str> {
        let host = self.server_host.as_deref()?;
        Some(host.rsplit_once(':').map_or(host, |(name, _)| name))
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("server_host", &self.server_host)
            .field("username", &self.username)
            .field("password", &if self.password.is_empty() { "" } else { "<redacted>" })
            .finish()
    }
}

/// Append the default port when the user left it off.
///
/// Any `:` counts as a port delimiter, so `example.com:1234` is kept as is.
/// The host is stored as given, surrounding whitespace included.
pub fn normalize_server_host(host: &str) -> String {
    if host.contains(':') {
        host.to_string()
    } else {
        format!("{host}:{DEFAULT_SERVER_PORT}")
    }
}
