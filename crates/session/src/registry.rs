// File-backed session registry
// One JSON file per logged-in identity, e.g. ~/.config/drawx/sessions/alice.json

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::identity::{Identity, SessionError, SessionRegistry};

/// Reads logged-in identities from a directory of JSON records.
#[derive(Debug, Clone)]
pub struct FileSessionRegistry {
    dir: PathBuf,
}

impl FileSessionRegistry {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// All logged-in identities, most recent login first.
    /// A missing directory means nobody is logged in.
    pub fn list_sessions(&self) -> Result<Vec<Identity>, SessionError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(SessionError::Io { path: self.dir.clone(), source }),
        };

        let mut sessions = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| SessionError::Io { path: self.dir.clone(), source })?;
            let path = entry.path();
            if path.extension().map_or(false, |ext| ext == "json") {
                sessions.push(read_identity(&path)?);
            }
        }

        sessions.sort_by(|a, b| b.logged_in_at.cmp(&a.logged_in_at));
        log::debug!("{} session record(s) in {}", sessions.len(), self.dir.display());
        Ok(sessions)
    }
}

impl SessionRegistry for FileSessionRegistry {
    fn current_identity(&self) -> Result<Option<Identity>, SessionError> {
        let mut sessions = self.list_sessions()?;
        match sessions.len() {
            0 | 1 => Ok(sessions.pop()),
            count => Err(SessionError::MultipleSessions { count }),
        }
    }
}

fn read_identity(path: &Path) -> Result<Identity, SessionError> {
    let contents = fs::read_to_string(path).map_err(|source| SessionError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&contents).map_err(|source| SessionError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn write_session(dir: &Path, user: &str, minutes_ago: i64) -> Identity {
        let identity = Identity {
            user: user.into(),
            server_url: "http://example.com:9080".into(),
            logged_in_at: Utc::now() - Duration::minutes(minutes_ago),
        };
        let json = serde_json::to_string_pretty(&identity).unwrap();
        fs::write(dir.join(format!("{user}.json")), json).unwrap();
        identity
    }

    #[test]
    fn test_missing_dir_means_nobody() {
        let dir = tempfile::tempdir().unwrap();
        let registry = FileSessionRegistry::new(dir.path().join("does-not-exist"));
        assert!(registry.list_sessions().unwrap().is_empty());
        assert!(registry.current_identity().unwrap().is_none());
    }

    #[test]
    fn test_single_session() {
        let dir = tempfile::tempdir().unwrap();
        let alice = write_session(dir.path(), "alice", 5);

        let registry = FileSessionRegistry::new(dir.path());
        assert_eq!(registry.current_identity().unwrap(), Some(alice));
    }

    #[test]
    fn test_non_json_files_ignored() {
        let dir = tempfile::tempdir().unwrap();
        write_session(dir.path(), "alice", 5);
        fs::write(dir.path().join("README.txt"), "not a session").unwrap();

        let registry = FileSessionRegistry::new(dir.path());
        assert_eq!(registry.current_identity().unwrap().unwrap().user, "alice");
    }

    #[test]
    fn test_multiple_sessions_are_ambiguous() {
        let dir = tempfile::tempdir().unwrap();
        write_session(dir.path(), "alice", 30);
        write_session(dir.path(), "bob", 1);

        let registry = FileSessionRegistry::new(dir.path());
        match registry.current_identity() {
            Err(SessionError::MultipleSessions { count }) => assert_eq!(count, 2),
            other => panic!("Expected MultipleSessions, got {:?}", other),
        }

        // Listing still works, newest first
        let users: Vec<_> = registry.list_sessions().unwrap().into_iter().map(|s| s.user).collect();
        assert_eq!(users, vec!["bob", "alice"]);
    }

    #[test]
    fn test_malformed_session_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("broken.json"), "{ not json").unwrap();

        let registry = FileSessionRegistry::new(dir.path());
        assert!(matches!(registry.current_identity(), Err(SessionError::Parse { .. })));
    }

    #[test]
    fn test_shared_registry_via_arc() {
        let dir = tempfile::tempdir().unwrap();
        write_session(dir.path(), "alice", 5);

        let shared = std::sync::Arc::new(FileSessionRegistry::new(dir.path()));
        assert!(shared.current_identity().unwrap().is_some());
    }
}
