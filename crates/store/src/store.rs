// Settings storage using SQLite

use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use rusqlite::{params, Connection, Transaction, TransactionBehavior};

use drawx_config::{LocalSettingsConfig, Settings};

use crate::error::StoreError;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS settings (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    server_host TEXT,                    -- NULL until first configured
    username TEXT NOT NULL DEFAULT '',
    password TEXT NOT NULL DEFAULT ''    -- cleartext
);
"#;

const SELECT_SETTINGS: &str =
    "SELECT id, server_host, username, password FROM settings ORDER BY id";

/// A settings row together with its row id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredSettings {
    pub id: i64,
    pub settings: Settings,
}

/// The local settings database.
///
/// One connection, guarded by a mutex: every write transaction holds the
/// lock for its whole duration, so writes within a process are serialized.
pub struct SettingsStore {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl SettingsStore {
    /// Open (creating if absent) the store described by `config`.
    pub fn open(config: &LocalSettingsConfig) -> Result<Self, StoreError> {
        let path = &config.path;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let conn = Connection::open(path).map_err(|source| StoreError::Open {
            path: path.clone(),
            source,
        })?;

        Self::init(conn, Some(path.clone()), config.schema_version)
    }

    /// Open a private in-memory store (tests, throwaway sessions).
    pub fn open_in_memory(schema_version: u32) -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn, None, schema_version)
    }

    fn init(conn: Connection, path: Option<PathBuf>, schema_version: u32) -> Result<Self, StoreError> {
        let found = read_schema_version(&conn)?;
        if found > schema_version {
            return Err(StoreError::SchemaTooNew { found, supported: schema_version });
        }

        conn.execute_batch(SCHEMA)?;

        if found != schema_version {
            conn.pragma_update(None, "user_version", schema_version)?;
            log::info!("settings store schema version {found} -> {schema_version}");
        }

        Ok(Self { conn: Mutex::new(conn), path })
    }

    /// Database file, `None` for in-memory stores
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Schema version stamped in the file
    pub fn schema_version(&self) -> Result<u32, StoreError> {
        read_schema_version(&self.conn.lock())
    }

    /// Every settings row, in insertion order.
    pub fn all_settings(&self) -> Result<Vec<StoredSettings>, StoreError> {
        query_all(&self.conn.lock())
    }

    /// The one settings row, if any. Fails on duplicates.
    pub fn single_settings(&self) -> Result<Option<StoredSettings>, StoreError> {
        query_single(&self.conn.lock())
    }

    /// Run `action` inside one write transaction.
    ///
    /// Commits when `action` returns `Ok`. Rolls back when it returns `Err`,
    /// when the commit itself fails, or when `action` panics. The connection
    /// lock is released on every one of those paths.
    pub fn write<T, E>(&self, action: impl FnOnce(&WriteTxn<'_>) -> Result<T, E>) -> Result<T, E>
    where
        E: From<StoreError>,
    {
        let mut conn = self.conn.lock();
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(StoreError::from)?;
        let txn = WriteTxn { tx };

        match action(&txn) {
            Ok(value) => {
                txn.tx.commit().map_err(StoreError::from)?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = txn.tx.rollback() {
                    log::warn!("settings rollback failed: {rollback_err}");
                } else {
                    log::debug!("settings write rolled back");
                }
                Err(err)
            }
        }
    }
}

/// An open write transaction. Only reachable inside [`SettingsStore::write`].
pub struct WriteTxn<'conn> {
    tx: Transaction<'conn>,
}

impl WriteTxn<'_> {
    pub fn all_settings(&self) -> Result<Vec<StoredSettings>, StoreError> {
        query_all(&self.tx)
    }

    pub fn single_settings(&self) -> Result<Option<StoredSettings>, StoreError> {
        query_single(&self.tx)
    }

    /// Insert a new row and return it with its id.
    pub fn insert_settings(&self, settings: &Settings) -> Result<StoredSettings, StoreError> {
        self.tx.execute(
            "INSERT INTO settings (server_host, username, password) VALUES (?1, ?2, ?3)",
            params![settings.server_host, settings.username, settings.password],
        )?;

        Ok(StoredSettings {
            id: self.tx.last_insert_rowid(),
            settings: settings.clone(),
        })
    }

    /// Overwrite every field of row `id`.
    pub fn update_settings(&self, id: i64, settings: &Settings) -> Result<(), StoreError> {
        let updated = self.tx.execute(
            "UPDATE settings SET server_host = ?1, username = ?2, password = ?3 WHERE id = ?4",
            params![settings.server_host, settings.username, settings.password, id],
        )?;

        if updated == 0 {
            return Err(StoreError::RecordMissing { id });
        }
        Ok(())
    }
}

fn read_schema_version(conn: &Connection) -> Result<u32, StoreError> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get(0))?)
}

fn query_all(conn: &Connection) -> Result<Vec<StoredSettings>, StoreError> {
    let mut stmt = conn.prepare(SELECT_SETTINGS)?;
    let rows = stmt.query_map([], |row| {
        Ok(StoredSettings {
            id: row.get(0)?,
            settings: Settings {
                server_host: row.get(1)?,
                username: row.get(2)?,
                password: row.get(3)?,
            },
        })
    })?;

    let all = rows.collect::<Result<Vec<_>, _>>()?;
    Ok(all)
}

fn query_single(conn: &Connection) -> Result<Option<StoredSettings>, StoreError> {
    let mut all = query_all(conn)?;
    match all.len() {
        0 => Ok(None),
        1 => Ok(all.pop()),
        count => Err(StoreError::DuplicateSettings { count }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drawx_config::SCHEMA_VERSION;

    #[derive(Debug)]
    enum TestError {
        Store(StoreError),
        Aborted,
    }

    impl From<StoreError> for TestError {
        fn from(e: StoreError) -> Self {
            TestError::Store(e)
        }
    }

    fn sample() -> Settings {
        Settings {
            server_host: Some("example.com:9080".into()),
            username: "alice".into(),
            password: "secret".into(),
        }
    }

    #[test]
    fn test_open_in_memory_is_empty() {
        let store = SettingsStore::open_in_memory(SCHEMA_VERSION).unwrap();
        assert!(store.all_settings().unwrap().is_empty());
        assert!(store.single_settings().unwrap().is_none());
        assert_eq!(store.schema_version().unwrap(), SCHEMA_VERSION);
        assert!(store.path().is_none());
    }

    #[test]
    fn test_insert_commits() {
        let store = SettingsStore::open_in_memory(SCHEMA_VERSION).unwrap();
        let inserted = store
            .write(|txn| txn.insert_settings(&sample()))
            .unwrap();

        let single = store.single_settings().unwrap().expect("row should exist");
        assert_eq!(single, inserted);
        assert_eq!(single.settings, sample());
    }

    #[test]
    fn test_error_rolls_back() {
        let store = SettingsStore::open_in_memory(SCHEMA_VERSION).unwrap();
        let result: Result<(), TestError> = store.write(|txn| {
            txn.insert_settings(&sample())?;
            Err(TestError::Aborted)
        });

        assert!(matches!(result, Err(TestError::Aborted)));
        assert!(store.all_settings().unwrap().is_empty());
    }

    #[test]
    fn test_panic_rolls_back_and_releases_lock() {
        let store = SettingsStore::open_in_memory(SCHEMA_VERSION).unwrap();
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _: Result<(), StoreError> = store.write(|txn| {
                txn.insert_settings(&sample())?;
                panic!("writer crashed");
            });
        }));
        assert!(outcome.is_err());

        // Lock released, nothing committed
        assert!(store.all_settings().unwrap().is_empty());
        store.write(|txn| txn.insert_settings(&sample())).unwrap();
        assert_eq!(store.all_settings().unwrap().len(), 1);
    }

    #[test]
    fn test_duplicates_fail_loudly() {
        let store = SettingsStore::open_in_memory(SCHEMA_VERSION).unwrap();
        store
            .write(|txn| {
                txn.insert_settings(&Settings::default())?;
                txn.insert_settings(&sample())
            })
            .unwrap();

        match store.single_settings() {
            Err(StoreError::DuplicateSettings { count }) => assert_eq!(count, 2),
            other => panic!("Expected DuplicateSettings, got {:?}", other),
        }
    }

    #[test]
    fn test_update_missing_row() {
        let store = SettingsStore::open_in_memory(SCHEMA_VERSION).unwrap();
        let result = store.write(|txn| txn.update_settings(42, &sample()));
        assert!(matches!(result, Err(StoreError::RecordMissing { id: 42 })));
    }

    #[test]
    fn test_file_store_persists_and_creates_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let config = LocalSettingsConfig::at(dir.path().join("nested/app/settings.db"));

        {
            let store = SettingsStore::open(&config).unwrap();
            let row = store.write(|txn| txn.insert_settings(&Settings::default())).unwrap();
            store.write(|txn| txn.update_settings(row.id, &sample())).unwrap();
            assert_eq!(store.path(), Some(config.path.as_path()));
        }

        let reopened = SettingsStore::open(&config).unwrap();
        let single = reopened.single_settings().unwrap().unwrap();
        assert_eq!(single.settings, sample());
    }

    #[test]
    fn test_newer_schema_refused() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.db");

        let newer = LocalSettingsConfig { path: path.clone(), schema_version: SCHEMA_VERSION + 1 };
        drop(SettingsStore::open(&newer).unwrap());

        match SettingsStore::open(&LocalSettingsConfig::at(&path)) {
            Err(StoreError::SchemaTooNew { found, supported }) => {
                assert_eq!(found, SCHEMA_VERSION + 1);
                assert_eq!(supported, SCHEMA_VERSION);
            }
            Err(other) => panic!("Expected SchemaTooNew, got {other}"),
            Ok(_) => panic!("Expected SchemaTooNew, store opened"),
        }
    }

    #[test]
    fn test_older_schema_is_stamped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.db");

        {
            let older = LocalSettingsConfig { path: path.clone(), schema_version: 1 };
            let store = SettingsStore::open(&older).unwrap();
            store.write(|txn| txn.insert_settings(&sample())).unwrap();
        }

        let store = SettingsStore::open(&LocalSettingsConfig::at(&path)).unwrap();
        assert_eq!(store.schema_version().unwrap(), SCHEMA_VERSION);
        assert_eq!(store.single_settings().unwrap().unwrap().settings, sample());
    }

    #[test]
    fn test_open_unwritable_location() {
        let dir = tempfile::tempdir().unwrap();
        // A regular file where the parent directory should be
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"not a dir").unwrap();

        let config = LocalSettingsConfig::at(blocker.join("settings.db"));
        assert!(matches!(SettingsStore::open(&config), Err(StoreError::CreateDir { .. })));
    }
}
