use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Parent directory of the database file could not be created.
    #[error("cannot create settings directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Database file could not be opened or created.
    #[error("cannot open settings store {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },
    /// File was written by a newer build.
    #[error("settings store schema version {found} is newer than supported version {supported}")]
    SchemaTooNew { found: u32, supported: u32 },
    /// More than one settings row. Never resolved by picking one.
    #[error("expected at most one settings record, found {count}")]
    DuplicateSettings { count: usize },
    #[error("settings record {id} no longer exists")]
    RecordMissing { id: i64 },
    #[error("settings store error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}
