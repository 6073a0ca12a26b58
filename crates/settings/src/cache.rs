use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use drawx_config::{normalize_server_host, LocalSettingsConfig, Settings};
use drawx_session::{FileSessionRegistry, SessionRegistry};
use drawx_store::{SettingsStore, StoreError, StoredSettings};

use crate::error::SettingsError;

struct Cached {
    id: i64,
    settings: Arc<Settings>,
}

/// The process-wide settings cache.
///
/// Construct one per process with [`SettingsCache::init_local_settings`] and
/// share it (usually behind an `Arc`). The settings record is loaded, or
/// created, on first access and then served from memory. Every mutation goes
/// through one store write transaction.
///
/// Writers are serialized on their own lock. The cache slot is only locked
/// to read or swap a snapshot, never across store I/O, so readers never wait
/// for a transaction. Lock order: writer, then store connection, then slot.
pub struct SettingsCache<S = FileSessionRegistry> {
    store: SettingsStore,
    pub(crate) sessions: S,
    writer: Mutex<()>,
    cached: RwLock<Option<Cached>>,
}

impl<S: SessionRegistry> SettingsCache<S> {
    /// Open (creating if absent) the local settings store.
    ///
    /// Nothing is read yet; the record is loaded on first use.
    pub fn init_local_settings(config: &LocalSettingsConfig, sessions: S) -> Result<Self, SettingsError> {
        let store = SettingsStore::open(config)?;
        log::debug!(
            "local settings store at {} (schema v{})",
            config.path.display(),
            config.schema_version
        );
        Ok(Self::with_store(store, sessions))
    }

    /// Wrap an already opened store.
    pub fn with_store(store: SettingsStore, sessions: S) -> Self {
        Self {
            store,
            sessions,
            writer: Mutex::new(()),
            cached: RwLock::new(None),
        }
    }

    pub fn store(&self) -> &SettingsStore {
        &self.store
    }

    pub fn sessions(&self) -> &S {
        &self.sessions
    }

    /// Whether the record has been loaded into memory yet
    pub fn is_loaded(&self) -> bool {
        self.cached.read().is_some()
    }

    /// The settings record.
    ///
    /// The first call loads it from the store, creating a default record in
    /// a write transaction if the store is empty. Later calls return the
    /// cached snapshot without touching the store.
    pub fn settings(&self) -> Result<Arc<Settings>, SettingsError> {
        if let Some((_, settings)) = self.cached_record() {
            return Ok(settings);
        }

        let stored = self.load_or_create()?;
        Ok(self.install(stored))
    }

    /// True iff the loaded record has host, username and password.
    ///
    /// Never touches the store: returns false if the record was not loaded
    /// yet, even when one exists on disk.
    pub fn has_credentials(&self) -> bool {
        self.cached
            .read()
            .as_ref()
            .is_some_and(|cached| cached.settings.has_credentials())
    }

    /// Store new login credentials. Returns whether anything changed.
    ///
    /// A host without a port gets the default port. Exactly one write
    /// transaction per call, performed even when nothing changed. On an empty
    /// store that transaction also creates the record.
    pub fn update_credentials(&self, host: &str, username: &str, password: &str) -> Result<bool, SettingsError> {
        if host.trim().is_empty() {
            return Err(SettingsError::EmptyServerHost);
        }
        let host = normalize_server_host(host);

        let changed = self.write(|settings| -> Result<bool, SettingsError> {
            // Compare before assigning
            let changed = settings.credentials_differ(&host, username, password);
            settings.server_host = Some(host.clone());
            settings.username = username.to_string();
            settings.password = password.to_string();
            Ok(changed)
        })?;

        log::info!(
            "credentials for {username}@{host} saved ({})",
            if changed { "changed" } else { "unchanged" }
        );
        Ok(changed)
    }

    /// Mutate the settings record inside one write transaction.
    ///
    /// `action` works on a draft copy. The draft is persisted and becomes the
    /// cached record only if `action` returns `Ok` and the commit succeeds.
    /// On error or panic the transaction is rolled back and the cached
    /// record is left as it was. If no record exists yet, the same
    /// transaction creates it from the draft.
    pub fn write<T, E>(&self, action: impl FnOnce(&mut Settings) -> Result<T, E>) -> Result<T, E>
    where
        E: From<SettingsError>,
    {
        let _writer = self.writer.lock();

        let existing = match self.cached_record() {
            Some(record) => Some(record),
            None => self
                .store
                .single_settings()
                .map_err(SettingsError::from)?
                .map(|stored| (stored.id, Arc::new(stored.settings))),
        };

        let (mut known_id, mut draft) = match existing {
            Some((id, settings)) => (Some(id), Settings::clone(&settings)),
            None => (None, Settings::default()),
        };

        let (id, value) = self
            .store
            .write(|txn| -> Result<(i64, T), Abort<E>> {
                // Another process may have created it since the read above
                if known_id.is_none() {
                    if let Some(stored) = txn.single_settings()? {
                        known_id = Some(stored.id);
                        draft = stored.settings;
                    }
                }

                let value = action(&mut draft).map_err(Abort::Action)?;

                let id = match known_id {
                    Some(id) => {
                        txn.update_settings(id, &draft)?;
                        id
                    }
                    None => {
                        let stored = txn.insert_settings(&draft)?;
                        log::info!("created settings record {}", stored.id);
                        stored.id
                    }
                };
                Ok((id, value))
            })
            .map_err(|abort| match abort {
                Abort::Action(e) => e,
                Abort::Store(e) => E::from(SettingsError::Store(e)),
            })?;

        *self.cached.write() = Some(Cached {
            id,
            settings: Arc::new(draft),
        });
        Ok(value)
    }

    fn cached_record(&self) -> Option<(i64, Arc<Settings>)> {
        self.cached
            .read()
            .as_ref()
            .map(|cached| (cached.id, Arc::clone(&cached.settings)))
    }

    /// Cache a freshly read record unless a writer or another reader got
    /// there first.
    fn install(&self, stored: StoredSettings) -> Arc<Settings> {
        let mut slot = self.cached.write();
        let cached = slot.get_or_insert_with(|| Cached {
            id: stored.id,
            settings: Arc::new(stored.settings),
        });
        Arc::clone(&cached.settings)
    }

    fn load_or_create(&self) -> Result<StoredSettings, SettingsError> {
        if let Some(stored) = self.store.single_settings()? {
            log::debug!("settings record {} loaded", stored.id);
            return Ok(stored);
        }

        let stored = self.store.write(|txn| -> Result<StoredSettings, StoreError> {
            // Another thread or process may have created it since the read above
            if let Some(stored) = txn.single_settings()? {
                return Ok(stored);
            }
            let stored = txn.insert_settings(&Settings::default())?;
            log::info!("created settings record {}", stored.id);
            Ok(stored)
        })?;
        Ok(stored)
    }
}

/// Why a cache write transaction was rolled back.
enum Abort<E> {
    Action(E),
    Store(StoreError),
}

impl<E> From<StoreError> for Abort<E> {
    fn from(e: StoreError) -> Self {
        Abort::Store(e)
    }
}
