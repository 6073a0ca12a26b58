use drawx_store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// `update_credentials` was given a blank host
    #[error("server host must not be empty")]
    EmptyServerHost,
    /// Store open, read, or write transaction failed
    #[error(transparent)]
    Store(#[from] StoreError),
}
