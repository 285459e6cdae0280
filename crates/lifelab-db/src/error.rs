//! Error types for the data layer.
//!
//! All errors are propagated via [`DbError`] which wraps the underlying
//! [`sqlx`] errors. At the store-trait boundary they become
//! [`StoreError::Storage`] unless they carry a domain meaning of their own
//! (missing rows, duplicate generations).

use lifelab_core::store::StoreError;

/// Errors that can occur in the data layer.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A `PostgreSQL` operation failed.
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    /// A `PostgreSQL` migration failed.
    #[error("PostgreSQL migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A stored row could not be mapped back to a domain record.
    #[error("Invalid row: {0}")]
    InvalidRow(String),
}

impl From<DbError> for StoreError {
    fn from(err: DbError) -> Self {
        Self::storage(err)
    }
}

/// Map a raw `sqlx` failure to a [`StoreError`].
pub(crate) fn storage(err: sqlx::Error) -> StoreError {
    DbError::from(err).into()
}
