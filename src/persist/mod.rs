//! Persistence abstraction and SQLite implementation.

/// SQLite-backed account sink.
pub mod sqlite;

use thiserror::Error;

use crate::{account::store::AccountWrite, types::WriteSeq};

/// Persistence failures.
#[derive(Debug, Error)]
pub enum PersistError {
    /// SQLite reported an error.
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// Any other persistence failure.
    #[error("{0}")]
    Message(String),
}

/// Result alias for persistence calls.
pub type PersistResult<T> = Result<T, PersistError>;

/// Destination for whole-account writes.
pub trait AccountSink: Send {
    /// Stores `writes` in order and returns the last sequence stored.
    fn put_accounts(&mut self, writes: &[AccountWrite]) -> PersistResult<WriteSeq>;

    /// Makes previously stored writes durable.
    fn flush(&mut self) -> PersistResult<()> {
        Ok(())
    }
}
