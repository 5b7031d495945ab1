//! SQLite-backed account sink.

use std::path::Path;

use rusqlite::{Connection, OptionalExtension, params};

use crate::{
    account::store::{AccountStore, AccountWrite},
    config::LedgerConfig,
    types::{Address, WriteSeq},
};

use super::{AccountSink, PersistResult};

/// SQLite implementation of [`crate::persist::AccountSink`].
///
/// Keeps the latest bytes of every account, keyed by address.
pub struct SqliteAccountSink {
    conn: Connection,
}

impl SqliteAccountSink {
    /// Opens or creates a SQLite-backed sink at `path`.
    ///
    /// Enables WAL mode and sets `synchronous=NORMAL`.
    pub fn open(path: impl AsRef<Path>) -> PersistResult<Self> {
        let conn = Connection::open(path)?;
        Self::init_connection(conn)
    }

    /// Opens an in-memory SQLite sink.
    pub fn open_in_memory() -> PersistResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_connection(conn)
    }

    fn init_connection(conn: Connection) -> PersistResult<Self> {
        conn.execute_batch(include_str!("schema.sql"))?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        Ok(Self { conn })
    }

    /// Rebuilds an [`AccountStore`] from every stored account.
    pub fn load_store(&self, config: LedgerConfig) -> PersistResult<AccountStore> {
        let mut store = AccountStore::new(config);
        for write in self.load_accounts()? {
            store.apply_replayed_write(write);
        }
        Ok(store)
    }

    /// Loads the latest write of every account in first-write order.
    pub fn load_accounts(&self) -> PersistResult<Vec<AccountWrite>> {
        let mut stmt = self
            .conn
            .prepare("SELECT address, seq, ts_ms, data FROM accounts ORDER BY first_seq ASC")?;

        let rows = stmt.query_map([], |row| {
            let raw: Vec<u8> = row.get(0)?;
            let address = Address::from_slice(&raw).map_err(|err| {
                rusqlite::Error::FromSqlConversionFailure(
                    raw.len(),
                    rusqlite::types::Type::Blob,
                    Box::new(err),
                )
            })?;
            let seq: i64 = row.get(1)?;
            let ts_ms: i64 = row.get(2)?;
            let data: Vec<u8> = row.get(3)?;
            Ok(AccountWrite {
                seq: seq as WriteSeq,
                ts_ms: ts_ms as u64,
                address,
                data,
            })
        })?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Returns the latest write sequence stored.
    pub fn latest_seq(&self) -> PersistResult<WriteSeq> {
        let seq: Option<i64> = self
            .conn
            .query_row("SELECT MAX(seq) FROM accounts", [], |row| row.get(0))
            .optional()?
            .flatten();
        Ok(seq.unwrap_or(0) as WriteSeq)
    }

    /// Number of stored accounts.
    pub fn account_count(&self) -> PersistResult<usize> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM accounts", [], |row| row.get(0))?;
        Ok(n as usize)
    }
}

impl AccountSink for SqliteAccountSink {
    fn put_accounts(&mut self, writes: &[AccountWrite]) -> PersistResult<WriteSeq> {
        if writes.is_empty() {
            return self.latest_seq();
        }

        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO accounts(address, first_seq, seq, ts_ms, data) VALUES (?1, ?2, ?2, ?3, ?4)
                 ON CONFLICT(address) DO UPDATE SET seq = excluded.seq, ts_ms = excluded.ts_ms, data = excluded.data",
            )?;
            for write in writes {
                stmt.execute(params![
                    write.address.as_bytes().as_slice(),
                    write.seq as i64,
                    write.ts_ms as i64,
                    write.data,
                ])?;
            }
        }
        tx.commit()?;

        Ok(writes.last().map(|w| w.seq).unwrap_or(0))
    }

    fn flush(&mut self) -> PersistResult<()> {
        self.conn.execute_batch("PRAGMA wal_checkpoint(PASSIVE);")?;
        Ok(())
    }
}
