use std::time::{SystemTime, UNIX_EPOCH};

use hashbrown::HashMap;
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    codec::{self, DecodeOutcome, EncodeError, Method},
    config::LedgerConfig,
    record::{TransactionPatch, TransactionRecord},
    resolve::{AddressResolver, ResolveError, ResolvedAddress},
    types::{ActorId, Address, BatchId, WriteSeq},
};

use super::indices::VecIndex;

/// Account store failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[allow(missing_docs)]
pub enum StoreError {
    /// The resolved account already holds data.
    #[error("account {0} already holds data")]
    AlreadyExists(Address),
    /// No account exists at the address.
    #[error("no account at {0}")]
    MissingAccount(Address),
    #[error("account {0} does not hold a decodable record")]
    NotDecodable(Address),
    /// A replacement record carries a different transaction id.
    #[error("account {address} holds {expected:?}, replacement is {actual:?}")]
    IdMismatch {
        address: Address,
        expected: String,
        actual: String,
    },
    /// The encoded record does not fit the fixed account size.
    #[error("record needs {needed} bytes but accounts hold {space}")]
    AccountTooSmall { needed: usize, space: usize },
    /// The record could not be encoded.
    #[error(transparent)]
    Encode(#[from] EncodeError),
    /// The address could not be resolved.
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    /// No write is available to undo.
    #[error("no write to undo")]
    NothingToUndo,
}

/// One full-buffer account write, as handed to persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountWrite {
    /// Monotonic write sequence.
    pub seq: WriteSeq,
    /// Write timestamp in milliseconds.
    pub ts_ms: u64,
    /// Account written.
    pub address: Address,
    /// Complete account contents after the write.
    pub data: Vec<u8>,
}

// Account contents before the most recent write.
#[derive(Debug)]
struct Undo {
    address: Address,
    previous: Option<Vec<u8>>,
    seq: WriteSeq,
}

/// In-memory map of fixed-size transaction accounts.
///
/// Every write replaces the whole buffer; bytes are never patched in place.
/// Writes are returned to the caller as [`AccountWrite`]s; the store keeps no
/// queue of them.
#[derive(Debug)]
pub struct AccountStore {
    config: LedgerConfig,
    accounts: HashMap<Address, Vec<u8>>,
    order: Vec<Address>,
    by_actor: VecIndex<ActorId>,
    by_batch: VecIndex<BatchId>,
    last_undo: Option<Undo>,
    next_seq: WriteSeq,
}

impl Default for AccountStore {
    fn default() -> Self {
        Self::new(LedgerConfig::default())
    }
}

impl AccountStore {
    /// Creates an empty store.
    pub fn new(config: LedgerConfig) -> Self {
        Self {
            config,
            accounts: HashMap::new(),
            order: Vec::new(),
            by_actor: VecIndex::new(),
            by_batch: VecIndex::new(),
            last_undo: None,
            next_seq: 1,
        }
    }

    /// Configuration the store was built with.
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Resolves the account for `record` and writes it there.
    ///
    /// An existing all-zero account is reused; any other existing content is
    /// rejected with [`StoreError::AlreadyExists`].
    pub fn create(
        &mut self,
        resolver: &dyn AddressResolver,
        record: &TransactionRecord,
    ) -> Result<(ResolvedAddress, AccountWrite), StoreError> {
        let resolved = self.resolve(resolver, &record.transaction_id)?;
        let address = resolved.address;
        if let Some(existing) = self.accounts.get(&address) {
            if !codec::is_uninitialized(existing) {
                return Err(StoreError::AlreadyExists(address));
            }
        }

        let data = self.account_bytes(Method::CreateTransaction, record)?;
        let write = self.write_account(address, data);
        debug!(%address, transaction_id = %record.transaction_id, seq = write.seq, "account created");
        Ok((resolved, write))
    }

    /// Rewrites the account at `address` with a newly encoded `record`.
    pub fn replace(
        &mut self,
        address: Address,
        record: &TransactionRecord,
    ) -> Result<AccountWrite, StoreError> {
        let current = self.decoded(address)?;
        if current.transaction_id != record.transaction_id {
            return Err(StoreError::IdMismatch {
                address,
                expected: current.transaction_id,
                actual: record.transaction_id.clone(),
            });
        }

        let data = self.account_bytes(Method::UpdateTransaction, record)?;
        let write = self.write_account(address, data);
        debug!(%address, seq = write.seq, "account replaced");
        Ok(write)
    }

    /// Applies `patch` to the stored record and writes the result.
    pub fn update(
        &mut self,
        address: Address,
        patch: &TransactionPatch,
    ) -> Result<(TransactionRecord, AccountWrite), StoreError> {
        let next = patch.apply(&self.decoded(address)?);
        let write = self.replace(address, &next)?;
        Ok((next, write))
    }

    /// Stores raw account bytes as-is, e.g. imported fixtures.
    pub fn insert_raw(&mut self, address: Address, data: Vec<u8>) -> AccountWrite {
        self.write_account(address, data)
    }

    /// Applies a write read back from persistence without re-queuing it.
    pub fn apply_replayed_write(&mut self, write: AccountWrite) {
        self.next_seq = self.next_seq.max(write.seq.saturating_add(1));
        self.last_undo = None;
        self.put_account(write.address, write.data);
    }

    /// Reverts the most recent write and gives its sequence number back.
    ///
    /// Only one write can be undone; replayed writes cannot.
    pub fn undo_last_write(&mut self) -> Result<Address, StoreError> {
        let undo = self.last_undo.take().ok_or(StoreError::NothingToUndo)?;
        match undo.previous {
            Some(data) => self.put_account(undo.address, data),
            None => self.remove_account(undo.address),
        }
        self.next_seq = undo.seq;
        debug!(address = %undo.address, seq = undo.seq, "account write undone");
        Ok(undo.address)
    }

    /// Decodes the account at `address`; `None` when no account exists.
    pub fn read(&self, address: Address) -> Option<DecodeOutcome> {
        self.accounts.get(&address).map(|data| codec::decode(data))
    }

    /// Returns the record at `address` when it decodes.
    pub fn get(&self, address: Address) -> Option<TransactionRecord> {
        self.read(address).and_then(DecodeOutcome::into_record)
    }

    /// Raw account bytes.
    pub fn raw(&self, address: Address) -> Option<&[u8]> {
        self.accounts.get(&address).map(Vec::as_slice)
    }

    /// Resolves `transaction_id` and returns the record stored there.
    pub fn find_by_transaction_id(
        &self,
        resolver: &dyn AddressResolver,
        transaction_id: &str,
    ) -> Result<Option<(Address, TransactionRecord)>, StoreError> {
        let address = self.resolve(resolver, transaction_id)?.address;
        Ok(self.get(address).map(|rec| (address, rec)))
    }

    /// Every decodable record in first-write order.
    ///
    /// Absent accounts are skipped silently, undecodable ones with a warning.
    pub fn scan(&self) -> Vec<(Address, TransactionRecord)> {
        self.order
            .iter()
            .filter_map(|address| match self.read(*address)? {
                DecodeOutcome::Record(rec) => Some((*address, rec)),
                DecodeOutcome::Absent => None,
                DecodeOutcome::Undecodable(err) => {
                    warn!(%address, %err, "skipping undecodable account");
                    None
                }
            })
            .collect()
    }

    /// Records where `actor` is sender or receiver.
    pub fn by_actor(&self, actor: ActorId) -> Vec<(Address, TransactionRecord)> {
        self.collect_index(self.by_actor.get(&actor))
    }

    /// Records that move `batch`.
    pub fn by_batch(&self, batch: BatchId) -> Vec<(Address, TransactionRecord)> {
        self.collect_index(self.by_batch.get(&batch))
    }

    /// Account addresses in first-write order.
    pub fn addresses(&self) -> &[Address] {
        &self.order
    }

    /// Number of accounts, decodable or not.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// True when the store holds no accounts.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Sequence of the most recent write, 0 when none.
    pub fn latest_seq(&self) -> WriteSeq {
        self.next_seq.saturating_sub(1)
    }

    fn resolve(
        &self,
        resolver: &dyn AddressResolver,
        transaction_id: &str,
    ) -> Result<ResolvedAddress, StoreError> {
        Ok(resolver.resolve_transaction(
            &self.config.namespace,
            transaction_id,
            &self.config.program_id,
        )?)
    }

    fn decoded(&self, address: Address) -> Result<TransactionRecord, StoreError> {
        match self.read(address) {
            None => Err(StoreError::MissingAccount(address)),
            Some(DecodeOutcome::Record(rec)) => Ok(rec),
            Some(_) => Err(StoreError::NotDecodable(address)),
        }
    }

    fn account_bytes(
        &self,
        method: Method,
        record: &TransactionRecord,
    ) -> Result<Vec<u8>, StoreError> {
        let space = self.config.account_space;
        let needed = codec::encoded_len(record);
        if needed > space {
            return Err(StoreError::AccountTooSmall { needed, space });
        }
        let mut data = codec::encode_with(method, record)?;
        data.resize(space, 0);
        Ok(data)
    }

    fn write_account(&mut self, address: Address, data: Vec<u8>) -> AccountWrite {
        let seq = self.next_seq;
        self.next_seq += 1;
        let write = AccountWrite {
            seq,
            ts_ms: now_ms(),
            address,
            data: data.clone(),
        };
        let previous = self.accounts.get(&address).cloned();
        self.last_undo = Some(Undo {
            address,
            previous,
            seq,
        });
        self.put_account(address, data);
        write
    }

    fn remove_account(&mut self, address: Address) {
        let Some(data) = self.accounts.remove(&address) else {
            return;
        };
        if let Some(rec) = codec::decode(&data).into_record() {
            self.remove_indices(address, &rec);
        }
        self.order.retain(|a| *a != address);
    }

    fn put_account(&mut self, address: Address, data: Vec<u8>) {
        if let Some(old) = self.accounts.get(&address).and_then(|d| codec::decode(d).into_record()) {
            self.remove_indices(address, &old);
        } else if !self.accounts.contains_key(&address) {
            self.order.push(address);
        }

        if let Some(rec) = codec::decode(&data).into_record() {
            self.insert_indices(address, &rec);
        }
        self.accounts.insert(address, data);
    }

    fn insert_indices(&mut self, address: Address, rec: &TransactionRecord) {
        self.by_actor.add(rec.from_actor_id, address);
        if rec.to_actor_id != rec.from_actor_id {
            self.by_actor.add(rec.to_actor_id, address);
        }
        for batch in &rec.batch_ids {
            self.by_batch.add(*batch, address);
        }
    }

    fn remove_indices(&mut self, address: Address, rec: &TransactionRecord) {
        self.by_actor.remove(rec.from_actor_id, address);
        self.by_actor.remove(rec.to_actor_id, address);
        for batch in &rec.batch_ids {
            self.by_batch.remove(*batch, address);
        }
    }

    fn collect_index(&self, addresses: Option<&Vec<Address>>) -> Vec<(Address, TransactionRecord)> {
        addresses
            .into_iter()
            .flatten()
            .filter_map(|address| self.get(*address).map(|rec| (*address, rec)))
            .collect()
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
