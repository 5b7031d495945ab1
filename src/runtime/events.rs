//! Runtime event stream payloads.

use crate::types::{Address, WriteSeq};

/// Events emitted from the single-writer runtime loop.
///
/// A write's `Created` or `Replaced` event is always sent before the
/// `DurableUpTo` that covers it.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum LedgerEvent {
    /// A record was written to a new account.
    Created {
        address: Address,
        transaction_id: String,
    },
    Replaced { address: Address },
    /// Persistence has reached at least `seq`.
    DurableUpTo { seq: WriteSeq },
}
