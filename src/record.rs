//! Transaction domain record and patch types.

use serde::{Deserialize, Serialize};

use crate::types::{ActorId, BatchId};

/// Fully materialized supply-chain transaction.
///
/// Fields are declared in wire order; see [`crate::codec`] for the layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Unique identifier, also the address seed.
    pub transaction_id: String,
    /// Free-form category label such as `"purchase"` or `"sale"`.
    pub transaction_type: String,
    /// Source party.
    pub from_actor_id: ActorId,
    /// Destination party.
    pub to_actor_id: ActorId,
    /// Batches moved by this transaction, possibly none.
    pub batch_ids: Vec<BatchId>,
    /// Decimal quantity kept as text.
    pub quantity: String,
    /// Decimal unit price kept as text.
    pub unit_price: String,
    /// Decimal total kept as text.
    pub total_amount: String,
    /// Zero or more payment references.
    pub payment_reference: Vec<String>,
    /// ISO-8601 timestamp text.
    pub transaction_date: String,
    /// Lifecycle label, e.g. `"completed"` or `"pending"`.
    pub status: String,
    /// Free-text notes; `None` is distinct from `Some(String::new())`.
    pub notes: Option<String>,
}

impl TransactionRecord {
    /// Returns true when `actor` is either side of the transaction.
    pub fn involves_actor(&self, actor: ActorId) -> bool {
        self.from_actor_id == actor || self.to_actor_id == actor
    }
}

/// Replacement policy for [`TransactionRecord::notes`] inside a patch.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NotesPatch {
    /// Keep the existing notes.
    #[default]
    Keep,
    /// Remove the notes entirely.
    Clear,
    /// Replace the notes with this text.
    Set(String),
}

/// Sparse update where each `Some` field replaces the record value.
///
/// Applying a patch yields a new record; serialized records are never
/// patched in place.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TransactionPatch {
    /// Optional replacement quantity.
    pub quantity: Option<String>,
    /// Optional replacement unit price.
    pub unit_price: Option<String>,
    /// Optional replacement total.
    pub total_amount: Option<String>,
    /// Optional replacement payment references.
    pub payment_reference: Option<Vec<String>>,
    /// Optional replacement status label.
    pub status: Option<String>,
    /// Notes replacement policy.
    #[serde(default)]
    pub notes: NotesPatch,
}

impl TransactionPatch {
    /// Returns true when no fields are set.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Returns a copy of `rec` with this patch applied.
    pub fn apply(&self, rec: &TransactionRecord) -> TransactionRecord {
        let mut next = rec.clone();
        if let Some(v) = &self.quantity {
            next.quantity = v.clone();
        }
        if let Some(v) = &self.unit_price {
            next.unit_price = v.clone();
        }
        if let Some(v) = &self.total_amount {
            next.total_amount = v.clone();
        }
        if let Some(v) = &self.payment_reference {
            next.payment_reference = v.clone();
        }
        if let Some(v) = &self.status {
            next.status = v.clone();
        }
        match &self.notes {
            NotesPatch::Keep => {}
            NotesPatch::Clear => next.notes = None,
            NotesPatch::Set(v) => next.notes = Some(v.clone()),
        }
        next
    }
}

