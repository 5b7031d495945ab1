//! Record decoder for raw account bytes.

use tracing::debug;

use crate::record::TransactionRecord;

use super::error::DecodeError;
use super::layout::{
    DISCRIMINATOR_LEN, LEN_PREFIX_LEN, MIN_RECORD_LEN, OPTION_NONE, OPTION_SOME, OPTION_TAG_LEN,
    U64_LEN,
};
use super::legacy::parse_legacy;

/// Result of reading one account buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeOutcome {
    /// Every byte is zero: the account was never written.
    Absent,
    /// A complete record was recovered.
    Record(TransactionRecord),
    /// The buffer holds bytes that are not a record.
    Undecodable(DecodeError),
}

impl DecodeOutcome {
    /// Returns the decoded record, if any.
    pub fn into_record(self) -> Option<TransactionRecord> {
        match self {
            Self::Record(rec) => Some(rec),
            _ => None,
        }
    }

    /// Borrows the decoded record, if any.
    pub fn as_record(&self) -> Option<&TransactionRecord> {
        match self {
            Self::Record(rec) => Some(rec),
            _ => None,
        }
    }

    /// True for [`DecodeOutcome::Absent`].
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// True for [`DecodeOutcome::Undecodable`].
    pub fn is_undecodable(&self) -> bool {
        matches!(self, Self::Undecodable(_))
    }
}

/// Reads a record from account bytes.
///
/// Tries, in order: the all-zero check, the legacy JSON text form, then the
/// strict binary layout. Never panics and never returns a partial record.
pub fn decode(buf: &[u8]) -> DecodeOutcome {
    if is_uninitialized(buf) {
        return DecodeOutcome::Absent;
    }

    // Legacy text wins over binary when it yields a transaction_id.
    if let Some(rec) = parse_legacy(buf) {
        return DecodeOutcome::Record(rec);
    }

    match decode_strict(buf) {
        Ok(rec) => DecodeOutcome::Record(rec),
        Err(err) => {
            debug!(len = buf.len(), %err, "account bytes not decodable");
            DecodeOutcome::Undecodable(err)
        }
    }
}

/// True when `buf` is non-empty and every byte is zero.
pub fn is_uninitialized(buf: &[u8]) -> bool {
    !buf.is_empty() && buf.iter().all(|b| *b == 0)
}

/// Parses the binary layout only, skipping the discriminator unchecked.
///
/// Bytes after the final field are ignored.
pub fn decode_strict(buf: &[u8]) -> Result<TransactionRecord, DecodeError> {
    if buf.len() < MIN_RECORD_LEN {
        return Err(DecodeError::TooShort {
            len: buf.len(),
            min: MIN_RECORD_LEN,
        });
    }

    let mut r = Reader::new(buf);
    r.take(DISCRIMINATOR_LEN, "discriminator")?;

    let transaction_id = r.string("transaction_id")?;
    let transaction_type = r.string("transaction_type")?;
    let from_actor_id = r.u64("from_actor_id")?;
    let to_actor_id = r.u64("to_actor_id")?;

    let count = r.len_prefix("batch_ids")?;
    let mut batch_ids = Vec::with_capacity(count.min(r.remaining() / U64_LEN));
    for _ in 0..count {
        batch_ids.push(r.u64("batch_ids")?);
    }

    let quantity = r.string("quantity")?;
    let unit_price = r.string("unit_price")?;
    let total_amount = r.string("total_amount")?;

    let count = r.len_prefix("payment_reference")?;
    let mut payment_reference = Vec::with_capacity(count.min(r.remaining() / LEN_PREFIX_LEN));
    for _ in 0..count {
        payment_reference.push(r.string("payment_reference")?);
    }

    let transaction_date = r.string("transaction_date")?;
    let status = r.string("status")?;
    let notes = r.option_string("notes")?;

    Ok(TransactionRecord {
        transaction_id,
        transaction_type,
        from_actor_id,
        to_actor_id,
        batch_ids,
        quantity,
        unit_price,
        total_amount,
        payment_reference,
        transaction_date,
        status,
        notes,
    })
}

struct Reader<'a> {
    rest: &'a [u8],
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { rest: buf }
    }

    fn remaining(&self) -> usize {
        self.rest.len()
    }

    fn take(&mut self, n: usize, field: &'static str) -> Result<&'a [u8], DecodeError> {
        if self.rest.len() < n {
            return Err(DecodeError::TruncatedInput {
                field,
                needed: n,
                remaining: self.rest.len(),
            });
        }
        let (head, tail) = self.rest.split_at(n);
        self.rest = tail;
        Ok(head)
    }

    fn array<const N: usize>(&mut self, field: &'static str) -> Result<[u8; N], DecodeError> {
        let bytes = self.take(N, field)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    fn len_prefix(&mut self, field: &'static str) -> Result<usize, DecodeError> {
        let raw = self.array::<LEN_PREFIX_LEN>(field)?;
        Ok(u32::from_le_bytes(raw) as usize)
    }

    fn u64(&mut self, field: &'static str) -> Result<u64, DecodeError> {
        Ok(u64::from_le_bytes(self.array::<U64_LEN>(field)?))
    }

    fn string(&mut self, field: &'static str) -> Result<String, DecodeError> {
        let len = self.len_prefix(field)?;
        let bytes = self.take(len, field)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| DecodeError::InvalidUtf8 { field })
    }

    fn option_string(&mut self, field: &'static str) -> Result<Option<String>, DecodeError> {
        let tag = self.array::<OPTION_TAG_LEN>(field)?[0];
        match tag {
            OPTION_NONE => Ok(None),
            OPTION_SOME => self.string(field).map(Some),
            tag => Err(DecodeError::InvalidOptionTag { field, tag }),
        }
    }
}
