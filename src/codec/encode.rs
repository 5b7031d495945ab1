//! Record encoder.
//!
//! Layout, all integers little-endian:
//! - 8 bytes operation discriminator
//! - `transaction_id`, `transaction_type`: 4-byte length + UTF-8 bytes
//! - `from_actor_id`, `to_actor_id`: 8 bytes each
//! - `batch_ids`: 4-byte count + 8 bytes per element
//! - `quantity`, `unit_price`, `total_amount`: length-prefixed strings
//! - `payment_reference`: 4-byte count + length-prefixed strings
//! - `transaction_date`, `status`: length-prefixed strings
//! - `notes`: 1-byte tag (0 absent, 1 present) + length-prefixed string

use crate::record::TransactionRecord;

use super::error::EncodeError;
use super::layout::{
    DISCRIMINATOR_LEN, LEN_PREFIX_LEN, Method, OPTION_NONE, OPTION_SOME, OPTION_TAG_LEN, U64_LEN,
};

/// Encodes `record` behind the `create_transaction` discriminator.
pub fn encode(record: &TransactionRecord) -> Result<Vec<u8>, EncodeError> {
    encode_with(Method::CreateTransaction, record)
}

/// Encodes `record` behind the discriminator of `method`.
pub fn encode_with(method: Method, record: &TransactionRecord) -> Result<Vec<u8>, EncodeError> {
    let mut buf = Vec::with_capacity(encoded_len(record));
    encode_to(method, record, &mut buf)?;
    Ok(buf)
}

/// Appends the encoding of `record` to `buf`.
///
/// On error `buf` may hold a partial encoding and should be discarded.
pub fn encode_to(
    method: Method,
    record: &TransactionRecord,
    buf: &mut Vec<u8>,
) -> Result<(), EncodeError> {
    buf.extend_from_slice(&method.discriminator());
    put_str(buf, "transaction_id", &record.transaction_id)?;
    put_str(buf, "transaction_type", &record.transaction_type)?;
    put_u64(buf, record.from_actor_id);
    put_u64(buf, record.to_actor_id);

    put_len(buf, "batch_ids", record.batch_ids.len())?;
    for id in &record.batch_ids {
        put_u64(buf, *id);
    }

    put_str(buf, "quantity", &record.quantity)?;
    put_str(buf, "unit_price", &record.unit_price)?;
    put_str(buf, "total_amount", &record.total_amount)?;

    put_len(buf, "payment_reference", record.payment_reference.len())?;
    for reference in &record.payment_reference {
        put_str(buf, "payment_reference", reference)?;
    }

    put_str(buf, "transaction_date", &record.transaction_date)?;
    put_str(buf, "status", &record.status)?;

    match &record.notes {
        None => buf.push(OPTION_NONE),
        Some(notes) => {
            buf.push(OPTION_SOME);
            put_str(buf, "notes", notes)?;
        }
    }
    Ok(())
}

/// Exact byte length [`encode`] produces for `record`.
pub fn encoded_len(record: &TransactionRecord) -> usize {
    DISCRIMINATOR_LEN
        + str_len(&record.transaction_id)
        + str_len(&record.transaction_type)
        + 2 * U64_LEN
        + LEN_PREFIX_LEN
        + record.batch_ids.len() * U64_LEN
        + str_len(&record.quantity)
        + str_len(&record.unit_price)
        + str_len(&record.total_amount)
        + LEN_PREFIX_LEN
        + record
            .payment_reference
            .iter()
            .map(|r| str_len(r))
            .sum::<usize>()
        + str_len(&record.transaction_date)
        + str_len(&record.status)
        + OPTION_TAG_LEN
        + record.notes.as_deref().map(str_len).unwrap_or(0)
}

fn str_len(s: &str) -> usize {
    LEN_PREFIX_LEN + s.len()
}

fn put_len(buf: &mut Vec<u8>, field: &'static str, len: usize) -> Result<(), EncodeError> {
    let len32 = u32::try_from(len).map_err(|_| EncodeError::LengthOverflow { field, len })?;
    buf.extend_from_slice(&len32.to_le_bytes());
    Ok(())
}

fn put_str(buf: &mut Vec<u8>, field: &'static str, value: &str) -> Result<(), EncodeError> {
    let bytes = value.as_bytes();
    put_len(buf, field, bytes.len())?;
    buf.extend_from_slice(bytes);
    Ok(())
}

fn put_u64(buf: &mut Vec<u8>, value: u64) {
    buf.extend_from_slice(&value.to_le_bytes());
}
