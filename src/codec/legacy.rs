//! Legacy JSON text records.
//!
//! Early fixtures wrote the record as a JSON object straight into the account
//! and relied on zero padding after it. Those objects are loosely typed: list
//! fields may be missing, decimals may be numbers, and `payment_reference` or
//! `status` may be numeric codes.

use serde_json::{Map, Value};
use tracing::debug;

use crate::record::TransactionRecord;

/// Parses NUL-stripped `buf` as a legacy JSON record.
///
/// Returns `None` unless the text is a JSON object with a `transaction_id`
/// key. Once that key is present the object is taken as the record: a
/// numeric id becomes text and any other field that cannot be read falls
/// back to its default.
pub fn parse_legacy(buf: &[u8]) -> Option<TransactionRecord> {
    let first = buf.iter().find(|b| **b != 0 && !b.is_ascii_whitespace())?;
    if *first != b'{' {
        return None;
    }

    let text: Vec<u8> = buf.iter().copied().filter(|b| *b != 0).collect();
    let value: Value = serde_json::from_slice(&text).ok()?;
    let object = value.as_object()?;
    let id = object.get("transaction_id")?;

    let fields = Fields(object);
    Some(TransactionRecord {
        transaction_id: fields.or_default("transaction_id", loose_text(id)),
        transaction_type: fields.text("transaction_type"),
        from_actor_id: fields.id("from_actor_id"),
        to_actor_id: fields.id("to_actor_id"),
        batch_ids: fields.read("batch_ids", |v| one_or_many(v, loose_id)),
        quantity: fields.text("quantity"),
        unit_price: fields.text("unit_price"),
        total_amount: fields.text("total_amount"),
        payment_reference: fields.read("payment_reference", |v| one_or_many(v, loose_text)),
        transaction_date: fields.text("transaction_date"),
        status: fields.read("status", status),
        notes: fields.read("notes", |v| loose_text(v).map(Some)),
    })
}

struct Fields<'a>(&'a Map<String, Value>);

impl Fields<'_> {
    // Missing and null fields take the default silently.
    fn read<T: Default>(&self, field: &'static str, read: impl Fn(&Value) -> Option<T>) -> T {
        match self.0.get(field) {
            None | Some(Value::Null) => T::default(),
            Some(v) => self.or_default(field, read(v)),
        }
    }

    fn or_default<T: Default>(&self, field: &'static str, value: Option<T>) -> T {
        value.unwrap_or_else(|| {
            debug!(field, "unreadable legacy field, using default");
            T::default()
        })
    }

    fn text(&self, field: &'static str) -> String {
        self.read(field, loose_text)
    }

    fn id(&self, field: &'static str) -> u64 {
        self.read(field, loose_id)
    }
}

fn loose_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Null => Some(String::new()),
        _ => None,
    }
}

fn loose_id(v: &Value) -> Option<u64> {
    match v {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn one_or_many<T>(v: &Value, read: impl Fn(&Value) -> Option<T>) -> Option<Vec<T>> {
    match v {
        Value::Array(items) => items.iter().map(read).collect(),
        other => read(other).map(|item| vec![item]),
    }
}

// Numeric status codes: 0 cancelled, 1 completed, 2 pending.
fn status(v: &Value) -> Option<String> {
    match v {
        Value::Number(n) => Some(match n.as_u64() {
            Some(0) => "cancelled".to_string(),
            Some(1) => "completed".to_string(),
            Some(2) => "pending".to_string(),
            _ => n.to_string(),
        }),
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}
