//! Transaction record codec.
//!
//! [`encode`] writes an operation discriminator followed by every
//! [`TransactionRecord`](crate::record::TransactionRecord) field in wire order.
//! [`decode`] reads account bytes back into one of three
//! [`DecodeOutcome`]s and never panics on short, zeroed or foreign input.
//!
//! ```
//! use riceledger::codec::{decode, encode, DecodeOutcome};
//! use riceledger::record::TransactionRecord;
//!
//! let rec = TransactionRecord {
//!     transaction_id: "TXN-1".to_string(),
//!     transaction_type: "sale".to_string(),
//!     from_actor_id: 1,
//!     to_actor_id: 2,
//!     batch_ids: vec![1],
//!     quantity: "500.00".to_string(),
//!     unit_price: "2.50".to_string(),
//!     total_amount: "1250.00".to_string(),
//!     payment_reference: vec!["PAY-1".to_string()],
//!     transaction_date: "2024-07-21T10:00:00Z".to_string(),
//!     status: "completed".to_string(),
//!     notes: None,
//! };
//! let bytes = encode(&rec).expect("encode");
//! assert_eq!(decode(&bytes), DecodeOutcome::Record(rec));
//! assert_eq!(decode(&[0u8; 64]), DecodeOutcome::Absent);
//! assert!(decode(&bytes[..7]).is_undecodable());
//! ```

mod decode;
mod encode;
mod error;
/// Wire layout constants and discriminator table.
pub mod layout;
mod legacy;

pub use decode::{DecodeOutcome, decode, decode_strict, is_uninitialized};
pub use encode::{encode, encode_to, encode_with, encoded_len};
pub use error::{DecodeError, EncodeError};
pub use layout::{Discriminator, Method};
pub use legacy::parse_legacy;
