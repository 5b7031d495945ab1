//! Rice supply-chain transaction records in fixed-size account buffers.
//!
//! The core is [`codec`], which encodes a [`record::TransactionRecord`] behind
//! an operation discriminator and decodes raw, possibly zeroed or truncated
//! account bytes without panicking. [`account`], [`persist`] and [`runtime`]
//! layer a local account store, SQLite journaling and a single-writer task on
//! top of it.
//!
//! # Examples
//!
//! In-memory usage with [`account::store::AccountStore`]:
//! ```
//! use riceledger::{
//!     account::store::AccountStore,
//!     config::LedgerConfig,
//!     record::TransactionRecord,
//!     resolve::HashedResolver,
//! };
//!
//! let mut store = AccountStore::new(LedgerConfig::default());
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
//! let (resolved, _write) = store.create(&HashedResolver, &rec).expect("create");
//! assert_eq!(store.get(resolved.address), Some(rec));
//! ```
//!
//! Runtime usage with SQLite sink:
//! ```no_run
//! use std::sync::Arc;
//!
//! use riceledger::{
//!     config::LedgerConfig,
//!     persist::sqlite::SqliteAccountSink,
//!     resolve::HashedResolver,
//!     runtime::handle::{spawn_ledger, RuntimeConfig},
//! };
//!
//! # #[tokio::main]
//! # async fn main() {
//! let sink = SqliteAccountSink::open("accounts.db").expect("open sqlite");
//! let store = sink.load_store(LedgerConfig::default()).expect("load");
//! let handle = spawn_ledger(store, Arc::new(HashedResolver), Some(Box::new(sink)), RuntimeConfig::default());
//! for (address, rec) in handle.scan().await.expect("scan") {
//!     println!("{address} {}", rec.transaction_id);
//! }
//! handle.shutdown().await.expect("shutdown");
//! # }
//! ```
#![deny(missing_docs)]

/// In-memory account store and index helpers.
pub mod account;
/// Binary record codec.
pub mod codec;
/// Ledger configuration.
pub mod config;
/// Persistence abstraction and SQLite implementation.
pub mod persist;
/// Transaction records and patches.
pub mod record;
/// Address resolution seam.
pub mod resolve;
/// Single-writer runtime handle and events.
pub mod runtime;
/// Shared primitive types.
pub mod types;
