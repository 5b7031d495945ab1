//! In-memory account storage and index helpers.

/// Secondary index helpers.
pub mod indices;
/// Fixed-size account store.
pub mod store;
