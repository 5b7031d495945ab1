//! Shared primitive IDs and the storage address type.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Supply-chain party identifier.
///
/// Identifiers are kept as full `u64` values end to end; nothing in the codec
/// narrows them.
pub type ActorId = u64;
/// Rice batch identifier.
pub type BatchId = u64;
/// Monotonic account write sequence number.
pub type WriteSeq = u64;
/// Bump/salt value returned alongside a resolved address.
pub type Bump = u8;

/// Byte length of an [`Address`].
pub const ADDRESS_LEN: usize = 32;

/// 32-byte storage location of an account, or a program identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Address(pub [u8; ADDRESS_LEN]);

impl Address {
    /// Wraps raw address bytes.
    pub const fn new(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    /// Returns the raw address bytes.
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    /// Builds an address from a slice, failing unless it is exactly 32 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, AddressParseError> {
        let arr: [u8; ADDRESS_LEN] = bytes
            .try_into()
            .map_err(|_| AddressParseError::Length(bytes.len()))?;
        Ok(Self(arr))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s.trim())?;
        Self::from_slice(&bytes)
    }
}

/// Failure to parse an [`Address`] from text or bytes.
#[derive(Debug, thiserror::Error)]
pub enum AddressParseError {
    /// Input was not valid hex.
    #[error("invalid address hex: {0}")]
    Hex(#[from] hex::FromHexError),
    /// Input decoded to the wrong number of bytes.
    #[error("address must be {ADDRESS_LEN} bytes, got {0}")]
    Length(usize),
}
