//! Storage address resolution.
//!
//! Address derivation belongs to the chain SDK; the ledger only needs the
//! [`AddressResolver`] seam. [`HashedResolver`] is a deterministic local
//! stand-in for tests and offline stores. It hashes the same seeds but does
//! not perform the SDK's off-curve search, so its addresses are not chain
//! addresses.

use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::types::{Address, Bump};

/// Maximum byte length of a single seed.
pub const MAX_SEED_LEN: usize = 32;
/// Maximum number of seeds per derivation.
pub const MAX_SEEDS: usize = 16;

const DERIVATION_MARKER: &[u8] = b"ProgramDerivedAddress";

/// Address plus the bump value used to reach it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub struct ResolvedAddress {
    pub address: Address,
    /// Bump/salt returned by the resolver.
    pub bump: Bump,
}

/// Seed validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[allow(missing_docs)]
pub enum ResolveError {
    /// Seed number `index` is longer than [`MAX_SEED_LEN`].
    #[error("seed {index} is {len} bytes, max {MAX_SEED_LEN}")]
    SeedTooLong { index: usize, len: usize },
    #[error("{0} seeds supplied, max {MAX_SEEDS}")]
    TooManySeeds(usize),
}

/// Maps seeds and a program identifier to a storage address.
pub trait AddressResolver: Send + Sync {
    /// Resolves the address for `seeds` under `program_id`.
    fn resolve(&self, seeds: &[&[u8]], program_id: &Address) -> Result<ResolvedAddress, ResolveError>;

    /// Resolves the account holding the record for `transaction_id`.
    fn resolve_transaction(
        &self,
        namespace: &str,
        transaction_id: &str,
        program_id: &Address,
    ) -> Result<ResolvedAddress, ResolveError> {
        self.resolve(&[namespace.as_bytes(), transaction_id.as_bytes()], program_id)
    }
}

/// Deterministic SHA-256 resolver, always using bump 255.
#[derive(Debug, Clone, Copy, Default)]
pub struct HashedResolver;

impl AddressResolver for HashedResolver {
    fn resolve(&self, seeds: &[&[u8]], program_id: &Address) -> Result<ResolvedAddress, ResolveError> {
        validate_seeds(seeds)?;
        let bump: Bump = u8::MAX;
        let mut hasher = Sha256::new();
        for seed in seeds {
            hasher.update(seed);
        }
        hasher.update([bump]);
        hasher.update(program_id.as_bytes());
        hasher.update(DERIVATION_MARKER);
        let address = Address::new(hasher.finalize().into());
        Ok(ResolvedAddress { address, bump })
    }
}

/// Checks seed count and lengths against the derivation limits.
pub fn validate_seeds(seeds: &[&[u8]]) -> Result<(), ResolveError> {
    if seeds.len() > MAX_SEEDS {
        return Err(ResolveError::TooManySeeds(seeds.len()));
    }
    for (index, seed) in seeds.iter().enumerate() {
        if seed.len() > MAX_SEED_LEN {
            return Err(ResolveError::SeedTooLong {
                index,
                len: seed.len(),
            });
        }
    }
    Ok(())
}
