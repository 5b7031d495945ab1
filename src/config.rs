//! Ledger configuration.

use std::env;

use thiserror::Error;

use crate::types::{Address, AddressParseError};

/// Default seed namespace for transaction accounts.
pub const DEFAULT_NAMESPACE: &str = "transaction";
/// Default fixed account size in bytes.
pub const DEFAULT_ACCOUNT_SPACE: usize = 1000;

/// Settings shared by the account store and its callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerConfig {
    /// Program that owns every transaction account.
    pub program_id: Address,
    /// First address seed; the transaction id is the second.
    pub namespace: String,
    /// Fixed size of each account buffer.
    pub account_space: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            program_id: Address::default(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            account_space: DEFAULT_ACCOUNT_SPACE,
        }
    }
}

/// Invalid environment configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// `PROGRAM_ID` is not a 32-byte hex address.
    #[error("PROGRAM_ID: {0}")]
    ProgramId(#[from] AddressParseError),
    /// `ACCOUNT_SPACE` is not a positive integer.
    #[error("ACCOUNT_SPACE: {0:?} is not a positive integer")]
    AccountSpace(String),
}

impl LedgerConfig {
    /// Builds a config from `PROGRAM_ID`, `LEDGER_NAMESPACE` and
    /// `ACCOUNT_SPACE`, falling back to defaults for unset variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`LedgerConfig::from_env`] with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut cfg = Self::default();
        if let Some(v) = lookup("PROGRAM_ID") {
            cfg.program_id = v.parse()?;
        }
        if let Some(v) = lookup("LEDGER_NAMESPACE") {
            cfg.namespace = v;
        }
        if let Some(v) = lookup("ACCOUNT_SPACE") {
            let space = v.trim().parse::<usize>().ok().filter(|n| *n > 0);
            cfg.account_space = space.ok_or(ConfigError::AccountSpace(v))?;
        }
        Ok(cfg)
    }
}
