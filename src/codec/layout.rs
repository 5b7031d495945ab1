//! Field layout constants and the operation discriminator table.

use sha2::{Digest, Sha256};

/// Discriminator prefix length in bytes.
pub const DISCRIMINATOR_LEN: usize = 8;
/// Width of every string length and collection count prefix.
pub const LEN_PREFIX_LEN: usize = 4;
/// Width of an encoded `u64`.
pub const U64_LEN: usize = 8;
/// Width of the `Option` presence tag.
pub const OPTION_TAG_LEN: usize = 1;

/// `Option` tag for an absent value.
pub const OPTION_NONE: u8 = 0;
/// `Option` tag for a present value.
pub const OPTION_SOME: u8 = 1;

/// Smallest buffer that can hold a binary record: discriminator, nine empty
/// length-prefixed fields, two ids and an absent `notes` tag.
pub const MIN_RECORD_LEN: usize =
    DISCRIMINATOR_LEN + 9 * LEN_PREFIX_LEN + 2 * U64_LEN + OPTION_TAG_LEN;

/// Eight-byte operation discriminator.
pub type Discriminator = [u8; DISCRIMINATOR_LEN];

/// Namespace used when hashing instruction names into discriminators.
pub const INSTRUCTION_NAMESPACE: &str = "global";

/// On-chain operation a payload encodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// Write a record into a freshly allocated account.
    CreateTransaction,
    /// Write a record into an existing, reused account.
    AddTransaction,
    /// Rewrite the record held by an account.
    UpdateTransaction,
}

/// Operation name, method and discriminator, one row per operation.
///
/// Each value is the first eight bytes of `sha256("global:<name>")`.
pub const DISCRIMINATORS: [(&str, Method, Discriminator); 3] = [
    (
        "create_transaction",
        Method::CreateTransaction,
        [227, 193, 53, 239, 55, 126, 112, 105],
    ),
    (
        "add_transaction",
        Method::AddTransaction,
        [48, 96, 174, 112, 81, 30, 239, 89],
    ),
    (
        "update_transaction",
        Method::UpdateTransaction,
        [251, 71, 35, 36, 240, 56, 180, 103],
    ),
];

impl Method {
    /// Snake-case operation name.
    pub fn name(self) -> &'static str {
        self.row().0
    }

    /// Discriminator written ahead of the record fields.
    pub fn discriminator(self) -> Discriminator {
        self.row().2
    }

    /// Looks up a method by its operation name.
    pub fn from_name(name: &str) -> Option<Self> {
        DISCRIMINATORS
            .iter()
            .find(|(n, _, _)| *n == name)
            .map(|(_, m, _)| *m)
    }

    /// Looks up a method by the leading bytes of a payload.
    pub fn from_discriminator(bytes: &[u8]) -> Option<Self> {
        let head = bytes.get(..DISCRIMINATOR_LEN)?;
        DISCRIMINATORS
            .iter()
            .find(|(_, _, d)| d.as_slice() == head)
            .map(|(_, m, _)| *m)
    }

    fn row(self) -> (&'static str, Method, Discriminator) {
        match self {
            Method::CreateTransaction => DISCRIMINATORS[0],
            Method::AddTransaction => DISCRIMINATORS[1],
            Method::UpdateTransaction => DISCRIMINATORS[2],
        }
    }
}

/// Computes `sha256("<namespace>:<name>")[..8]`.
pub fn derive_discriminator(namespace: &str, name: &str) -> Discriminator {
    let digest = Sha256::new()
        .chain_update(namespace.as_bytes())
        .chain_update(b":")
        .chain_update(name.as_bytes())
        .finalize();
    let mut out = [0u8; DISCRIMINATOR_LEN];
    out.copy_from_slice(&digest[..DISCRIMINATOR_LEN]);
    out
}
