use thiserror::Error;

/// Reasons an encode call refuses to produce bytes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[allow(missing_docs)]
pub enum EncodeError {
    /// A string or collection of `len` bytes or elements does not fit the
    /// 4-byte length prefix.
    #[error("field `{field}` length {len} exceeds the u32 length prefix")]
    LengthOverflow { field: &'static str, len: usize },
}

/// Reasons a non-zero buffer could not be read as a record.
///
/// `field` is always the wire field being read when the failure happened.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[allow(missing_docs)]
pub enum DecodeError {
    /// Buffer is shorter than the smallest possible record.
    #[error("buffer of {len} bytes is shorter than the {min}-byte minimum record")]
    TooShort { len: usize, min: usize },
    /// A prefix or payload needs more bytes than remain in the buffer.
    #[error("truncated input reading `{field}`: needed {needed} bytes, {remaining} remaining")]
    TruncatedInput {
        field: &'static str,
        needed: usize,
        remaining: usize,
    },
    #[error("field `{field}` is not valid UTF-8")]
    InvalidUtf8 { field: &'static str },
    /// The `notes` presence tag was neither 0 nor 1.
    #[error("invalid option tag {tag} for `{field}`")]
    InvalidOptionTag { field: &'static str, tag: u8 },
}
