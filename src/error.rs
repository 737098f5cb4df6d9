//! Error types for termwire.

use thiserror::Error;

/// Main error type for all termwire operations.
#[derive(Debug, Error)]
pub enum WireError {
    /// I/O error on the underlying stream (read or write side).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A term could not be encoded.
    #[error("encode error: {0}")]
    Encode(#[from] EncodeError),

    /// An inbound frame could not be decoded.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Encoded request exceeded the per-request size limit; nothing was written.
    #[error("encoded request is {size} bytes, limit is {limit}")]
    SizeLimit { size: usize, limit: usize },

    /// No matching response arrived within the call's timeout.
    #[error("call timed out")]
    Timeout,

    /// The caller cancelled the pending call.
    #[error("call cancelled")]
    Cancelled,

    /// The connection closed or failed while the call was outstanding.
    #[error("connection closed")]
    ConnectionClosed,

    /// Protocol violation (oversized frame, malformed reply shape, etc.).
    #[error("protocol error: {0}")]
    Protocol(String),
}

/// Result type alias using WireError.
pub type Result<T> = std::result::Result<T, WireError>;

/// Failures while encoding a term.
///
/// Well-typed terms almost always encode; these cover the limits of what the
/// wire format can represent.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// Atom text exceeds the 2-byte length field of the long atom tag.
    #[error("atom of {0} bytes exceeds the 65535-byte limit")]
    AtomTooLong(usize),

    /// Tuple arity or list length exceeds the 4-byte count field.
    #[error("collection of {0} elements exceeds the format's count field")]
    TooManyElements(usize),

    /// Term nesting exceeds the configured recursion bound.
    #[error("term nesting exceeds the configured depth limit")]
    DepthLimit,
}

/// Failures while decoding a byte buffer into a term.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The buffer does not start with the version marker byte.
    #[error("expected version byte 131, found {0}")]
    BadVersion(u8),

    /// A tag byte that does not select any known variant.
    #[error("unknown tag byte {0}")]
    UnknownTag(u8),

    /// The buffer ended before the current payload was complete.
    #[error("input truncated")]
    Truncated,

    /// A list whose elements are not followed by the nil terminator.
    #[error("improper list: missing nil terminator")]
    ImproperList,

    /// Bytes left over after the outermost term was decoded.
    #[error("{0} trailing bytes after term")]
    TrailingBytes(usize),

    /// Atom or string payload is not valid UTF-8.
    #[error("text payload is not valid UTF-8")]
    InvalidUtf8,

    /// Term nesting exceeds the configured recursion bound.
    #[error("term nesting exceeds the configured depth limit")]
    DepthLimit,

    /// An export whose module/function/arity fields have the wrong types.
    #[error("export fields have unexpected types")]
    MalformedExport,
}
