use thiserror::Error;

/// Main error type for BER encoding and decoding operations
#[derive(Error, Debug)]
pub enum BerError {
    /// Fewer bytes remain than needed to decode an identifier, a length,
    /// or the announced content.
    #[error("short buffer")]
    ShortBuffer,

    #[error("invalid length: {0}")]
    InvalidLength(String),

    /// A primitive operation was given an identifier with the constructed
    /// bit set.
    #[error("{0}: encoding shall be primitive")]
    ExpectedPrimitive(&'static str),

    /// A constructed operation encountered a primitive header.
    #[error("{0}: encoding shall be constructed")]
    ExpectedConstructed(&'static str),

    /// Content length differs from the length the type requires
    /// (NULL must be empty, BOOLEAN must be a single byte).
    #[error("length mismatch: expected {expected} bytes, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    /// A restricted string contains code points outside its alphabet,
    /// or text content is not well-formed UTF-8.
    #[error("invalid character: {0}")]
    InvalidCharacter(String),

    /// A time value lies outside the range its tag can represent.
    #[error("time out of range: {0}")]
    InvalidTimeRange(String),

    /// The identifier is not one of UTCTime, GeneralizedTime or Integer.
    #[error("identifier not valid for time encoding")]
    InvalidTimeIdent,

    /// A decoder advanced past the length declared by the enclosing
    /// constructed value.
    #[error("read past the enclosing constructed length")]
    OverConsume,

    #[error("invalid annotation: {0}")]
    InvalidAnnotation(String),

    #[error("invalid object identifier: {0}")]
    InvalidOid(String),

    /// REAL encodings only support base 2 (binary) and base 10 (decimal).
    #[error("unsupported real base {0}")]
    UnsupportedRealBase(u32),

    /// The first content byte of a REAL matches no known sub-format.
    #[error("invalid real subtype {0:#04x}")]
    InvalidFloatSubtype(u8),

    /// Decoding was asked to produce a shape the input cannot fill.
    #[error("cannot decode into {0}")]
    UnmarshalTarget(String),
}

/// Result type alias for BER operations
pub type BerResult<T> = Result<T, BerError>;
