use bstr::BString;
use thiserror::Error;

use crate::sink::Pool;

/// A failed decode: what went wrong and where.
///
/// `offset` is a byte offset into the buffer handed to the decoder, so a
/// syntax error inside the JSON chunk of a container points past the
/// 20-byte container preamble.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{source} at byte {offset}")]
pub struct DecodeError {
    pub(crate) source: ErrorSource,
    pub(crate) offset: usize,
}

impl DecodeError {
    pub(crate) fn new(source: impl Into<ErrorSource>, offset: usize) -> Self {
        Self {
            source: source.into(),
            offset,
        }
    }

    /// The kind of failure.
    #[must_use]
    pub fn cause(&self) -> &ErrorSource {
        &self.source
    }

    /// Byte offset into the input buffer where the failure was detected.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ErrorSource {
    #[error("format error: {0}")]
    Format(#[from] FormatError),
    #[error("syntax error: {0}")]
    Syntax(#[from] SyntaxError),
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),
    #[error("capacity error: {0}")]
    Capacity(#[from] CapacityError),
}

/// The container framing is wrong. Checked before any JSON is scanned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("buffer of {0} bytes is shorter than the 20-byte container preamble")]
    TooShort(usize),
    #[error("bad magic 0x{0:08X}")]
    BadMagic(u32),
    #[error("expected a {expected} chunk, found type 0x{found:08X}")]
    UnexpectedChunk { expected: &'static str, found: u32 },
    #[error("missing {0} chunk")]
    MissingChunk(&'static str),
    #[error("{chunk} chunk of {length} bytes runs past the end of the buffer")]
    ChunkOutOfBounds { chunk: &'static str, length: u32 },
    #[error("header declares {declared} bytes but the buffer holds {actual}")]
    LengthMismatch { declared: u32, actual: usize },
}

/// The scanner found something other than what the grammar allows here.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyntaxError {
    #[error("unexpected end of input")]
    UnexpectedEndOfInput,
    #[error("unexpected character '{found}', expected {expected}")]
    UnexpectedCharacter { found: char, expected: &'static str },
    #[error("missing value")]
    MissingValue,
    #[error("invalid number {0:?}")]
    InvalidNumber(BString),
    #[error("number {0:?} does not fit its field")]
    NumberOutOfRange(BString),
    #[error("invalid literal {0:?}")]
    InvalidLiteral(BString),
}

/// The JSON is well formed but does not describe a decodable document.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    #[error("field `{field}` must be {expected}")]
    WrongValueType {
        field: &'static str,
        expected: &'static str,
    },
    #[error("field `{field}` must hold {expected} values, found {found}")]
    WrongLength {
        field: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("unknown component type {0:?}")]
    UnknownComponentType(BString),
    #[error("unknown accessor type {0:?}")]
    UnknownAccessorType(BString),
    #[error("unknown attribute semantic {0:?}")]
    UnknownSemantic(BString),
    #[error("attribute semantic {0:?} requires a set index suffix")]
    MissingSetIndex(BString),
    #[error("attribute semantic {0:?} does not take a set index")]
    UnexpectedSetIndex(BString),
    #[error("accessor bounds need both `componentType` and `type`")]
    UnresolvedBounds,
    #[error("bound {value} does not fit the accessor component type")]
    BoundOutOfRange { value: f64 },
}

/// The fill pass and the sizes it was given disagree.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CapacityError {
    #[error("{pool:?} pool holds {capacity} elements, {requested} requested")]
    Exceeded {
        pool: Pool,
        capacity: usize,
        requested: usize,
    },
    #[error("{pool:?} pool was sized for {expected} elements, filled {found}")]
    Mismatch {
        pool: Pool,
        expected: usize,
        found: usize,
    },
}
