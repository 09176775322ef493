//! Container framing: the 12-byte header and the two chunk headers.
//!
//! ```text
//! magic u32 | version u32 | length u32
//! chunk length u32 | "JSON" | <json bytes>
//! chunk length u32 | "BIN\0" | <binary payload>
//! ```
//!
//! All words are little-endian. Nothing here looks inside either chunk.

use crate::{
    error::{DecodeError, FormatError},
    options::DecodeOptions,
};

/// `glTF` read as a little-endian word.
pub const MAGIC: u32 = u32::from_le_bytes(*b"glTF");
/// Chunk type of the JSON chunk.
pub const CHUNK_JSON: u32 = u32::from_le_bytes(*b"JSON");
/// Chunk type of the binary chunk.
pub const CHUNK_BIN: u32 = u32::from_le_bytes(*b"BIN\0");

const HEADER_LEN: usize = 12;
const CHUNK_HEADER_LEN: usize = 8;
/// Offset of the first JSON byte in a container.
pub const JSON_START: usize = HEADER_LEN + CHUNK_HEADER_LEN;

/// The validated framing of a binary container.
///
/// Both chunk spans borrow from the input buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Container<'a> {
    /// Container format version from the header.
    pub version: u32,
    /// Total length recorded in the header.
    pub length: u32,
    /// The JSON chunk payload.
    pub json: &'a [u8],
    /// The binary chunk payload, empty when the container has none.
    pub bin: &'a [u8],
}

impl<'a> Container<'a> {
    /// Validates the header and slices out both chunks.
    ///
    /// # Errors
    ///
    /// Returns a [`FormatError`] when the buffer is too short, the magic or a
    /// chunk type is wrong, or a chunk runs past the end of the buffer.
    pub fn read(bytes: &'a [u8], options: &DecodeOptions) -> Result<Self, DecodeError> {
        if bytes.len() < JSON_START {
            return Err(DecodeError::new(FormatError::TooShort(bytes.len()), 0));
        }

        let magic = word(bytes, 0)?;
        if magic != MAGIC {
            return Err(DecodeError::new(FormatError::BadMagic(magic), 0));
        }
        let version = word(bytes, 4)?;
        let length = word(bytes, 8)?;
        if options.verify_total_length && usize::try_from(length).ok() != Some(bytes.len()) {
            return Err(DecodeError::new(
                FormatError::LengthMismatch {
                    declared: length,
                    actual: bytes.len(),
                },
                8,
            ));
        }

        let json = chunk(bytes, HEADER_LEN, CHUNK_JSON, "JSON")?;
        let json_end = JSON_START + json.len();

        let bin = if bytes.len() == json_end && options.allow_missing_bin_chunk {
            &bytes[json_end..]
        } else if bytes.len() < json_end + CHUNK_HEADER_LEN {
            return Err(DecodeError::new(FormatError::MissingChunk("BIN"), json_end));
        } else {
            chunk(bytes, json_end, CHUNK_BIN, "BIN")?
        };

        log::debug!(
            "container v{version}: {} JSON bytes, {} binary bytes",
            json.len(),
            bin.len()
        );

        Ok(Self {
            version,
            length,
            json,
            bin,
        })
    }
}

/// Reads the chunk whose header starts at `at` and checks its type.
fn chunk<'a>(
    bytes: &'a [u8],
    at: usize,
    expected: u32,
    name: &'static str,
) -> Result<&'a [u8], DecodeError> {
    let length = word(bytes, at)?;
    let kind = word(bytes, at + 4)?;
    if kind != expected {
        return Err(DecodeError::new(
            FormatError::UnexpectedChunk {
                expected: name,
                found: kind,
            },
            at + 4,
        ));
    }

    let start = at + CHUNK_HEADER_LEN;
    usize::try_from(length)
        .ok()
        .and_then(|len| start.checked_add(len))
        .and_then(|end| bytes.get(start..end))
        .ok_or_else(|| {
            DecodeError::new(
                FormatError::ChunkOutOfBounds {
                    chunk: name,
                    length,
                },
                at,
            )
        })
}

fn word(bytes: &[u8], at: usize) -> Result<u32, DecodeError> {
    bytes
        .get(at..at + 4)
        .and_then(|w| w.try_into().ok())
        .map(u32::from_le_bytes)
        .ok_or_else(|| DecodeError::new(FormatError::TooShort(bytes.len()), at))
}
