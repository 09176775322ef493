mod parse_good;

use alloc::vec::Vec;

use crate::{CHUNK_BIN, CHUNK_JSON, DecodeOptions, MAGIC};

/// Frames `json` and `bin` into a container, padding neither chunk.
pub(crate) fn glb(json: &[u8], bin: &[u8]) -> Vec<u8> {
    let total = 12 + 8 + json.len() + 8 + bin.len();
    let mut out = Vec::with_capacity(total);
    for word in [MAGIC, 2, u32::try_from(total).unwrap()] {
        out.extend_from_slice(&word.to_le_bytes());
    }
    out.extend_from_slice(&u32::try_from(json.len()).unwrap().to_le_bytes());
    out.extend_from_slice(&CHUNK_JSON.to_le_bytes());
    out.extend_from_slice(json);
    out.extend_from_slice(&u32::try_from(bin.len()).unwrap().to_le_bytes());
    out.extend_from_slice(&CHUNK_BIN.to_le_bytes());
    out.extend_from_slice(bin);
    out
}

pub(crate) fn strict() -> DecodeOptions {
    DecodeOptions {
        verify_total_length: true,
        ..Default::default()
    }
}
