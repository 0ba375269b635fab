//! Schema version marker codec.
//!
//! The marker is an unsigned LEB128 varint stored under
//! [`Key::SchemaVersion`](crate::schema::Key::SchemaVersion). Decoding reads
//! the leading varint and ignores anything after it, so markers written into
//! a zero-padded fixed buffer still decode. A marker that is not a valid
//! varint is reported as `None`; the opener treats it as version 0.

use crate::error::{StoreError, StoreResult};

/// Schema version this build writes.
///
/// - 0: initial layout.
/// - 1: credential store added; legacy OAuth token moved out of settings.
pub const SCHEMA_VERSION: u64 = 1;

/// Longest encoding of a `u64`.
pub const MAX_VARINT_LEN: usize = 10;

/// Encode a version as a varint.
pub fn encode_version(version: u64) -> StoreResult<Vec<u8>> {
    let mut buf = [0u8; MAX_VARINT_LEN];
    let mut value = version;
    let mut len = 0;
    loop {
        let Some(slot) = buf.get_mut(len) else {
            return Err(StoreError::EncodeVersion(version));
        };
        let mut byte = (value & 0x7F) as u8;
        value >>= 7;
        if value > 0 {
            byte |= 0x80;
        }
        *slot = byte;
        len += 1;
        if value == 0 {
            break;
        }
    }
    Ok(buf[..len].to_vec())
}

/// Decode a stored version marker. An empty marker is version 0.
///
/// Returns `None` when the leading varint is truncated or overflows a `u64`.
pub fn decode_version(data: &[u8]) -> Option<u64> {
    if data.is_empty() {
        return Some(0);
    }
    let mut value: u64 = 0;
    let mut shift = 0;
    for (i, &byte) in data.iter().enumerate() {
        if i == MAX_VARINT_LEN - 1 && byte > 1 {
            return None;
        }
        value |= ((byte & 0x7F) as u64) << shift;
        if byte & 0x80 == 0 {
            return Some(value);
        }
        shift += 7;
    }
    None
}
