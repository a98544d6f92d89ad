//! Strategy parameter decoding
//!
//! Strategy-specific parameters travel as opaque bytes: a sequence of
//! 32-byte big-endian words, the same layout as ABI-encoded static values.

use crate::errors::OrderError;
use crate::ids::U256;

/// Size of one encoded word.
pub const WORD_SIZE: usize = 32;

/// Read the `index`-th word as a `U256`.
pub fn decode_word(params: &[u8], index: usize) -> Result<U256, OrderError> {
    let start = index * WORD_SIZE;
    let word = params
        .get(start..start + WORD_SIZE)
        .ok_or(OrderError::Invalid {
            reason: "strategy parameters too short",
        })?;
    Ok(U256::from_be_slice(word))
}

/// Encode values as consecutive 32-byte words.
pub fn encode_words(values: &[U256]) -> Vec<u8> {
    let mut out = Vec::with_capacity(values.len() * WORD_SIZE);
    for value in values {
        out.extend_from_slice(&value.to_be_bytes::<WORD_SIZE>());
    }
    out
}
