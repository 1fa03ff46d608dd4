//! Error types for context map decoding and encoding.
//!
//! This module provides the [`ContextMapError`] type which covers every way a
//! context map record, or one of the entropy-coding structures it depends on,
//! can be malformed.
//!
//! ## Error Categories
//!
//! | Category | Errors | Description |
//! |----------|--------|-------------|
//! | Bitstream | [`UnexpectedEof`], [`InvalidBitCount`] | Cursor ran out of data or was misused |
//! | Context map | [`InvalidClusterId`], [`InvalidContextMap`], [`RunOverflow`] | Symbol stream is corrupt |
//! | Validation | [`InvalidHistogramIndex`], [`IncompleteContextMap`] | Cluster indices are not dense |
//! | Entropy code | [`Lz77Disallowed`], [`InvalidHistogram`], [`InvalidUintConfig`], ... | Histogram header is corrupt |
//! | Usage | [`NoContexts`], [`InvalidContext`], [`UnknownHistogram`] | Caller passed arguments outside the decoded code |
//! | Encoding | [`Unencodable`] | Input cannot be represented |
//!
//! Every failure is terminal for the call that produced it. The context map
//! buffer handed to the decoder holds unspecified contents afterwards.
//!
//! ## Example
//!
//! ```rust
//! use jxl_context_map::{decode_context_map, BitReader, ContextMapError};
//!
//! // Simple encoding, 1 bit per entry, entries [1, 1]: cluster 0 is never used.
//! let data = [0b0_1_1_01_1];
//! let mut reader = BitReader::new(&data);
//! let mut context_map = [0u8; 2];
//!
//! match decode_context_map(&mut context_map, &mut reader) {
//!     Err(ContextMapError::IncompleteContextMap { found, num_htrees }) => {
//!         assert_eq!((found, num_htrees), (1, 2));
//!     }
//!     other => panic!("unexpected result: {:?}", other),
//! }
//! ```
//!
//! [`UnexpectedEof`]: ContextMapError::UnexpectedEof
//! [`InvalidBitCount`]: ContextMapError::InvalidBitCount
//! [`InvalidClusterId`]: ContextMapError::InvalidClusterId
//! [`InvalidContextMap`]: ContextMapError::InvalidContextMap
//! [`RunOverflow`]: ContextMapError::RunOverflow
//! [`InvalidHistogramIndex`]: ContextMapError::InvalidHistogramIndex
//! [`IncompleteContextMap`]: ContextMapError::IncompleteContextMap
//! [`Lz77Disallowed`]: ContextMapError::Lz77Disallowed
//! [`InvalidHistogram`]: ContextMapError::InvalidHistogram
//! [`InvalidUintConfig`]: ContextMapError::InvalidUintConfig
//! [`Unencodable`]: ContextMapError::Unencodable
//! [`NoContexts`]: ContextMapError::NoContexts
//! [`InvalidContext`]: ContextMapError::InvalidContext
//! [`UnknownHistogram`]: ContextMapError::UnknownHistogram

use thiserror::Error;

/// Error type for context map operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContextMapError {
    /// The bit cursor ran out of input.
    #[error("Unexpected end of bitstream")]
    UnexpectedEof,

    /// A read of more than 32 bits was requested.
    #[error("Invalid bit count: {0}")]
    InvalidBitCount(u32),

    /// A literal cluster index was at or above the format maximum.
    #[error("Invalid cluster ID: {0}")]
    InvalidClusterId(i32),

    /// The ANS decoder did not end in its terminal state.
    ///
    /// This indicates a corrupt or truncated symbol stream.
    #[error("Invalid context map")]
    InvalidContextMap,

    /// A zero run extended past the end of the context map.
    #[error("Invalid context map: zero run of {run} at position {position} exceeds length {len}")]
    RunOverflow {
        /// Write cursor when the run was decoded.
        position: usize,
        /// Number of zero entries the run covers.
        run: usize,
        /// Length of the context map.
        len: usize,
    },

    /// An entry is not below the computed cluster count.
    #[error("Invalid histogram index in context map: {index} >= {num_htrees}")]
    InvalidHistogramIndex {
        /// Offending entry.
        index: u8,
        /// Cluster count the map was checked against.
        num_htrees: usize,
    },

    /// Some cluster index in `0..num_htrees` is never used.
    #[error("Incomplete context map: {found} of {num_htrees} clusters used")]
    IncompleteContextMap {
        /// Number of distinct clusters present.
        found: usize,
        /// Cluster count the map was checked against.
        num_htrees: usize,
    },

    /// A histogram set was requested for zero contexts.
    #[error("Histogram set needs at least one context")]
    NoContexts,

    /// A context is not covered by the context map handed to the symbol reader.
    #[error("Context {ctx} out of range for {num_contexts} contexts")]
    InvalidContext {
        /// Requested context.
        ctx: usize,
        /// Length of the context map.
        num_contexts: usize,
    },

    /// A histogram index is not below the number of decoded histograms.
    #[error("Histogram {histogram} out of range for {num_histograms} histograms")]
    UnknownHistogram {
        /// Requested histogram.
        histogram: usize,
        /// Number of histograms in the code.
        num_histograms: usize,
    },

    /// The entropy code enabled LZ77 where it is not permitted.
    #[error("Using LZ77 when explicitly disallowed")]
    Lz77Disallowed,

    /// An LZ77 copy length does not fit in 32 bits.
    #[error("LZ77 copy length overflow")]
    Lz77LengthOverflow,

    /// The entropy code uses prefix (Huffman) histograms.
    #[error("Prefix-coded histograms are not supported")]
    PrefixCodeUnsupported,

    /// A hybrid integer configuration is out of range.
    #[error("Invalid hybrid uint config: {0}")]
    InvalidUintConfig(&'static str),

    /// A hybrid integer token expands to more than 32 bits.
    #[error("Invalid hybrid uint token: {0}")]
    InvalidHybridUint(u32),

    /// A histogram in the bitstream is malformed.
    #[error("Invalid histogram: {0}")]
    InvalidHistogram(&'static str),

    /// A histogram has more symbols than the alphabet allows.
    #[error("Alphabet size is too large: {size} > {max}")]
    AlphabetTooLarge {
        /// Number of symbols in the histogram.
        size: usize,
        /// Maximum alphabet size.
        max: usize,
    },

    /// The encoder cannot represent the input.
    #[error("Cannot encode context map: {0}")]
    Unencodable(&'static str),
}

pub type Result<T> = std::result::Result<T, ContextMapError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        assert_eq!(
            ContextMapError::InvalidClusterId(300).to_string(),
            "Invalid cluster ID: 300"
        );
        assert_eq!(
            ContextMapError::IncompleteContextMap {
                found: 2,
                num_htrees: 3
            }
            .to_string(),
            "Incomplete context map: 2 of 3 clusters used"
        );
        assert_eq!(
            ContextMapError::InvalidContextMap.to_string(),
            "Invalid context map"
        );
    }
}
