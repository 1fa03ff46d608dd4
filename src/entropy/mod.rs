//! ANS entropy coding used by context maps.
//!
//! A context map in the general encoding is a stream of hybrid-uint symbols
//! drawn from a single ANS distribution. This module provides everything
//! below that level:
//!
//! | Piece | Purpose |
//! |-------|---------|
//! | [`HybridUintConfig`] | Split tokens into an entropy-coded part and raw extra bits |
//! | [`AliasTable`] | O(1) slot → symbol lookup for a 12-bit distribution |
//! | [`decode_histograms`] | Parse LZ77 parameters, clustering and distributions |
//! | [`AnsSymbolReader`] | Decode symbols, expand LZ77 copies, check the final state |
//!
//! ## Stream layout
//!
//! ```text
//! ┌──────────┬───────────────┬──────────┬────────────┬─────────────┬──────────────┐
//! │ LZ77     │ context map   │ prefix?  │ alphabet   │ uint config │ histogram    │
//! │ params   │ (if >1 ctx)   │ (1 bit)  │ (2 bits)   │ × clusters  │ × clusters   │
//! └──────────┴───────────────┴──────────┴────────────┴─────────────┴──────────────┘
//!   then: 32-bit ANS state, symbols with interleaved refill and extra bits
//! ```
//!
//! Only ANS-coded distributions are supported; streams selecting prefix
//! codes fail with [`PrefixCodeUnsupported`](crate::ContextMapError::PrefixCodeUnsupported).

mod alias;
mod code;
mod histogram;
mod hybrid_uint;
mod reader;
mod writer;

pub use alias::{AliasSymbol, AliasTable};
pub use code::{decode_histograms, AnsCode, Lz77Params};
pub use hybrid_uint::{pack_signed, unpack_signed, HybridUintConfig, UintToken};
pub use reader::AnsSymbolReader;

pub(crate) use histogram::{normalize_counts, write_histogram};
pub(crate) use writer::write_ans_stream;

/// Log2 of the ANS distribution precision.
pub const ANS_LOG_TAB_SIZE: u32 = 12;
/// Sum of every ANS distribution.
pub const ANS_TAB_SIZE: u32 = 1 << ANS_LOG_TAB_SIZE;
/// Marker the ANS state must return to after the last symbol.
pub const ANS_SIGNATURE: u32 = 0x13;
pub(crate) const ANS_FINAL_STATE: u32 = ANS_SIGNATURE << 16;

/// Smallest log2 alphabet size for ANS histograms.
pub const MIN_LOG_ALPHA_SIZE: u32 = 5;
/// Largest log2 alphabet size for ANS histograms.
pub const MAX_LOG_ALPHA_SIZE: u32 = 8;

/// `ceil(log2(x))` for `x >= 1`.
#[inline]
pub(crate) fn ceil_log2_nonzero(x: u32) -> u32 {
    debug_assert!(x != 0);
    let floor = floor_log2_nonzero(x);
    if x.is_power_of_two() {
        floor
    } else {
        floor + 1
    }
}

/// `floor(log2(x))` for `x >= 1`.
#[inline]
pub(crate) fn floor_log2_nonzero(x: u32) -> u32 {
    debug_assert!(x != 0);
    31 - x.leading_zeros()
}
