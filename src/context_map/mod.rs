//! Context map decoding.
//!
//! A context map assigns each of a fixed number of contexts to one of a
//! smaller number of clusters, so contexts with similar statistics share a
//! histogram. The map is stored in one of two encodings, chosen by its first
//! bit:
//!
//! | Bit | Encoding | Layout |
//! |-----|----------|--------|
//! | `1` | Simple | 2-bit width `w`, then `w` raw bits per entry (`w = 0`: all zeros) |
//! | `0` | Entropy coded | Histogram header, then ANS-coded signed symbols |
//!
//! In the entropy-coded form each symbol is either a literal move-to-front
//! index (non-negative) or a run of `-s + 1` zero indices (negative). After
//! the whole map is read the move-to-front transform is undone.
//!
//! ## Decoding Pipeline
//!
//! ```text
//! BitReader
//!     ↓
//! ┌──────────────────┐
//! │ mode bit         │
//! └──────────────────┘
//!     ↓ simple                 ↓ entropy coded
//! raw fixed-width       ┌──────────────────────┐
//! entries               │ decode_histograms    │
//!     │                 │ AnsSymbolReader      │ ← unpack_signed, zero runs
//!     │                 │ inverse_move_to_front│
//!     │                 └──────────────────────┘
//!     ↓                        ↓
//! ┌──────────────────────────────────┐
//! │ verify_context_map (max + 1)     │
//! └──────────────────────────────────┘
//! ```
//!
//! Decoding a histogram set with several contexts needs a context map of its
//! own, so [`decode_context_map`] and
//! [`decode_histograms`](crate::entropy::decode_histograms) call each other.
//! Maps of at most two entries may not use LZ77, which stops a malicious
//! stream from nesting one level per context map.

mod encode;
mod mtf;
mod verify;

pub use encode::{encode_context_map, ContextMapEncoding, EncodeOptions};
pub use mtf::{inverse_move_to_front, move_to_front};
pub use verify::verify_context_map;

#[cfg(test)]
pub(crate) use encode::write_token_stream;

use tracing::{debug, trace};

use crate::bit_reader::BitReader;
use crate::entropy::{decode_histograms, unpack_signed, AnsSymbolReader};
use crate::error::{ContextMapError, Result};

/// Upper bound on the number of clusters a context map can reference.
pub const MAX_CLUSTERS: usize = 256;

/// Maps this short may not enable LZ77 in their own histogram header.
const MAX_LEN_WITHOUT_LZ77: usize = 2;

/// Decode a context map into `context_map`, returning the cluster count.
///
/// The slice length is the number of contexts. On success every entry is
/// below the returned count and every cluster in `0..count` is used. On
/// failure the slice contents are unspecified.
///
/// # Example
///
/// ```rust
/// use jxl_context_map::{decode_context_map, BitReader};
///
/// // Simple encoding, 2 bits per entry: [0, 3, 1, 2]
/// let data = [0b1110_0101, 0b100];
/// let mut reader = BitReader::new(&data);
/// let mut context_map = [0u8; 4];
/// let num_htrees = decode_context_map(&mut context_map, &mut reader).unwrap();
/// assert_eq!(context_map, [0, 3, 1, 2]);
/// assert_eq!(num_htrees, 4);
/// ```
pub fn decode_context_map(context_map: &mut [u8], reader: &mut BitReader) -> Result<usize> {
    let is_simple = reader.read_bit()?;
    if is_simple {
        decode_simple(context_map, reader)?;
    } else {
        decode_entropy_coded(context_map, reader)?;
    }

    let num_htrees = context_map.iter().max().map_or(0, |&m| m as usize) + 1;
    verify_context_map(context_map, num_htrees)?;
    debug!(len = context_map.len(), num_htrees, "decoded context map");
    Ok(num_htrees)
}

fn decode_simple(context_map: &mut [u8], reader: &mut BitReader) -> Result<()> {
    let bits_per_entry = reader.read_bits(2)?;
    debug!(len = context_map.len(), bits_per_entry, "simple context map");
    if bits_per_entry == 0 {
        context_map.fill(0);
        return Ok(());
    }
    for entry in context_map.iter_mut() {
        // At most 3 bits, always below MAX_CLUSTERS
        *entry = reader.read_bits(bits_per_entry)? as u8;
    }
    Ok(())
}

fn decode_entropy_coded(context_map: &mut [u8], reader: &mut BitReader) -> Result<()> {
    let len = context_map.len();
    debug!(len, "entropy-coded context map");
    context_map.fill(0);

    let (code, histogram_map) = decode_histograms(reader, 1, len <= MAX_LEN_WITHOUT_LZ77)?;
    let mut symbols = AnsSymbolReader::new(&code, reader)?;

    let mut i = 0;
    while i < len {
        let sym = unpack_signed(symbols.read_hybrid_uint(0, reader, &histogram_map)?);
        if sym < 0 {
            let run = (1 - i64::from(sym)) as usize;
            if run > len - i {
                return Err(ContextMapError::RunOverflow {
                    position: i,
                    run,
                    len,
                });
            }
            trace!(position = i, run, "zero run");
            i += run;
        } else {
            if sym as usize >= MAX_CLUSTERS {
                return Err(ContextMapError::InvalidClusterId(sym));
            }
            context_map[i] = sym as u8;
            i += 1;
        }
    }

    if !symbols.check_final_state() {
        return Err(ContextMapError::InvalidContextMap);
    }
    inverse_move_to_front(context_map);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bit_writer::BitWriter;
    use crate::entropy::{pack_signed, HybridUintConfig, Lz77Params, UintToken};

    fn literal(value: u32) -> UintToken {
        HybridUintConfig::default().encode(value)
    }

    fn signed(value: i32) -> UintToken {
        literal(pack_signed(value))
    }

    /// Entropy-coded context map made of the given tokens.
    fn entropy_stream(tokens: &[UintToken], lz77: &Lz77Params) -> Vec<u8> {
        let mut writer = BitWriter::new();
        writer.write(1, 0);
        write_token_stream(&mut writer, tokens, lz77, 8, HybridUintConfig::default()).unwrap();
        writer.finish()
    }

    fn decode(data: &[u8], len: usize) -> Result<(Vec<u8>, usize)> {
        let mut reader = BitReader::new(data);
        let mut context_map = vec![0xAA; len];
        let num_htrees = decode_context_map(&mut context_map, &mut reader)?;
        Ok((context_map, num_htrees))
    }

    fn lz77_params() -> Lz77Params {
        Lz77Params {
            enabled: true,
            min_symbol: 224,
            min_length: 3,
            length_uint_config: HybridUintConfig::new(8, 0, 0),
            distance_context: 1,
        }
    }

    #[test]
    fn test_simple_zero_width() {
        let data = [0b001];
        for len in [1, 7, 300] {
            let (map, num_htrees) = decode(&data, len).unwrap();
            assert!(map.iter().all(|&m| m == 0));
            assert_eq!(num_htrees, 1);
        }
    }

    #[test]
    fn test_simple_raw_entries() {
        let entries = [0u8, 5, 1, 7, 2, 3, 6, 4, 4];
        let mut writer = BitWriter::new();
        writer.write(1, 1);
        writer.write(2, 3);
        for &e in &entries {
            writer.write(3, u32::from(e));
        }
        let (map, num_htrees) = decode(&writer.finish(), entries.len()).unwrap();
        assert_eq!(map, entries);
        assert_eq!(num_htrees, 8);
    }

    #[test]
    fn test_simple_truncated() {
        let data = [0b1_11_1];
        assert_eq!(decode(&data, 4), Err(ContextMapError::UnexpectedEof));
    }

    #[test]
    fn test_zero_run_then_inverse_mtf() {
        // Indices [1, 0, 0, 0, 0, 1] after the run of 4 zeros
        let tokens = [signed(1), signed(-3), signed(1)];
        let data = entropy_stream(&tokens, &Lz77Params::default());
        let (map, num_htrees) = decode(&data, 6).unwrap();
        assert_eq!(map, vec![1, 1, 1, 1, 1, 0]);
        assert_eq!(num_htrees, 2);
    }

    #[test]
    fn test_run_fills_zeros_in_dirty_buffer() {
        // Run covering the whole map; the buffer starts as 0xAA
        let data = entropy_stream(&[signed(-4)], &Lz77Params::default());
        let (map, num_htrees) = decode(&data, 5).unwrap();
        assert_eq!(map, vec![0; 5]);
        assert_eq!(num_htrees, 1);
    }

    #[test]
    fn test_run_past_end_rejected() {
        let data = entropy_stream(&[signed(-3)], &Lz77Params::default());
        assert_eq!(
            decode(&data, 3),
            Err(ContextMapError::RunOverflow {
                position: 0,
                run: 4,
                len: 3
            })
        );
    }

    #[test]
    fn test_cluster_id_too_large() {
        let data = entropy_stream(&[signed(256), signed(0)], &Lz77Params::default());
        assert_eq!(decode(&data, 2), Err(ContextMapError::InvalidClusterId(256)));
    }

    #[test]
    fn test_bad_final_state() {
        let mut writer = BitWriter::new();
        writer.write(1, 0); // entropy coded
        writer.write(1, 0); // no LZ77
        writer.write(1, 0); // ANS
        writer.write(2, 3);
        HybridUintConfig::default().write(&mut writer, 8);
        writer.write(1, 1); // simple histogram, one symbol
        writer.write(1, 0);
        writer.write(1, 0); // symbol 0
        writer.write(32, 0x0012_0000);
        assert_eq!(
            decode(&writer.finish(), 3),
            Err(ContextMapError::InvalidContextMap)
        );
    }

    #[test]
    fn test_lz77_disallowed_for_short_maps() {
        // literal 1, copy 3 from distance 1
        let tokens = [signed(1), literal(224), literal(0)];
        let data = entropy_stream(&tokens, &lz77_params());
        assert_eq!(decode(&data, 2), Err(ContextMapError::Lz77Disallowed));
        assert_eq!(decode(&data, 1), Err(ContextMapError::Lz77Disallowed));
    }

    #[test]
    fn test_lz77_allowed_for_longer_maps() {
        let tokens = [signed(1), literal(224), literal(0)];
        let data = entropy_stream(&tokens, &lz77_params());
        let (map, num_htrees) = decode(&data, 4).unwrap();
        assert_eq!(map, vec![1, 0, 1, 0]);
        assert_eq!(num_htrees, 2);
    }

    #[test]
    fn test_empty_map_incomplete() {
        let data = [0b001];
        assert_eq!(
            decode(&data, 0),
            Err(ContextMapError::IncompleteContextMap {
                found: 0,
                num_htrees: 1
            })
        );
    }

    #[test]
    fn test_sparse_entropy_coded_map_rejected() {
        // MTF indices [2, 0] decode to [2, 2]: clusters 0 and 1 unused
        let data = entropy_stream(&[signed(2), signed(0)], &Lz77Params::default());
        assert_eq!(
            decode(&data, 2),
            Err(ContextMapError::IncompleteContextMap {
                found: 1,
                num_htrees: 3
            })
        );
    }
}
