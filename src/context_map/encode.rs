//! Context map encoding.
//!
//! Produces streams that [`decode_context_map`](super::decode_context_map)
//! reads back. The entropy-coded form always uses a single ANS histogram with
//! LZ77 disabled.

use tracing::debug;

use super::mtf::move_to_front;
use super::verify::verify_context_map;
use super::MAX_CLUSTERS;
use crate::bit_writer::BitWriter;
use crate::entropy::{
    ceil_log2_nonzero, normalize_counts, pack_signed, write_ans_stream, write_histogram,
    AliasTable, HybridUintConfig, Lz77Params, UintToken, MAX_LOG_ALPHA_SIZE, MIN_LOG_ALPHA_SIZE,
};
use crate::error::{ContextMapError, Result};

/// Widest entry the simple encoding can store.
const MAX_SIMPLE_BITS: u32 = 3;

/// Which of the two layouts to write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ContextMapEncoding {
    /// Whichever is smaller; simple on ties.
    #[default]
    Auto,
    /// Raw fixed-width entries. Fails for more than 8 clusters.
    Simple,
    /// Move-to-front, zero runs and ANS.
    EntropyCoded,
}

/// Options for [`encode_context_map`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeOptions {
    pub encoding: ContextMapEncoding,
    /// Log2 of the ANS alphabet size, 5 to 8.
    pub log_alpha_size: u32,
    /// Token split for the symbol stream.
    pub uint_config: HybridUintConfig,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            encoding: ContextMapEncoding::Auto,
            log_alpha_size: MAX_LOG_ALPHA_SIZE,
            uint_config: HybridUintConfig::default(),
        }
    }
}

/// Encode `context_map` and return its cluster count.
///
/// The map must be dense (every cluster in `0..max + 1` used); the same
/// errors as [`verify_context_map`] are returned otherwise.
///
/// ```rust
/// use jxl_context_map::{decode_context_map, encode_context_map, BitReader, BitWriter, EncodeOptions};
///
/// let context_map = [0u8, 0, 1, 2, 1, 0, 0, 0];
/// let mut writer = BitWriter::new();
/// encode_context_map(&context_map, &mut writer, &EncodeOptions::default()).unwrap();
/// let data = writer.finish();
///
/// let mut decoded = [0u8; 8];
/// let num_htrees = decode_context_map(&mut decoded, &mut BitReader::new(&data)).unwrap();
/// assert_eq!(decoded, context_map);
/// assert_eq!(num_htrees, 3);
/// ```
pub fn encode_context_map(
    context_map: &[u8],
    writer: &mut BitWriter,
    options: &EncodeOptions,
) -> Result<usize> {
    let num_htrees = context_map.iter().max().map_or(0, |&m| m as usize) + 1;
    verify_context_map(context_map, num_htrees)?;
    debug_assert!(num_htrees <= MAX_CLUSTERS);

    let entry_bits = ceil_log2_nonzero(num_htrees as u32);
    let use_simple = match options.encoding {
        ContextMapEncoding::Simple => {
            if entry_bits > MAX_SIMPLE_BITS {
                return Err(ContextMapError::Unencodable(
                    "simple encoding holds at most 8 clusters",
                ));
            }
            true
        }
        ContextMapEncoding::EntropyCoded => false,
        ContextMapEncoding::Auto if num_htrees == 1 => true,
        ContextMapEncoding::Auto if entry_bits > MAX_SIMPLE_BITS => false,
        ContextMapEncoding::Auto => {
            let simple_bits = 3 + context_map.len() as u64 * u64::from(entry_bits);
            let mut scratch = BitWriter::new();
            // An entropy layout the options cannot express never wins.
            write_entropy_coded(context_map, &mut scratch, options)
                .map_or(true, |()| simple_bits <= scratch.bits_written())
        }
    };

    debug!(
        len = context_map.len(),
        num_htrees,
        simple = use_simple,
        "encoding context map"
    );
    if use_simple {
        writer.write(1, 1);
        writer.write(2, entry_bits);
        for &entry in context_map {
            writer.write(entry_bits, u32::from(entry));
        }
    } else {
        write_entropy_coded(context_map, writer, options)?;
    }
    Ok(num_htrees)
}

/// Turn move-to-front indices into signed symbols: runs of two or more zeros
/// become one negative symbol.
fn zero_run_symbols(indices: &[u8]) -> Vec<u32> {
    let mut values = Vec::with_capacity(indices.len());
    let mut i = 0;
    while i < indices.len() {
        if indices[i] == 0 {
            let run = indices[i..].iter().take_while(|&&v| v == 0).count();
            if run >= 2 {
                values.push(pack_signed(1 - run as i32));
            } else {
                values.push(pack_signed(0));
            }
            i += run;
        } else {
            values.push(pack_signed(i32::from(indices[i])));
            i += 1;
        }
    }
    values
}

fn write_entropy_coded(
    context_map: &[u8],
    writer: &mut BitWriter,
    options: &EncodeOptions,
) -> Result<()> {
    let values = zero_run_symbols(&move_to_front(context_map));
    let tokens: Vec<UintToken> = values
        .iter()
        .map(|&v| options.uint_config.encode(v))
        .collect();
    writer.write(1, 0);
    write_token_stream(
        writer,
        &tokens,
        &Lz77Params::default(),
        options.log_alpha_size,
        options.uint_config,
    )
}

/// Write a single-histogram header followed by the ANS-coded `tokens`.
///
/// With LZ77 enabled, both the symbol context and the distance context use
/// the one histogram, so `tokens` may mix literal, length and distance
/// tokens.
pub(crate) fn write_token_stream(
    writer: &mut BitWriter,
    tokens: &[UintToken],
    lz77: &Lz77Params,
    log_alpha_size: u32,
    uint_config: HybridUintConfig,
) -> Result<()> {
    if !(MIN_LOG_ALPHA_SIZE..=MAX_LOG_ALPHA_SIZE).contains(&log_alpha_size) {
        return Err(ContextMapError::Unencodable("log_alpha_size out of range"));
    }
    if uint_config.split_exponent() > log_alpha_size {
        return Err(ContextMapError::Unencodable(
            "split exponent exceeds alphabet size",
        ));
    }

    let alphabet_size = tokens.iter().map(|t| t.token as usize + 1).max().unwrap_or(1);
    let max_alphabet = 1usize << log_alpha_size;
    if alphabet_size > max_alphabet {
        return Err(ContextMapError::AlphabetTooLarge {
            size: alphabet_size,
            max: max_alphabet,
        });
    }
    let mut frequencies = vec![0u64; alphabet_size];
    for t in tokens {
        frequencies[t.token as usize] += 1;
    }
    if tokens.is_empty() {
        frequencies[0] = 1;
    }
    let counts = normalize_counts(&frequencies)?;

    lz77.write(writer)?;
    if lz77.enabled {
        // Symbol and distance contexts share histogram 0.
        writer.write(1, 1);
        writer.write(2, 0);
    }
    writer.write(1, 0); // ANS
    writer.write(2, log_alpha_size - MIN_LOG_ALPHA_SIZE);
    uint_config.write(writer, log_alpha_size);
    write_histogram(writer, &counts)?;

    let table = AliasTable::new(&counts, log_alpha_size)?;
    write_ans_stream(writer, tokens, &table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bit_reader::BitReader;
    use crate::context_map::decode_context_map;

    fn round_trip(context_map: &[u8], options: &EncodeOptions) -> (Vec<u8>, usize, u64) {
        let mut writer = BitWriter::new();
        let num_htrees = encode_context_map(context_map, &mut writer, options).unwrap();
        let bits = writer.bits_written();
        let data = writer.finish();

        let mut reader = BitReader::new(&data);
        let mut decoded = vec![0u8; context_map.len()];
        let decoded_htrees = decode_context_map(&mut decoded, &mut reader).unwrap();
        assert_eq!(decoded_htrees, num_htrees);
        (decoded, num_htrees, bits)
    }

    fn with_encoding(encoding: ContextMapEncoding) -> EncodeOptions {
        EncodeOptions {
            encoding,
            ..EncodeOptions::default()
        }
    }

    #[test]
    fn test_zero_run_symbols() {
        assert_eq!(
            zero_run_symbols(&[3, 0, 0, 0, 1, 0, 2]),
            vec![pack_signed(3), pack_signed(-2), pack_signed(1), 0, pack_signed(2)]
        );
        assert!(zero_run_symbols(&[]).is_empty());
    }

    #[test]
    fn test_single_cluster_is_three_bits() {
        let (decoded, num_htrees, bits) = round_trip(&[0; 100], &EncodeOptions::default());
        assert_eq!(decoded, vec![0; 100]);
        assert_eq!(num_htrees, 1);
        assert_eq!(bits, 3);
    }

    #[test]
    fn test_forced_simple() {
        let map = [0, 1, 2, 3, 4, 5, 6, 7, 7, 0];
        let (decoded, num_htrees, bits) =
            round_trip(&map, &with_encoding(ContextMapEncoding::Simple));
        assert_eq!(decoded, map);
        assert_eq!(num_htrees, 8);
        assert_eq!(bits, 3 + 3 * map.len() as u64);
    }

    #[test]
    fn test_forced_simple_too_many_clusters() {
        let map: Vec<u8> = (0..9).collect();
        let mut writer = BitWriter::new();
        assert!(matches!(
            encode_context_map(&map, &mut writer, &with_encoding(ContextMapEncoding::Simple)),
            Err(ContextMapError::Unencodable(_))
        ));
    }

    #[test]
    fn test_forced_entropy_coded() {
        let map = [0, 0, 0, 1, 1, 2, 0, 0, 0, 0, 3, 2, 1];
        let (decoded, num_htrees, _) =
            round_trip(&map, &with_encoding(ContextMapEncoding::EntropyCoded));
        assert_eq!(decoded, map);
        assert_eq!(num_htrees, 4);

        // A single cluster still round-trips through the entropy coder.
        let (decoded, _, _) =
            round_trip(&[0; 3], &with_encoding(ContextMapEncoding::EntropyCoded));
        assert_eq!(decoded, vec![0; 3]);
    }

    #[test]
    fn test_auto_prefers_entropy_coding_for_long_runs() {
        let mut map = vec![0u8; 2000];
        map[1000] = 1;
        let (decoded, num_htrees, bits) = round_trip(&map, &EncodeOptions::default());
        assert_eq!(decoded, map);
        assert_eq!(num_htrees, 2);
        assert!(bits < 3 + 2000);
    }

    #[test]
    fn test_many_clusters() {
        let map: Vec<u8> = (0..=255u8).chain((0..=255u8).rev()).collect();
        let (decoded, num_htrees, _) = round_trip(&map, &EncodeOptions::default());
        assert_eq!(decoded, map);
        assert_eq!(num_htrees, MAX_CLUSTERS);
    }

    #[test]
    fn test_small_alphabet_options() {
        let map = [2, 0, 1, 1, 1, 0, 2, 2, 0];
        let options = EncodeOptions {
            encoding: ContextMapEncoding::EntropyCoded,
            log_alpha_size: 5,
            uint_config: HybridUintConfig::new(2, 1, 0),
        };
        let (decoded, _, _) = round_trip(&map, &options);
        assert_eq!(decoded, map);
    }

    #[test]
    fn test_auto_falls_back_to_simple_when_alphabet_too_small() {
        // Runs of 250 give zero-run symbols past the 32-token alphabet
        let map: Vec<u8> = (0..2000).map(|i| (i / 250) as u8).collect();
        let options = EncodeOptions {
            encoding: ContextMapEncoding::Auto,
            log_alpha_size: 5,
            ..EncodeOptions::default()
        };
        let mut writer = BitWriter::new();
        assert!(matches!(
            encode_context_map(
                &map,
                &mut writer,
                &EncodeOptions {
                    encoding: ContextMapEncoding::EntropyCoded,
                    ..options
                }
            ),
            Err(ContextMapError::AlphabetTooLarge { max: 32, .. })
        ));

        let (decoded, num_htrees, bits) = round_trip(&map, &options);
        assert_eq!(decoded, map);
        assert_eq!(num_htrees, 8);
        assert_eq!(bits, 3 + 3 * map.len() as u64);
    }

    #[test]
    fn test_rejects_sparse_map() {
        let mut writer = BitWriter::new();
        assert_eq!(
            encode_context_map(&[0, 2], &mut writer, &EncodeOptions::default()),
            Err(ContextMapError::IncompleteContextMap {
                found: 2,
                num_htrees: 3
            })
        );
        assert_eq!(writer.bits_written(), 0);
    }

    #[test]
    fn test_rejects_bad_alphabet_size() {
        let options = EncodeOptions {
            encoding: ContextMapEncoding::EntropyCoded,
            log_alpha_size: 9,
            ..EncodeOptions::default()
        };
        let mut writer = BitWriter::new();
        assert!(encode_context_map(&[0, 1], &mut writer, &options).is_err());
    }
}
