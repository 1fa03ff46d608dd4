//! Histogram set header: LZ77 parameters, clustering and distributions.

use tracing::debug;

use super::alias::AliasTable;
use super::histogram::read_histogram;
use super::hybrid_uint::HybridUintConfig;
use super::{MIN_LOG_ALPHA_SIZE, MAX_LOG_ALPHA_SIZE};
use crate::bit_reader::BitReader;
use crate::bit_writer::BitWriter;
use crate::context_map::decode_context_map;
use crate::error::{ContextMapError, Result};

/// Alphabet size used for the LZ77 length config.
const LZ77_LENGTH_LOG_ALPHA_SIZE: u32 = 8;

/// One of the four alternatives of a selector-coded 32-bit field.
#[derive(Debug, Clone, Copy)]
enum U32Dist {
    Val(u32),
    BitsOffset(u32, u32),
}

const MIN_SYMBOL_DISTS: [U32Dist; 4] = [
    U32Dist::Val(224),
    U32Dist::Val(512),
    U32Dist::Val(4096),
    U32Dist::BitsOffset(15, 8),
];

const MIN_LENGTH_DISTS: [U32Dist; 4] = [
    U32Dist::Val(3),
    U32Dist::Val(4),
    U32Dist::BitsOffset(2, 5),
    U32Dist::BitsOffset(8, 9),
];

fn read_u32(reader: &mut BitReader, dists: &[U32Dist; 4]) -> Result<u32> {
    let selector = reader.read_bits(2)? as usize;
    match dists[selector] {
        U32Dist::Val(v) => Ok(v),
        U32Dist::BitsOffset(n, offset) => Ok(reader.read_bits(n)? + offset),
    }
}

fn write_u32(writer: &mut BitWriter, dists: &[U32Dist; 4], value: u32) -> Result<()> {
    for (selector, dist) in dists.iter().enumerate() {
        match *dist {
            U32Dist::Val(v) if v == value => {
                writer.write(2, selector as u32);
                return Ok(());
            }
            U32Dist::BitsOffset(n, offset)
                if value >= offset && value - offset < (1 << n) =>
            {
                writer.write(2, selector as u32);
                writer.write(n, value - offset);
                return Ok(());
            }
            _ => {}
        }
    }
    Err(ContextMapError::Unencodable("value not representable in U32 field"))
}

/// LZ77 parameters of a histogram set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lz77Params {
    pub enabled: bool,
    /// First token that starts a copy
    pub min_symbol: u32,
    /// Added to every decoded copy length
    pub min_length: u32,
    pub length_uint_config: HybridUintConfig,
    /// Context whose histogram codes copy distances
    pub distance_context: usize,
}

impl Default for Lz77Params {
    fn default() -> Self {
        Self {
            enabled: false,
            min_symbol: 224,
            min_length: 3,
            length_uint_config: HybridUintConfig::new(0, 0, 0),
            distance_context: 0,
        }
    }
}

impl Lz77Params {
    /// Read the enable flag and, if set, the copy thresholds.
    ///
    /// The length config and the distance context are not part of this
    /// field group; [`decode_histograms`] fills them in.
    fn read(reader: &mut BitReader) -> Result<Self> {
        let mut params = Self::default();
        params.enabled = reader.read_bit()?;
        if params.enabled {
            params.min_symbol = read_u32(reader, &MIN_SYMBOL_DISTS)?;
            params.min_length = read_u32(reader, &MIN_LENGTH_DISTS)?;
        }
        Ok(params)
    }

    /// Write the fields read by [`decode_histograms`] ahead of the
    /// clustering, including the length config when enabled.
    pub(crate) fn write(&self, writer: &mut BitWriter) -> Result<()> {
        writer.write(1, u32::from(self.enabled));
        if self.enabled {
            write_u32(writer, &MIN_SYMBOL_DISTS, self.min_symbol)?;
            write_u32(writer, &MIN_LENGTH_DISTS, self.min_length)?;
            self.length_uint_config
                .write(writer, LZ77_LENGTH_LOG_ALPHA_SIZE);
        }
        Ok(())
    }
}

/// Decoded ANS histogram set.
#[derive(Debug, Clone)]
pub struct AnsCode {
    pub(crate) alias_tables: Vec<AliasTable>,
    pub(crate) uint_configs: Vec<HybridUintConfig>,
    pub(crate) log_alpha_size: u32,
    pub(crate) lz77: Lz77Params,
}

impl AnsCode {
    /// Number of distinct histograms.
    pub fn num_histograms(&self) -> usize {
        self.alias_tables.len()
    }

    pub fn log_alpha_size(&self) -> u32 {
        self.log_alpha_size
    }

    pub fn lz77(&self) -> &Lz77Params {
        &self.lz77
    }

    pub fn uint_config(&self, histogram: usize) -> Option<&HybridUintConfig> {
        self.uint_configs.get(histogram)
    }
}

/// Decode the histograms for `num_contexts` contexts.
///
/// Returns the code together with the context → histogram map. When LZ77 is
/// enabled the map has one extra entry, naming the distance histogram.
/// `disallow_lz77` rejects streams that enable LZ77; a nested context map
/// is itself decoded through this function, so the flag bounds recursion.
pub fn decode_histograms(
    reader: &mut BitReader,
    num_contexts: usize,
    disallow_lz77: bool,
) -> Result<(AnsCode, Vec<u8>)> {
    if num_contexts == 0 {
        return Err(ContextMapError::NoContexts);
    }
    let mut num_contexts = num_contexts;
    let mut lz77 = Lz77Params::read(reader)?;
    if lz77.enabled {
        num_contexts += 1;
        lz77.length_uint_config = HybridUintConfig::read(reader, LZ77_LENGTH_LOG_ALPHA_SIZE)?;
    }
    if lz77.enabled && disallow_lz77 {
        return Err(ContextMapError::Lz77Disallowed);
    }
    lz77.distance_context = num_contexts - 1;

    let mut context_map = vec![0u8; num_contexts];
    let num_histograms = if num_contexts > 1 {
        decode_context_map(&mut context_map, reader)?
    } else {
        1
    };

    let use_prefix_code = reader.read_bit()?;
    if use_prefix_code {
        return Err(ContextMapError::PrefixCodeUnsupported);
    }
    let log_alpha_size = MIN_LOG_ALPHA_SIZE + reader.read_bits(2)?;
    debug_assert!(log_alpha_size <= MAX_LOG_ALPHA_SIZE);

    debug!(
        num_contexts,
        num_histograms,
        log_alpha_size,
        lz77 = lz77.enabled,
        "decoding histograms"
    );

    let uint_configs = (0..num_histograms)
        .map(|_| HybridUintConfig::read(reader, log_alpha_size))
        .collect::<Result<Vec<_>>>()?;

    let max_alphabet = 1usize << log_alpha_size;
    let mut alias_tables = Vec::with_capacity(num_histograms);
    for _ in 0..num_histograms {
        let counts = read_histogram(reader)?;
        if counts.len() > max_alphabet {
            return Err(ContextMapError::AlphabetTooLarge {
                size: counts.len(),
                max: max_alphabet,
            });
        }
        alias_tables.push(AliasTable::new(&counts, log_alpha_size)?);
    }

    Ok((
        AnsCode {
            alias_tables,
            uint_configs,
            log_alpha_size,
            lz77,
        },
        context_map,
    ))
}
