//! ANS symbol reader with LZ77 expansion.

use super::code::AnsCode;
use super::{ANS_FINAL_STATE, ANS_LOG_TAB_SIZE, ANS_TAB_SIZE};
use crate::bit_reader::BitReader;
use crate::error::{ContextMapError, Result};

const LZ77_WINDOW_SIZE: usize = 1 << 20;
const LZ77_WINDOW_MASK: usize = LZ77_WINDOW_SIZE - 1;

fn histogram_for(ctx: usize, context_map: &[u8]) -> Result<usize> {
    context_map
        .get(ctx)
        .map(|&histogram| histogram as usize)
        .ok_or(ContextMapError::InvalidContext {
            ctx,
            num_contexts: context_map.len(),
        })
}

/// Decodes hybrid-uint values from an interleaved ANS stream.
///
/// The bit reader is passed to every call rather than stored, so extra bits
/// and state refills are read from the same cursor the caller uses.
#[derive(Debug)]
pub struct AnsSymbolReader<'c> {
    code: &'c AnsCode,
    state: u32,
    /// Recently decoded values, only allocated when LZ77 is enabled
    lz77_window: Vec<u32>,
    num_to_copy: u32,
    copy_pos: usize,
    num_decoded: usize,
}

impl<'c> AnsSymbolReader<'c> {
    /// Start decoding; reads the 32-bit initial state.
    pub fn new(code: &'c AnsCode, reader: &mut BitReader) -> Result<Self> {
        let state = reader.read_bits(32)?;
        let lz77_window = if code.lz77.enabled {
            vec![0; LZ77_WINDOW_SIZE]
        } else {
            Vec::new()
        };
        Ok(Self {
            code,
            state,
            lz77_window,
            num_to_copy: 0,
            copy_pos: 0,
            num_decoded: 0,
        })
    }

    /// Decode one token from histogram `histogram`.
    pub fn read_symbol(&mut self, histogram: usize, reader: &mut BitReader) -> Result<u32> {
        let table = self.code.alias_tables.get(histogram).ok_or(
            ContextMapError::UnknownHistogram {
                histogram,
                num_histograms: self.code.alias_tables.len(),
            },
        )?;
        let slot = self.state & (ANS_TAB_SIZE - 1);
        let symbol = table.lookup(slot);
        self.state = symbol.freq * (self.state >> ANS_LOG_TAB_SIZE) + symbol.offset;
        if self.state < (1 << 16) {
            self.state = (self.state << 16) | reader.read_bits(16)?;
        }
        Ok(symbol.value)
    }

    /// Decode one value for context `ctx`, mapped to a histogram through
    /// `context_map`.
    pub fn read_hybrid_uint(
        &mut self,
        ctx: usize,
        reader: &mut BitReader,
        context_map: &[u8],
    ) -> Result<u32> {
        let histogram = histogram_for(ctx, context_map)?;
        if !self.code.lz77.enabled {
            let token = self.read_symbol(histogram, reader)?;
            return self.code.uint_configs[histogram].decode(token, reader);
        }

        if self.num_to_copy > 0 {
            return Ok(self.copy_one());
        }

        let token = self.read_symbol(histogram, reader)?;
        let lz77 = self.code.lz77;
        if token < lz77.min_symbol {
            let value = self.code.uint_configs[histogram].decode(token, reader)?;
            self.push(value);
            return Ok(value);
        }

        let length = lz77
            .length_uint_config
            .decode(token - lz77.min_symbol, reader)?;
        self.num_to_copy = length
            .checked_add(lz77.min_length)
            .ok_or(ContextMapError::Lz77LengthOverflow)?;

        let distance_histogram = histogram_for(lz77.distance_context, context_map)?;
        let distance_token = self.read_symbol(distance_histogram, reader)?;
        let distance = self.code.uint_configs[distance_histogram]
            .decode(distance_token, reader)? as usize;
        let distance = (distance + 1).min(self.num_decoded).min(LZ77_WINDOW_SIZE);
        self.copy_pos = self.num_decoded - distance;
        if distance == 0 {
            // Nothing decoded yet: the copy reads zeros.
            let to_fill = (self.num_to_copy as usize).min(LZ77_WINDOW_SIZE);
            self.lz77_window[..to_fill].fill(0);
        }
        Ok(self.copy_one())
    }

    /// True if the stream ended on the expected final state.
    pub fn check_final_state(&self) -> bool {
        self.state == ANS_FINAL_STATE
    }

    fn copy_one(&mut self) -> u32 {
        let value = self.lz77_window[self.copy_pos & LZ77_WINDOW_MASK];
        self.copy_pos += 1;
        self.num_to_copy -= 1;
        self.push(value);
        value
    }

    fn push(&mut self, value: u32) {
        self.lz77_window[self.num_decoded & LZ77_WINDOW_MASK] = value;
        self.num_decoded += 1;
    }
}
