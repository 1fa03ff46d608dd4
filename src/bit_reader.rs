//! Bit reader for context map streams.
//!
//! Reads bits from a byte stream, LSB first (JPEG XL convention): the first
//! bit of the stream is bit 0 of the first byte, and multi-bit fields are
//! assembled least significant bit first.

use crate::error::{ContextMapError, Result};

/// Largest field width accepted by [`BitReader::read_bits`].
pub const MAX_BITS_PER_READ: u32 = 32;

/// Bit reader that reads from a byte slice.
pub struct BitReader<'a> {
    data: &'a [u8],
    /// Next byte to load into the buffer
    pos: usize,
    /// Bits consumed so far
    bit_pos: u64,
    /// Buffered bits, next bit in the least significant position
    buffer: u64,
    /// Bits available in buffer
    bits_in_buffer: u32,
}

impl<'a> BitReader<'a> {
    /// Create a new bit reader from a byte slice.
    pub fn new(data: &'a [u8]) -> Self {
        let mut reader = Self {
            data,
            pos: 0,
            bit_pos: 0,
            buffer: 0,
            bits_in_buffer: 0,
        };
        reader.fill_buffer();
        reader
    }

    /// Fill the buffer with more bytes.
    fn fill_buffer(&mut self) {
        while self.bits_in_buffer <= 56 && self.pos < self.data.len() {
            self.buffer |= (self.data[self.pos] as u64) << self.bits_in_buffer;
            self.bits_in_buffer += 8;
            self.pos += 1;
        }
    }

    /// Peek at the next n bits without consuming them.
    ///
    /// Bits past the end of the stream read as zero.
    #[inline]
    pub fn peek_bits(&self, n: u32) -> u32 {
        debug_assert!(n <= MAX_BITS_PER_READ);
        (self.buffer & ((1u64 << n) - 1)) as u32
    }

    /// Read n bits (0 to 32) and advance the position.
    #[inline]
    pub fn read_bits(&mut self, n: u32) -> Result<u32> {
        if n > MAX_BITS_PER_READ {
            return Err(ContextMapError::InvalidBitCount(n));
        }
        // The buffer holds at least 57 bits unless the input is exhausted.
        if n > self.bits_in_buffer {
            return Err(ContextMapError::UnexpectedEof);
        }

        let value = self.peek_bits(n);
        self.advance_bits(n);
        Ok(value)
    }

    /// Consume n bits that were previously peeked.
    #[inline]
    pub fn skip_bits(&mut self, n: u32) -> Result<()> {
        if n > MAX_BITS_PER_READ {
            return Err(ContextMapError::InvalidBitCount(n));
        }
        if n > self.bits_in_buffer {
            return Err(ContextMapError::UnexpectedEof);
        }
        self.advance_bits(n);
        Ok(())
    }

    #[inline]
    fn advance_bits(&mut self, n: u32) {
        self.buffer >>= n;
        self.bits_in_buffer -= n;
        self.bit_pos += n as u64;
        self.fill_buffer();
    }

    /// Read a single bit.
    #[inline]
    pub fn read_bit(&mut self) -> Result<bool> {
        Ok(self.read_bits(1)? != 0)
    }

    /// Get the current bit position.
    pub fn bit_position(&self) -> u64 {
        self.bit_pos
    }

    /// Check if at end of data.
    pub fn is_eof(&self) -> bool {
        self.bits_in_buffer == 0 && self.pos >= self.data.len()
    }

    /// Remaining bits available.
    pub fn remaining_bits(&self) -> u64 {
        self.bits_in_buffer as u64 + ((self.data.len() - self.pos) as u64 * 8)
    }
}
