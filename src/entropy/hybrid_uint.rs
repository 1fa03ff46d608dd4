//! Hybrid unsigned integer coding.
//!
//! Small values are entropy coded directly as tokens. Larger values are split
//! into a token carrying the exponent plus a few leading and trailing bits,
//! and raw "extra" bits for the middle of the mantissa.

use super::ceil_log2_nonzero;
use crate::bit_reader::BitReader;
use crate::bit_writer::BitWriter;
use crate::error::{ContextMapError, Result};

/// Token/extra-bits split of one value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UintToken {
    /// Entropy-coded symbol
    pub token: u32,
    /// Number of raw extra bits
    pub nbits: u32,
    /// Raw extra bits
    pub bits: u32,
}

/// Parameters of the hybrid uint split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HybridUintConfig {
    split_exponent: u32,
    split_token: u32,
    msb_in_token: u32,
    lsb_in_token: u32,
}

impl HybridUintConfig {
    /// Create a config. `msb_in_token + lsb_in_token` must not exceed
    /// `split_exponent`.
    pub const fn new(split_exponent: u32, msb_in_token: u32, lsb_in_token: u32) -> Self {
        debug_assert!(split_exponent < 32);
        debug_assert!(msb_in_token + lsb_in_token <= split_exponent);
        Self {
            split_exponent,
            split_token: 1 << split_exponent,
            msb_in_token,
            lsb_in_token,
        }
    }

    pub fn split_exponent(&self) -> u32 {
        self.split_exponent
    }

    pub fn msb_in_token(&self) -> u32 {
        self.msb_in_token
    }

    pub fn lsb_in_token(&self) -> u32 {
        self.lsb_in_token
    }

    /// Read a config for an alphabet of `2^log_alpha_size` tokens.
    pub fn read(reader: &mut BitReader, log_alpha_size: u32) -> Result<Self> {
        let split_exponent = reader.read_bits(ceil_log2_nonzero(log_alpha_size + 1))?;
        if split_exponent > log_alpha_size {
            return Err(ContextMapError::InvalidUintConfig(
                "split exponent exceeds alphabet size",
            ));
        }

        let mut msb_in_token = 0;
        let mut lsb_in_token = 0;
        if split_exponent != log_alpha_size {
            msb_in_token = reader.read_bits(ceil_log2_nonzero(split_exponent + 1))?;
            if msb_in_token > split_exponent {
                return Err(ContextMapError::InvalidUintConfig(
                    "msb_in_token exceeds split exponent",
                ));
            }
            lsb_in_token =
                reader.read_bits(ceil_log2_nonzero(split_exponent - msb_in_token + 1))?;
        }
        if msb_in_token + lsb_in_token > split_exponent {
            return Err(ContextMapError::InvalidUintConfig(
                "msb_in_token + lsb_in_token exceeds split exponent",
            ));
        }

        Ok(Self::new(split_exponent, msb_in_token, lsb_in_token))
    }

    /// Write the config in the layout [`read`](Self::read) expects.
    pub fn write(&self, writer: &mut BitWriter, log_alpha_size: u32) {
        debug_assert!(self.split_exponent <= log_alpha_size);
        writer.write(ceil_log2_nonzero(log_alpha_size + 1), self.split_exponent);
        if self.split_exponent != log_alpha_size {
            writer.write(ceil_log2_nonzero(self.split_exponent + 1), self.msb_in_token);
            writer.write(
                ceil_log2_nonzero(self.split_exponent - self.msb_in_token + 1),
                self.lsb_in_token,
            );
        }
    }

    /// Expand a token into its value, reading the extra bits.
    #[inline]
    pub fn decode(&self, token: u32, reader: &mut BitReader) -> Result<u32> {
        if token < self.split_token {
            return Ok(token);
        }

        let in_token = self.msb_in_token + self.lsb_in_token;
        let nbits = (self.split_exponent - in_token)
            .checked_add((token - self.split_token) >> in_token)
            .filter(|&nbits| nbits <= 31 - in_token)
            .ok_or(ContextMapError::InvalidHybridUint(token))?;

        let low = token & ((1 << self.lsb_in_token) - 1);
        let token = token >> self.lsb_in_token;
        let bits = reader.read_bits(nbits)?;
        let high = (1 << self.msb_in_token) | (token & ((1 << self.msb_in_token) - 1));
        Ok((((high << nbits) | bits) << self.lsb_in_token) | low)
    }

    /// Split a value into token and extra bits.
    pub fn encode(&self, value: u32) -> UintToken {
        if value < self.split_token {
            return UintToken {
                token: value,
                nbits: 0,
                bits: 0,
            };
        }

        let n = 31 - value.leading_zeros();
        let m = value - (1 << n);
        let in_token = self.msb_in_token + self.lsb_in_token;
        let token = self.split_token
            + ((n - self.split_exponent) << in_token)
            + ((m >> (n - self.msb_in_token)) << self.lsb_in_token)
            + (m & ((1 << self.lsb_in_token) - 1));
        let nbits = n - in_token;
        let bits = (value >> self.lsb_in_token) & ((1 << nbits) - 1);
        UintToken { token, nbits, bits }
    }
}

impl Default for HybridUintConfig {
    fn default() -> Self {
        Self::new(4, 2, 0)
    }
}

/// Map an unsigned code onto signed space: even codes are non-negative,
/// odd codes negative (`0, -1, 1, -2, 2, ...`).
#[inline]
pub fn unpack_signed(value: u32) -> i32 {
    ((value >> 1) ^ ((!value & 1).wrapping_sub(1))) as i32
}

/// Inverse of [`unpack_signed`].
#[inline]
pub fn pack_signed(value: i32) -> u32 {
    ((value as u32) << 1) ^ (((!value) as u32 >> 31).wrapping_sub(1))
}
