//! Bit writer for context map streams.
//!
//! Produces the LSB-first layout read by [`BitReader`](crate::BitReader).

/// Bit writer that appends to a growable byte buffer.
#[derive(Debug, Default, Clone)]
pub struct BitWriter {
    bytes: Vec<u8>,
    /// Pending bits not yet flushed to `bytes`
    buffer: u64,
    /// Number of pending bits (always < 8 between calls)
    bits_in_buffer: u32,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the low `n_bits` bits of `bits` (0 to 32 bits).
    pub fn write(&mut self, n_bits: u32, bits: u32) {
        debug_assert!(n_bits <= 32);
        debug_assert!(n_bits == 32 || bits >> n_bits == 0);
        let mask = (1u64 << n_bits) - 1;
        self.buffer |= (bits as u64 & mask) << self.bits_in_buffer;
        self.bits_in_buffer += n_bits;
        while self.bits_in_buffer >= 8 {
            self.bytes.push(self.buffer as u8);
            self.buffer >>= 8;
            self.bits_in_buffer -= 8;
        }
    }

    /// Number of bits written so far.
    pub fn bits_written(&self) -> u64 {
        self.bytes.len() as u64 * 8 + self.bits_in_buffer as u64
    }

    /// Flush the final partial byte (zero padded) and return the buffer.
    pub fn finish(mut self) -> Vec<u8> {
        if self.bits_in_buffer > 0 {
            self.bytes.push(self.buffer as u8);
        }
        self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BitReader;

    #[test]
    fn test_write_lsb_first() {
        let mut writer = BitWriter::new();
        writer.write(4, 0b0100);
        writer.write(4, 0b1011);
        writer.write(8, 0b11001010);
        assert_eq!(writer.bits_written(), 16);
        assert_eq!(writer.finish(), vec![0b10110100, 0b11001010]);
    }

    #[test]
    fn test_partial_byte_is_padded() {
        let mut writer = BitWriter::new();
        writer.write(1, 1);
        writer.write(2, 0b10);
        assert_eq!(writer.bits_written(), 3);
        assert_eq!(writer.finish(), vec![0b101]);
    }

    #[test]
    fn test_reader_sees_written_fields() {
        let mut writer = BitWriter::new();
        writer.write(3, 5);
        writer.write(32, 0xDEAD_BEEF);
        writer.write(0, 0);
        writer.write(13, 4097);
        let data = writer.finish();

        let mut reader = BitReader::new(&data);
        assert_eq!(reader.read_bits(3).unwrap(), 5);
        assert_eq!(reader.read_bits(32).unwrap(), 0xDEAD_BEEF);
        assert_eq!(reader.read_bits(13).unwrap(), 4097);
    }
}
