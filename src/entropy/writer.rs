//! ANS stream encoder.

use super::alias::AliasTable;
use super::hybrid_uint::UintToken;
use super::{ANS_FINAL_STATE, ANS_LOG_TAB_SIZE, ANS_TAB_SIZE};
use crate::bit_writer::BitWriter;
use crate::error::{ContextMapError, Result};

/// For each symbol, the slot holding each of its offsets.
fn reverse_map(table: &AliasTable) -> Vec<Vec<u32>> {
    let mut slots: Vec<Vec<u32>> = Vec::new();
    for slot in 0..ANS_TAB_SIZE {
        let symbol = table.lookup(slot);
        let value = symbol.value as usize;
        if slots.len() <= value {
            slots.resize_with(value + 1, Vec::new);
        }
        let entry = &mut slots[value];
        if entry.len() < symbol.freq as usize {
            entry.resize(symbol.freq as usize, 0);
        }
        entry[symbol.offset as usize] = slot;
    }
    slots
}

/// Write `tokens` (all from `table`'s histogram) as an ANS stream that
/// [`AnsSymbolReader`](super::AnsSymbolReader) decodes in order.
///
/// Tokens are encoded last to first. The decoder sees the final state
/// first, then per token an optional 16-bit refill and the extra bits.
pub(crate) fn write_ans_stream(
    writer: &mut BitWriter,
    tokens: &[UintToken],
    table: &AliasTable,
) -> Result<()> {
    let slots = reverse_map(table);
    let mut refills: Vec<Option<u32>> = vec![None; tokens.len()];
    let mut state = ANS_FINAL_STATE;
    for (i, token) in tokens.iter().enumerate().rev() {
        let offsets = slots
            .get(token.token as usize)
            .filter(|offsets| !offsets.is_empty())
            .ok_or(ContextMapError::Unencodable("token missing from histogram"))?;
        let freq = offsets.len() as u32;
        if (state >> (32 - ANS_LOG_TAB_SIZE)) >= freq {
            refills[i] = Some(state & 0xFFFF);
            state >>= 16;
        }
        state = ((state / freq) << ANS_LOG_TAB_SIZE) + offsets[(state % freq) as usize];
    }

    writer.write(32, state);
    for (token, refill) in tokens.iter().zip(&refills) {
        if let Some(chunk) = refill {
            writer.write(16, *chunk);
        }
        writer.write(token.nbits, token.bits);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bit_reader::BitReader;

    #[test]
    fn test_reverse_map_covers_every_slot() {
        let table = AliasTable::new(&[1000, 0, 3000, 96], 5).unwrap();
        let slots = reverse_map(&table);
        assert_eq!(slots.len(), 4);
        assert_eq!(slots[0].len(), 1000);
        assert!(slots[1].is_empty());
        assert_eq!(slots[2].len(), 3000);
        assert_eq!(slots[3].len(), 96);
        for (value, offsets) in slots.iter().enumerate() {
            for (offset, &slot) in offsets.iter().enumerate() {
                let symbol = table.lookup(slot);
                assert_eq!(symbol.value as usize, value);
                assert_eq!(symbol.offset as usize, offset);
            }
        }
    }

    #[test]
    fn test_single_symbol_stream_is_bare_state() {
        let table = AliasTable::new(&[ANS_TAB_SIZE], 5).unwrap();
        let tokens = [UintToken {
            token: 0,
            nbits: 0,
            bits: 0,
        }; 10];
        let mut writer = BitWriter::new();
        write_ans_stream(&mut writer, &tokens, &table).unwrap();
        let data = writer.finish();
        let mut reader = BitReader::new(&data);
        assert_eq!(reader.read_bits(32).unwrap(), ANS_FINAL_STATE);
        assert!(reader.is_eof());
    }

    #[test]
    fn test_unknown_token_rejected() {
        let table = AliasTable::new(&[2048, 2048], 5).unwrap();
        let tokens = [UintToken {
            token: 3,
            nbits: 0,
            bits: 0,
        }];
        let mut writer = BitWriter::new();
        assert_eq!(
            write_ans_stream(&mut writer, &tokens, &table),
            Err(ContextMapError::Unencodable("token missing from histogram"))
        );
    }
}
