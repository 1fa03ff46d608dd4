//! ANS histogram serialization.
//!
//! A histogram is stored in one of three forms:
//!
//! | Form | Layout |
//! |------|--------|
//! | Simple | 1 or 2 symbols; two symbols carry a 12-bit count for the first |
//! | Flat | Alphabet size; 4096 split evenly |
//! | Full | Per-symbol log2 counts (prefix coded, with RLE) plus mantissa bits |
//!
//! In the full form one symbol (the first with the largest log count) is
//! omitted and receives whatever is left of the 4096 total.

use super::{floor_log2_nonzero, ANS_LOG_TAB_SIZE, ANS_TAB_SIZE};
use crate::bit_reader::BitReader;
use crate::bit_writer::BitWriter;
use crate::error::{ContextMapError, Result};

/// Log count symbol that introduces a run of repeated counts.
const RLE_LOG_COUNT: u32 = ANS_LOG_TAB_SIZE + 1;
/// Minimum number of entries covered by one RLE symbol.
const RLE_MIN_REPEAT: usize = 4;
/// Shift that makes every mantissa bit explicit.
const EXACT_SHIFT: u32 = ANS_LOG_TAB_SIZE + 1;
/// Longest log count code.
const LOG_COUNT_MAX_BITS: u32 = 7;

/// Prefix code for log counts `0..=13`: (code bits, LSB first; length).
const LOG_COUNT_CODES: [(u32, u32); RLE_LOG_COUNT as usize + 1] = [
    (17, 5),
    (11, 4),
    (15, 4),
    (3, 4),
    (9, 4),
    (7, 4),
    (4, 3),
    (2, 3),
    (5, 3),
    (6, 3),
    (0, 3),
    (33, 6),
    (1, 7),
    (65, 7),
];

/// Read a value in `0..=255`: a flag, then a 3-bit exponent and mantissa.
pub(crate) fn decode_var_len_uint8(reader: &mut BitReader) -> Result<u32> {
    if !reader.read_bit()? {
        return Ok(0);
    }
    let nbits = reader.read_bits(3)?;
    if nbits == 0 {
        return Ok(1);
    }
    Ok(reader.read_bits(nbits)? + (1 << nbits))
}

pub(crate) fn encode_var_len_uint8(writer: &mut BitWriter, value: u32) {
    debug_assert!(value <= 255);
    if value == 0 {
        writer.write(1, 0);
        return;
    }
    let nbits = floor_log2_nonzero(value);
    writer.write(1, 1);
    writer.write(3, nbits);
    writer.write(nbits, value - (1 << nbits));
}

fn read_log_count(reader: &mut BitReader) -> Result<u32> {
    let bits = reader.peek_bits(LOG_COUNT_MAX_BITS);
    for (log_count, &(code, len)) in LOG_COUNT_CODES.iter().enumerate() {
        if bits & ((1 << len) - 1) == code {
            reader.skip_bits(len)?;
            return Ok(log_count as u32);
        }
    }
    Err(ContextMapError::InvalidHistogram("invalid log count code"))
}

/// Number of explicit mantissa bits for a count of magnitude `2^log_count`.
fn population_count_precision(log_count: u32, shift: u32) -> u32 {
    let r = (log_count as i32).min(shift as i32 - ((ANS_LOG_TAB_SIZE - log_count) >> 1) as i32);
    r.max(0) as u32
}

/// Evenly split `total_count` over `length` symbols.
fn flat_histogram(length: usize, total_count: u32) -> Vec<u32> {
    let count = total_count / length as u32;
    let remainder = (total_count % length as u32) as usize;
    let mut counts = vec![count; length];
    for c in counts.iter_mut().take(remainder) {
        *c += 1;
    }
    counts
}

/// Read one histogram with 12-bit precision.
pub(crate) fn read_histogram(reader: &mut BitReader) -> Result<Vec<u32>> {
    let is_simple = reader.read_bit()?;
    if is_simple {
        let num_symbols = reader.read_bits(1)? as usize + 1;
        let mut symbols = [0usize; 2];
        for symbol in symbols.iter_mut().take(num_symbols) {
            *symbol = decode_var_len_uint8(reader)? as usize;
        }
        let max_symbol = symbols[..num_symbols].iter().copied().max().unwrap_or(0);
        let mut counts = vec![0u32; max_symbol + 1];
        if num_symbols == 1 {
            counts[symbols[0]] = ANS_TAB_SIZE;
        } else {
            if symbols[0] == symbols[1] {
                return Err(ContextMapError::InvalidHistogram("duplicate symbol"));
            }
            counts[symbols[0]] = reader.read_bits(ANS_LOG_TAB_SIZE)?;
            counts[symbols[1]] = ANS_TAB_SIZE - counts[symbols[0]];
        }
        return Ok(counts);
    }

    let is_flat = reader.read_bit()?;
    if is_flat {
        let alphabet_size = decode_var_len_uint8(reader)? as usize + 1;
        return Ok(flat_histogram(alphabet_size, ANS_TAB_SIZE));
    }

    let upper_bound_log = floor_log2_nonzero(ANS_LOG_TAB_SIZE + 1);
    let mut log = 0;
    while log < upper_bound_log && reader.read_bit()? {
        log += 1;
    }
    let shift = (reader.read_bits(log)? | (1 << log)) - 1;
    if shift > ANS_LOG_TAB_SIZE + 1 {
        return Err(ContextMapError::InvalidHistogram("invalid shift value"));
    }

    let length = decode_var_len_uint8(reader)? as usize + 3;
    let mut log_counts = vec![0u32; length];
    // Number of entries covered by an RLE symbol at that position
    let mut same = vec![0usize; length];
    let mut omit: Option<(u32, usize)> = None;
    let mut i = 0;
    while i < length {
        let log_count = read_log_count(reader)?;
        if log_count == RLE_LOG_COUNT {
            let repeat = decode_var_len_uint8(reader)? as usize + RLE_MIN_REPEAT;
            same[i] = repeat;
            i += repeat;
            continue;
        }
        log_counts[i] = log_count;
        if omit.map_or(true, |(omit_log, _)| log_count > omit_log) {
            omit = Some((log_count, i));
        }
        i += 1;
    }

    let omit_pos = match omit {
        Some((_, pos)) => pos,
        None => return Err(ContextMapError::InvalidHistogram("no symbol to omit")),
    };
    if omit_pos + 1 < length && same[omit_pos + 1] != 0 {
        return Err(ContextMapError::InvalidHistogram("RLE after omitted symbol"));
    }

    let mut counts = vec![0u32; length];
    let mut total_count = 0u32;
    let mut prev = 0;
    let mut num_same = 0;
    for i in 0..length {
        if same[i] != 0 {
            num_same = same[i];
            prev = if i > 0 { counts[i - 1] } else { 0 };
        }
        if num_same > 0 {
            counts[i] = prev;
            num_same -= 1;
        } else {
            let code = log_counts[i];
            if i == omit_pos || code == 0 {
                continue;
            }
            counts[i] = if code == 1 {
                1
            } else {
                let bitcount = population_count_precision(code - 1, shift);
                (1 << (code - 1)) + (reader.read_bits(bitcount)? << (code - 1 - bitcount))
            };
        }
        total_count += counts[i];
    }

    if total_count >= ANS_TAB_SIZE {
        return Err(ContextMapError::InvalidHistogram("counts exceed table size"));
    }
    counts[omit_pos] = ANS_TAB_SIZE - total_count;
    Ok(counts)
}

/// Write a histogram summing to [`ANS_TAB_SIZE`] over at most 256 symbols.
pub(crate) fn write_histogram(writer: &mut BitWriter, counts: &[u32]) -> Result<()> {
    let used: Vec<usize> = (0..counts.len()).filter(|&s| counts[s] != 0).collect();
    if counts.iter().sum::<u32>() != ANS_TAB_SIZE {
        return Err(ContextMapError::InvalidHistogram(
            "distribution does not sum to table size",
        ));
    }
    let length = used.last().map_or(0, |&s| s + 1);
    if length > 256 {
        return Err(ContextMapError::AlphabetTooLarge {
            size: length,
            max: 256,
        });
    }

    match used.as_slice() {
        [symbol] => {
            writer.write(1, 1);
            writer.write(1, 0);
            encode_var_len_uint8(writer, *symbol as u32);
        }
        [first, second] => {
            writer.write(1, 1);
            writer.write(1, 1);
            encode_var_len_uint8(writer, *first as u32);
            encode_var_len_uint8(writer, *second as u32);
            writer.write(ANS_LOG_TAB_SIZE, counts[*first]);
        }
        _ => {
            // Full form, every mantissa bit explicit so counts are exact.
            writer.write(1, 0);
            writer.write(1, 0);
            let upper_bound_log = floor_log2_nonzero(ANS_LOG_TAB_SIZE + 1);
            let log = floor_log2_nonzero(EXACT_SHIFT + 1);
            debug_assert_eq!(log, upper_bound_log);
            for _ in 0..log {
                writer.write(1, 1);
            }
            writer.write(log, EXACT_SHIFT + 1 - (1 << log));

            let length = length.max(3);
            encode_var_len_uint8(writer, (length - 3) as u32);

            let log_counts: Vec<u32> = (0..length)
                .map(|s| match counts.get(s).copied().unwrap_or(0) {
                    0 => 0,
                    c => floor_log2_nonzero(c) + 1,
                })
                .collect();
            let mut omit_pos = 0;
            for (s, &log_count) in log_counts.iter().enumerate() {
                if log_count > log_counts[omit_pos] {
                    omit_pos = s;
                }
            }
            for &log_count in &log_counts {
                let (code, len) = LOG_COUNT_CODES[log_count as usize];
                writer.write(len, code);
            }
            for (s, &log_count) in log_counts.iter().enumerate() {
                if s == omit_pos || log_count <= 1 {
                    continue;
                }
                let bitcount = population_count_precision(log_count - 1, EXACT_SHIFT);
                debug_assert_eq!(bitcount, log_count - 1);
                writer.write(bitcount, counts[s] - (1 << (log_count - 1)));
            }
        }
    }
    Ok(())
}

/// Scale symbol frequencies so they sum to [`ANS_TAB_SIZE`], keeping every
/// used symbol at a count of at least 1.
pub(crate) fn normalize_counts(frequencies: &[u64]) -> Result<Vec<u32>> {
    let total: u64 = frequencies.iter().sum();
    if total == 0 {
        return Err(ContextMapError::Unencodable("empty symbol stream"));
    }
    if frequencies.iter().filter(|&&f| f != 0).count() > ANS_TAB_SIZE as usize {
        return Err(ContextMapError::Unencodable("too many distinct symbols"));
    }

    let mut counts: Vec<u32> = frequencies
        .iter()
        .map(|&f| match f {
            0 => 0,
            f => ((f * ANS_TAB_SIZE as u64 / total) as u32).max(1),
        })
        .collect();

    let mut sum: u32 = counts.iter().sum();
    while sum > ANS_TAB_SIZE {
        // Take from the largest count; it stays >= 1 since at most 4096 symbols are used.
        let largest = (0..counts.len()).max_by_key(|&s| counts[s]).unwrap_or(0);
        let excess = (sum - ANS_TAB_SIZE).min(counts[largest] - 1);
        counts[largest] -= excess;
        sum -= excess;
    }
    if sum < ANS_TAB_SIZE {
        let largest = (0..counts.len()).max_by_key(|&s| counts[s]).unwrap_or(0);
        counts[largest] += ANS_TAB_SIZE - sum;
    }
    Ok(counts)
}
