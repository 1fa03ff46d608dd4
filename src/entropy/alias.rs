//! Alias tables for ANS symbol lookup.
//!
//! The 4096 slots of a distribution are split into `2^log_alpha_size` equal
//! buckets. Each bucket holds a prefix of slots for its own symbol (up to
//! `cutoff`) and the remainder for a single "right" symbol, so finding the
//! symbol owning a slot takes one table access.

use super::{ANS_LOG_TAB_SIZE, ANS_TAB_SIZE};
use crate::error::{ContextMapError, Result};

#[derive(Debug, Clone, Copy, Default)]
struct AliasEntry {
    /// Slots below this position belong to the bucket's own symbol
    cutoff: u32,
    /// Symbol owning the slots at and above `cutoff`
    right_value: u32,
    /// Offset of the right part within `right_value`'s slots, minus `cutoff`
    offsets1: u32,
    /// Frequency of the bucket's own symbol
    freq0: u32,
    /// Frequency of `right_value`
    freq1: u32,
}

/// Result of a slot lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AliasSymbol {
    /// Decoded symbol
    pub value: u32,
    /// Position of the slot among the symbol's `freq` slots
    pub offset: u32,
    /// Frequency of the symbol
    pub freq: u32,
}

/// Alias table over one ANS distribution.
#[derive(Debug, Clone)]
pub struct AliasTable {
    entries: Vec<AliasEntry>,
    log_entry_size: u32,
}

impl AliasTable {
    /// Build the table for a distribution summing to [`ANS_TAB_SIZE`].
    pub fn new(distribution: &[u32], log_alpha_size: u32) -> Result<Self> {
        let mut distribution = distribution.to_vec();
        while distribution.last() == Some(&0) {
            distribution.pop();
        }
        // An empty alphabet still decodes (to symbol 0) instead of failing later.
        if distribution.is_empty() {
            distribution.push(ANS_TAB_SIZE);
        }

        let table_size = 1usize << log_alpha_size;
        if distribution.len() > table_size {
            return Err(ContextMapError::AlphabetTooLarge {
                size: distribution.len(),
                max: table_size,
            });
        }
        if distribution.iter().sum::<u32>() != ANS_TAB_SIZE {
            return Err(ContextMapError::InvalidHistogram(
                "distribution does not sum to table size",
            ));
        }

        let log_entry_size = ANS_LOG_TAB_SIZE - log_alpha_size;
        let entry_size = 1u32 << log_entry_size;
        let mut entries = vec![AliasEntry::default(); table_size];

        // A single-symbol distribution must leave the ANS state unchanged.
        if let Some(sym) = distribution.iter().position(|&f| f == ANS_TAB_SIZE) {
            for (i, entry) in entries.iter_mut().enumerate() {
                *entry = AliasEntry {
                    cutoff: 0,
                    right_value: sym as u32,
                    offsets1: entry_size * i as u32,
                    freq0: 0,
                    freq1: ANS_TAB_SIZE,
                };
            }
            return Ok(Self {
                entries,
                log_entry_size,
            });
        }

        let mut cutoffs = vec![0u32; table_size];
        let mut underfull = Vec::new();
        let mut overfull = Vec::new();
        for (i, cutoff) in cutoffs.iter_mut().enumerate() {
            *cutoff = distribution.get(i).copied().unwrap_or(0);
            if *cutoff > entry_size {
                overfull.push(i);
            } else if *cutoff < entry_size {
                underfull.push(i);
            }
        }

        // Move the excess of overfull buckets into the free space of underfull ones.
        while let Some(over) = overfull.pop() {
            let under = underfull.pop().ok_or(ContextMapError::InvalidHistogram(
                "unbalanced alias table",
            ))?;
            let underfull_by = entry_size - cutoffs[under];
            cutoffs[over] -= underfull_by;
            entries[under].right_value = over as u32;
            entries[under].offsets1 = cutoffs[over];
            if cutoffs[over] < entry_size {
                underfull.push(over);
            } else if cutoffs[over] > entry_size {
                overfull.push(over);
            }
        }

        for (i, entry) in entries.iter_mut().enumerate() {
            if cutoffs[i] == entry_size {
                entry.right_value = i as u32;
                entry.offsets1 = 0;
                entry.cutoff = 0;
            } else {
                entry.offsets1 -= cutoffs[i];
                entry.cutoff = cutoffs[i];
            }
            entry.freq0 = distribution.get(i).copied().unwrap_or(0);
            entry.freq1 = distribution
                .get(entry.right_value as usize)
                .copied()
                .unwrap_or(0);
        }

        Ok(Self {
            entries,
            log_entry_size,
        })
    }

    /// Find the symbol owning `value` (a slot in `0..ANS_TAB_SIZE`).
    #[inline]
    pub fn lookup(&self, value: u32) -> AliasSymbol {
        let i = (value >> self.log_entry_size) as usize;
        let pos = value & ((1 << self.log_entry_size) - 1);
        let entry = &self.entries[i];
        if pos >= entry.cutoff {
            AliasSymbol {
                value: entry.right_value,
                offset: entry.offsets1 + pos,
                freq: entry.freq1,
            }
        } else {
            AliasSymbol {
                value: i as u32,
                offset: pos,
                freq: entry.freq0,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Every symbol must own exactly `freq` slots with offsets `0..freq`.
    fn assert_bijective(table: &AliasTable, distribution: &[u32]) {
        let mut seen: Vec<Vec<bool>> = distribution
            .iter()
            .map(|&f| vec![false; f as usize])
            .collect();
        for slot in 0..ANS_TAB_SIZE {
            let s = table.lookup(slot);
            assert_eq!(s.freq, distribution[s.value as usize], "slot {}", slot);
            let cell = &mut seen[s.value as usize][s.offset as usize];
            assert!(!*cell, "slot {} maps to a used offset", slot);
            *cell = true;
        }
        assert!(seen.iter().flatten().all(|&b| b));
    }

    #[test]
    fn test_single_symbol_is_identity() {
        let table = AliasTable::new(&[0, 0, ANS_TAB_SIZE], 5).unwrap();
        for slot in [0, 1, 127, 128, 4095] {
            let s = table.lookup(slot);
            assert_eq!(s.value, 2);
            assert_eq!(s.offset, slot);
            assert_eq!(s.freq, ANS_TAB_SIZE);
        }
    }

    #[test]
    fn test_skewed_distribution() {
        let distribution = [3000, 1, 95, 0, 1000];
        let table = AliasTable::new(&distribution, 5).unwrap();
        assert_bijective(&table, &distribution);
    }

    #[test]
    fn test_flat_distribution() {
        let distribution = vec![16u32; 256];
        let table = AliasTable::new(&distribution, 8).unwrap();
        assert_bijective(&table, &distribution);
        assert_eq!(table.lookup(17).value, 1);
    }

    #[test]
    fn test_rejects_bad_sum() {
        assert!(matches!(
            AliasTable::new(&[100, 200], 5),
            Err(ContextMapError::InvalidHistogram(_))
        ));
    }

    #[test]
    fn test_rejects_long_alphabet() {
        let mut distribution = vec![0u32; 33];
        distribution[0] = ANS_TAB_SIZE - 1;
        distribution[32] = 1;
        assert_eq!(
            AliasTable::new(&distribution, 5).unwrap_err(),
            ContextMapError::AlphabetTooLarge { size: 33, max: 32 }
        );
    }
}
