use crate::error::{ContextMapError, Result};

/// Check that `context_map` uses exactly the clusters `0..num_htrees`.
///
/// Fails with [`ContextMapError::InvalidHistogramIndex`] on the first entry
/// outside the range, and with [`ContextMapError::IncompleteContextMap`] if
/// some cluster in the range is never used. Validation does not modify the
/// map, so a map that passes once passes again.
pub fn verify_context_map(context_map: &[u8], num_htrees: usize) -> Result<()> {
    let mut have_htree = vec![false; num_htrees];
    let mut num_found = 0;
    for &htree in context_map {
        let seen = have_htree
            .get_mut(htree as usize)
            .ok_or(ContextMapError::InvalidHistogramIndex {
                index: htree,
                num_htrees,
            })?;
        if !*seen {
            *seen = true;
            num_found += 1;
        }
    }
    if num_found != num_htrees {
        return Err(ContextMapError::IncompleteContextMap {
            found: num_found,
            num_htrees,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dense_map_accepted() {
        assert!(verify_context_map(&[0, 2, 1, 1, 0], 3).is_ok());
        assert!(verify_context_map(&[0], 1).is_ok());
    }

    #[test]
    fn test_out_of_range_index() {
        assert_eq!(
            verify_context_map(&[0, 3, 1], 3),
            Err(ContextMapError::InvalidHistogramIndex {
                index: 3,
                num_htrees: 3
            })
        );
    }

    #[test]
    fn test_gap_is_incomplete() {
        assert_eq!(
            verify_context_map(&[0, 2, 2], 3),
            Err(ContextMapError::IncompleteContextMap {
                found: 2,
                num_htrees: 3
            })
        );
    }

    #[test]
    fn test_empty_map_incomplete() {
        assert_eq!(
            verify_context_map(&[], 1),
            Err(ContextMapError::IncompleteContextMap {
                found: 0,
                num_htrees: 1
            })
        );
    }

    #[test]
    fn test_revalidation_is_stable() {
        let map = [1, 0, 1, 2];
        for _ in 0..3 {
            assert!(verify_context_map(&map, 3).is_ok());
        }
        for _ in 0..3 {
            assert!(verify_context_map(&map, 4).is_err());
        }
    }
}
