//! Move-to-front transform over byte values.

/// Recency table with every byte value at its own index.
fn identity_table() -> [u8; 256] {
    let mut mtf = [0u8; 256];
    for (i, v) in mtf.iter_mut().enumerate() {
        *v = i as u8;
    }
    mtf
}

/// Move `mtf[index]` to the front, shifting the entries before it right.
#[inline]
fn promote(mtf: &mut [u8; 256], index: usize) {
    let value = mtf[index];
    mtf.copy_within(0..index, 1);
    mtf[0] = value;
}

/// Undo a move-to-front transform in place.
///
/// Each entry is replaced by the value at that position of the recency
/// table, which is then moved to the front. Index 0 leaves the table as is.
///
/// ```
/// use jxl_context_map::inverse_move_to_front;
///
/// let mut v = [2, 0, 1];
/// inverse_move_to_front(&mut v);
/// assert_eq!(v, [2, 2, 0]);
/// ```
pub fn inverse_move_to_front(values: &mut [u8]) {
    let mut mtf = identity_table();
    for v in values.iter_mut() {
        let index = *v as usize;
        *v = mtf[index];
        if index != 0 {
            promote(&mut mtf, index);
        }
    }
}

/// Forward move-to-front transform.
pub fn move_to_front(values: &[u8]) -> Vec<u8> {
    let mut mtf = identity_table();
    values
        .iter()
        .map(|&value| {
            // The table is a permutation of all byte values.
            let index = mtf.iter().position(|&m| m == value).unwrap_or(0);
            if index != 0 {
                promote(&mut mtf, index);
            }
            index as u8
        })
        .collect()
}
