//! Median filter.

use crate::core::types::PixelBuffer;

/// Window side actually used for a requested `size`.
///
/// Even sizes are bumped to the next odd value and 0 is treated as 1.
pub fn effective_window(size: usize) -> usize {
    if size == 0 {
        1
    } else if size % 2 == 0 {
        size + 1
    } else {
        size
    }
}

/// Replace every sample with the median of its square neighbourhood.
///
/// Out-of-range reads replicate the nearest edge sample, so the window is
/// always full and (being odd) has a single middle element.
pub fn median_filter(buffer: &PixelBuffer, size: usize) -> PixelBuffer {
    let side = effective_window(size);
    if side == 1 {
        return buffer.clone();
    }
    let half = (side / 2) as isize;
    let mut window = Vec::with_capacity(side * side);

    buffer.map_indexed(|row, col| {
        window.clear();
        for dr in -half..=half {
            for dc in -half..=half {
                window.push(buffer.pixel_replicated(row as isize + dr, col as isize + dc));
            }
        }
        let mid = window.len() / 2;
        *window.select_nth_unstable(mid).1
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_effective_window() {
        assert_eq!(effective_window(0), 1);
        assert_eq!(effective_window(3), 3);
        assert_eq!(effective_window(4), 5);
    }

    #[test]
    fn test_removes_salt_noise() {
        let buf = PixelBuffer::from_fn(5, 5, |r, c| if (r, c) == (2, 2) { 255 } else { 40 }).unwrap();
        let out = median_filter(&buf, 3);
        assert!(out.as_bytes().iter().all(|&v| v == 40));
    }

    #[test]
    fn test_edge_replication() {
        // A 1x3 row [0, 9, 9]: the left window is [0, 0, 9] x3 rows -> 0.
        let buf = PixelBuffer::new(3, 1, vec![0, 9, 9]).unwrap();
        assert_eq!(median_filter(&buf, 3).as_bytes(), &[0, 9, 9]);
    }

    #[test]
    fn test_size_one_is_identity() {
        let buf = PixelBuffer::from_fn(3, 3, |r, c| (r * 3 + c) as u8).unwrap();
        assert_eq!(median_filter(&buf, 1), buf);
        assert_eq!(median_filter(&buf, 0), buf);
    }

    proptest! {
        #[test]
        fn median_preserves_constant(v in any::<u8>(), size in 0usize..8) {
            let buf = PixelBuffer::filled(4, 3, v).unwrap();
            prop_assert_eq!(median_filter(&buf, size), buf);
        }
    }
}
