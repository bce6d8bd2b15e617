//! Width/height inference for headerless sample streams.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A width and height pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: usize,
    pub height: usize,
}

impl Dimensions {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    /// Number of samples covered.
    pub fn area(&self) -> usize {
        self.width * self.height
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// How much an inferred shape can be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Confidence {
    /// A non-trivial factorization was found.
    High,
    /// Only `N x 1` exists; the data is probably a single row.
    Low,
}

/// Result of [`infer_dimensions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferredDimensions {
    pub dimensions: Dimensions,
    pub confidence: Confidence,
}

/// Every `(width, height)` with `width * height == count`, for
/// `width <= sqrt(count)`, each followed by its transpose when distinct.
pub fn divisor_pairs(count: usize) -> Vec<Dimensions> {
    let mut pairs = Vec::new();
    let mut w = 1;
    while w * w <= count {
        if count % w == 0 {
            let h = count / w;
            pairs.push(Dimensions::new(w, h));
            if w != h {
                pairs.push(Dimensions::new(h, w));
            }
        }
        w += 1;
    }
    pairs
}

/// Most-square factorization of `count`.
///
/// Picks the first pair minimising `|width - height|`, so ties resolve to
/// `width <= height`. When only the trivial factorization exists the result
/// is `(count, 1)` with [`Confidence::Low`]. Returns `None` for 0.
pub fn infer_dimensions(count: usize) -> Option<InferredDimensions> {
    if count == 0 {
        return None;
    }

    let best = divisor_pairs(count)
        .into_iter()
        .min_by_key(|d| d.width.abs_diff(d.height))?;

    if best.width == 1 || best.height == 1 {
        return Some(InferredDimensions {
            dimensions: Dimensions::new(count, 1),
            confidence: Confidence::Low,
        });
    }

    Some(InferredDimensions {
        dimensions: best,
        confidence: Confidence::High,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_square_count() {
        let inferred = infer_dimensions(65536).unwrap();
        assert_eq!(inferred.dimensions, Dimensions::new(256, 256));
        assert_eq!(inferred.confidence, Confidence::High);
    }

    #[test]
    fn test_prime_count() {
        let inferred = infer_dimensions(17).unwrap();
        assert_eq!(inferred.dimensions, Dimensions::new(17, 1));
        assert_eq!(inferred.confidence, Confidence::Low);
    }

    #[test]
    fn test_tie_prefers_narrow_width() {
        assert_eq!(infer_dimensions(12).unwrap().dimensions, Dimensions::new(3, 4));
        assert_eq!(infer_dimensions(6).unwrap().dimensions, Dimensions::new(2, 3));
    }

    #[test]
    fn test_degenerate_counts() {
        assert!(infer_dimensions(0).is_none());
        let one = infer_dimensions(1).unwrap();
        assert_eq!(one.dimensions, Dimensions::new(1, 1));
        assert_eq!(one.confidence, Confidence::Low);
    }

    #[test]
    fn test_divisor_pairs() {
        assert_eq!(
            divisor_pairs(6),
            vec![
                Dimensions::new(1, 6),
                Dimensions::new(6, 1),
                Dimensions::new(2, 3),
                Dimensions::new(3, 2),
            ]
        );
    }

    proptest! {
        #[test]
        fn inferred_area_matches(count in 1usize..50_000) {
            let inferred = infer_dimensions(count).unwrap();
            prop_assert_eq!(inferred.dimensions.area(), count);
            prop_assert!(inferred.dimensions.width * inferred.dimensions.width <= count
                || inferred.confidence == Confidence::Low);
        }
    }
}
