//! Distance functions
//!
//! Ranking and the distance cutoff are calibrated to Manhattan distance.

/// Manhattan (L1) distance: sum of absolute per-component differences.
///
/// Both slices must have the same length; the index and engine validate
/// dimensions before vectors reach this function.
#[inline]
pub fn manhattan(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "vectors of different dimension");
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).abs()).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manhattan_identical_is_zero() {
        let a = [0.25, -1.0, 3.5];
        assert_eq!(manhattan(&a, &a), 0.0);
    }

    #[test]
    fn test_manhattan_sums_absolute_differences() {
        let a = [1.0, -2.0, 0.5];
        let b = [-1.0, 1.0, 0.5];
        assert!((manhattan(&a, &b) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_manhattan_is_symmetric() {
        let a = [0.1, 0.7, -0.3, 0.9];
        let b = [0.4, -0.2, 0.3, 0.0];
        assert_eq!(manhattan(&a, &b), manhattan(&b, &a));
    }

    #[test]
    fn test_manhattan_differs_from_euclidean() {
        let a = [0.0, 0.0];
        let b = [3.0, 4.0];
        assert_eq!(manhattan(&a, &b), 7.0);
    }
}
