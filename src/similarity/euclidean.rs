//! Euclidean distance for dense points.

/// Euclidean (L2) distance between two points of equal dimension.
#[inline]
pub fn l2(a: &[f64], b: &[f64]) -> f64 {
    l2_squared(a, b).sqrt()
}

/// Squared Euclidean distance (avoids the sqrt).
#[inline]
pub fn l2_squared(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len(), "Point dimensions must match");

    a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical() {
        let a = [1.0, 2.0, 3.0];
        assert!(l2(&a, &a).abs() < 1e-12);
    }

    #[test]
    fn test_pythagorean() {
        let a = [0.0, 0.0];
        let b = [3.0, 4.0];
        assert!((l2(&a, &b) - 5.0).abs() < 1e-12);
        assert!((l2_squared(&a, &b) - 25.0).abs() < 1e-12);
    }

    #[test]
    fn test_symmetric() {
        let a = [0.0, 0.5];
        let b = [5.0, 6.0];
        assert_eq!(l2(&a, &b), l2(&b, &a));
    }
}
