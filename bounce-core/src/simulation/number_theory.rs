//! Exact integer helpers for corner prediction.
//!
//! Everything here works on `i64` inputs and widens to `i128` wherever an
//! intermediate product could exceed 64 bits.

/// Bézout coefficients and greatest common divisor for a pair of integers.
///
/// Coefficients are ordered against `(max(n1, n2), min(n1, n2))`, so that
/// `coefficients.0 * max + coefficients.1 * min == gcd`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BezoutSolution {
    pub coefficients: (i64, i64),
    pub gcd: i64,
}

impl BezoutSolution {
    /// Returns the coefficient that multiplies `n` in the identity.
    ///
    /// `n` must be one of the two values the solution was computed for.
    /// When both inputs are equal the first coefficient is returned.
    pub fn coefficient_for(&self, n: i64, other: i64) -> i64 {
        if n >= other {
            self.coefficients.0
        } else {
            self.coefficients.1
        }
    }
}

/// Runs the iterative extended Euclidean algorithm on `n1` and `n2`.
///
/// Callers must pass positive integers; the arena constructor guarantees
/// this for every call made by the simulator.
pub fn extended_euclidean(n1: i64, n2: i64) -> BezoutSolution {
    let a = n1.max(n2);
    let b = n1.min(n2);

    let (mut r_prev, mut r) = (a, b);
    let (mut s_prev, mut s) = (1_i64, 0_i64);
    let (mut t_prev, mut t) = (0_i64, 1_i64);

    while r != 0 {
        let q = r_prev / r;
        (r_prev, r) = (r, r_prev - q * r);
        (s_prev, s) = (s, s_prev - q * s);
        (t_prev, t) = (t, t_prev - q * t);
    }

    BezoutSolution {
        coefficients: (s_prev, t_prev),
        gcd: r_prev,
    }
}

/// Least common multiple of two positive integers.
///
/// The product is formed in `i128`, so any pair of `u32`-sized dimensions
/// is exact. Results above `u64::MAX` saturate, which cannot happen for
/// `u32` inputs.
///
/// # Panics
///
/// Panics if both `n1` and `n2` are zero, since their gcd is zero.
pub fn lcm(n1: i64, n2: i64) -> u64 {
    let gcd = extended_euclidean(n1, n2).gcd;
    let product = i128::from(n1) * i128::from(n2);
    u64::try_from(product / i128::from(gcd)).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_identity(n1: i64, n2: i64) {
        let solution = extended_euclidean(n1, n2);
        let (s, t) = solution.coefficients;
        assert_eq!(s * n1.max(n2) + t * n1.min(n2), solution.gcd);
        assert_eq!(n1 % solution.gcd, 0);
        assert_eq!(n2 % solution.gcd, 0);
    }

    #[test]
    fn test_extended_euclidean_coprime() {
        let solution = extended_euclidean(7, 5);
        assert_eq!(solution.gcd, 1);
        assert_identity(7, 5);
        assert_identity(5, 7);
    }

    #[test]
    fn test_extended_euclidean_shared_factor() {
        assert_eq!(extended_euclidean(4, 6).gcd, 2);
        assert_eq!(extended_euclidean(540, 310).gcd, 10);
        assert_identity(540, 310);
        assert_identity(12, 18);
    }

    #[test]
    fn test_extended_euclidean_equal_and_unit() {
        let equal = extended_euclidean(9, 9);
        assert_eq!(equal.gcd, 9);
        assert_identity(9, 9);
        assert_eq!(extended_euclidean(1, 1_000_000).gcd, 1);
        assert_identity(1, 1_000_000);
    }

    #[test]
    fn test_coefficient_for_follows_argument_order() {
        let solution = extended_euclidean(5, 7);
        let for_five = solution.coefficient_for(5, 7);
        let for_seven = solution.coefficient_for(7, 5);
        assert_eq!(for_five * 5 + for_seven * 7, solution.gcd);
    }

    #[test]
    fn test_lcm() {
        assert_eq!(lcm(7, 5), 35);
        assert_eq!(lcm(4, 6), 12);
        assert_eq!(lcm(9, 9), 9);
        assert_eq!(lcm(1, 13), 13);
    }

    #[test]
    fn test_lcm_with_one_zero_is_zero() {
        assert_eq!(lcm(0, 5), 0);
        assert_eq!(lcm(5, 0), 0);
    }

    #[test]
    #[should_panic]
    fn test_lcm_of_two_zeros_panics() {
        lcm(0, 0);
    }

    #[test]
    fn test_lcm_does_not_overflow_for_large_dimensions() {
        let big = i64::from(u32::MAX);
        let expected = (u32::MAX as u64) * (u32::MAX as u64 - 1);
        assert_eq!(lcm(big, big - 1), expected);
    }
}
