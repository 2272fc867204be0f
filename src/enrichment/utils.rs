/// Trigamma function, via the recurrence up to x >= 10 and the asymptotic series.
pub fn trigamma(x: f64) -> f64 {
    if x <= 0.0 || !x.is_finite() {
        return f64::NAN;
    }
    let mut x = x;
    let mut acc = 0.0;
    while x < 10.0 {
        acc += 1.0 / (x * x);
        x += 1.0;
    }
    let inv = 1.0 / x;
    let inv2 = inv * inv;
    acc + inv
        + inv2 / 2.0
        + inv * inv2 * (1.0 / 6.0 - inv2 * (1.0 / 30.0 - inv2 * (1.0 / 42.0 - inv2 / 30.0)))
}

/// Standard deviation of log2(p) for a permutation p-value estimated from
/// `n_more_extreme` exceedances among `n_draws` draws.
pub fn permutation_log2_error(n_more_extreme: usize, n_draws: usize) -> f64 {
    if n_draws == 0 {
        return 0.0;
    }
    let var = trigamma(n_more_extreme as f64 + 1.0) - trigamma(n_draws as f64 + 1.0);
    var.max(0.0).sqrt() / std::f64::consts::LN_2
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_trigamma_known_values() {
        // psi1(1) = pi^2 / 6, psi1(1/2) = pi^2 / 2
        let pi2 = std::f64::consts::PI * std::f64::consts::PI;
        assert_relative_eq!(trigamma(1.0), pi2 / 6.0, epsilon = 1e-10);
        assert_relative_eq!(trigamma(0.5), pi2 / 2.0, epsilon = 1e-10);
        assert_relative_eq!(trigamma(100.0), 0.010050166663333571, epsilon = 1e-12);
        assert!(trigamma(0.0).is_nan());
    }

    #[test]
    fn test_log2_error_shrinks_with_exceedances() {
        let few = permutation_log2_error(1, 1000);
        let many = permutation_log2_error(100, 1000);
        assert!(few > many);
        assert!(many > 0.0);
        assert_relative_eq!(permutation_log2_error(0, 0), 0.0);
    }
}
