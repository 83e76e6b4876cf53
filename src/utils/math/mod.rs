use num::Float;

/// Digamma function ψ(x) for x > 0.
///
/// Shifts x above 6 with the recurrence ψ(x) = ψ(x + 1) - 1/x, then uses the
/// asymptotic series.
pub fn digamma(mut x: f64) -> f64 {
    let mut acc = 0.0;
    while x < 6.0 {
        acc -= 1.0 / x;
        x += 1.0;
    }
    let f = 1.0 / (x * x);
    acc + x.ln()
        - 0.5 / x
        - f * (1.0 / 12.0 - f * (1.0 / 120.0 - f * (1.0 / 252.0 - f * (1.0 / 240.0 - f / 132.0))))
}

/// Trigamma function ψ₁(x) for x > 0.
pub fn trigamma(mut x: f64) -> f64 {
    let mut acc = 0.0;
    while x < 6.0 {
        acc += 1.0 / (x * x);
        x += 1.0;
    }
    let f = 1.0 / (x * x);
    acc + 1.0 / x + f / 2.0 + f / x * (1.0 / 6.0 - f * (1.0 / 30.0 - f * (1.0 / 42.0 - f / 30.0)))
}

/// E[ln θ_i] for θ ~ Dir(params): ψ(params_i) - ψ(Σ params).
pub fn dirichlet_expectation(params: &[f64]) -> Vec<f64> {
    let total = digamma(params.iter().sum());
    params.iter().map(|&p| digamma(p) - total).collect()
}

/// Scale a row so it sums to 1.
/// A row with no mass becomes uniform; an empty row stays empty.
pub fn normalize<N: Float>(row: &[N]) -> Vec<N> {
    if row.is_empty() {
        return Vec::new();
    }
    let sum = row.iter().fold(N::zero(), |acc, &v| acc + v);
    if sum > N::zero() && sum.is_finite() {
        row.iter().map(|&v| v / sum).collect()
    } else {
        let uniform = N::one() / N::from(row.len()).unwrap_or_else(N::one);
        vec![uniform; row.len()]
    }
}

/// Natural log with non-positive input mapped to -inf.
#[inline]
pub fn ln_or_neg_inf<N: Float>(v: N) -> N {
    if v > N::zero() {
        v.ln()
    } else {
        N::neg_infinity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digamma_matches_known_values() {
        // ψ(1) = -γ
        assert!((digamma(1.0) + 0.577_215_664_901_532_9).abs() < 1e-10);
        // ψ(0.5) = -γ - 2 ln 2
        assert!((digamma(0.5) + 1.963_510_026_021_423_5).abs() < 1e-10);
        assert!((digamma(10.0) - 2.251_752_589_066_721).abs() < 1e-10);
    }

    #[test]
    fn trigamma_matches_known_values() {
        // ψ₁(1) = π²/6
        let pi2_6 = std::f64::consts::PI.powi(2) / 6.0;
        assert!((trigamma(1.0) - pi2_6).abs() < 1e-9);
        // ψ₁(0.5) = π²/2
        assert!((trigamma(0.5) - 3.0 * pi2_6).abs() < 1e-9);
    }

    #[test]
    fn normalize_handles_zero_and_empty_rows() {
        assert_eq!(normalize::<f64>(&[]), Vec::<f64>::new());
        assert_eq!(normalize(&[0.0f64, 0.0]), vec![0.5, 0.5]);
        let row = normalize(&[1.0f64, 3.0]);
        assert!((row[0] - 0.25).abs() < 1e-12);
        assert!((row[1] - 0.75).abs() < 1e-12);
    }

    #[test]
    fn dirichlet_expectation_is_negative_log_scale() {
        let e = dirichlet_expectation(&[1.0, 1.0]);
        // ψ(1) - ψ(2) = -1
        assert!((e[0] + 1.0).abs() < 1e-10);
        assert_eq!(e[0], e[1]);
    }
}
