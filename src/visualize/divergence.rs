use num::Float;

use crate::utils::math::ln_or_neg_inf;

pub trait Divergence<N>
where
    N: Float,
{
    /// Distance between two distributions over the same support.
    /// Must be symmetric and zero for identical inputs.
    fn divergence(p: &[N], q: &[N]) -> N;
}

/// Jensen–Shannon divergence (natural log)
/// JS(p, q) = ½ KL(p ‖ m) + ½ KL(q ‖ m), m = ½ (p + q)
/// Bounded by ln 2.
#[derive(Debug)]
pub struct JensenShannon;

impl<N> Divergence<N> for JensenShannon
where
    N: Float,
{
    #[inline]
    fn divergence(p: &[N], q: &[N]) -> N {
        debug_assert_eq!(p.len(), q.len());
        let half = N::from(0.5).unwrap_or_else(N::zero);
        let mut kl_p = N::zero();
        let mut kl_q = N::zero();
        for (&a, &b) in p.iter().zip(q) {
            let m = (a + b) * half;
            // 0 · ln 0 = 0
            if a > N::zero() {
                kl_p = kl_p + a * (a.ln() - ln_or_neg_inf(m));
            }
            if b > N::zero() {
                kl_q = kl_q + b * (b.ln() - ln_or_neg_inf(m));
            }
        }
        let js = (kl_p + kl_q) * half;
        // rounding can leave a tiny negative value for near-identical rows
        js.max(N::zero())
    }
}

/// Kullback–Leibler divergence KL(p ‖ q); infinite when q misses p's support.
/// Asymmetric, so not a `Divergence`.
pub fn kullback_leibler<N: Float>(p: &[N], q: &[N]) -> N {
    p.iter()
        .zip(q)
        .filter(|(&a, _)| a > N::zero())
        .fold(N::zero(), |acc, (&a, &b)| acc + a * (a.ln() - ln_or_neg_inf(b)))
}

/// Symmetric pairwise matrix of `D` over `rows`, zero diagonal.
pub fn pairwise<N, D>(rows: &[Vec<N>]) -> Vec<Vec<N>>
where
    N: Float,
    D: Divergence<N>,
{
    let n = rows.len();
    let mut out = vec![vec![N::zero(); n]; n];
    for i in 0..n {
        for j in (i + 1)..n {
            let d = D::divergence(&rows[i], &rows[j]);
            out[i][j] = d;
            out[j][i] = d;
        }
    }
    out
}
