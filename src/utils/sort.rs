/// Sort a u32-key SoA pair (inds/vals) by ascending key.
/// - Reorders vals accordingly
/// - Keys are expected to be distinct (term indices of one document)
#[inline]
pub fn sort_u32_soa<N: Copy>(inds: &mut Vec<u32>, vals: &mut Vec<N>) {
    debug_assert_eq!(inds.len(), vals.len());
    let n = inds.len();
    if n <= 1 {
        return;
    }

    // Small sizes: insertion sort in place, no scratch.
    if n <= 32 {
        insertion_sort_u32_soa(inds, vals);
        return;
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_unstable_by_key(|&i| inds[i]);
    *inds = order.iter().map(|&i| inds[i]).collect();
    *vals = order.iter().map(|&i| vals[i]).collect();
}

#[inline(always)]
fn insertion_sort_u32_soa<N: Copy>(inds: &mut [u32], vals: &mut [N]) {
    let n = inds.len();
    for i in 1..n {
        let mut j = i;
        while j > 0 && inds[j] < inds[j - 1] {
            inds.swap(j, j - 1);
            vals.swap(j, j - 1);
            j -= 1;
        }
    }
}

/// Indices of the `n` largest finite scores, descending.
/// Equal scores are ordered by ascending index; NaN and infinite scores are skipped.
pub fn rank_desc(scores: &[f64], n: usize) -> Vec<usize> {
    let mut ranked: Vec<usize> = (0..scores.len())
        .filter(|&i| scores[i].is_finite())
        .collect();
    // stable sort keeps ascending index among ties
    ranked.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));
    ranked.truncate(n);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    /// tiny deterministic PRNG (xorshift32)
    struct Rng(u32);
    impl Rng {
        fn new(seed: u32) -> Self { Self(seed) }
        fn next_u32(&mut self) -> u32 {
            let mut x = self.0;
            x ^= x << 13;
            x ^= x >> 17;
            x ^= x << 5;
            self.0 = x;
            x
        }
    }

    #[test]
    fn soa_sort_handles_empty_and_single() {
        let mut inds: Vec<u32> = vec![];
        let mut vals: Vec<u32> = vec![];
        sort_u32_soa(&mut inds, &mut vals);
        assert!(inds.is_empty());

        let mut inds = vec![42u32];
        let mut vals = vec![7u32];
        sort_u32_soa(&mut inds, &mut vals);
        assert_eq!(inds, vec![42]);
        assert_eq!(vals, vec![7]);
    }

    #[test]
    fn soa_sort_keeps_pairing_across_sizes() {
        let mut rng = Rng::new(0x1234_5678);
        for &n in &[2usize, 3, 31, 32, 33, 100, 1024] {
            // distinct keys: shuffle 0..n via random swaps
            let mut inds: Vec<u32> = (0..n as u32).map(|k| k * 3).collect();
            for i in (1..n).rev() {
                let j = (rng.next_u32() as usize) % (i + 1);
                inds.swap(i, j);
            }
            // value carries the key to verify pairing
            let mut vals: Vec<u32> = inds.iter().map(|k| k ^ 0xA5A5_5A5A).collect();

            sort_u32_soa(&mut inds, &mut vals);

            for i in 1..n {
                assert!(inds[i - 1] < inds[i], "not sorted at n={n}, i={i}");
            }
            for (k, v) in inds.iter().zip(&vals) {
                assert_eq!(*v, k ^ 0xA5A5_5A5A, "pairing lost at n={n}");
            }
        }
    }

    #[test]
    fn rank_desc_breaks_ties_by_index() {
        assert_eq!(rank_desc(&[0.1, 0.4, 0.4, 0.1], 2), vec![1, 2]);
        assert_eq!(rank_desc(&[0.1, 0.4, 0.4, 0.1], 10), vec![1, 2, 0, 3]);
    }

    #[test]
    fn rank_desc_skips_non_finite() {
        let scores = [f64::NEG_INFINITY, 0.5, f64::NAN, -1.0];
        assert_eq!(rank_desc(&scores, 4), vec![1, 3]);
    }
}
