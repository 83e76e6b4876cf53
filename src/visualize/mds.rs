//! Principal coordinates (classical MDS) of a small distance matrix.
//!
//! The matrix is K x K with K the number of topics, so a dense power
//! iteration with deflation is enough and keeps the result deterministic.

const MAX_ITERATIONS: usize = 1000;
const TOLERANCE: f64 = 1e-12;
const RELATIVE_FLOOR: f64 = 1e-9;

/// Project the points behind `distances` onto the plane.
/// Row i of the result is the position of point i. Axes with a non-positive
/// eigenvalue collapse to 0.
pub fn principal_coordinates(distances: &[Vec<f64>]) -> Vec<[f64; 2]> {
    let n = distances.len();
    if n == 0 {
        return Vec::new();
    }
    let mut b = double_centre(distances);
    let mut coords = vec![[0.0; 2]; n];
    let mut found: Vec<Vec<f64>> = Vec::with_capacity(2);
    let mut leading = 0.0f64;

    for axis in 0..2 {
        let Some((value, vector)) = dominant_eigenpair(&b, &found) else {
            break;
        };
        // relative floor: deflation leaves residue on the order of the
        // leading eigenvalue times the iteration tolerance
        if value <= TOLERANCE.max(RELATIVE_FLOOR * leading) {
            break;
        }
        leading = leading.max(value);
        let scale = value.sqrt();
        for (c, &x) in coords.iter_mut().zip(&vector) {
            c[axis] = x * scale;
        }
        // deflate
        for i in 0..n {
            for j in 0..n {
                b[i][j] -= value * vector[i] * vector[j];
            }
        }
        found.push(vector);
    }
    coords
}

/// B = -½ J D² J with J = I - 11ᵀ/n
fn double_centre(distances: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let n = distances.len();
    let sq: Vec<Vec<f64>> = distances
        .iter()
        .map(|row| row.iter().map(|d| d * d).collect())
        .collect();
    let row_mean: Vec<f64> = sq.iter().map(|row| row.iter().sum::<f64>() / n as f64).collect();
    let grand_mean = row_mean.iter().sum::<f64>() / n as f64;
    (0..n)
        .map(|i| {
            (0..n)
                // sq is symmetric, so column means equal row means
                .map(|j| -0.5 * (sq[i][j] - row_mean[i] - row_mean[j] + grand_mean))
                .collect()
        })
        .collect()
}

/// Largest algebraic eigenvalue of a symmetric matrix with a unit eigenvector.
/// The matrix is shifted by its Gershgorin bound so that power iteration
/// converges to that eigenvalue and not to the largest magnitude one.
/// Iterates stay orthogonal to the eigenvectors in `found`.
fn dominant_eigenpair(m: &[Vec<f64>], found: &[Vec<f64>]) -> Option<(f64, Vec<f64>)> {
    let n = m.len();
    let shift = m
        .iter()
        .map(|row| row.iter().map(|v| v.abs()).sum::<f64>())
        .fold(0.0, f64::max);
    if shift == 0.0 {
        return None;
    }

    // fixed, irregular start so no eigenvector is missed by symmetry
    let mut v: Vec<f64> = (0..n).map(|i| 1.0 + (i as f64 + 1.0).sqrt()).collect();
    orthogonalise(&mut v, found);
    unit(&mut v)?;

    for _ in 0..MAX_ITERATIONS {
        let mut next: Vec<f64> = (0..n)
            .map(|i| m[i].iter().zip(&v).map(|(a, x)| a * x).sum::<f64>() + shift * v[i])
            .collect();
        orthogonalise(&mut next, found);
        unit(&mut next)?;
        let delta = next
            .iter()
            .zip(&v)
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max);
        v = next;
        if delta < TOLERANCE {
            break;
        }
    }

    // Rayleigh quotient of the unshifted matrix
    let value: f64 = (0..n)
        .map(|i| v[i] * m[i].iter().zip(&v).map(|(a, x)| a * x).sum::<f64>())
        .sum();

    // sign: the largest-magnitude component is positive
    let pivot = v
        .iter()
        .copied()
        .fold(0.0f64, |acc, x| if x.abs() > acc.abs() { x } else { acc });
    if pivot < 0.0 {
        v.iter_mut().for_each(|x| *x = -*x);
    }
    Some((value, v))
}

/// Gram–Schmidt against unit vectors
fn orthogonalise(v: &mut [f64], basis: &[Vec<f64>]) {
    for b in basis {
        let dot: f64 = v.iter().zip(b).map(|(x, y)| x * y).sum();
        v.iter_mut().zip(b).for_each(|(x, y)| *x -= dot * y);
    }
}

fn unit(v: &mut [f64]) -> Option<()> {
    let norm = v.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm == 0.0 || !norm.is_finite() {
        return None;
    }
    v.iter_mut().for_each(|x| *x /= norm);
    Some(())
}
