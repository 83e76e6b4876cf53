//! Variational E-step and Dirichlet prior update for batch LDA.
//!
//! Per document, the topic mixture posterior `gamma` is iterated against the
//! current topic-term expectations until its mean change falls under the
//! threshold. The document also yields its share of the topic-term sufficient
//! statistics, which the caller sums in document order.

use crate::{
    corpus::EncodedDocument,
    utils::math::{digamma, dirichlet_expectation, trigamma},
};

/// Keeps phi normalisers away from zero.
const PHI_FLOOR: f64 = 1e-100;

/// exp(E[ln β]) for every topic row of `lambda`.
pub(crate) fn exp_elog_beta(lambda: &[Vec<f64>]) -> Vec<Vec<f64>> {
    lambda
        .iter()
        .map(|row| {
            if row.is_empty() {
                Vec::new()
            } else {
                dirichlet_expectation(row).into_iter().map(f64::exp).collect()
            }
        })
        .collect()
}

/// Stopping rule of the per-document loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct EStepParams {
    pub iterations: usize,
    pub gamma_threshold: f64,
}

/// Result of the E-step for one document.
#[derive(Debug, Clone)]
pub(crate) struct DocPosterior {
    /// variational Dirichlet parameter over topics
    pub gamma: Vec<f64>,
    /// topic x (distinct term of the document), row-major
    sstats: Vec<f64>,
}

impl DocPosterior {
    /// Add this document's statistics into the K x V accumulator.
    pub fn accumulate(&self, doc: &EncodedDocument, acc: &mut [Vec<f64>]) {
        let n = doc.len();
        for (t, row) in acc.iter_mut().enumerate() {
            let local = &self.sstats[t * n..(t + 1) * n];
            for (&w, &s) in doc.indices().iter().zip(local) {
                row[w as usize] += s;
            }
        }
    }
}

pub(crate) fn e_step(
    doc: &EncodedDocument,
    alpha: &[f64],
    exp_elog_beta: &[Vec<f64>],
    params: EStepParams,
) -> DocPosterior {
    let k = alpha.len();
    let n = doc.len();
    let ids = doc.indices();
    let cts: Vec<f64> = doc.counts().iter().map(|&c| c as f64).collect();
    let doc_len: f64 = cts.iter().sum();

    // beta_d[t * n + j] = exp(E[ln β_{t, ids[j]}])
    let mut beta_d = Vec::with_capacity(k * n);
    for row in exp_elog_beta {
        beta_d.extend(ids.iter().map(|&w| row[w as usize]));
    }

    let mut gamma: Vec<f64> = alpha.iter().map(|&a| a + doc_len / k as f64).collect();
    let mut exp_elog_theta: Vec<f64> = dirichlet_expectation(&gamma).into_iter().map(f64::exp).collect();
    let mut phinorm = phi_norm(&exp_elog_theta, &beta_d, n);

    for _ in 0..params.iterations {
        let mut change = 0.0;
        for t in 0..k {
            let beta_t = &beta_d[t * n..(t + 1) * n];
            let dot: f64 = (0..n).map(|j| cts[j] / phinorm[j] * beta_t[j]).sum();
            let next = alpha[t] + exp_elog_theta[t] * dot;
            change += (next - gamma[t]).abs();
            gamma[t] = next;
        }
        exp_elog_theta = dirichlet_expectation(&gamma).into_iter().map(f64::exp).collect();
        phinorm = phi_norm(&exp_elog_theta, &beta_d, n);
        if change / (k as f64) < params.gamma_threshold {
            break;
        }
    }

    let mut sstats = Vec::with_capacity(k * n);
    for t in 0..k {
        sstats.extend((0..n).map(|j| exp_elog_theta[t] * cts[j] / phinorm[j]));
    }
    DocPosterior { gamma, sstats }
}

fn phi_norm(exp_elog_theta: &[f64], beta_d: &[f64], n: usize) -> Vec<f64> {
    (0..n)
        .map(|j| {
            exp_elog_theta
                .iter()
                .enumerate()
                .map(|(t, &th)| th * beta_d[t * n + j])
                .sum::<f64>()
                + PHI_FLOOR
        })
        .collect()
}

/// One Newton step on a Dirichlet prior given the mean E[ln θ] of `n` draws.
/// The step is scaled by `rho` and rejected when it would leave the prior
/// non-positive.
pub(crate) fn update_dir_prior(prior: &[f64], n: f64, logphat: &[f64], rho: f64) -> Vec<f64> {
    let sum: f64 = prior.iter().sum();
    let psi_sum = digamma(sum);
    let gradf: Vec<f64> = prior
        .iter()
        .zip(logphat)
        .map(|(&p, &l)| n * (psi_sum - digamma(p) + l))
        .collect();
    let c = n * trigamma(sum);
    let q: Vec<f64> = prior.iter().map(|&p| -n * trigamma(p)).collect();
    let b = gradf.iter().zip(&q).map(|(g, q)| g / q).sum::<f64>()
        / (1.0 / c + q.iter().map(|q| 1.0 / q).sum::<f64>());

    let updated: Vec<f64> = prior
        .iter()
        .zip(gradf.iter().zip(&q))
        .map(|(&p, (&g, &q))| p + rho * (-(g - b) / q))
        .collect();

    if updated.iter().all(|&a| a > 0.0 && a.is_finite()) {
        updated
    } else {
        log::warn!("alpha update rejected: step leaves the prior non-positive");
        prior.to_vec()
    }
}

/// Mean of E[ln θ_d] over the documents' posteriors.
pub(crate) fn mean_elog_theta(posteriors: &[DocPosterior], k: usize) -> Vec<f64> {
    let mut acc = vec![0.0; k];
    for post in posteriors {
        for (a, e) in acc.iter_mut().zip(dirichlet_expectation(&post.gamma)) {
            *a += e;
        }
    }
    let n = posteriors.len().max(1) as f64;
    acc.iter().map(|a| a / n).collect()
}
