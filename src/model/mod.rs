pub mod serde;
pub(crate) mod variational;

use ::serde::{Deserialize, Serialize};
use rand::{rngs::StdRng, SeedableRng};
use rand_distr::{Distribution, Gamma};
use rayon::prelude::*;

use crate::{
    corpus::{Corpus, EncodedDocument},
    error::{Result, TopicError},
    model::variational::{e_step, exp_elog_beta, mean_elog_theta, update_dir_prior, DocPosterior, EStepParams},
    utils::math::normalize,
    Vocabulary,
};

pub const DEFAULT_NUM_TOPICS: usize = 10;
pub const DEFAULT_SEED: u64 = 42;
pub const DEFAULT_MAX_PASSES: usize = 10;
pub const DEFAULT_ITERATIONS: usize = 50;
pub const DEFAULT_GAMMA_THRESHOLD: f64 = 1e-3;
pub const DEFAULT_CONVERGENCE_THRESHOLD: f64 = 1e-4;

/// lambda starts at Gamma(shape, 1/shape) draws: mean 1, small spread
const INIT_SHAPE: f64 = 100.0;

/// Dirichlet prior on the per-document topic mixture.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AlphaPrior {
    /// The same concentration for every topic
    Symmetric(f64),
    /// Fixed prior `1 / (k + sqrt(K))`, normalised to sum 1
    Asymmetric,
    /// Start at `1 / K` and re-estimate after every pass
    Auto,
}

impl AlphaPrior {
    fn initial(&self, num_topics: usize) -> Vec<f64> {
        match *self {
            AlphaPrior::Symmetric(a) => vec![a; num_topics],
            AlphaPrior::Auto => vec![1.0 / num_topics as f64; num_topics],
            AlphaPrior::Asymmetric => {
                let offset = (num_topics as f64).sqrt();
                let raw: Vec<f64> = (0..num_topics).map(|k| 1.0 / (k as f64 + offset)).collect();
                normalize(&raw)
            }
        }
    }
}

/// Training parameters for [`TopicModel::train`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainConfig {
    /// number of topics K (>= 1)
    pub num_topics: usize,
    /// seed of the topic-term initialisation
    pub seed: u64,
    /// upper bound on passes over the corpus (>= 1)
    pub max_passes: usize,
    pub alpha: AlphaPrior,
    /// symmetric topic-term prior; `None` means `1 / K`
    pub eta: Option<f64>,
    /// per-document E-step iteration cap
    pub iterations: usize,
    /// per-document stop when the mean change of gamma drops below this
    pub gamma_threshold: f64,
    /// stop training when no topic-term probability moves more than this in a pass
    pub convergence_threshold: f64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            num_topics: DEFAULT_NUM_TOPICS,
            seed: DEFAULT_SEED,
            max_passes: DEFAULT_MAX_PASSES,
            alpha: AlphaPrior::Auto,
            eta: None,
            iterations: DEFAULT_ITERATIONS,
            gamma_threshold: DEFAULT_GAMMA_THRESHOLD,
            convergence_threshold: DEFAULT_CONVERGENCE_THRESHOLD,
        }
    }
}

impl TrainConfig {
    pub fn validate(&self) -> Result<()> {
        if self.num_topics == 0 {
            return Err(TopicError::invalid("num_topics", "must be at least 1"));
        }
        if self.max_passes == 0 {
            return Err(TopicError::invalid("max_passes", "must be at least 1"));
        }
        if self.iterations == 0 {
            return Err(TopicError::invalid("iterations", "must be at least 1"));
        }
        if let AlphaPrior::Symmetric(a) = self.alpha {
            if !(a > 0.0 && a.is_finite()) {
                return Err(TopicError::invalid("alpha", format!("must be positive, got {a}")));
            }
        }
        if let Some(eta) = self.eta {
            if !(eta > 0.0 && eta.is_finite()) {
                return Err(TopicError::invalid("eta", format!("must be positive, got {eta}")));
            }
        }
        if !(self.gamma_threshold >= 0.0 && self.gamma_threshold.is_finite()) {
            return Err(TopicError::invalid("gamma_threshold", "must be a non-negative number"));
        }
        if !(self.convergence_threshold >= 0.0 && self.convergence_threshold.is_finite()) {
            return Err(TopicError::invalid("convergence_threshold", "must be a non-negative number"));
        }
        Ok(())
    }

    fn e_step_params(&self) -> EStepParams {
        EStepParams {
            iterations: self.iterations,
            gamma_threshold: self.gamma_threshold,
        }
    }
}

/// How a training run ended.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainReport {
    /// passes actually run
    pub passes: usize,
    /// whether the convergence threshold stopped training before `max_passes`
    pub converged: bool,
    /// max absolute change of the topic-term matrix after each pass
    pub topic_changes: Vec<f64>,
}

/// Trained LDA topic model.
///
/// Holds the variational topic-term parameters (`lambda`), the derived
/// K x |V| topic-term distribution and the N x K document-topic distribution
/// of the training corpus. Every row of both matrices sums to 1; topic rows
/// are empty when the vocabulary is.
///
/// Term indices only mean something next to the [`Vocabulary`] the model was
/// trained against, see [`TopicModel::ensure_vocabulary`].
#[derive(Debug, Clone, PartialEq)]
pub struct TopicModel {
    num_topics: usize,
    num_terms: usize,
    alpha: Vec<f64>,
    eta: f64,
    lambda: Vec<Vec<f64>>,
    topic_term: Vec<Vec<f64>>,
    doc_topic: Vec<Vec<f64>>,
    e_step: EStepParams,
    report: TrainReport,
}

impl TopicModel {
    /// Fit LDA to `corpus` with batch variational Bayes.
    ///
    /// The E-step runs over documents in parallel; their statistics are summed
    /// in document order afterwards, so the result only depends on the inputs
    /// and `config.seed`.
    pub fn train(corpus: &Corpus, vocabulary: &Vocabulary, config: &TrainConfig) -> Result<Self> {
        config.validate()?;
        let k = config.num_topics;
        let v = vocabulary.len();
        if let Some(index) = corpus.iter().flat_map(|d| d.iter()).map(|(i, _)| i).find(|&i| i >= v) {
            return Err(TopicError::CorpusMismatch { index, vocabulary_terms: v });
        }

        let params = config.e_step_params();
        let eta = config.eta.unwrap_or(1.0 / k as f64);
        let mut alpha = config.alpha.initial(k);
        let total_tokens = corpus.total_tokens();
        if total_tokens == 0 {
            log::warn!("corpus has no tokens; topics and document mixtures will be uniform");
        }

        let mut lambda = initial_lambda(k, v, config.seed)?;
        let mut topics: Vec<Vec<f64>> = lambda.iter().map(|row| normalize(row)).collect();
        let mut report = TrainReport::default();

        for pass in 0..config.max_passes {
            let elog_beta = exp_elog_beta(&lambda);
            let posteriors: Vec<DocPosterior> = corpus
                .documents()
                .par_iter()
                .map(|doc| e_step(doc, &alpha, &elog_beta, params))
                .collect();

            // fixed-order reduction over documents
            let mut sstats = vec![vec![0.0; v]; k];
            for (doc, post) in corpus.iter().zip(&posteriors) {
                post.accumulate(doc, &mut sstats);
            }
            for ((lam, ss), eb) in lambda.iter_mut().zip(&sstats).zip(&elog_beta) {
                for ((l, &s), &b) in lam.iter_mut().zip(ss).zip(eb) {
                    *l = eta + s * b;
                }
            }

            if config.alpha == AlphaPrior::Auto && total_tokens > 0 {
                let rho = (1.0 + pass as f64).powf(-0.5);
                let logphat = mean_elog_theta(&posteriors, k);
                alpha = update_dir_prior(&alpha, posteriors.len() as f64, &logphat, rho);
            }

            let next: Vec<Vec<f64>> = lambda.iter().map(|row| normalize(row)).collect();
            let change = max_abs_change(&topics, &next);
            topics = next;
            report.passes = pass + 1;
            report.topic_changes.push(change);
            log::debug!("pass {}/{}: topic-term change {:.3e}", pass + 1, config.max_passes, change);

            if change < config.convergence_threshold {
                report.converged = true;
                break;
            }
        }

        let doc_topic: Vec<Vec<f64>> = if total_tokens == 0 {
            // nothing to infer from; the prior shape is not evidence
            vec![vec![1.0 / k as f64; k]; corpus.len()]
        } else {
            let elog_beta = exp_elog_beta(&lambda);
            corpus
                .documents()
                .par_iter()
                .map(|doc| normalize(&e_step(doc, &alpha, &elog_beta, params).gamma))
                .collect()
        };

        log::info!(
            "trained {} topics over {} documents / {} terms in {} passes (converged: {})",
            k,
            corpus.len(),
            v,
            report.passes,
            report.converged
        );

        Ok(Self {
            num_topics: k,
            num_terms: v,
            alpha,
            eta,
            lambda,
            topic_term: topics,
            doc_topic,
            e_step: params,
            report,
        })
    }

    /// Topic mixture of a document that was not part of training.
    pub fn infer(&self, doc: &EncodedDocument) -> Result<Vec<f64>> {
        if let Some((index, _)) = doc.iter().find(|&(i, _)| i >= self.num_terms) {
            return Err(TopicError::CorpusMismatch { index, vocabulary_terms: self.num_terms });
        }
        let elog_beta = exp_elog_beta(&self.lambda);
        Ok(normalize(&e_step(doc, &self.alpha, &elog_beta, self.e_step).gamma))
    }

    /// Reject a vocabulary whose size differs from the one trained against.
    pub fn ensure_vocabulary(&self, vocabulary: &Vocabulary) -> Result<()> {
        if self.num_terms != vocabulary.len() {
            return Err(TopicError::DimensionMismatch {
                model_terms: self.num_terms,
                vocabulary_terms: vocabulary.len(),
            });
        }
        Ok(())
    }

    #[inline]
    pub fn num_topics(&self) -> usize {
        self.num_topics
    }

    #[inline]
    pub fn num_terms(&self) -> usize {
        self.num_terms
    }

    /// Number of documents in the training corpus
    #[inline]
    pub fn num_docs(&self) -> usize {
        self.doc_topic.len()
    }

    /// K x |V| topic-term distribution
    #[inline]
    pub fn topic_term(&self) -> &[Vec<f64>] {
        &self.topic_term
    }

    /// N x K document-topic distribution, in corpus order
    #[inline]
    pub fn doc_topic(&self) -> &[Vec<f64>] {
        &self.doc_topic
    }

    /// Term distribution of one topic
    #[inline]
    pub fn topic(&self, topic_id: usize) -> Option<&[f64]> {
        self.topic_term.get(topic_id).map(Vec::as_slice)
    }

    /// Document-topic prior after training
    #[inline]
    pub fn alpha(&self) -> &[f64] {
        &self.alpha
    }

    #[inline]
    pub fn eta(&self) -> f64 {
        self.eta
    }

    #[inline]
    pub fn report(&self) -> &TrainReport {
        &self.report
    }
}

#[cfg(test)]
impl TopicModel {
    /// Model with fixed distributions, for testing downstream stages.
    pub(crate) fn from_rows(topic_term: Vec<Vec<f64>>, doc_topic: Vec<Vec<f64>>) -> Self {
        let num_topics = topic_term.len();
        Self {
            num_topics,
            num_terms: topic_term.first().map_or(0, Vec::len),
            alpha: vec![1.0 / num_topics as f64; num_topics],
            eta: 0.1,
            lambda: topic_term.clone(),
            topic_term,
            doc_topic,
            e_step: TrainConfig::default().e_step_params(),
            report: TrainReport::default(),
        }
    }
}

/// K x V draws from Gamma(shape, 1/shape), seeded.
fn initial_lambda(k: usize, v: usize, seed: u64) -> Result<Vec<Vec<f64>>> {
    let init = Gamma::new(INIT_SHAPE, 1.0 / INIT_SHAPE)
        .map_err(|e| TopicError::invalid("lambda initialisation", e.to_string()))?;
    let mut rng = StdRng::seed_from_u64(seed);
    Ok((0..k)
        .map(|_| (0..v).map(|_| init.sample(&mut rng)).collect())
        .collect())
}

fn max_abs_change(prev: &[Vec<f64>], next: &[Vec<f64>]) -> f64 {
    prev.iter()
        .flatten()
        .zip(next.iter().flatten())
        .map(|(a, b)| (a - b).abs())
        .fold(0.0, f64::max)
}
