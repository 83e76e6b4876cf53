pub mod divergence;
pub mod mds;

use serde::{Deserialize, Serialize};

use crate::{
    error::{Result, TopicError},
    utils::{math::{ln_or_neg_inf, normalize}, sort::rank_desc},
    visualize::divergence::{kullback_leibler, pairwise, JensenShannon},
    Corpus, TopicModel, Vocabulary,
};

pub const DEFAULT_RELEVANCE_LAMBDA: f64 = 0.6;
pub const DEFAULT_RELEVANCE_TERMS: usize = 30;

/// Parameters of [`VisualizationData::prepare`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VisConfig {
    /// weight of the topic probability against its lift, in [0, 1]
    pub lambda: f64,
    /// terms kept per topic and in the overall saliency list
    pub relevance_terms: usize,
}

impl Default for VisConfig {
    fn default() -> Self {
        Self {
            lambda: DEFAULT_RELEVANCE_LAMBDA,
            relevance_terms: DEFAULT_RELEVANCE_TERMS,
        }
    }
}

impl VisConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.lambda) {
            return Err(TopicError::invalid("relevance_lambda", format!("must be within [0, 1], got {}", self.lambda)));
        }
        if self.relevance_terms == 0 {
            return Err(TopicError::invalid("relevance_terms", "must be at least 1"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedTerm {
    pub index: usize,
    pub term: String,
    pub score: f64,
}

/// Everything an inter-topic map renderer needs, derived from a trained model.
///
/// Topics keep their model ids: entry `k` of every per-topic field is topic `k`.
/// Relevance of a term that never occurs in the corpus is `-inf`, which JSON
/// output writes as `null`. The JSON is an export format only and is not read
/// back.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisualizationData {
    /// share of the corpus assigned to each topic, sums to 1
    pub topic_sizes: Vec<f64>,
    /// K x K Jensen–Shannon divergence between topic-term rows
    pub topic_distances: Vec<Vec<f64>>,
    /// principal coordinates of `topic_distances`
    pub topic_coordinates: Vec<[f64; 2]>,
    /// vocabulary terms in index order
    pub terms: Vec<String>,
    /// corpus-wide count of each term
    pub term_frequency: Vec<u64>,
    /// K x |V| relevance of each term to each topic
    pub relevance: Vec<Vec<f64>>,
    /// most relevant terms of each topic, best first
    pub top_relevant: Vec<Vec<RankedTerm>>,
    /// most salient terms overall, best first
    pub salient_terms: Vec<RankedTerm>,
    pub lambda: f64,
}

impl VisualizationData {
    /// Compute topic sizes, inter-topic distances and term rankings.
    ///
    /// `corpus` supplies the term frequencies and must be encoded with
    /// `vocabulary`; topic sizes come from the model's own document mixtures.
    pub fn prepare(model: &TopicModel, corpus: &Corpus, vocabulary: &Vocabulary, config: &VisConfig) -> Result<Self> {
        config.validate()?;
        model.ensure_vocabulary(vocabulary)?;
        let v = vocabulary.len();
        if let Some(index) = corpus.iter().flat_map(|d| d.iter()).map(|(i, _)| i).find(|&i| i >= v) {
            return Err(TopicError::CorpusMismatch { index, vocabulary_terms: v });
        }
        if corpus.len() != model.num_docs() {
            log::warn!(
                "corpus has {} documents, model was trained on {}; term frequencies follow the corpus",
                corpus.len(),
                model.num_docs()
            );
        }

        let topic_sizes = topic_sizes(model);
        let topic_distances = pairwise::<f64, JensenShannon>(model.topic_term());
        let topic_coordinates = mds::principal_coordinates(&topic_distances);

        let term_frequency = corpus.term_frequency(v);
        let total: u64 = term_frequency.iter().sum();
        let term_share: Vec<f64> = if total == 0 {
            vec![0.0; v]
        } else {
            term_frequency.iter().map(|&c| c as f64 / total as f64).collect()
        };
        if total == 0 {
            log::warn!("corpus has no tokens; no term is ranked");
        }

        let relevance: Vec<Vec<f64>> = model
            .topic_term()
            .iter()
            .map(|row| relevance_row(row, &term_share, config.lambda))
            .collect();

        let ranked = |scores: &[f64]| -> Vec<RankedTerm> {
            rank_desc(scores, config.relevance_terms)
                .into_iter()
                .filter_map(|index| {
                    vocabulary.term(index).map(|term| RankedTerm {
                        index,
                        term: term.to_string(),
                        score: scores[index],
                    })
                })
                .collect()
        };
        let top_relevant = relevance.iter().map(|row| ranked(row.as_slice())).collect();
        let salient_terms = ranked(saliency(model.topic_term(), &topic_sizes, &term_share).as_slice());

        log::debug!("prepared visualization data for {} topics / {} terms", model.num_topics(), v);

        Ok(Self {
            topic_sizes,
            topic_distances,
            topic_coordinates,
            terms: vocabulary.iter().map(|(_, term, _)| term.to_string()).collect(),
            term_frequency,
            relevance,
            top_relevant,
            salient_terms,
            lambda: config.lambda,
        })
    }

    #[inline]
    pub fn num_topics(&self) -> usize {
        self.topic_sizes.len()
    }

    /// JSON document for an external renderer
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Σ_d θ_{d,k}, normalised; uniform without documents.
fn topic_sizes(model: &TopicModel) -> Vec<f64> {
    let mut mass = vec![0.0; model.num_topics()];
    for row in model.doc_topic() {
        for (m, &p) in mass.iter_mut().zip(row) {
            *m += p;
        }
    }
    normalize(&mass)
}

/// λ ln φ_w + (1 − λ) ln(φ_w / p_w) = ln φ_w − (1 − λ) ln p_w; `-inf` where p_w = 0.
fn relevance_row(phi: &[f64], term_share: &[f64], lambda: f64) -> Vec<f64> {
    phi.iter()
        .zip(term_share)
        .map(|(&p, &share)| {
            if share <= 0.0 {
                return f64::NEG_INFINITY;
            }
            // expanded form, so φ = 0 stays -inf instead of 0 · -inf
            ln_or_neg_inf(p) - (1.0 - lambda) * share.ln()
        })
        .collect()
}

/// p_w · KL(P(k|w) ‖ P(k)); `-inf` for terms absent from the corpus so they
/// are never ranked.
fn saliency(topic_term: &[Vec<f64>], topic_sizes: &[f64], term_share: &[f64]) -> Vec<f64> {
    (0..term_share.len())
        .map(|w| {
            if term_share[w] <= 0.0 {
                return f64::NEG_INFINITY;
            }
            let joint: Vec<f64> = topic_term
                .iter()
                .zip(topic_sizes)
                .map(|(row, &size)| row[w] * size)
                .collect();
            let marginal: f64 = joint.iter().sum();
            if marginal <= 0.0 {
                return 0.0;
            }
            let posterior: Vec<f64> = joint.iter().map(|j| j / marginal).collect();
            term_share[w] * kullback_leibler(&posterior, topic_sizes)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PruneConfig, TrainConfig};

    const EPS: f64 = 1e-9;

    fn fixture() -> (TopicModel, Corpus, Vocabulary) {
        let docs = vec![
            vec!["rotor", "blade", "fatigue", "rotor"],
            vec!["rotor", "blade", "crack"],
            vec!["battery", "cell", "thermal", "battery"],
            vec!["battery", "cell", "charge"],
            vec!["blade", "cell"],
        ];
        let vocab = Vocabulary::build(&docs, &PruneConfig { no_below: 1, no_above: 1.0, keep_n: None }).unwrap();
        let corpus = Corpus::encode(&docs, &vocab);
        let model = TopicModel::train(&corpus, &vocab, &TrainConfig { num_topics: 3, ..TrainConfig::default() }).unwrap();
        (model, corpus, vocab)
    }

    #[test]
    fn shapes_and_sizes() {
        let (model, corpus, vocab) = fixture();
        let vis = VisualizationData::prepare(&model, &corpus, &vocab, &VisConfig::default()).unwrap();
        assert_eq!(vis.num_topics(), 3);
        assert!((vis.topic_sizes.iter().sum::<f64>() - 1.0).abs() < EPS);
        assert_eq!(vis.topic_coordinates.len(), 3);
        assert_eq!(vis.relevance.len(), 3);
        assert!(vis.relevance.iter().all(|row| row.len() == vocab.len()));
        assert_eq!(vis.terms.len(), vocab.len());
        assert_eq!(vis.term_frequency.iter().sum::<u64>(), corpus.total_tokens());
        // vocabulary has fewer than the default 30 terms
        assert!(vis.top_relevant.iter().all(|terms| terms.len() == vocab.len()));
        assert_eq!(vis.salient_terms.len(), vocab.len());
    }

    #[test]
    fn distances_are_symmetric_and_bounded() {
        let (model, corpus, vocab) = fixture();
        let vis = VisualizationData::prepare(&model, &corpus, &vocab, &VisConfig::default()).unwrap();
        let d = &vis.topic_distances;
        for i in 0..3 {
            assert_eq!(d[i][i], 0.0);
            for j in 0..3 {
                assert_eq!(d[i][j], d[j][i]);
                assert!(d[i][j] <= std::f64::consts::LN_2 + EPS);
            }
        }
    }

    #[test]
    fn lambda_one_ranks_by_topic_probability() {
        let phi = vec![vec![0.1, 0.5, 0.3, 0.1], vec![0.4, 0.1, 0.1, 0.4]];
        let model = TopicModel::from_rows(phi.clone(), vec![vec![0.5, 0.5]]);
        let docs = vec![vec!["a", "b", "c", "d", "a", "a"]];
        let vocab = Vocabulary::build(&[vec!["a", "b", "c", "d"]], &PruneConfig { no_below: 1, no_above: 1.0, keep_n: None }).unwrap();
        let corpus = Corpus::encode(&docs, &vocab);
        let cfg = VisConfig { lambda: 1.0, relevance_terms: 4 };
        let vis = VisualizationData::prepare(&model, &corpus, &vocab, &cfg).unwrap();
        for (k, row) in phi.iter().enumerate() {
            let by_relevance: Vec<_> = vis.top_relevant[k].iter().map(|t| t.index).collect();
            assert_eq!(by_relevance, rank_desc(row, 4));
        }
    }

    #[test]
    fn lift_promotes_rare_terms() {
        // equal topic probability, "d" is rare in the corpus
        let model = TopicModel::from_rows(vec![vec![0.25; 4]], vec![vec![1.0]]);
        let vocab = Vocabulary::build(&[vec!["a", "b", "c", "d"]], &PruneConfig { no_below: 1, no_above: 1.0, keep_n: None }).unwrap();
        let corpus = Corpus::encode(&[vec!["a", "a", "b", "b", "c", "c", "d"]], &vocab);
        let cfg = VisConfig { lambda: 0.0, relevance_terms: 1 };
        let vis = VisualizationData::prepare(&model, &corpus, &vocab, &cfg).unwrap();
        assert_eq!(vis.top_relevant[0][0].term, "d");
    }

    #[test]
    fn unseen_terms_are_never_ranked() {
        let model = TopicModel::from_rows(vec![vec![0.7, 0.3], vec![0.2, 0.8]], vec![vec![0.5, 0.5]]);
        let vocab = Vocabulary::build(&[vec!["seen", "unseen"]], &PruneConfig { no_below: 1, no_above: 1.0, keep_n: None }).unwrap();
        let corpus = Corpus::encode(&[vec!["seen"]], &vocab);
        let vis = VisualizationData::prepare(&model, &corpus, &vocab, &VisConfig::default()).unwrap();
        assert!(vis.relevance.iter().all(|row| row[1] == f64::NEG_INFINITY));
        assert!(vis.top_relevant.iter().all(|terms| terms.iter().all(|t| t.term == "seen")));
        assert_eq!(vis.salient_terms.len(), 1);
        let json: serde_json::Value = serde_json::from_str(&vis.to_json().unwrap()).unwrap();
        assert!(json["relevance"][0][1].is_null());
        let seen = json["relevance"][0][0].as_f64().unwrap();
        assert!((seen - vis.relevance[0][0]).abs() < 1e-12);
    }

    #[test]
    fn sizes_are_uniform_without_documents() {
        let model = TopicModel::from_rows(vec![vec![0.5, 0.5]; 4], Vec::new());
        let vocab = Vocabulary::build(&[vec!["x", "y"]], &PruneConfig { no_below: 1, no_above: 1.0, keep_n: None }).unwrap();
        let vis = VisualizationData::prepare(&model, &Corpus::default(), &vocab, &VisConfig::default()).unwrap();
        assert!(vis.topic_sizes.iter().all(|&s| (s - 0.25).abs() < EPS));
        assert!(vis.salient_terms.is_empty());
    }

    #[test]
    fn rejects_bad_configuration_and_inputs() {
        let (model, corpus, vocab) = fixture();
        for (cfg, name) in [
            (VisConfig { lambda: 1.5, ..VisConfig::default() }, "relevance_lambda"),
            (VisConfig { relevance_terms: 0, ..VisConfig::default() }, "relevance_terms"),
        ] {
            match VisualizationData::prepare(&model, &corpus, &vocab, &cfg) {
                Err(TopicError::InvalidConfig { option, .. }) => assert_eq!(option, name),
                other => panic!("expected invalid {name}, got {other:?}"),
            }
        }
        let other = Vocabulary::build(&[vec!["a"]], &PruneConfig { no_below: 1, no_above: 1.0, keep_n: None }).unwrap();
        assert!(matches!(
            VisualizationData::prepare(&model, &corpus, &other, &VisConfig::default()),
            Err(TopicError::DimensionMismatch { .. })
        ));
    }
}
