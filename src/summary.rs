use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

use crate::{
    error::{Result, TopicError},
    utils::sort::rank_desc,
    TopicModel, Vocabulary,
};

pub const DEFAULT_TOP_N: usize = 5;

/// One ranked term of a topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicTerm {
    pub index: usize,
    pub term: String,
    pub weight: f64,
}

/// Topic id -> its highest-weight terms, best first.
///
/// Derived from a trained model at any time and never persisted on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicSummary {
    topics: BTreeMap<usize, Vec<TopicTerm>>,
}

impl TopicSummary {
    /// Pick the `top_n` heaviest terms of every topic.
    /// Equal weights are ordered by ascending term index; `top_n` larger than
    /// the vocabulary returns every term.
    pub fn summarize(model: &TopicModel, vocabulary: &Vocabulary, top_n: usize) -> Result<Self> {
        if top_n == 0 {
            return Err(TopicError::invalid("top_n_summary", "must be at least 1"));
        }
        model.ensure_vocabulary(vocabulary)?;

        let topics = model
            .topic_term()
            .iter()
            .enumerate()
            .map(|(topic_id, row)| {
                let terms = rank_desc(row, top_n)
                    .into_iter()
                    .filter_map(|index| {
                        vocabulary.term(index).map(|term| TopicTerm {
                            index,
                            term: term.to_string(),
                            weight: row[index],
                        })
                    })
                    .collect();
                (topic_id, terms)
            })
            .collect();
        Ok(Self { topics })
    }

    /// Ranked terms of one topic
    pub fn get(&self, topic_id: usize) -> Option<&[TopicTerm]> {
        self.topics.get(&topic_id).map(Vec::as_slice)
    }

    /// Term strings of one topic, best first
    pub fn terms(&self, topic_id: usize) -> Option<Vec<&str>> {
        self.get(topic_id)
            .map(|terms| terms.iter().map(|t| t.term.as_str()).collect())
    }

    /// Human-readable label, e.g. `laser / welding / seam`
    pub fn label(&self, topic_id: usize) -> Option<String> {
        self.terms(topic_id).map(|terms| terms.join(" / "))
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &[TopicTerm])> {
        self.topics.iter().map(|(&id, terms)| (id, terms.as_slice()))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.topics.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }
}

impl fmt::Display for TopicSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (id, _) in self.iter() {
            writeln!(f, "Topic {}: {}", id, self.label(id).unwrap_or_default())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Corpus, PruneConfig, TrainConfig};

    fn model_with_rows(rows: Vec<Vec<f64>>) -> (TopicModel, Vocabulary) {
        let terms: Vec<String> = (0..rows[0].len()).map(|i| format!("t{i}")).collect();
        let vocab = Vocabulary::build(&[terms], &PruneConfig { no_below: 1, no_above: 1.0, keep_n: None }).unwrap();
        (TopicModel::from_rows(rows, Vec::new()), vocab)
    }

    #[test]
    fn ties_break_by_ascending_index() {
        let (model, vocab) = model_with_rows(vec![vec![0.1, 0.4, 0.4, 0.1]]);
        let summary = TopicSummary::summarize(&model, &vocab, 2).unwrap();
        let indices: Vec<_> = summary.get(0).unwrap().iter().map(|t| t.index).collect();
        assert_eq!(indices, vec![1, 2]);
        assert_eq!(summary.label(0).unwrap(), "t1 / t2");
    }

    #[test]
    fn top_n_beyond_vocabulary_returns_all_terms() {
        let (model, vocab) = model_with_rows(vec![vec![0.1, 0.2, 0.7], vec![0.5, 0.25, 0.25]]);
        let summary = TopicSummary::summarize(&model, &vocab, 10).unwrap();
        assert_eq!(summary.len(), 2);
        assert_eq!(summary.terms(0).unwrap(), vec!["t2", "t1", "t0"]);
        assert_eq!(summary.terms(1).unwrap(), vec!["t0", "t1", "t2"]);
        assert_eq!(summary.to_string(), "Topic 0: t2 / t1 / t0\nTopic 1: t0 / t1 / t2\n");
    }

    #[test]
    fn rejects_zero_top_n_and_foreign_vocabulary() {
        let (model, vocab) = model_with_rows(vec![vec![0.5, 0.5]]);
        assert!(matches!(
            TopicSummary::summarize(&model, &vocab, 0),
            Err(TopicError::InvalidConfig { option: "top_n_summary", .. })
        ));

        let other = Vocabulary::build(&[vec!["x", "y", "z"]], &PruneConfig { no_below: 1, no_above: 1.0, keep_n: None }).unwrap();
        assert!(matches!(
            TopicSummary::summarize(&model, &other, 3),
            Err(TopicError::DimensionMismatch { model_terms: 2, vocabulary_terms: 3 })
        ));
    }

    #[test]
    fn summarizes_a_trained_model() {
        let docs = vec![
            vec!["turbine", "blade", "crack"],
            vec!["turbine", "blade", "inspection"],
            vec!["polymer", "print", "layer"],
            vec!["polymer", "print", "nozzle"],
        ];
        let vocab = Vocabulary::build(&docs, &PruneConfig { no_below: 1, no_above: 1.0, keep_n: None }).unwrap();
        let corpus = Corpus::encode(&docs, &vocab);
        let model = TopicModel::train(&corpus, &vocab, &TrainConfig { num_topics: 2, ..TrainConfig::default() }).unwrap();
        let summary = TopicSummary::summarize(&model, &vocab, 3).unwrap();
        for (_, terms) in summary.iter() {
            assert_eq!(terms.len(), 3);
            assert!(terms.windows(2).all(|w| w[0].weight >= w[1].weight));
        }
    }
}
