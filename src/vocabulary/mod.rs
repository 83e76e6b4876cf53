pub mod doc_freq;
pub mod token;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TopicError};
use crate::vocabulary::{doc_freq::DocumentFrequency, token::TokenFrequency};

pub const DEFAULT_NO_BELOW: u64 = 2;
pub const DEFAULT_NO_ABOVE: f64 = 0.5;

/// Frequency thresholds applied once, after every document has been counted.
///
/// A term survives iff `no_below <= doc_freq` and `doc_freq / num_docs <= no_above`.
/// `keep_n` then optionally caps the vocabulary at the most document-frequent
/// survivors (ties resolved by first appearance).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PruneConfig {
    pub no_below: u64,
    pub no_above: f64,
    pub keep_n: Option<usize>,
}

impl Default for PruneConfig {
    fn default() -> Self {
        Self {
            no_below: DEFAULT_NO_BELOW,
            no_above: DEFAULT_NO_ABOVE,
            keep_n: None,
        }
    }
}

impl PruneConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.no_above > 0.0 && self.no_above <= 1.0) {
            return Err(TopicError::invalid(
                "no_above",
                format!("must be in (0, 1], got {}", self.no_above),
            ));
        }
        Ok(())
    }

    #[inline]
    fn keeps(&self, doc_freq: u64, num_docs: u64) -> bool {
        doc_freq >= self.no_below && (doc_freq as f64 / num_docs as f64) <= self.no_above
    }
}

/// Vocabulary
/// Bijective term <-> index mapping with per-term document frequency.
///
/// Indices are contiguous from 0 and follow the order in which terms first
/// appear in the input, so identical input always yields an identical
/// vocabulary. It is never edited after construction.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Vocabulary {
    /// term -> document frequency; the entry position is the term index
    #[serde(with = "indexmap::map::serde_seq")]
    terms: IndexMap<Box<str>, u64>,
    /// number of documents the vocabulary was counted over
    num_docs: u64,
}

impl Vocabulary {
    /// Count document frequencies over `docs` and keep the terms passing `prune`.
    ///
    /// Fails when `docs` is empty or the thresholds are invalid. Thresholds
    /// that reject every term give an empty vocabulary.
    pub fn build<D, S>(docs: &[D], prune: &PruneConfig) -> Result<Self>
    where
        D: AsRef<[S]>,
        S: AsRef<str>,
    {
        if docs.is_empty() {
            return Err(TopicError::EmptyInput("token sequences"));
        }
        prune.validate()?;

        let mut df = DocumentFrequency::new();
        for doc in docs {
            df.add_doc(&TokenFrequency::from(doc.as_ref()));
        }
        Ok(Self::from_doc_freq(&df, prune))
    }

    /// Apply `prune` to already counted document frequencies.
    pub fn from_doc_freq(df: &DocumentFrequency, prune: &PruneConfig) -> Self {
        let num_docs = df.doc_num();
        let mut kept: Vec<(usize, &str, u64)> = df
            .iter()
            .enumerate()
            .filter(|(_, (_, count))| num_docs > 0 && prune.keeps(*count, num_docs))
            .map(|(pos, (term, count))| (pos, term, count))
            .collect();

        if let Some(keep_n) = prune.keep_n {
            if kept.len() > keep_n {
                // stable: equal frequencies keep first-seen order
                kept.sort_by(|a, b| b.2.cmp(&a.2));
                kept.truncate(keep_n);
                kept.sort_by_key(|&(pos, _, _)| pos);
            }
        }

        let terms: IndexMap<Box<str>, u64> = kept
            .into_iter()
            .map(|(_, term, count)| (Box::from(term), count))
            .collect();

        if terms.is_empty() {
            log::warn!(
                "vocabulary is empty after pruning {} distinct terms (no_below={}, no_above={})",
                df.vocab_size(),
                prune.no_below,
                prune.no_above
            );
        } else {
            log::debug!(
                "vocabulary kept {} of {} distinct terms over {} documents",
                terms.len(),
                df.vocab_size(),
                num_docs
            );
        }

        Self { terms, num_docs }
    }

    /// Number of terms
    #[inline]
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Number of documents the vocabulary was built from
    #[inline]
    pub fn num_docs(&self) -> u64 {
        self.num_docs
    }

    /// Index of `term`, if it survived pruning
    #[inline]
    pub fn index_of(&self, term: &str) -> Option<usize> {
        self.terms.get_index_of(term)
    }

    /// Term at `index`
    #[inline]
    pub fn term(&self, index: usize) -> Option<&str> {
        self.terms.get_index(index).map(|(term, _)| &**term)
    }

    /// Document frequency of the term at `index`
    #[inline]
    pub fn doc_freq(&self, index: usize) -> Option<u64> {
        self.terms.get_index(index).map(|(_, &count)| count)
    }

    /// Iterate `(index, term, doc_freq)` in index order
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str, u64)> {
        self.terms
            .iter()
            .enumerate()
            .map(|(index, (term, &count))| (index, &**term, count))
    }
}

/// Index order matters, so equality compares entries positionally.
impl PartialEq for Vocabulary {
    fn eq(&self, other: &Self) -> bool {
        self.num_docs == other.num_docs && self.terms.iter().eq(other.terms.iter())
    }
}
