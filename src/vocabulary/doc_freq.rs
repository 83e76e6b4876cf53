use indexmap::IndexMap;

use crate::vocabulary::token::TokenFrequency;

/// keep document count and per-term document counts
/// Terms stay in first-seen order so the survivors of pruning can be indexed
/// deterministically.
#[derive(Debug, Clone, Default)]
pub struct DocumentFrequency {
    /// number of documents counted
    doc_num: u64,
    /// term -> number of documents containing it
    term_counts: IndexMap<Box<str>, u64>,
}

impl DocumentFrequency {
    pub fn new() -> Self {
        Self {
            doc_num: 0,
            term_counts: IndexMap::new(),
        }
    }

    /// Count one document; each distinct term is counted once
    pub fn add_doc(&mut self, freq: &TokenFrequency) {
        self.doc_num += 1;
        for term in freq.token_set_iter() {
            if let Some(count) = self.term_counts.get_mut(term) {
                *count += 1;
            } else {
                self.term_counts.insert(term.into(), 1);
            }
        }
    }

    /// Get the number of documents counted
    #[inline]
    pub fn doc_num(&self) -> u64 {
        self.doc_num
    }

    /// Get the document frequency of a term
    #[inline]
    pub fn term_count(&self, term: &str) -> u64 {
        self.term_counts.get(term).copied().unwrap_or(0)
    }

    /// Number of distinct terms seen
    #[inline]
    pub fn vocab_size(&self) -> usize {
        self.term_counts.len()
    }

    /// Iterate `(term, doc_freq)` in first-seen order
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.term_counts.iter().map(|(term, &count)| (&**term, count))
    }
}
