use serde::{Deserialize, Serialize};

use crate::{utils::sort::sort_u32_soa, vocabulary::token::TokenFrequency, Vocabulary};

/// Bag-of-words encoding of one document against a `Vocabulary`.
///
/// Stored as two parallel arrays (term index / count) sorted by ascending
/// term index. Counts are always >= 1; an empty encoding is a valid document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedDocument {
    inds: Vec<u32>,
    counts: Vec<u32>,
}

impl EncodedDocument {
    /// Iterate `(term_index, count)` in ascending index order
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (usize, u32)> + '_ {
        self.inds
            .iter()
            .zip(&self.counts)
            .map(|(&i, &c)| (i as usize, c))
    }

    /// Number of distinct terms
    #[inline]
    pub fn len(&self) -> usize {
        self.inds.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inds.is_empty()
    }

    /// Number of tokens (sum of counts)
    #[inline]
    pub fn token_count(&self) -> u64 {
        self.counts.iter().map(|&c| c as u64).sum()
    }

    pub(crate) fn indices(&self) -> &[u32] {
        &self.inds
    }

    pub(crate) fn counts(&self) -> &[u32] {
        &self.counts
    }

    /// Map indices back to terms, as `(term, count)` in index order.
    /// Indices unknown to `vocabulary` are skipped.
    pub fn decode<'v>(&self, vocabulary: &'v Vocabulary) -> Vec<(&'v str, u32)> {
        self.iter()
            .filter_map(|(i, c)| vocabulary.term(i).map(|t| (t, c)))
            .collect()
    }
}

impl Vocabulary {
    /// Encode one token sequence; terms outside the vocabulary are dropped.
    pub fn doc2bow<S: AsRef<str>>(&self, tokens: &[S]) -> EncodedDocument {
        let freq = TokenFrequency::from(tokens);
        let mut inds = Vec::with_capacity(freq.token_num());
        let mut counts = Vec::with_capacity(freq.token_num());
        for (token, count) in freq.iter() {
            if let Some(index) = self.index_of(token) {
                inds.push(index as u32);
                counts.push(count);
            }
        }
        sort_u32_soa(&mut inds, &mut counts);
        EncodedDocument { inds, counts }
    }
}

/// Corpus
/// Encoded documents in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Corpus {
    documents: Vec<EncodedDocument>,
}

impl Corpus {
    /// Encode every token sequence against `vocabulary`.
    /// The output has one entry per input sequence, empty ones included.
    pub fn encode<D, S>(docs: &[D], vocabulary: &Vocabulary) -> Self
    where
        D: AsRef<[S]>,
        S: AsRef<str>,
    {
        let documents: Vec<EncodedDocument> = docs
            .iter()
            .map(|doc| vocabulary.doc2bow(doc.as_ref()))
            .collect();
        let empty = documents.iter().filter(|d| d.is_empty()).count();
        if empty > 0 {
            log::debug!("{} of {} documents encode to no terms", empty, documents.len());
        }
        Self { documents }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    #[inline]
    pub fn documents(&self) -> &[EncodedDocument] {
        &self.documents
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&EncodedDocument> {
        self.documents.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &EncodedDocument> {
        self.documents.iter()
    }

    /// Total token count over all documents
    pub fn total_tokens(&self) -> u64 {
        self.documents.iter().map(EncodedDocument::token_count).sum()
    }

    /// Token count of each document
    pub fn doc_lengths(&self) -> Vec<u64> {
        self.documents.iter().map(EncodedDocument::token_count).collect()
    }

    /// Corpus-wide occurrence count of each term index below `num_terms`
    pub fn term_frequency(&self, num_terms: usize) -> Vec<u64> {
        let mut freq = vec![0u64; num_terms];
        for doc in &self.documents {
            for (i, c) in doc.iter() {
                if let Some(slot) = freq.get_mut(i) {
                    *slot += c as u64;
                }
            }
        }
        freq
    }
}

impl FromIterator<EncodedDocument> for Corpus {
    fn from_iter<I: IntoIterator<Item = EncodedDocument>>(iter: I) -> Self {
        Self {
            documents: iter.into_iter().collect(),
        }
    }
}
