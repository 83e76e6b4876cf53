//! This crate infers research trend topics from pre-tokenized documents with LDA.
//!
//! The pipeline runs strictly downstream:
//! `Vocabulary` -> `Corpus` -> `TopicModel` -> `TopicSummary` / `VisualizationData`.
//! Every stage returns a new artifact and leaves its inputs untouched.
//!
//! ```
//! use trend_topics::{Config, Corpus, TopicModel, TopicSummary, Vocabulary};
//!
//! let docs = vec![
//!     vec!["laser", "welding", "seam"],
//!     vec!["laser", "welding", "robot"],
//!     vec!["battery", "cell", "thermal"],
//!     vec!["battery", "cell", "charge"],
//! ];
//! let config = Config { num_topics: 2, no_below: 1, no_above: 1.0, ..Config::default() };
//! let vocabulary = Vocabulary::build(&docs, &config.prune_config()).unwrap();
//! let corpus = Corpus::encode(&docs, &vocabulary);
//! let model = TopicModel::train(&corpus, &vocabulary, &config.train_config()).unwrap();
//! let summary = TopicSummary::summarize(&model, &vocabulary, 3).unwrap();
//! assert_eq!(summary.len(), 2);
//! ```

pub mod config;
pub mod corpus;
pub mod error;
pub mod model;
pub mod persist;
pub mod summary;
pub mod utils;
pub mod visualize;
pub mod vocabulary;

/// Vocabulary
/// Bijective term <-> index mapping built from tokenized documents.
///
/// Terms are pruned once, after the full document-frequency count:
/// - `no_below`: minimum number of documents containing the term
/// - `no_above`: maximum fraction of documents containing the term
/// - `keep_n`: optional cap keeping the most document-frequent terms
///
/// Indices are contiguous from 0 in first-seen order, so identical input always
/// builds an identical vocabulary.
///
/// # Serialization
/// Supported. Stored as `vocabulary.cbor` in a model directory.
pub use vocabulary::{PruneConfig, Vocabulary};

/// Token Frequency structure
/// Occurrence count of each token within one document, in first-seen order,
/// plus the total token count.
///
/// `merge_fields` joins a document's fields (title, abstract, ...) into one
/// token sequence before counting.
///
/// ```
/// use trend_topics::TokenFrequency;
///
/// let tf = TokenFrequency::from(&["gear", "noise", "gear"][..]);
/// assert_eq!(tf.token_count("gear"), 2);
/// assert_eq!(tf.token_sum(), 3);
/// ```
pub use vocabulary::token::{merge_fields, TokenFrequency};

/// Corpus and Encoded Document
/// Bag-of-words form of each document against one `Vocabulary`:
/// sorted `(term index, count)` pairs. Unknown tokens are dropped and a
/// document may encode to nothing.
///
/// The corpus keeps input order and length.
pub use corpus::{Corpus, EncodedDocument};

/// Topic Model
/// LDA fitted by batch variational Bayes.
///
/// Holds the K x |V| topic-term distribution, the N x K document-topic
/// distribution of the training corpus, the learned priors and a training
/// report. Training is deterministic for a given seed even though the
/// per-document E-step runs in parallel.
///
/// # Serialization
/// Supported. Use `TopicModelData` to deserialize; the topic-term matrix is
/// rebuilt from the stored variational parameters.
pub use model::{AlphaPrior, TopicModel, TrainConfig, TrainReport};

/// Topic Model Data Structure for Deserialization
/// Convert it into a `TopicModel` with `into_topic_model`, which checks that
/// every matrix has the declared shape.
pub use model::serde::TopicModelData;

/// Topic Summary
/// The highest-weight terms of every topic, best first, with ties broken by
/// ascending term index.
pub use summary::{TopicSummary, TopicTerm};

/// Visualization Data
/// Topic sizes, inter-topic Jensen–Shannon distances with 2-D principal
/// coordinates, corpus term frequencies, per-topic relevance rankings and an
/// overall saliency ranking, ready to be written as JSON.
pub use visualize::{RankedTerm, VisConfig, VisualizationData};

/// Pipeline configuration with every default in one place.
pub use config::Config;

pub use error::{Result, TopicError};
