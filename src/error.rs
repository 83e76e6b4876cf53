use std::path::PathBuf;

/// Errors produced by the topic pipeline.
///
/// Degenerate data (an empty vocabulary after pruning, documents that encode
/// to nothing) is never an error; these variants only cover invalid input,
/// invalid configuration and persistence failures.
#[derive(thiserror::Error, Debug)]
pub enum TopicError {
    /// A required collection was empty.
    #[error("empty input: {0}")]
    EmptyInput(&'static str),

    /// A configuration option is out of its valid range.
    #[error("invalid configuration `{option}`: {reason}")]
    InvalidConfig {
        option: &'static str,
        reason: String,
    },

    /// One half of a saved model directory is missing.
    #[error("missing {artifact} artifact at {}", path.display())]
    MissingArtifact {
        artifact: &'static str,
        path: PathBuf,
    },

    /// A topic model was paired with a vocabulary of a different size.
    #[error("topic model covers {model_terms} terms but the vocabulary has {vocabulary_terms}")]
    DimensionMismatch {
        model_terms: usize,
        vocabulary_terms: usize,
    },

    /// A corpus was encoded against a different vocabulary.
    #[error("corpus references term index {index} but the vocabulary has {vocabulary_terms} terms")]
    CorpusMismatch {
        index: usize,
        vocabulary_terms: usize,
    },

    /// An artifact could not be encoded.
    #[error("failed to encode {artifact} artifact")]
    Encode {
        artifact: &'static str,
        #[source]
        source: serde_cbor::Error,
    },

    /// An artifact could not be decoded.
    #[error("failed to decode {artifact} artifact")]
    CorruptArtifact {
        artifact: &'static str,
        #[source]
        source: serde_cbor::Error,
    },

    /// An artifact decoded but its contents are inconsistent.
    #[error("malformed {artifact} artifact: {reason}")]
    MalformedArtifact {
        artifact: &'static str,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TopicError {
    pub(crate) fn invalid(option: &'static str, reason: impl Into<String>) -> Self {
        TopicError::InvalidConfig {
            option,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TopicError>;
