//! Model directory: a trained model and the vocabulary it indexes, stored as
//! two CBOR artifacts next to each other.

use std::{
    fs::{self, File},
    io::{BufReader, BufWriter, Write},
    path::Path,
};

use serde::{de::DeserializeOwned, Serialize};

use crate::{
    error::{Result, TopicError},
    model::serde::TopicModelData,
    TopicModel, Vocabulary,
};

pub const VOCABULARY_FILE: &str = "vocabulary.cbor";
pub const MODEL_FILE: &str = "model.cbor";

/// Write `model` and `vocabulary` into `dir`, creating it if needed.
/// Existing artifacts are overwritten.
pub fn save(model: &TopicModel, vocabulary: &Vocabulary, dir: impl AsRef<Path>) -> Result<()> {
    model.ensure_vocabulary(vocabulary)?;
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;
    write_artifact(&dir.join(VOCABULARY_FILE), "vocabulary", vocabulary)?;
    write_artifact(&dir.join(MODEL_FILE), "model", model)?;
    log::info!("saved model with {} topics to {}", model.num_topics(), dir.display());
    Ok(())
}

/// Read back a directory written by [`save`].
///
/// Fails with `MissingArtifact` naming the absent file, `CorruptArtifact` when
/// a file does not decode, and `DimensionMismatch` when the two halves do not
/// belong together.
pub fn load(dir: impl AsRef<Path>) -> Result<(TopicModel, Vocabulary)> {
    let dir = dir.as_ref();
    let vocabulary: Vocabulary = read_artifact(&dir.join(VOCABULARY_FILE), "vocabulary")?;
    let data: TopicModelData = read_artifact(&dir.join(MODEL_FILE), "model")?;
    let model = data.into_topic_model()?;
    model.ensure_vocabulary(&vocabulary)?;
    log::debug!(
        "loaded model with {} topics / {} terms from {}",
        model.num_topics(),
        vocabulary.len(),
        dir.display()
    );
    Ok((model, vocabulary))
}

fn write_artifact<T: Serialize>(path: &Path, artifact: &'static str, value: &T) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_cbor::to_writer(&mut writer, value).map_err(|source| TopicError::Encode { artifact, source })?;
    writer.flush()?;
    Ok(())
}

fn read_artifact<T: DeserializeOwned>(path: &Path, artifact: &'static str) -> Result<T> {
    if !path.is_file() {
        return Err(TopicError::MissingArtifact {
            artifact,
            path: path.to_path_buf(),
        });
    }
    let reader = BufReader::new(File::open(path)?);
    serde_cbor::from_reader(reader).map_err(|source| TopicError::CorruptArtifact { artifact, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Corpus, PruneConfig, TrainConfig};

    fn trained() -> (TopicModel, Vocabulary) {
        let docs = vec![
            vec!["hydrogen", "storage", "tank"],
            vec!["hydrogen", "fuel", "cell"],
            vec!["graphene", "sensor", "film"],
            vec!["graphene", "film", "storage"],
        ];
        let vocab = Vocabulary::build(&docs, &PruneConfig { no_below: 1, no_above: 1.0, keep_n: None }).unwrap();
        let corpus = Corpus::encode(&docs, &vocab);
        let model = TopicModel::train(&corpus, &vocab, &TrainConfig { num_topics: 2, ..TrainConfig::default() }).unwrap();
        (model, vocab)
    }

    #[test]
    fn round_trip_is_identical() {
        let (model, vocab) = trained();
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("run");
        save(&model, &vocab, &target).unwrap();
        assert!(target.join(VOCABULARY_FILE).is_file());
        assert!(target.join(MODEL_FILE).is_file());

        let (loaded_model, loaded_vocab) = load(&target).unwrap();
        assert_eq!(loaded_model, model);
        assert_eq!(loaded_vocab, vocab);
        assert_eq!(loaded_model.topic_term(), model.topic_term());
        assert_eq!(loaded_model.doc_topic(), model.doc_topic());
    }

    #[test]
    fn missing_model_is_named() {
        let (model, vocab) = trained();
        let dir = tempfile::tempdir().unwrap();
        save(&model, &vocab, dir.path()).unwrap();
        fs::remove_file(dir.path().join(MODEL_FILE)).unwrap();
        match load(dir.path()) {
            Err(TopicError::MissingArtifact { artifact, path }) => {
                assert_eq!(artifact, "model");
                assert!(path.ends_with(MODEL_FILE));
            }
            other => panic!("expected missing model, got {other:?}"),
        }
    }

    #[test]
    fn corrupt_artifact_is_reported() {
        let (model, vocab) = trained();
        let dir = tempfile::tempdir().unwrap();
        save(&model, &vocab, dir.path()).unwrap();
        fs::write(dir.path().join(VOCABULARY_FILE), b"\xff\x00not cbor").unwrap();
        assert!(matches!(
            load(dir.path()),
            Err(TopicError::CorruptArtifact { artifact: "vocabulary", .. })
        ));
    }

    #[test]
    fn mismatched_halves_are_rejected() {
        let (model, vocab) = trained();
        let dir = tempfile::tempdir().unwrap();
        save(&model, &vocab, dir.path()).unwrap();

        let small = Vocabulary::build(&[vec!["only"]], &PruneConfig { no_below: 1, no_above: 1.0, keep_n: None }).unwrap();
        assert!(matches!(save(&model, &small, dir.path()), Err(TopicError::DimensionMismatch { .. })));

        let file = BufWriter::new(File::create(dir.path().join(VOCABULARY_FILE)).unwrap());
        serde_cbor::to_writer(file, &small).unwrap();
        assert!(matches!(load(dir.path()), Err(TopicError::DimensionMismatch { .. })));
    }
}
