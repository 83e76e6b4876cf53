use serde::{ser::SerializeStruct, Deserialize, Serialize};

use crate::{
    error::{Result, TopicError},
    model::{variational::EStepParams, TopicModel, TrainReport},
    utils::math::normalize,
};

const ARTIFACT: &str = "model";

/// Deserialization form of `TopicModel`.
/// The topic-term distribution is not stored; `into_topic_model` derives it
/// again from `lambda`, which reproduces it bit for bit.
#[derive(Debug, Deserialize)]
pub struct TopicModelData {
    pub num_topics: usize,
    pub num_terms: usize,
    pub alpha: Vec<f64>,
    pub eta: f64,
    pub lambda: Vec<Vec<f64>>,
    pub doc_topic: Vec<Vec<f64>>,
    pub iterations: usize,
    pub gamma_threshold: f64,
    pub report: TrainReport,
}

impl TopicModelData {
    /// Check the shapes and rebuild the model.
    pub fn into_topic_model(self) -> Result<TopicModel> {
        let k = self.num_topics;
        let malformed = |reason: String| TopicError::MalformedArtifact { artifact: ARTIFACT, reason };

        if k == 0 {
            return Err(malformed("zero topics".to_string()));
        }
        if self.alpha.len() != k {
            return Err(malformed(format!("alpha has {} entries for {} topics", self.alpha.len(), k)));
        }
        if self.lambda.len() != k {
            return Err(malformed(format!("lambda has {} rows for {} topics", self.lambda.len(), k)));
        }
        if let Some(row) = self.lambda.iter().find(|row| row.len() != self.num_terms) {
            return Err(malformed(format!("lambda row of width {} for {} terms", row.len(), self.num_terms)));
        }
        if let Some(row) = self.doc_topic.iter().find(|row| row.len() != k) {
            return Err(malformed(format!("document row of width {} for {} topics", row.len(), k)));
        }

        let topic_term = self.lambda.iter().map(|row| normalize(row)).collect();
        Ok(TopicModel {
            num_topics: k,
            num_terms: self.num_terms,
            alpha: self.alpha,
            eta: self.eta,
            lambda: self.lambda,
            topic_term,
            doc_topic: self.doc_topic,
            e_step: EStepParams {
                iterations: self.iterations,
                gamma_threshold: self.gamma_threshold,
            },
            report: self.report,
        })
    }
}

impl Serialize for TopicModel {
    /// Serializes everything except the derived topic-term matrix.
    /// Use `TopicModelData` to deserialize.
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("TopicModel", 9)?;
        state.serialize_field("num_topics", &self.num_topics)?;
        state.serialize_field("num_terms", &self.num_terms)?;
        state.serialize_field("alpha", &self.alpha)?;
        state.serialize_field("eta", &self.eta)?;
        state.serialize_field("lambda", &self.lambda)?;
        state.serialize_field("doc_topic", &self.doc_topic)?;
        state.serialize_field("iterations", &self.e_step.iterations)?;
        state.serialize_field("gamma_threshold", &self.e_step.gamma_threshold)?;
        state.serialize_field("report", &self.report)?;
        state.end()
    }
}
