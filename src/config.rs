use serde::{Deserialize, Serialize};

use crate::{
    error::{Result, TopicError},
    model::{
        AlphaPrior, DEFAULT_CONVERGENCE_THRESHOLD, DEFAULT_GAMMA_THRESHOLD, DEFAULT_ITERATIONS, DEFAULT_MAX_PASSES,
        DEFAULT_NUM_TOPICS, DEFAULT_SEED,
    },
    summary::DEFAULT_TOP_N,
    visualize::{DEFAULT_RELEVANCE_LAMBDA, DEFAULT_RELEVANCE_TERMS},
    vocabulary::{DEFAULT_NO_ABOVE, DEFAULT_NO_BELOW},
    PruneConfig, TrainConfig, VisConfig,
};

/// Every knob of the pipeline in one place.
///
/// Each stage takes its own slice of this (`prune_config`, `train_config`,
/// `vis_config`); nothing reads global state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub num_topics: usize,
    pub no_below: u64,
    pub no_above: f64,
    pub keep_n: Option<usize>,
    pub top_n_summary: usize,
    pub max_passes: usize,
    pub seed: u64,
    pub alpha: AlphaPrior,
    pub eta: Option<f64>,
    pub iterations: usize,
    pub gamma_threshold: f64,
    pub convergence_threshold: f64,
    pub relevance_lambda: f64,
    pub relevance_terms: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            num_topics: DEFAULT_NUM_TOPICS,
            no_below: DEFAULT_NO_BELOW,
            no_above: DEFAULT_NO_ABOVE,
            keep_n: None,
            top_n_summary: DEFAULT_TOP_N,
            max_passes: DEFAULT_MAX_PASSES,
            seed: DEFAULT_SEED,
            alpha: AlphaPrior::Auto,
            eta: None,
            iterations: DEFAULT_ITERATIONS,
            gamma_threshold: DEFAULT_GAMMA_THRESHOLD,
            convergence_threshold: DEFAULT_CONVERGENCE_THRESHOLD,
            relevance_lambda: DEFAULT_RELEVANCE_LAMBDA,
            relevance_terms: DEFAULT_RELEVANCE_TERMS,
        }
    }
}

impl Config {
    /// Check every option up front; the error names the first bad one.
    pub fn validate(&self) -> Result<()> {
        self.prune_config().validate()?;
        self.train_config().validate()?;
        if self.top_n_summary == 0 {
            return Err(TopicError::invalid("top_n_summary", "must be at least 1"));
        }
        self.vis_config().validate()
    }

    pub fn prune_config(&self) -> PruneConfig {
        PruneConfig {
            no_below: self.no_below,
            no_above: self.no_above,
            keep_n: self.keep_n,
        }
    }

    pub fn train_config(&self) -> TrainConfig {
        TrainConfig {
            num_topics: self.num_topics,
            seed: self.seed,
            max_passes: self.max_passes,
            alpha: self.alpha,
            eta: self.eta,
            iterations: self.iterations,
            gamma_threshold: self.gamma_threshold,
            convergence_threshold: self.convergence_threshold,
        }
    }

    pub fn vis_config(&self) -> VisConfig {
        VisConfig {
            lambda: self.relevance_lambda,
            relevance_terms: self.relevance_terms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invalid_option(cfg: Config) -> &'static str {
        match cfg.validate() {
            Err(TopicError::InvalidConfig { option, .. }) => option,
            other => panic!("expected an invalid option, got {other:?}"),
        }
    }

    #[test]
    fn defaults_are_valid() {
        let cfg = Config::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.num_topics, 10);
        assert_eq!(cfg.no_below, 2);
        assert_eq!(cfg.no_above, 0.5);
        assert_eq!(cfg.top_n_summary, 5);
        assert_eq!(cfg.max_passes, 10);
        assert_eq!(cfg.seed, 42);
        assert_eq!(cfg.relevance_lambda, 0.6);
        assert_eq!(cfg.train_config(), TrainConfig::default());
        assert_eq!(cfg.prune_config(), PruneConfig::default());
        assert_eq!(cfg.vis_config(), VisConfig::default());
    }

    #[test]
    fn names_the_offending_option() {
        assert_eq!(invalid_option(Config { num_topics: 0, ..Config::default() }), "num_topics");
        assert_eq!(invalid_option(Config { no_above: 0.0, ..Config::default() }), "no_above");
        assert_eq!(invalid_option(Config { no_above: 1.5, ..Config::default() }), "no_above");
        assert_eq!(invalid_option(Config { top_n_summary: 0, ..Config::default() }), "top_n_summary");
        assert_eq!(invalid_option(Config { relevance_lambda: -0.1, ..Config::default() }), "relevance_lambda");
    }

    #[test]
    fn missing_fields_take_defaults() {
        let cfg: Config = serde_json::from_str(r#"{ "num_topics": 4, "seed": 7 }"#).unwrap();
        assert_eq!(cfg, Config { num_topics: 4, seed: 7, ..Config::default() });
    }
}
