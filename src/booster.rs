//! Booster
//!
//! Gradient boosting with the quantile (pinball) loss. Every round grows a
//! shallow least squares tree on the loss gradients and then moves each of its
//! leaves to the target quantile of the residuals that fall into it.
use crate::binning::bin_matrix;
use crate::data::Matrix;
use crate::errors::CalibrationError;
use crate::model::{JsonIO, RegressionModel};
use crate::objective::QuantileLoss;
use crate::sampler::{RandomSampler, Sampler};
use crate::tree::{Tree, TreeParams};
use crate::utils::{validate_float_parameter, validate_positive_float_parameter, validate_quantile};
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

fn default_quantile() -> f64 {
    0.9
}
fn default_n_estimators() -> usize {
    100
}
fn default_learning_rate() -> f64 {
    0.1
}
fn default_max_depth() -> usize {
    3
}
fn default_min_samples_split() -> usize {
    2
}
fn default_min_samples_leaf() -> usize {
    1
}
fn default_subsample() -> f64 {
    1.0
}
fn default_max_bin() -> u16 {
    256
}
fn default_log_iterations() -> usize {
    0
}

/// Training parameters of the `QuantileBooster`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct BoosterConfig {
    /// Target quantile in `(0, 1)`.
    #[serde(default = "default_quantile")]
    pub quantile: f64,
    /// Number of boosting rounds.
    #[serde(default = "default_n_estimators")]
    pub n_estimators: usize,
    /// Step size each leaf value is multiplied by.
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
    /// Maximum depth of each tree.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    /// Minimum number of rows a node needs to be split.
    #[serde(default = "default_min_samples_split")]
    pub min_samples_split: usize,
    /// Minimum number of rows in a leaf.
    #[serde(default = "default_min_samples_leaf")]
    pub min_samples_leaf: usize,
    /// Fraction of rows drawn for each tree.
    #[serde(default = "default_subsample")]
    pub subsample: f64,
    /// Maximum number of bins used to discretize each feature.
    #[serde(default = "default_max_bin")]
    pub max_bin: u16,
    /// Seed for random number generation.
    #[serde(default)]
    pub seed: u64,
    /// Logging frequency (every N iterations, 0 disables it).
    #[serde(default = "default_log_iterations")]
    pub log_iterations: usize,
}

impl Default for BoosterConfig {
    fn default() -> Self {
        BoosterConfig {
            quantile: default_quantile(),
            n_estimators: default_n_estimators(),
            learning_rate: default_learning_rate(),
            max_depth: default_max_depth(),
            min_samples_split: default_min_samples_split(),
            min_samples_leaf: default_min_samples_leaf(),
            subsample: default_subsample(),
            max_bin: default_max_bin(),
            seed: 0,
            log_iterations: default_log_iterations(),
        }
    }
}

impl BoosterConfig {
    pub fn validate(&self) -> Result<(), CalibrationError> {
        validate_quantile(self.quantile)?;
        validate_positive_float_parameter(self.learning_rate, "learning_rate")?;
        validate_float_parameter(self.subsample, 0.0, 1.0, "subsample")?;
        if self.n_estimators == 0 {
            return Err(CalibrationError::InvalidParameter(
                "n_estimators".to_string(),
                "a positive integer".to_string(),
                "0".to_string(),
            ));
        }
        if self.max_depth == 0 {
            return Err(CalibrationError::InvalidParameter(
                "max_depth".to_string(),
                "a positive integer".to_string(),
                "0".to_string(),
            ));
        }
        Ok(())
    }
}

impl JsonIO for BoosterConfig {}

/// Quantile gradient boosting model.
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct QuantileBooster {
    pub cfg: BoosterConfig,
    /// The initial prediction value of the model.
    pub base_score: f64,
    pub n_features: usize,
    pub trees: Vec<Tree>,
    #[serde(default)]
    metadata: HashMap<String, String>,
}

impl Default for QuantileBooster {
    fn default() -> Self {
        QuantileBooster {
            cfg: BoosterConfig::default(),
            base_score: f64::NAN,
            n_features: 0,
            trees: Vec::new(),
            metadata: HashMap::new(),
        }
    }
}

impl QuantileBooster {
    pub fn new(cfg: BoosterConfig) -> Result<Self, CalibrationError> {
        cfg.validate()?;
        Ok(QuantileBooster {
            cfg,
            ..Default::default()
        })
    }

    pub fn reset(&mut self) {
        self.trees = Vec::new();
        self.base_score = f64::NAN;
    }

    /// Fit the booster on a provided dataset.
    ///
    /// * `data` - Column major input data, one column per input variable.
    /// * `y` - Target of every row.
    pub fn fit(&mut self, data: &Matrix<f64>, y: &[f64]) -> Result<(), CalibrationError> {
        self.cfg.validate()?;
        if data.rows == 0 {
            return Err(CalibrationError::DataShape("cannot fit on an empty dataset".to_string()));
        }
        if data.rows != y.len() {
            return Err(CalibrationError::DataShape(format!(
                "{} rows of inputs but {} targets",
                data.rows,
                y.len()
            )));
        }
        self.reset();
        self.n_features = data.cols;

        let objective = QuantileLoss::new(self.cfg.quantile);
        let binned = bin_matrix(data, self.cfg.max_bin)?;
        let params = TreeParams {
            max_depth: self.cfg.max_depth,
            min_samples_split: self.cfg.min_samples_split,
            min_samples_leaf: self.cfg.min_samples_leaf,
            learning_rate: self.cfg.learning_rate,
        };

        self.base_score = objective.initial_value(y, None);
        let mut yhat = vec![self.base_score; y.len()];

        let mut rng = StdRng::seed_from_u64(self.cfg.seed);
        let mut sampler = RandomSampler::new(self.cfg.subsample);

        for i in 0..self.cfg.n_estimators {
            let index = if self.cfg.subsample < 1.0 {
                sampler.sample(&mut rng, &data.index).0
            } else {
                data.index.to_owned()
            };
            if index.is_empty() {
                continue;
            }
            let grad = objective.gradient(y, &yhat);
            let mut tree = Tree::new();
            tree.fit(&binned, data.rows, index, &grad, y, &yhat, &objective, &params);
            for (p, v) in yhat.iter_mut().zip(tree.predict(data, true)) {
                *p += v;
            }
            self.trees.push(tree);

            if self.cfg.log_iterations > 0 && (i + 1) % self.cfg.log_iterations == 0 {
                let loss = objective.loss(y, &yhat);
                info!(
                    "round {}, mean quantile loss {:.6}",
                    i + 1,
                    loss.iter().sum::<f64>() / loss.len() as f64
                );
            }
        }

        info!(
            "Finished training a quantile booster (quantile={}) with {} trees on {} rows and {} inputs.",
            self.cfg.quantile,
            self.trees.len(),
            data.rows,
            data.cols
        );
        Ok(())
    }

    /// Get reference to the trees
    pub fn get_prediction_trees(&self) -> &[Tree] {
        &self.trees
    }

    /// Insert metadata
    /// * `key` - String value for the metadata key.
    /// * `value` - value to assign to the metadata key.
    pub fn insert_metadata(&mut self, key: String, value: String) {
        self.metadata.insert(key, value);
    }

    /// Get Metadata
    /// * `key` - Get the associated value for the metadata key.
    pub fn get_metadata(&self, key: &String) -> Option<String> {
        self.metadata.get(key).cloned()
    }
}

impl RegressionModel for QuantileBooster {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict_row(&self, row: &[f64]) -> f64 {
        self.trees
            .iter()
            .fold(self.base_score, |acc, tree| acc + tree.predict_row_from_row_slice(row))
    }

    fn predict(&self, data: &Matrix<f64>, parallel: bool) -> Vec<f64> {
        let mut init_preds = vec![self.base_score; data.rows];
        self.get_prediction_trees().iter().for_each(|tree| {
            for (p_, val) in init_preds.iter_mut().zip(tree.predict(data, parallel)) {
                *p_ += val;
            }
        });
        init_preds
    }
}

impl JsonIO for QuantileBooster {}
