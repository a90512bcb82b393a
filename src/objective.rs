//! Quantile Loss function for quantile regression.
use crate::utils::weighted_quantile;
use serde::{Deserialize, Serialize};

/// Quantile Loss (pinball loss), targets a specific quantile of the conditional distribution.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
pub struct QuantileLoss {
    /// Target quantile in `(0, 1)`. For example, `0.5` for the median.
    pub quantile: f64,
}

impl QuantileLoss {
    pub fn new(quantile: f64) -> Self {
        QuantileLoss { quantile }
    }

    #[inline]
    pub fn loss_single(&self, y: f64, yhat: f64) -> f64 {
        let q = self.quantile;
        let s = y - yhat;
        if s >= 0.0 {
            q * s
        } else {
            (q - 1.0) * s
        }
    }

    /// Pinball loss of every record.
    #[inline]
    pub fn loss(&self, y: &[f64], yhat: &[f64]) -> Vec<f64> {
        y.iter().zip(yhat).map(|(y_, yhat_)| self.loss_single(*y_, *yhat_)).collect()
    }

    /// Gradient of the pinball loss with respect to the prediction.
    ///
    /// `1 - q` when the prediction is at or above the target, `-q` otherwise.
    #[inline]
    pub fn gradient(&self, y: &[f64], yhat: &[f64]) -> Vec<f64> {
        let q = self.quantile;
        y.iter()
            .zip(yhat)
            .map(|(y_, yhat_)| if yhat_ - y_ >= 0.0 { 1.0 - q } else { -q })
            .collect()
    }

    /// Constant prediction minimizing the loss: the quantile of the targets.
    pub fn initial_value(&self, y: &[f64], sample_weight: Option<&[f64]>) -> f64 {
        weighted_quantile(y, sample_weight, self.quantile)
    }

    /// Optimal value of a terminal region: the quantile of the residuals
    /// `y - yhat` of the rows in `index`.
    pub fn leaf_value(&self, y: &[f64], yhat: &[f64], index: &[usize]) -> f64 {
        let residuals: Vec<f64> = index.iter().map(|i| y[*i] - yhat[*i]).collect();
        weighted_quantile(&residuals, None, self.quantile)
    }
}
