//! Metric
//!
//! Calibration checks for quantile predictions: coverage of the held-out
//! targets, pinball loss, and coverage profiles along one input variable.
use crate::objective::QuantileLoss;
use crate::registry::BinningSpec;
use serde::{Deserialize, Serialize};

/// Number of rows whose target lies strictly below its prediction.
pub fn count_below(y: &[f64], yhat: &[f64]) -> usize {
    y.iter().zip(yhat).filter(|(y_, yhat_)| y_ < yhat_).count()
}

/// Fraction of rows whose target lies strictly below its prediction.
/// NaN for empty input.
pub fn efficiency(y: &[f64], yhat: &[f64]) -> f64 {
    if y.is_empty() {
        return f64::NAN;
    }
    count_below(y, yhat) as f64 / y.len() as f64
}

pub fn mean_pinball_loss(y: &[f64], yhat: &[f64], quantile: f64) -> f64 {
    if y.is_empty() {
        return f64::NAN;
    }
    let loss = QuantileLoss::new(quantile);
    loss.loss(y, yhat).iter().sum::<f64>() / y.len() as f64
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProfileBin {
    pub bin: usize,
    pub low: f64,
    pub high: f64,
    pub count: usize,
    pub efficiency: f64,
}

/// Efficiency as a function of one input variable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EfficiencyProfile {
    pub variable: String,
    pub bins: Vec<ProfileBin>,
}

impl EfficiencyProfile {
    /// Bin the rows by `x` and compute the efficiency inside every bin.
    /// Empty bins and rows outside the binning are left out.
    ///
    /// * `variable` - Name of the variable `x` holds.
    /// * `x` - Values of the variable, one per row.
    /// * `y` - Targets.
    /// * `yhat` - Predictions.
    /// * `binning` - Bins to group rows by.
    pub fn compute(variable: &str, x: &[f64], y: &[f64], yhat: &[f64], binning: &BinningSpec) -> Self {
        let mut counts = vec![0usize; binning.n_bins];
        let mut below = vec![0usize; binning.n_bins];
        for ((x_, y_), yhat_) in x.iter().zip(y).zip(yhat) {
            if let Some(b) = binning.find_bin(*x_) {
                counts[b] += 1;
                if y_ < yhat_ {
                    below[b] += 1;
                }
            }
        }
        let bins = counts
            .iter()
            .zip(below.iter())
            .enumerate()
            .filter(|(_, (c, _))| **c > 0)
            .map(|(b, (c, n))| ProfileBin {
                bin: b,
                low: binning.bin_low_edge(b),
                high: binning.bin_low_edge(b + 1),
                count: *c,
                efficiency: *n as f64 / *c as f64,
            })
            .collect();
        EfficiencyProfile {
            variable: variable.to_string(),
            bins,
        }
    }

    /// Bin with the efficiency furthest from `quantile`.
    pub fn worst_bin(&self, quantile: f64) -> Option<&ProfileBin> {
        self.bins.iter().max_by(|a, b| {
            (a.efficiency - quantile)
                .abs()
                .total_cmp(&(b.efficiency - quantile).abs())
        })
    }
}
