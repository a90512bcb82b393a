use crate::histogram::NodeHistogram;
use crate::utils::gain_const_hess;

/// Splits whose gain does not exceed this value are not taken.
const MIN_SPLIT_GAIN: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq)]
pub struct SplitInfo {
    pub split_gain: f64,
    pub split_feature: usize,
    pub split_value: f64,
    pub split_bin: u16,
    pub left_count: usize,
    pub right_count: usize,
}

/// Least squares split search over gradient histograms.
#[derive(Debug, Clone, Copy)]
pub struct Splitter {
    pub min_samples_leaf: usize,
}

impl Splitter {
    pub fn new(min_samples_leaf: usize) -> Self {
        Splitter {
            min_samples_leaf: min_samples_leaf.max(1),
        }
    }

    /// Find the split with the largest gain across all features.
    ///
    /// Ties are resolved in favour of the lowest feature and bin, so the search
    /// is deterministic.
    ///
    /// * `hist` - Histograms of the node.
    /// * `cuts` - Cut values of each feature.
    pub fn best_split(&self, hist: &NodeHistogram, cuts: &[Vec<f64>]) -> Option<SplitInfo> {
        let mut best: Option<SplitInfo> = None;
        for (feature, (fh, feature_cuts)) in hist.data.iter().zip(cuts.iter()).enumerate() {
            let total_gradient: f64 = fh.gradient_sum.iter().sum();
            let total_count: usize = fh.counts.iter().sum();
            if total_count == 0 {
                continue;
            }
            let parent_gain = gain_const_hess(total_gradient, total_count);
            let mut left_gradient = 0.0;
            let mut left_count = 0;
            // The last bin has no cut above it, so it can never be a split point.
            for (bin, cut) in feature_cuts.iter().enumerate() {
                left_gradient += fh.gradient_sum[bin];
                left_count += fh.counts[bin];
                let right_count = total_count - left_count;
                if left_count < self.min_samples_leaf {
                    continue;
                }
                if right_count < self.min_samples_leaf {
                    break;
                }
                let right_gradient = total_gradient - left_gradient;
                let split_gain = gain_const_hess(left_gradient, left_count)
                    + gain_const_hess(right_gradient, right_count)
                    - parent_gain;
                if split_gain <= MIN_SPLIT_GAIN {
                    continue;
                }
                let improves = match &best {
                    Some(b) => split_gain > b.split_gain,
                    None => true,
                };
                if improves {
                    best = Some(SplitInfo {
                        split_gain,
                        split_feature: feature,
                        split_value: *cut,
                        split_bin: bin as u16,
                        left_count,
                        right_count,
                    });
                }
            }
        }
        best
    }
}
