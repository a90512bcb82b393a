//! Histogram
//!
//! Gradient histograms used to find the best split of a node.
//! Each bin stores the gradient sum and the record count of a feature bin.
use crate::binning::BinnedData;
use rayon::prelude::*;

/// Gradient statistics of a single feature.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureHistogram {
    pub gradient_sum: Vec<f64>,
    pub counts: Vec<usize>,
}

impl FeatureHistogram {
    pub fn empty(n_bins: usize) -> Self {
        FeatureHistogram {
            gradient_sum: vec![0.0; n_bins],
            counts: vec![0; n_bins],
        }
    }

    /// Accumulate the gradients of the rows in `index`.
    ///
    /// * `feature` - Bin codes of the feature, indexed by row.
    /// * `grad` - Gradients, indexed by row.
    /// * `index` - Rows belonging to the node.
    pub fn update(&mut self, feature: &[u16], grad: &[f64], index: &[usize]) {
        for i in index {
            let b = usize::from(feature[*i]);
            self.gradient_sum[b] += grad[*i];
            self.counts[b] += 1;
        }
    }

    /// Fill this histogram as `parent - sibling`.
    pub fn from_parent_child(parent: &FeatureHistogram, sibling: &FeatureHistogram) -> Self {
        let gradient_sum = parent
            .gradient_sum
            .iter()
            .zip(sibling.gradient_sum.iter())
            .map(|(p, s)| p - s)
            .collect();
        let counts = parent.counts.iter().zip(sibling.counts.iter()).map(|(p, s)| p - s).collect();
        FeatureHistogram { gradient_sum, counts }
    }
}

/// Histograms of every feature for one node.
#[derive(Debug, Clone)]
pub struct NodeHistogram {
    pub data: Vec<FeatureHistogram>,
}

impl NodeHistogram {
    /// Build the histograms of a node from scratch.
    ///
    /// * `binned` - Binned training data.
    /// * `rows` - Number of rows in the binned data.
    /// * `grad` - Gradients, indexed by row.
    /// * `index` - Rows belonging to the node.
    pub fn build(binned: &BinnedData, rows: usize, grad: &[f64], index: &[usize]) -> Self {
        let data = (0..binned.cuts.len())
            .into_par_iter()
            .map(|col| {
                let feature = &binned.binned_data[col * rows..(col + 1) * rows];
                let mut hist = FeatureHistogram::empty(binned.n_bins(col));
                hist.update(feature, grad, index);
                hist
            })
            .collect();
        NodeHistogram { data }
    }

    /// Histograms of a node computed from its parent and its sibling.
    pub fn from_parent_child(parent: &NodeHistogram, sibling: &NodeHistogram) -> Self {
        let data = parent
            .data
            .iter()
            .zip(sibling.data.iter())
            .map(|(p, s)| FeatureHistogram::from_parent_child(p, s))
            .collect();
        NodeHistogram { data }
    }
}
