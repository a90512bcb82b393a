use crate::binning::BinnedData;
use crate::data::Matrix;
use crate::histogram::NodeHistogram;
use crate::node::Node;
use crate::objective::QuantileLoss;
use crate::splitter::Splitter;
use crate::utils::pivot_on_split;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::max;
use std::collections::VecDeque;
use std::fmt::{self, Display};

/// Growth limits of a single tree.
#[derive(Debug, Clone, Copy)]
pub struct TreeParams {
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub learning_rate: f64,
}

/// A node waiting to be split, with its rows at `index[start_idx..stop_idx]`.
struct SplittableNode {
    num: usize,
    depth: usize,
    start_idx: usize,
    stop_idx: usize,
    histogram: NodeHistogram,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct Tree {
    pub nodes: Vec<Node>,
    pub depth: usize,
    pub n_leaves: usize,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    pub fn new() -> Self {
        Tree {
            nodes: Vec::new(),
            depth: 0,
            n_leaves: 0,
        }
    }

    /// Grow a least squares tree on the gradients, then set every leaf to the
    /// loss-optimal value of its rows, scaled by the learning rate.
    ///
    /// * `binned` - Binned training data.
    /// * `index` - Rows the tree is grown on.
    /// * `grad` - Gradients, indexed by row.
    /// * `y` - Targets, indexed by row.
    /// * `yhat` - Current predictions, indexed by row.
    /// * `objective` - Loss used for the leaf values.
    /// * `params` - Growth limits.
    #[allow(clippy::too_many_arguments)]
    pub fn fit(
        &mut self,
        binned: &BinnedData,
        rows: usize,
        mut index: Vec<usize>,
        grad: &[f64],
        y: &[f64],
        yhat: &[f64],
        objective: &QuantileLoss,
        params: &TreeParams,
    ) {
        self.nodes.clear();
        self.depth = 0;
        let splitter = Splitter::new(params.min_samples_leaf);
        let min_samples_split = max(params.min_samples_split, 2 * splitter.min_samples_leaf);

        self.nodes.push(Node::leaf(0, 0, index.len()));
        let mut growable = VecDeque::new();
        growable.push_back(SplittableNode {
            num: 0,
            depth: 0,
            start_idx: 0,
            stop_idx: index.len(),
            histogram: NodeHistogram::build(binned, rows, grad, &index),
        });
        let mut leaves: Vec<(usize, usize, usize)> = Vec::new();

        while let Some(node) = growable.pop_front() {
            let n_rows = node.stop_idx - node.start_idx;
            let split = if node.depth < params.max_depth && n_rows >= min_samples_split {
                splitter.best_split(&node.histogram, &binned.cuts)
            } else {
                None
            };
            let split = match split {
                Some(s) => s,
                None => {
                    leaves.push((node.num, node.start_idx, node.stop_idx));
                    continue;
                }
            };

            let feature = &binned.binned_data[split.split_feature * rows..(split.split_feature + 1) * rows];
            let n_left = pivot_on_split(&mut index[node.start_idx..node.stop_idx], feature, split.split_bin);
            let mid = node.start_idx + n_left;

            // Build the smaller child, derive the larger one from the parent.
            let (left_hist, right_hist) = if n_left <= n_rows - n_left {
                let left = NodeHistogram::build(binned, rows, grad, &index[node.start_idx..mid]);
                let right = NodeHistogram::from_parent_child(&node.histogram, &left);
                (left, right)
            } else {
                let right = NodeHistogram::build(binned, rows, grad, &index[mid..node.stop_idx]);
                let left = NodeHistogram::from_parent_child(&node.histogram, &right);
                (left, right)
            };

            let left_num = self.nodes.len();
            let right_num = left_num + 1;
            let child_depth = node.depth + 1;
            self.nodes[node.num].make_parent_node(&split, left_num, right_num);
            self.nodes.push(Node::leaf(left_num, child_depth, n_left));
            self.nodes.push(Node::leaf(right_num, child_depth, n_rows - n_left));
            self.depth = max(self.depth, child_depth);

            growable.push_back(SplittableNode {
                num: left_num,
                depth: child_depth,
                start_idx: node.start_idx,
                stop_idx: mid,
                histogram: left_hist,
            });
            growable.push_back(SplittableNode {
                num: right_num,
                depth: child_depth,
                start_idx: mid,
                stop_idx: node.stop_idx,
                histogram: right_hist,
            });
        }

        self.n_leaves = leaves.len();
        for (num, start, stop) in leaves {
            let value = objective.leaf_value(y, yhat, &index[start..stop]);
            self.nodes[num].weight_value = params.learning_rate * value;
        }
    }

    pub fn predict_row_from_row_slice(&self, row: &[f64]) -> f64 {
        let mut node_idx = 0;
        loop {
            let node = &self.nodes[node_idx];
            if node.is_leaf {
                return node.weight_value;
            }
            node_idx = node.get_child_idx(row[node.split_feature]);
        }
    }

    fn predict_row(&self, data: &Matrix<f64>, row: usize) -> f64 {
        let mut node_idx = 0;
        loop {
            let node = &self.nodes[node_idx];
            if node.is_leaf {
                return node.weight_value;
            }
            node_idx = node.get_child_idx(*data.get(row, node.split_feature));
        }
    }

    pub fn predict(&self, data: &Matrix<f64>, parallel: bool) -> Vec<f64> {
        if parallel {
            data.index.par_iter().map(|i| self.predict_row(data, *i)).collect()
        } else {
            data.index.iter().map(|i| self.predict_row(data, *i)).collect()
        }
    }
}

impl Display for Tree {
    // Generate text representation of the tree
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut print_buffer: Vec<usize> = vec![0];
        let mut r = String::new();
        while let Some(idx) = print_buffer.pop() {
            let node = &self.nodes[idx];
            r += &format!("{}", "      ".repeat(node.depth));
            if node.is_leaf {
                r += &format!("{}:leaf={},count={}\n", node.num, node.weight_value, node.count);
            } else {
                r += &format!(
                    "{}:[{} < {}] yes={},no={},gain={},count={}\n",
                    node.num,
                    node.split_feature,
                    node.split_value,
                    node.left_child,
                    node.right_child,
                    node.split_gain,
                    node.count
                );
                print_buffer.push(node.right_child);
                print_buffer.push(node.left_child);
            }
        }
        write!(f, "{}", r)
    }
}
