use crate::splitter::SplitInfo;
use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct Node {
    pub num: usize,
    pub weight_value: f64,
    pub depth: usize,
    pub split_value: f64,
    pub split_feature: usize,
    pub split_gain: f64,
    pub left_child: usize,
    pub right_child: usize,
    pub is_leaf: bool,
    pub count: usize,
}

impl Node {
    pub fn leaf(num: usize, depth: usize, count: usize) -> Self {
        Node {
            num,
            weight_value: 0.0,
            depth,
            split_value: 0.0,
            split_feature: 0,
            split_gain: 0.0,
            left_child: 0,
            right_child: 0,
            is_leaf: true,
            count,
        }
    }

    /// Update all the info that is needed if this node is a
    /// parent node.
    pub fn make_parent_node(&mut self, split: &SplitInfo, left_child: usize, right_child: usize) {
        self.is_leaf = false;
        self.split_value = split.split_value;
        self.split_feature = split.split_feature;
        self.split_gain = split.split_gain;
        self.left_child = left_child;
        self.right_child = right_child;
    }

    /// Get the path that should be traveled down, given a value.
    #[inline]
    pub fn get_child_idx(&self, v: f64) -> usize {
        if v < self.split_value {
            self.left_child
        } else {
            self.right_child
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_idx() {
        let mut n = Node::leaf(0, 0, 10);
        let split = SplitInfo {
            split_gain: 1.0,
            split_feature: 2,
            split_value: 3.5,
            split_bin: 4,
            left_count: 4,
            right_count: 6,
        };
        n.make_parent_node(&split, 1, 2);
        assert!(!n.is_leaf);
        assert_eq!(n.get_child_idx(3.0), 1);
        assert_eq!(n.get_child_idx(3.5), 2);
        assert_eq!(n.split_feature, 2);
    }
}
