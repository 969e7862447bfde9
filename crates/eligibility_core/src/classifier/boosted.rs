//! Gradient boosted regression trees with a logistic link
//!
//! Raw score = `init + learning_rate * Σ tree(x)`, `P(class 1) = σ(raw)`.
//! A split sends `x[feature] <= threshold` left.

use super::{check_input, label_from_positive, sigmoid, Classifier};
use crate::errors::{EligibilityError, Result};
use crate::matrix::Matrix;
use serde::{Deserialize, Serialize};

/// Child index marking a leaf
pub const LEAF: i32 = -1;

/// A tree node (internal split or leaf)
///
/// For leaves `left == right == -1` and `value` holds the output. For
/// splits, children must come after their parent so traversal always
/// terminates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    pub left: i32,
    pub right: i32,
    #[serde(default)]
    pub feature: usize,
    #[serde(default)]
    pub threshold: f64,
    #[serde(default)]
    pub value: f64,
}

impl TreeNode {
    pub fn split(feature: usize, threshold: f64, left: i32, right: i32) -> Self {
        Self {
            left,
            right,
            feature,
            threshold,
            value: 0.0,
        }
    }

    pub fn leaf(value: f64) -> Self {
        Self {
            left: LEAF,
            right: LEAF,
            feature: 0,
            threshold: 0.0,
            value,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.left == LEAF
    }
}

/// Serialized boosted ensemble
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoostedTreesArtifact {
    pub n_features: usize,
    pub init: f64,
    pub learning_rate: f64,
    pub trees: Vec<Vec<TreeNode>>,
}

#[derive(Debug, Clone)]
pub struct BoostedTrees {
    n_features: usize,
    init: f64,
    learning_rate: f64,
    trees: Vec<Vec<TreeNode>>,
}

impl BoostedTrees {
    pub fn from_artifact(artifact: BoostedTreesArtifact) -> Result<Self> {
        if artifact.n_features == 0 {
            return Err(EligibilityError::schema_load("model", "boosted model has no features"));
        }
        if artifact.trees.is_empty() {
            return Err(EligibilityError::schema_load("model", "boosted model has no trees"));
        }
        if !artifact.init.is_finite() || !artifact.learning_rate.is_finite() {
            return Err(EligibilityError::schema_load("model", "non-finite init or learning rate"));
        }
        for (tree_idx, nodes) in artifact.trees.iter().enumerate() {
            validate_tree(nodes, artifact.n_features).map_err(|reason| {
                EligibilityError::schema_load("model", format!("tree {tree_idx}: {reason}"))
            })?;
        }
        Ok(Self {
            n_features: artifact.n_features,
            init: artifact.init,
            learning_rate: artifact.learning_rate,
            trees: artifact.trees,
        })
    }

    fn raw_score(&self, row: &[f64]) -> f64 {
        let sum: f64 = self.trees.iter().map(|nodes| evaluate(nodes, row)).sum();
        self.init + self.learning_rate * sum
    }

    fn positive_probabilities(&self, rows: &Matrix) -> Result<Vec<f64>> {
        check_input(rows, self.n_features)?;
        Ok(rows.iter_rows().map(|row| sigmoid(self.raw_score(row))).collect())
    }
}

fn validate_tree(nodes: &[TreeNode], n_features: usize) -> std::result::Result<(), String> {
    if nodes.is_empty() {
        return Err("no nodes".into());
    }
    for (idx, node) in nodes.iter().enumerate() {
        if node.is_leaf() {
            if node.right != LEAF {
                return Err(format!("leaf node {idx} has a right child"));
            }
            if !node.value.is_finite() {
                return Err(format!("leaf node {idx} has a non-finite value"));
            }
            continue;
        }
        for child in [node.left, node.right] {
            if child <= idx as i32 || child as usize >= nodes.len() {
                return Err(format!("node {idx} has invalid child {child}"));
            }
        }
        if node.feature >= n_features {
            return Err(format!("node {idx} splits on unknown feature {}", node.feature));
        }
        if !node.threshold.is_finite() {
            return Err(format!("node {idx} has a non-finite threshold"));
        }
    }
    Ok(())
}

/// Walk a validated tree from the root to a leaf
fn evaluate(nodes: &[TreeNode], row: &[f64]) -> f64 {
    let mut idx = 0usize;
    loop {
        let node = &nodes[idx];
        if node.is_leaf() {
            return node.value;
        }
        idx = if row[node.feature] <= node.threshold {
            node.left as usize
        } else {
            node.right as usize
        };
    }
}

impl Classifier for BoostedTrees {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict(&self, rows: &Matrix) -> Result<Vec<u8>> {
        Ok(self
            .positive_probabilities(rows)?
            .into_iter()
            .map(label_from_positive)
            .collect())
    }

    fn predict_proba(&self, rows: &Matrix) -> Result<Vec<[f64; 2]>> {
        Ok(self
            .positive_probabilities(rows)?
            .into_iter()
            .map(|p1| [1.0 - p1, p1])
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stump(feature: usize, threshold: f64, left: f64, right: f64) -> Vec<TreeNode> {
        vec![
            TreeNode::split(feature, threshold, 1, 2),
            TreeNode::leaf(left),
            TreeNode::leaf(right),
        ]
    }

    fn model() -> BoostedTrees {
        BoostedTrees::from_artifact(BoostedTreesArtifact {
            n_features: 2,
            init: 0.0,
            learning_rate: 1.0,
            trees: vec![stump(0, 0.5, -2.0, 2.0), stump(1, 0.0, -1.0, 1.0)],
        })
        .unwrap()
    }

    #[test]
    fn two_tree_scores() {
        let m = model();
        // left, left: -3
        assert_eq!(m.raw_score(&[0.0, 0.0]), -3.0);
        // right, right: 3
        assert_eq!(m.raw_score(&[1.0, 1.0]), 3.0);
        // threshold is inclusive on the left
        assert_eq!(m.raw_score(&[0.5, 1.0]), -1.0);
    }

    #[test]
    fn labels_follow_probabilities() {
        let rows = Matrix::from_rows(vec![vec![0.0, 0.0], vec![1.0, 1.0]]).unwrap();
        let m = model();
        assert_eq!(m.predict(&rows).unwrap(), vec![0, 1]);
        let proba = m.predict_proba(&rows).unwrap();
        assert!(proba[0][0] > 0.9);
        assert!(proba[1][1] > 0.9);
    }

    #[test]
    fn deserializes_sparse_leaf_nodes() {
        let artifact: BoostedTreesArtifact = serde_json::from_str(
            r#"{"n_features":1,"init":0.1,"learning_rate":0.5,
                "trees":[[{"left":1,"right":2,"feature":0,"threshold":3.5},
                          {"left":-1,"right":-1,"value":-0.4},
                          {"left":-1,"right":-1,"value":0.8}]]}"#,
        )
        .unwrap();
        let m = BoostedTrees::from_artifact(artifact).unwrap();
        assert!((m.raw_score(&[10.0]) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn rejects_cycles_and_bad_features() {
        let cyclic = BoostedTreesArtifact {
            n_features: 1,
            init: 0.0,
            learning_rate: 1.0,
            trees: vec![vec![TreeNode::split(0, 0.0, 0, 1), TreeNode::leaf(1.0)]],
        };
        assert!(BoostedTrees::from_artifact(cyclic).is_err());

        let bad_feature = BoostedTreesArtifact {
            n_features: 1,
            init: 0.0,
            learning_rate: 1.0,
            trees: vec![stump(3, 0.0, 0.0, 1.0)],
        };
        assert!(BoostedTrees::from_artifact(bad_feature).is_err());

        let empty = BoostedTreesArtifact {
            n_features: 1,
            init: 0.0,
            learning_rate: 1.0,
            trees: vec![],
        };
        assert!(BoostedTrees::from_artifact(empty).is_err());
    }
}
