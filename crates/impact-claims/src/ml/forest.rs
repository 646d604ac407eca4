//! Decision forest artifact and evaluator.
//!
//! Artifact JSON:
//!
//! ```json
//! {
//!   "classes": [0, 1],
//!   "n_features": 8,
//!   "trees": [
//!     { "nodes": [
//!         { "feature": 0, "threshold": 10.8, "left": 1, "right": 2 },
//!         { "value": [40.0, 0.0] },
//!         { "value": [0.0, 35.0] }
//!     ] }
//!   ]
//! }
//! ```
//!
//! A split sends `x[feature] <= threshold` to `left`. Leaves hold per-class
//! weights; the forest predicts the argmax of the mean normalized leaf
//! distribution (ties resolve to the lower class index).

use serde::{Deserialize, Serialize};

use super::DecisionFunction;

/// One tree node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: Vec<f64>,
    },
}

/// One tree as a flat node array rooted at index 0
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    fn leaf_for(&self, x: &[f64]) -> &[f64] {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if x[*feature] <= *threshold { *left } else { *right };
                }
                TreeNode::Leaf { value } => return value,
            }
        }
    }
}

/// Ensemble of decision trees
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionForest {
    /// Class label for each output column
    pub classes: Vec<i64>,
    /// Input arity
    pub n_features: usize,
    pub trees: Vec<DecisionTree>,
}

impl DecisionForest {
    /// Parse and validate an artifact
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, String> {
        let forest: DecisionForest = serde_json::from_slice(bytes).map_err(|e| e.to_string())?;
        forest.validate()?;
        Ok(forest)
    }

    /// Check structural consistency.
    ///
    /// Child links must point strictly forward, which rules out cycles and
    /// guarantees traversal terminates.
    pub fn validate(&self) -> Result<(), String> {
        if self.classes.is_empty() {
            return Err("no classes".into());
        }
        if self.n_features == 0 {
            return Err("n_features is zero".into());
        }
        if self.trees.is_empty() {
            return Err("forest has no trees".into());
        }

        for (t, tree) in self.trees.iter().enumerate() {
            if tree.nodes.is_empty() {
                return Err(format!("tree {} has no nodes", t));
            }
            let len = tree.nodes.len();
            for (i, node) in tree.nodes.iter().enumerate() {
                match node {
                    TreeNode::Split {
                        feature,
                        threshold,
                        left,
                        right,
                    } => {
                        if *feature >= self.n_features {
                            return Err(format!(
                                "tree {} node {}: feature {} out of range (n_features = {})",
                                t, i, feature, self.n_features
                            ));
                        }
                        if threshold.is_nan() {
                            return Err(format!("tree {} node {}: threshold is NaN", t, i));
                        }
                        for child in [*left, *right] {
                            if child <= i || child >= len {
                                return Err(format!(
                                    "tree {} node {}: child {} is not a forward link",
                                    t, i, child
                                ));
                            }
                        }
                    }
                    TreeNode::Leaf { value } => {
                        if value.len() != self.classes.len() {
                            return Err(format!(
                                "tree {} node {}: leaf width {} != class count {}",
                                t,
                                i,
                                value.len(),
                                self.classes.len()
                            ));
                        }
                        if value.iter().any(|w| !w.is_finite() || *w < 0.0) {
                            return Err(format!(
                                "tree {} node {}: leaf weights must be finite and non-negative",
                                t, i
                            ));
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Mean normalized class distribution over all trees
    pub fn predict_proba(&self, x: &[f64]) -> Vec<f64> {
        let mut proba = vec![0.0; self.classes.len()];
        for tree in &self.trees {
            let leaf = tree.leaf_for(x);
            let total: f64 = leaf.iter().sum();
            let norm = if total > 0.0 { total } else { 1.0 };
            for (p, w) in proba.iter_mut().zip(leaf) {
                *p += w / norm;
            }
        }
        let n = self.trees.len() as f64;
        proba.iter_mut().for_each(|p| *p /= n);
        proba
    }
}

impl DecisionFunction for DecisionForest {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict(&self, features: &[f64]) -> i64 {
        let proba = self.predict_proba(features);
        let mut best = 0;
        for (i, p) in proba.iter().enumerate().skip(1) {
            if *p > proba[best] {
                best = i;
            }
        }
        self.classes[best]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stump(feature: usize, threshold: f64) -> DecisionTree {
        DecisionTree {
            nodes: vec![
                TreeNode::Split {
                    feature,
                    threshold,
                    left: 1,
                    right: 2,
                },
                TreeNode::Leaf { value: vec![10.0, 0.0] },
                TreeNode::Leaf { value: vec![0.0, 10.0] },
            ],
        }
    }

    fn forest(trees: Vec<DecisionTree>) -> DecisionForest {
        DecisionForest {
            classes: vec![0, 1],
            n_features: 2,
            trees,
        }
    }

    #[test]
    fn test_split_goes_left_on_equal() {
        let f = forest(vec![stump(0, 5.0)]);
        assert_eq!(f.predict(&[5.0, 0.0]), 0);
        assert_eq!(f.predict(&[5.000001, 0.0]), 1);
    }

    #[test]
    fn test_ties_resolve_to_first_class() {
        let f = forest(vec![stump(0, 5.0), stump(1, 5.0)]);
        // one vote each
        assert_eq!(f.predict_proba(&[6.0, 0.0]), vec![0.5, 0.5]);
        assert_eq!(f.predict(&[6.0, 0.0]), 0);
        assert_eq!(f.predict(&[6.0, 6.0]), 1);
    }

    #[test]
    fn test_leaf_weights_are_normalized() {
        let mut sparse_leaf = stump(0, 5.0);
        sparse_leaf.nodes[2] = TreeNode::Leaf { value: vec![0.0, 1.0] };
        let dense_leaf = DecisionTree {
            nodes: vec![TreeNode::Leaf { value: vec![200.0, 100.0] }],
        };
        let f = forest(vec![sparse_leaf, dense_leaf.clone(), dense_leaf]);
        // (0 + 2/3 + 2/3) / 3 vs (1 + 1/3 + 1/3) / 3
        assert_eq!(f.predict(&[9.0, 0.0]), 1);
        let p = f.predict_proba(&[9.0, 0.0]);
        assert!((p[0] - 4.0 / 9.0).abs() < 1e-12);
    }

    #[test]
    fn test_class_labels_are_returned() {
        let mut f = forest(vec![stump(0, 0.0)]);
        f.classes = vec![3, 7];
        assert_eq!(f.predict(&[-1.0, 0.0]), 3);
        assert_eq!(f.predict(&[1.0, 0.0]), 7);
    }

    #[test]
    fn test_validation_rejects_bad_structure() {
        let mut bad_feature = forest(vec![stump(2, 0.0)]);
        assert!(bad_feature.validate().unwrap_err().contains("feature 2"));
        bad_feature.trees = vec![];
        assert!(bad_feature.validate().unwrap_err().contains("no trees"));

        let cycle = forest(vec![DecisionTree {
            nodes: vec![
                TreeNode::Split { feature: 0, threshold: 0.0, left: 0, right: 1 },
                TreeNode::Leaf { value: vec![1.0, 0.0] },
            ],
        }]);
        assert!(cycle.validate().unwrap_err().contains("forward link"));

        let wide = forest(vec![DecisionTree {
            nodes: vec![TreeNode::Leaf { value: vec![1.0, 0.0, 0.0] }],
        }]);
        assert!(wide.validate().unwrap_err().contains("leaf width"));
    }

    #[test]
    fn test_parse_from_json() {
        let json = br#"{
            "classes": [0, 1],
            "n_features": 2,
            "trees": [{ "nodes": [
                { "feature": 1, "threshold": 0.5, "left": 1, "right": 2 },
                { "value": [1, 0] },
                { "value": [0, 1] }
            ] }]
        }"#;
        let f = DecisionForest::from_json_slice(json).unwrap();
        assert_eq!(f.n_features(), 2);
        assert_eq!(f.predict(&[0.0, 1.0]), 1);

        assert!(DecisionForest::from_json_slice(b"{not json").is_err());
    }
}
