//! Random forest failure classifier.
//!
//! Bagged Gini-split decision trees over the four numeric features. The
//! fitted forest is the single global model artifact, serialized as JSON
//! and overwritten wholesale on retrain. Training is deterministic: each
//! tree's bootstrap sample is drawn from a seed derived from the forest
//! seed and the tree index.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::features::FEATURE_COUNT;

/// One labeled training example.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSample {
    pub features: [f64; FEATURE_COUNT],
    pub label: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum TreeNode {
    Leaf {
        label: bool,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

/// A single Gini-split decision tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    root: TreeNode,
}

impl DecisionTree {
    fn fit(samples: &[&TrainingSample], max_depth: usize) -> Self {
        Self {
            root: build_node(samples, max_depth),
        }
    }

    fn predict(&self, features: &[f64; FEATURE_COUNT]) -> bool {
        let mut node = &self.root;
        loop {
            match node {
                TreeNode::Leaf { label } => return *label,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if features[*feature] <= *threshold {
                        left
                    } else {
                        right
                    };
                }
            }
        }
    }
}

/// Majority label; ties resolve to false (not at risk).
fn majority(samples: &[&TrainingSample]) -> bool {
    let positives = samples.iter().filter(|s| s.label).count();
    positives * 2 > samples.len()
}

fn gini(positives: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let p = positives as f64 / total as f64;
    2.0 * p * (1.0 - p)
}

/// Exhaustive split search: midpoints between consecutive distinct values
/// per feature, scored by weighted Gini impurity. Returns None when no
/// split improves on the parent.
fn best_split(samples: &[&TrainingSample]) -> Option<(usize, f64)> {
    let total = samples.len();
    let positives = samples.iter().filter(|s| s.label).count();
    let parent = gini(positives, total);
    if parent == 0.0 {
        return None;
    }

    let mut best: Option<(usize, f64, f64)> = None;
    for feature in 0..FEATURE_COUNT {
        let mut values: Vec<f64> = samples.iter().map(|s| s.features[feature]).collect();
        values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        values.dedup();

        for pair in values.windows(2) {
            let threshold = (pair[0] + pair[1]) / 2.0;
            let mut left = (0usize, 0usize);
            let mut right = (0usize, 0usize);
            for sample in samples {
                let side = if sample.features[feature] <= threshold {
                    &mut left
                } else {
                    &mut right
                };
                side.1 += 1;
                if sample.label {
                    side.0 += 1;
                }
            }
            if left.1 == 0 || right.1 == 0 {
                continue;
            }
            let weighted = (left.1 as f64 * gini(left.0, left.1)
                + right.1 as f64 * gini(right.0, right.1))
                / total as f64;
            if weighted + 1e-12 < best.map_or(parent, |(_, _, g)| g) {
                best = Some((feature, threshold, weighted));
            }
        }
    }

    best.map(|(feature, threshold, _)| (feature, threshold))
}

fn build_node(samples: &[&TrainingSample], depth: usize) -> TreeNode {
    if depth == 0 || samples.len() < 2 {
        return TreeNode::Leaf {
            label: majority(samples),
        };
    }

    match best_split(samples) {
        None => TreeNode::Leaf {
            label: majority(samples),
        },
        Some((feature, threshold)) => {
            let left: Vec<&TrainingSample> = samples
                .iter()
                .copied()
                .filter(|s| s.features[feature] <= threshold)
                .collect();
            let right: Vec<&TrainingSample> = samples
                .iter()
                .copied()
                .filter(|s| s.features[feature] > threshold)
                .collect();
            TreeNode::Split {
                feature,
                threshold,
                left: Box::new(build_node(&left, depth - 1)),
                right: Box::new(build_node(&right, depth - 1)),
            }
        }
    }
}

/// Bagged ensemble of decision trees with majority voting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    n_trees: usize,
    max_depth: usize,
    sample_ratio: f64,
    seed: u64,
}

impl Default for RandomForest {
    fn default() -> Self {
        Self::new(25, 8)
    }
}

impl RandomForest {
    pub fn new(n_trees: usize, max_depth: usize) -> Self {
        Self {
            trees: Vec::new(),
            n_trees,
            max_depth,
            sample_ratio: 0.8,
            seed: 42,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_sample_ratio(mut self, ratio: f64) -> Self {
        self.sample_ratio = ratio.clamp(0.1, 1.0);
        self
    }

    pub fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }

    /// Fits the forest on the full sample set. Bootstrap sampling with
    /// replacement, `sample_ratio` of the set per tree.
    pub fn fit(&mut self, samples: &[TrainingSample]) {
        if samples.is_empty() {
            return;
        }
        let bag_size = ((samples.len() as f64 * self.sample_ratio).round() as usize).max(1);

        self.trees.clear();
        for tree_idx in 0..self.n_trees {
            let mut rng = ChaCha8Rng::seed_from_u64(self.seed.wrapping_add(tree_idx as u64));
            let bag: Vec<&TrainingSample> = (0..bag_size)
                .map(|_| &samples[rng.gen_range(0..samples.len())])
                .collect();
            self.trees.push(DecisionTree::fit(&bag, self.max_depth));
        }
    }

    /// Majority vote over the ensemble. An unfitted forest reports false.
    pub fn predict(&self, features: &[f64; FEATURE_COUNT]) -> bool {
        if self.trees.is_empty() {
            return false;
        }
        let votes = self.trees.iter().filter(|t| t.predict(features)).count();
        votes * 2 > self.trees.len()
    }

    /// Persists the forest as pretty JSON, overwriting any previous
    /// artifact at `path`.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self).context("Failed to serialize model")?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write model artifact {}", path.display()))?;
        Ok(())
    }

    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read model artifact {}", path.display()))?;
        let forest: Self =
            serde_json::from_str(&content).context("Model artifact is not valid JSON")?;
        Ok(forest)
    }
}
