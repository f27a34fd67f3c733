use rand::rngs::StdRng;
use rand::seq::index;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Dimensionality of the feature vector:
/// `[duration, budget, team_size, encoded_resource_tier]`.
pub const N_FEATURES: usize = 4;

// Trees grow until pure: at least two samples per split, sqrt(n_features)
// candidate features considered per split.
const MIN_SAMPLES_SPLIT: usize = 2;
const SPLIT_CANDIDATES: usize = 2;
const MIN_GAIN: f64 = 1e-12;

/// A single node in a fitted decision tree, stored in a flat array.
///
/// `feature == -1` marks a leaf; `value` then holds the class distribution
/// `[p_failure, p_success]`. Internal nodes route on
/// `features[feature] <= threshold` (left) versus greater (right).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeNode {
    pub feature: i32,
    pub threshold: f64,
    pub left: i32,
    pub right: i32,
    pub value: Option<[f64; 2]>,
}

impl TreeNode {
    fn leaf(value: [f64; 2]) -> Self {
        Self {
            feature: -1,
            threshold: 0.0,
            left: -1,
            right: -1,
            value: Some(value),
        }
    }
}

/// A bagged ensemble of binary decision trees.
///
/// Each tree is grown on a bootstrap resample of the training set; prediction
/// averages the leaf class distributions over all trees. Training is
/// deterministic for a given RNG, so a fixed seed reproduces the forest
/// bit-for-bit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Forest {
    trees: Vec<Vec<TreeNode>>,
    feature_importances: [f64; N_FEATURES],
}

impl Forest {
    /// Fits `n_trees` trees on bootstrap resamples of `(x, y)`.
    pub fn fit(x: &[[f64; N_FEATURES]], y: &[bool], n_trees: usize, rng: &mut StdRng) -> Self {
        let mut trees = Vec::with_capacity(n_trees);
        let mut importances = [0.0; N_FEATURES];

        for _ in 0..n_trees {
            let sample: Vec<usize> = (0..x.len()).map(|_| rng.gen_range(0..x.len())).collect();
            let mut nodes = Vec::new();
            grow_tree(x, y, &sample, &mut nodes, &mut importances, rng);
            trees.push(nodes);
        }

        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            for value in importances.iter_mut() {
                *value /= total;
            }
        }

        Self {
            trees,
            feature_importances: importances,
        }
    }

    /// Returns the averaged class distribution `[p_failure, p_success]`.
    pub fn predict_proba(&self, features: &[f64; N_FEATURES]) -> [f64; 2] {
        if self.trees.is_empty() {
            return [0.5, 0.5];
        }

        let mut sum = [0.0, 0.0];
        for tree in &self.trees {
            let probs = traverse_tree(tree, features);
            sum[0] += probs[0];
            sum[1] += probs[1];
        }

        let n = self.trees.len() as f64;
        [sum[0] / n, sum[1] / n]
    }

    /// Normalized impurity-decrease importance per feature, in vector order.
    pub fn feature_importances(&self) -> [f64; N_FEATURES] {
        self.feature_importances
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

/// Traverse a single tree and return its leaf distribution.
#[inline]
fn traverse_tree(nodes: &[TreeNode], features: &[f64; N_FEATURES]) -> [f64; 2] {
    let mut node_idx = 0usize;

    loop {
        let node = &nodes[node_idx];

        if node.feature == -1 {
            return match node.value {
                Some(probs) => probs,
                None => [0.5, 0.5],
            };
        }

        let feature_val = features[node.feature as usize];

        // NaN or <= threshold goes left
        if feature_val.is_nan() || feature_val <= node.threshold {
            node_idx = node.left as usize;
        } else {
            node_idx = node.right as usize;
        }
    }
}

fn class_distribution(y: &[bool], indices: &[usize]) -> [f64; 2] {
    let n = indices.len() as f64;
    let successes = indices.iter().filter(|&&i| y[i]).count() as f64;
    [(n - successes) / n, successes / n]
}

fn gini(n: f64, successes: f64) -> f64 {
    let p = successes / n;
    let q = 1.0 - p;
    1.0 - p * p - q * q
}

struct CandidateSplit {
    feature: usize,
    threshold: f64,
    gain: f64,
}

/// Grows one subtree over `indices`, appending nodes to `nodes` and returning
/// the root index of the subtree. Impurity decreases are accumulated into
/// `importances`, weighted by node size.
fn grow_tree(
    x: &[[f64; N_FEATURES]],
    y: &[bool],
    indices: &[usize],
    nodes: &mut Vec<TreeNode>,
    importances: &mut [f64; N_FEATURES],
    rng: &mut StdRng,
) -> i32 {
    let node_idx = nodes.len() as i32;
    let distribution = class_distribution(y, indices);
    let impurity = 1.0 - distribution[0] * distribution[0] - distribution[1] * distribution[1];

    if indices.len() < MIN_SAMPLES_SPLIT || impurity == 0.0 {
        nodes.push(TreeNode::leaf(distribution));
        return node_idx;
    }

    let split = match best_split(x, y, indices, impurity, rng) {
        Some(split) => split,
        None => {
            nodes.push(TreeNode::leaf(distribution));
            return node_idx;
        }
    };

    importances[split.feature] += indices.len() as f64 * split.gain;

    // Placeholder filled in once both children exist.
    nodes.push(TreeNode {
        feature: split.feature as i32,
        threshold: split.threshold,
        left: -1,
        right: -1,
        value: None,
    });

    let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
        .iter()
        .copied()
        .partition(|&i| x[i][split.feature] <= split.threshold);

    let left = grow_tree(x, y, &left_indices, nodes, importances, rng);
    let right = grow_tree(x, y, &right_indices, nodes, importances, rng);

    let node = &mut nodes[node_idx as usize];
    node.left = left;
    node.right = right;
    node_idx
}

/// Finds the best Gini split over a random subset of candidate features.
fn best_split(
    x: &[[f64; N_FEATURES]],
    y: &[bool],
    indices: &[usize],
    parent_impurity: f64,
    rng: &mut StdRng,
) -> Option<CandidateSplit> {
    let n = indices.len() as f64;
    let mut best: Option<CandidateSplit> = None;

    for feature in index::sample(rng, N_FEATURES, SPLIT_CANDIDATES) {
        let mut values: Vec<f64> = indices.iter().map(|&i| x[i][feature]).collect();
        values.sort_by(|a, b| a.total_cmp(b));
        values.dedup();

        for pair in values.windows(2) {
            let threshold = (pair[0] + pair[1]) / 2.0;

            let (mut n_left, mut s_left, mut n_right, mut s_right) = (0.0, 0.0, 0.0, 0.0);
            for &i in indices {
                if x[i][feature] <= threshold {
                    n_left += 1.0;
                    if y[i] {
                        s_left += 1.0;
                    }
                } else {
                    n_right += 1.0;
                    if y[i] {
                        s_right += 1.0;
                    }
                }
            }
            if n_left == 0.0 || n_right == 0.0 {
                continue;
            }

            let weighted =
                (n_left / n) * gini(n_left, s_left) + (n_right / n) * gini(n_right, s_right);
            let gain = parent_impurity - weighted;

            if gain > best.as_ref().map_or(MIN_GAIN, |b| b.gain) {
                best = Some(CandidateSplit {
                    feature,
                    threshold,
                    gain,
                });
            }
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    // Two well-separated clusters on the first two features.
    fn separable_data() -> (Vec<[f64; N_FEATURES]>, Vec<bool>) {
        let mut x = Vec::new();
        let mut y = Vec::new();
        for i in 0..30 {
            let offset = (i % 5) as f64 * 0.1;
            x.push([1.0 + offset, 10.0 + offset, 3.0, 0.0]);
            y.push(false);
            x.push([9.0 + offset, 90.0 + offset, 3.0, 0.0]);
            y.push(true);
        }
        (x, y)
    }

    #[test]
    fn test_fit_separates_clusters() {
        let (x, y) = separable_data();
        let mut rng = StdRng::seed_from_u64(42);
        let forest = Forest::fit(&x, &y, 25, &mut rng);

        // A tree whose sampled split candidates are both constant features
        // degenerates to a 0.5/0.5 leaf, so the ensemble average stays a bit
        // below the pure-cluster probability.
        let low = forest.predict_proba(&[1.2, 11.0, 3.0, 0.0]);
        let high = forest.predict_proba(&[8.8, 88.0, 3.0, 0.0]);
        assert!(low[0] > 0.75, "expected failure cluster, got {:?}", low);
        assert!(high[1] > 0.75, "expected success cluster, got {:?}", high);
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let (x, y) = separable_data();
        let mut rng = StdRng::seed_from_u64(42);
        let forest = Forest::fit(&x, &y, 25, &mut rng);

        for features in [[1.0, 10.0, 3.0, 0.0], [5.0, 50.0, 3.0, 0.0], [9.0, 90.0, 3.0, 0.0]] {
            let probs = forest.predict_proba(&features);
            assert!((probs[0] + probs[1] - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_fit_is_deterministic_for_a_seed() {
        let (x, y) = separable_data();
        let mut rng_a = StdRng::seed_from_u64(42);
        let mut rng_b = StdRng::seed_from_u64(42);

        let forest_a = Forest::fit(&x, &y, 10, &mut rng_a);
        let forest_b = Forest::fit(&x, &y, 10, &mut rng_b);

        let json_a = serde_json::to_string(&forest_a).unwrap();
        let json_b = serde_json::to_string(&forest_b).unwrap();
        assert_eq!(json_a, json_b);
    }

    #[test]
    fn test_importances_are_normalized() {
        let (x, y) = separable_data();
        let mut rng = StdRng::seed_from_u64(7);
        let forest = Forest::fit(&x, &y, 10, &mut rng);

        let total: f64 = forest.feature_importances().iter().sum();
        assert!((total - 1.0).abs() < 1e-9);
        // The constant features carry no signal.
        assert_eq!(forest.feature_importances()[2], 0.0);
        assert_eq!(forest.feature_importances()[3], 0.0);
    }

    #[test]
    fn test_single_class_sample_yields_leaf() {
        let x = vec![[1.0, 1.0, 1.0, 0.0]; 8];
        let y = vec![true; 8];
        let mut rng = StdRng::seed_from_u64(42);
        let forest = Forest::fit(&x, &y, 5, &mut rng);

        let probs = forest.predict_proba(&[1.0, 1.0, 1.0, 0.0]);
        assert_eq!(probs, [0.0, 1.0]);
    }
}
