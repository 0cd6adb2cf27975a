// 🌲 Satisfaction Predictor - Random forest regression
// (price, one-hot category) → predicted rating, trained once over the catalog
//
// Only products already in the catalog can be scored: their feature row is
// rebuilt from the stored record. Scoring unseen products is not supported.

use crate::catalog::Catalog;
use crate::error::{RecommendError, RecommendResult};
use crate::features::FeatureBuilder;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

// ============================================================================
// CONFIGURATION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForestConfig {
    pub n_trees: usize,
    pub seed: u64,
    /// Nodes with fewer samples become leaves
    pub min_samples_split: usize,
    /// `None` grows until leaves are pure
    pub max_depth: Option<usize>,
}

impl Default for ForestConfig {
    fn default() -> Self {
        ForestConfig {
            n_trees: 100,
            seed: 42,
            min_samples_split: 2,
            max_depth: None,
        }
    }
}

// ============================================================================
// REGRESSION TREE
// ============================================================================

/// Flat node storage; children are indices into `RegressionTree::nodes`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

/// (node index, rows reaching it, depth)
type PendingNode = (usize, Vec<usize>, usize);

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    sse: f64,
}

impl RegressionTree {
    /// Fit on the rows selected by `sample` (may contain repeats).
    /// Nodes are grown from an explicit work list, so tree depth never
    /// touches the call stack.
    pub fn fit(x: &[Vec<f64>], y: &[f64], sample: Vec<usize>, config: &ForestConfig) -> Self {
        let mut tree = RegressionTree {
            nodes: vec![Node::Leaf { value: 0.0 }],
        };
        let mut pending = vec![(0usize, sample, 0usize)];

        while let Some((index, sample, depth)) = pending.pop() {
            if let Some((left, right)) = tree.grow_node(x, y, index, sample, depth, config) {
                pending.push(right);
                pending.push(left);
            }
        }

        tree
    }

    pub fn predict(&self, row: &[f64]) -> f64 {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                Node::Leaf { value } => return *value,
                Node::Split { feature, threshold, left, right } => {
                    index = if row[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Settle the node at `index`. A split allocates both children and
    /// returns their pending work.
    fn grow_node(
        &mut self,
        x: &[Vec<f64>],
        y: &[f64],
        index: usize,
        sample: Vec<usize>,
        depth: usize,
        config: &ForestConfig,
    ) -> Option<(PendingNode, PendingNode)> {
        let mean = sample.iter().map(|&i| y[i]).sum::<f64>() / sample.len() as f64;
        self.nodes[index] = Node::Leaf { value: mean };

        let depth_reached = config.max_depth.map_or(false, |max| depth >= max);
        let pure = sample.iter().all(|&i| y[i] == y[sample[0]]);
        if sample.len() < config.min_samples_split || depth_reached || pure {
            return None;
        }

        let split = best_split(x, y, &sample)?;

        let (left_sample, right_sample): (Vec<usize>, Vec<usize>) = sample
            .into_iter()
            .partition(|&i| x[i][split.feature] <= split.threshold);

        let left = self.nodes.len();
        let right = left + 1;
        self.nodes.push(Node::Leaf { value: mean });
        self.nodes.push(Node::Leaf { value: mean });

        self.nodes[index] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };

        Some(((left, left_sample, depth + 1), (right, right_sample, depth + 1)))
    }
}

/// Lowest summed squared error over all features and cut points.
/// Earlier features and lower thresholds win ties.
fn best_split(x: &[Vec<f64>], y: &[f64], sample: &[usize]) -> Option<SplitCandidate> {
    let n_features = x[sample[0]].len();
    let n = sample.len() as f64;
    let total_sum: f64 = sample.iter().map(|&i| y[i]).sum();
    let total_sq: f64 = sample.iter().map(|&i| y[i] * y[i]).sum();

    let mut best: Option<SplitCandidate> = None;

    for feature in 0..n_features {
        let mut pairs: Vec<(f64, f64)> = sample.iter().map(|&i| (x[i][feature], y[i])).collect();
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut left_sum = 0.0;
        let mut left_sq = 0.0;

        for k in 0..pairs.len() - 1 {
            left_sum += pairs[k].1;
            left_sq += pairs[k].1 * pairs[k].1;

            if pairs[k].0 == pairs[k + 1].0 {
                continue;
            }

            let left_n = (k + 1) as f64;
            let right_n = n - left_n;
            let right_sum = total_sum - left_sum;
            let right_sq = total_sq - left_sq;

            let sse = (left_sq - left_sum * left_sum / left_n) + (right_sq - right_sum * right_sum / right_n);

            if best.as_ref().map_or(true, |b| sse < b.sse) {
                best = Some(SplitCandidate {
                    feature,
                    threshold: (pairs[k].0 + pairs[k + 1].0) / 2.0,
                    sse,
                });
            }
        }
    }

    best
}

// ============================================================================
// RANDOM FOREST
// ============================================================================

/// Bagged regression trees; prediction is the mean of all trees
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<RegressionTree>,
    config: ForestConfig,
}

impl RandomForest {
    pub fn fit(x: &[Vec<f64>], y: &[f64], config: ForestConfig) -> Self {
        let n = y.len();
        let mut rng = StdRng::seed_from_u64(config.seed);

        let trees = if n == 0 {
            Vec::new()
        } else {
            (0..config.n_trees.max(1))
                .map(|_| {
                    let sample: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
                    RegressionTree::fit(x, y, sample, &config)
                })
                .collect()
        };

        RandomForest { trees, config }
    }

    pub fn predict(&self, row: &[f64]) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        self.trees.iter().map(|tree| tree.predict(row)).sum::<f64>() / self.trees.len() as f64
    }

    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }

    pub fn config(&self) -> &ForestConfig {
        &self.config
    }
}

// ============================================================================
// SATISFACTION PREDICTOR
// ============================================================================

#[derive(Debug, Clone)]
pub struct SatisfactionPredictor {
    forest: RandomForest,
}

impl SatisfactionPredictor {
    pub fn train(catalog: &Catalog, features: &FeatureBuilder, config: ForestConfig) -> Self {
        let x = features.predictor_matrix(catalog);
        let y: Vec<f64> = catalog.products().iter().map(|p| p.rating).collect();

        let forest = RandomForest::fit(&x, &y, config);
        tracing::info!(trees = forest.tree_count(), rows = y.len(), "satisfaction predictor trained");

        SatisfactionPredictor { forest }
    }

    pub fn from_forest(forest: RandomForest) -> Self {
        SatisfactionPredictor { forest }
    }

    pub fn forest(&self) -> &RandomForest {
        &self.forest
    }

    /// Predicted rating for a product already in the catalog
    pub fn predict(&self, catalog: &Catalog, features: &FeatureBuilder, product_id: &str) -> RecommendResult<f64> {
        let product = catalog
            .get(product_id)
            .ok_or_else(|| RecommendError::NotFound(product_id.to_string()))?;

        Ok(self.forest.predict(&features.predictor_vector(product)))
    }
}

// ============================================================================
// TESTS
// ============================================================================
