//! Random forest classifier.
//!
//! A small, dependency-light implementation of a bagged ensemble of CART trees:
//!
//! - each tree is fitted on a bootstrap resample of the training rows
//! - each node considers a random subset of the features (`floor(sqrt(n_features))`, at least
//!   one) and picks the threshold with the lowest weighted Gini impurity
//! - class probabilities are the mean over trees of the leaf class frequencies
//!
//! All randomness comes from a single `ChaCha8Rng` seeded from [`ForestParams::seed`], so the
//! same rows, labels and parameters always produce the same forest. Leaves keep integer class
//! counts, which makes a serialised forest reproduce its probabilities exactly after reloading.

use crate::{CoreError, CoreResult};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Smallest impurity decrease accepted for a split.
const MIN_IMPURITY_DECREASE: f64 = 1e-12;

/// Parameters controlling how a forest is fitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_estimators: usize,
    pub seed: u64,
    #[serde(default)]
    pub max_depth: Option<usize>,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: crate::constants::DEFAULT_TREE_COUNT,
            seed: crate::constants::DEFAULT_MODEL_SEED,
            max_depth: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        counts: Vec<u32>,
    },
}

/// A single fitted CART tree stored as a flat node arena. The root is node 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
}

/// Borrowed training data and fitting limits shared by every node of a tree.
struct FitContext<'a> {
    rows: &'a [Vec<f64>],
    labels: &'a [usize],
    n_classes: usize,
    n_features: usize,
    max_features: usize,
    max_depth: Option<usize>,
}

struct Split {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

impl DecisionTree {
    fn fit(ctx: &FitContext<'_>, samples: Vec<usize>, rng: &mut ChaCha8Rng) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        tree.grow(ctx, samples, 0, rng);
        tree
    }

    fn grow(
        &mut self,
        ctx: &FitContext<'_>,
        samples: Vec<usize>,
        depth: usize,
        rng: &mut ChaCha8Rng,
    ) -> usize {
        let counts = class_counts(ctx.labels, &samples, ctx.n_classes);
        let index = self.nodes.len();

        let pure = counts.iter().filter(|&&c| c > 0).count() <= 1;
        let depth_reached = ctx.max_depth.is_some_and(|max| depth >= max);
        if pure || samples.len() < 2 || depth_reached {
            self.nodes.push(Node::Leaf { counts });
            return index;
        }

        let Some(split) = best_split(ctx, &samples, &counts, rng) else {
            self.nodes.push(Node::Leaf { counts });
            return index;
        };

        // Reserve the slot so children are numbered after their parent.
        self.nodes.push(Node::Leaf { counts: Vec::new() });

        let (left_samples, right_samples): (Vec<usize>, Vec<usize>) = samples
            .into_iter()
            .partition(|&s| ctx.rows[s][split.feature] <= split.threshold);

        let left = self.grow(ctx, left_samples, depth + 1, rng);
        let right = self.grow(ctx, right_samples, depth + 1, rng);

        self.nodes[index] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        index
    }

    /// Class counts of the leaf reached by `features`.
    ///
    /// Features beyond the end of the slice read as 0.0.
    fn leaf_counts(&self, features: &[f64]) -> &[u32] {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                Node::Leaf { counts } => return counts,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let value = features.get(*feature).copied().unwrap_or(0.0);
                    index = if value <= *threshold { *left } else { *right };
                }
            }
        }
    }

    /// Number of nodes in the tree.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn is_well_formed(&self, n_classes: usize) -> bool {
        !self.nodes.is_empty()
            && self.nodes.iter().enumerate().all(|(i, node)| match node {
                Node::Leaf { counts } => {
                    counts.len() == n_classes
                        && counts
                            .iter()
                            .try_fold(0u32, |acc, &c| acc.checked_add(c))
                            .is_some_and(|total| total > 0)
                }
                Node::Split { left, right, .. } => {
                    *left > i && *right > i && *left < self.nodes.len() && *right < self.nodes.len()
                }
            })
    }
}

fn class_counts(labels: &[usize], samples: &[usize], n_classes: usize) -> Vec<u32> {
    let mut counts = vec![0u32; n_classes];
    for &s in samples {
        counts[labels[s]] += 1;
    }
    counts
}

fn gini(counts: &[u32], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = f64::from(c) / total;
            p * p
        })
        .sum::<f64>()
}

fn best_split(
    ctx: &FitContext<'_>,
    samples: &[usize],
    parent_counts: &[u32],
    rng: &mut ChaCha8Rng,
) -> Option<Split> {
    let parent_impurity = gini(parent_counts, samples.len());

    let mut order: Vec<usize> = (0..ctx.n_features).collect();
    order.shuffle(rng);

    let mut best: Option<Split> = None;
    let mut informative = 0;

    for feature in order {
        if informative >= ctx.max_features {
            break;
        }

        let mut values: Vec<f64> = samples.iter().map(|&s| ctx.rows[s][feature]).collect();
        values.sort_by(f64::total_cmp);
        values.dedup();
        // Constant features do not count towards the sample size.
        if values.len() < 2 {
            continue;
        }
        informative += 1;

        for pair in values.windows(2) {
            let threshold = (pair[0] + pair[1]) / 2.0;
            let mut left = vec![0u32; ctx.n_classes];
            let mut right = vec![0u32; ctx.n_classes];
            let mut n_left = 0usize;
            for &s in samples {
                if ctx.rows[s][feature] <= threshold {
                    left[ctx.labels[s]] += 1;
                    n_left += 1;
                } else {
                    right[ctx.labels[s]] += 1;
                }
            }
            let n_right = samples.len() - n_left;
            let impurity = (n_left as f64 * gini(&left, n_left)
                + n_right as f64 * gini(&right, n_right))
                / samples.len() as f64;

            if best.as_ref().map_or(true, |b| impurity < b.impurity) {
                best = Some(Split {
                    feature,
                    threshold,
                    impurity,
                });
            }
        }
    }

    best.filter(|b| parent_impurity - b.impurity > MIN_IMPURITY_DECREASE)
}

/// A fitted random forest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    params: ForestParams,
    n_features: usize,
    n_classes: usize,
    trees: Vec<DecisionTree>,
}

impl RandomForest {
    /// Fits a forest on `rows` (one feature vector per sample) and `labels` (class indices).
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Training` if there are no rows, no trees requested, no classes,
    /// rows of differing width, a label/row count mismatch, or a label outside `0..n_classes`.
    pub fn fit(
        rows: &[Vec<f64>],
        labels: &[usize],
        n_classes: usize,
        params: ForestParams,
    ) -> CoreResult<Self> {
        if rows.is_empty() {
            return Err(CoreError::Training("no training rows".into()));
        }
        if params.n_estimators == 0 {
            return Err(CoreError::Training("n_estimators must be at least 1".into()));
        }
        if n_classes == 0 {
            return Err(CoreError::Training("no classes".into()));
        }
        if rows.len() != labels.len() {
            return Err(CoreError::Training(format!(
                "{} rows but {} labels",
                rows.len(),
                labels.len()
            )));
        }
        let n_features = rows[0].len();
        if n_features == 0 || rows.iter().any(|r| r.len() != n_features) {
            return Err(CoreError::Training(
                "rows must share the same non-zero width".into(),
            ));
        }
        if let Some(bad) = labels.iter().find(|&&l| l >= n_classes) {
            return Err(CoreError::Training(format!(
                "label {bad} out of range for {n_classes} classes"
            )));
        }

        let ctx = FitContext {
            rows,
            labels,
            n_classes,
            n_features,
            max_features: ((n_features as f64).sqrt().floor() as usize).max(1),
            max_depth: params.max_depth,
        };

        let mut rng = ChaCha8Rng::seed_from_u64(params.seed);
        let n_rows = rows.len();
        let trees = (0..params.n_estimators)
            .map(|_| {
                let bootstrap: Vec<usize> = (0..n_rows).map(|_| rng.gen_range(0..n_rows)).collect();
                DecisionTree::fit(&ctx, bootstrap, &mut rng)
            })
            .collect();

        Ok(Self {
            params,
            n_features,
            n_classes,
            trees,
        })
    }

    /// Mean class probabilities over all trees.
    pub fn predict_proba(&self, features: &[f64]) -> Vec<f64> {
        let mut proba = vec![0.0; self.n_classes];
        for tree in &self.trees {
            let counts = tree.leaf_counts(features);
            let total: u64 = counts.iter().map(|&c| u64::from(c)).sum();
            if total == 0 {
                continue;
            }
            for (p, &c) in proba.iter_mut().zip(counts) {
                *p += f64::from(c) / total as f64;
            }
        }
        let n_trees = self.trees.len() as f64;
        for p in &mut proba {
            *p /= n_trees;
        }
        proba
    }

    /// Index and probability of the most likely class. Ties go to the lowest index.
    pub fn predict(&self, features: &[f64]) -> (usize, f64) {
        let proba = self.predict_proba(features);
        let mut best = (0, proba.first().copied().unwrap_or(0.0));
        for (index, &p) in proba.iter().enumerate().skip(1) {
            if p > best.1 {
                best = (index, p);
            }
        }
        best
    }

    pub fn params(&self) -> ForestParams {
        self.params
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }

    /// Structural sanity check for forests read back from storage.
    pub fn is_well_formed(&self) -> bool {
        !self.trees.is_empty()
            && self.n_classes > 0
            && self.trees.iter().all(|t| t.is_well_formed(self.n_classes))
    }
}
