//! Bagged decision-tree ensembles for binary classification and regression.
//!
//! Trees are grown CART-style on bootstrap samples until their leaves are
//! pure or a stopping rule triggers. Classification uses weighted Gini
//! impurity over a random subset of ⌊√d⌋ features per node; regression uses
//! weighted variance over every feature. All randomness comes from a seeded
//! `StdRng`, so a fit is reproducible for a given [`ForestParams::seed`].

use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

const IMPURITY_EPSILON: f64 = 1e-12;

/// Hyper-parameters shared by every forest in the ensemble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_trees: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: None,
            min_samples_split: 2,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ForestError {
    #[error("cannot fit a forest on an empty sample")]
    EmptySample,
    #[error("{rows} feature rows but {targets} targets")]
    LengthMismatch { rows: usize, targets: usize },
    #[error("feature rows must share one width (expected {expected}, found {found})")]
    RaggedRows { expected: usize, found: usize },
    #[error("feature rows have no columns")]
    NoFeatures,
    #[error("classifier targets contain only the {0} class")]
    SingleClass(bool),
    #[error("forest needs at least one tree")]
    NoTrees,
}

/// Class re-weighting applied before bootstrap sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassWeight {
    Uniform,
    /// Each class weighs `n / (2 * n_class)`.
    Balanced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Criterion {
    Gini,
    Variance,
}

#[derive(Debug, Clone, Copy)]
enum FeatureSubset {
    Sqrt,
    All,
}

impl FeatureSubset {
    fn size(self, n_features: usize) -> usize {
        match self {
            Self::Sqrt => ((n_features as f64).sqrt().floor() as usize).clamp(1, n_features),
            Self::All => n_features,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    fn predict(&self, row: &[f64]) -> f64 {
        let mut node = self;
        loop {
            match node {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if row[*feature] <= *threshold {
                        left
                    } else {
                        right
                    };
                }
            }
        }
    }
}

/// Running weighted sums for one side of a candidate split.
#[derive(Debug, Clone, Copy, Default)]
struct SideStats {
    weight: f64,
    weighted_sum: f64,
    weighted_sq_sum: f64,
}

impl SideStats {
    fn add(&mut self, weight: f64, target: f64) {
        self.weight += weight;
        self.weighted_sum += weight * target;
        self.weighted_sq_sum += weight * target * target;
    }

    fn remove(&mut self, weight: f64, target: f64) {
        self.weight -= weight;
        self.weighted_sum -= weight * target;
        self.weighted_sq_sum -= weight * target * target;
    }

    fn mean(&self) -> f64 {
        if self.weight <= 0.0 {
            0.0
        } else {
            self.weighted_sum / self.weight
        }
    }

    fn impurity(&self, criterion: Criterion) -> f64 {
        if self.weight <= 0.0 {
            return 0.0;
        }
        let mean = self.mean();
        match criterion {
            // Targets are 0/1, so `mean` is the positive-class share.
            Criterion::Gini => 2.0 * mean * (1.0 - mean),
            Criterion::Variance => (self.weighted_sq_sum / self.weight - mean * mean).max(0.0),
        }
    }
}

struct Sample<'a> {
    rows: &'a [Vec<f64>],
    targets: &'a [f64],
    weights: Vec<f64>,
}

struct TreeBuilder<'a> {
    criterion: Criterion,
    subset: FeatureSubset,
    params: &'a ForestParams,
    n_features: usize,
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    decrease: f64,
}

impl TreeBuilder<'_> {
    fn grow(&self, data: &Sample<'_>, indices: Vec<usize>, depth: usize, rng: &mut StdRng) -> Node {
        let mut stats = SideStats::default();
        for &index in &indices {
            stats.add(data.weights[index], data.targets[index]);
        }
        let leaf = Node::Leaf {
            value: stats.mean(),
        };

        let depth_exhausted = self.params.max_depth.is_some_and(|max| depth >= max);
        if depth_exhausted
            || indices.len() < self.params.min_samples_split.max(2)
            || stats.impurity(self.criterion) <= IMPURITY_EPSILON
        {
            return leaf;
        }

        let Some(best) = self.best_split(data, &indices, &stats, rng) else {
            return leaf;
        };

        let (left, right): (Vec<usize>, Vec<usize>) = indices
            .into_iter()
            .partition(|&index| data.rows[index][best.feature] <= best.threshold);

        Node::Split {
            feature: best.feature,
            threshold: best.threshold,
            left: Box::new(self.grow(data, left, depth + 1, rng)),
            right: Box::new(self.grow(data, right, depth + 1, rng)),
        }
    }

    fn best_split(
        &self,
        data: &Sample<'_>,
        indices: &[usize],
        parent: &SideStats,
        rng: &mut StdRng,
    ) -> Option<BestSplit> {
        let parent_impurity = parent.impurity(self.criterion);
        let candidates = sample(rng, self.n_features, self.subset.size(self.n_features));
        let mut best: Option<BestSplit> = None;
        let mut ordered = indices.to_vec();

        for feature in candidates.iter() {
            ordered.sort_by(|a, b| data.rows[*a][feature].total_cmp(&data.rows[*b][feature]));

            let mut left = SideStats::default();
            let mut right = *parent;
            for position in 0..ordered.len() - 1 {
                let index = ordered[position];
                let weight = data.weights[index];
                let target = data.targets[index];
                left.add(weight, target);
                right.remove(weight, target);

                let current = data.rows[index][feature];
                let next = data.rows[ordered[position + 1]][feature];
                if next <= current {
                    continue;
                }

                let children = (left.weight * left.impurity(self.criterion)
                    + right.weight * right.impurity(self.criterion))
                    / parent.weight;
                let decrease = parent_impurity - children;
                if decrease > IMPURITY_EPSILON
                    && best.as_ref().map_or(true, |found| decrease > found.decrease)
                {
                    best = Some(BestSplit {
                        feature,
                        threshold: current + (next - current) / 2.0,
                        decrease,
                    });
                }
            }
        }

        best
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Forest {
    trees: Vec<Node>,
    n_features: usize,
}

impl Forest {
    fn fit(
        rows: &[Vec<f64>],
        targets: &[f64],
        weights: Vec<f64>,
        criterion: Criterion,
        subset: FeatureSubset,
        params: &ForestParams,
    ) -> Result<Self, ForestError> {
        let n_features = validate_shape(rows, targets.len())?;
        if params.n_trees == 0 {
            return Err(ForestError::NoTrees);
        }

        let builder = TreeBuilder {
            criterion,
            subset,
            params,
            n_features,
        };
        let mut seeder = StdRng::seed_from_u64(params.seed);
        let n_rows = rows.len();

        let trees = (0..params.n_trees)
            .map(|_| {
                let mut rng = StdRng::seed_from_u64(seeder.gen());
                let mut counts = vec![0.0; n_rows];
                for _ in 0..n_rows {
                    counts[rng.gen_range(0..n_rows)] += 1.0;
                }
                let bootstrap = Sample {
                    rows,
                    targets,
                    weights: weights
                        .iter()
                        .zip(&counts)
                        .map(|(weight, count)| weight * count)
                        .collect(),
                };
                let drawn = (0..n_rows).filter(|&index| counts[index] > 0.0).collect();
                builder.grow(&bootstrap, drawn, 0, &mut rng)
            })
            .collect();

        Ok(Self { trees, n_features })
    }

    fn predict(&self, row: &[f64]) -> f64 {
        debug_assert_eq!(row.len(), self.n_features);
        let total: f64 = self.trees.iter().map(|tree| tree.predict(row)).sum();
        total / self.trees.len() as f64
    }
}

/// Binary classifier reporting the probability of the positive class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForestClassifier {
    forest: Forest,
}

impl RandomForestClassifier {
    pub fn fit(
        rows: &[Vec<f64>],
        labels: &[bool],
        class_weight: ClassWeight,
        params: &ForestParams,
    ) -> Result<Self, ForestError> {
        validate_shape(rows, labels.len())?;
        let positives = labels.iter().filter(|label| **label).count();
        if positives == 0 {
            return Err(ForestError::SingleClass(false));
        }
        if positives == labels.len() {
            return Err(ForestError::SingleClass(true));
        }

        let weights = match class_weight {
            ClassWeight::Uniform => vec![1.0; labels.len()],
            ClassWeight::Balanced => {
                let total = labels.len() as f64;
                let positive_weight = total / (2.0 * positives as f64);
                let negative_weight = total / (2.0 * (labels.len() - positives) as f64);
                labels
                    .iter()
                    .map(|label| {
                        if *label {
                            positive_weight
                        } else {
                            negative_weight
                        }
                    })
                    .collect()
            }
        };
        let targets: Vec<f64> = labels.iter().map(|label| f64::from(u8::from(*label))).collect();

        let forest = Forest::fit(
            rows,
            &targets,
            weights,
            Criterion::Gini,
            FeatureSubset::Sqrt,
            params,
        )?;

        Ok(Self { forest })
    }

    pub fn predict_proba(&self, row: &[f64]) -> f64 {
        self.forest.predict(row).clamp(0.0, 1.0)
    }

}

/// Regressor averaging the leaf means of every tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForestRegressor {
    forest: Forest,
}

impl RandomForestRegressor {
    pub fn fit(
        rows: &[Vec<f64>],
        targets: &[f64],
        params: &ForestParams,
    ) -> Result<Self, ForestError> {
        let weights = vec![1.0; targets.len()];
        let forest = Forest::fit(
            rows,
            targets,
            weights,
            Criterion::Variance,
            FeatureSubset::All,
            params,
        )?;

        Ok(Self { forest })
    }

    pub fn predict(&self, row: &[f64]) -> f64 {
        self.forest.predict(row)
    }
}

fn validate_shape(rows: &[Vec<f64>], targets: usize) -> Result<usize, ForestError> {
    if rows.is_empty() {
        return Err(ForestError::EmptySample);
    }
    if rows.len() != targets {
        return Err(ForestError::LengthMismatch {
            rows: rows.len(),
            targets,
        });
    }
    let expected = rows[0].len();
    if expected == 0 {
        return Err(ForestError::NoFeatures);
    }
    if let Some(row) = rows.iter().find(|row| row.len() != expected) {
        return Err(ForestError::RaggedRows {
            expected,
            found: row.len(),
        });
    }
    Ok(expected)
}
