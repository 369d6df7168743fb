//! Seeded random forest of Gini decision trees.
//!
//! Each tree is grown on a bootstrap sample of the rows. At every split a
//! fresh random subset of `max_features` columns is searched (constant
//! columns do not count towards the subset). Trees are grown until their
//! leaves are pure unless `max_depth` stops them. The forest predicts the
//! mean of the trees' leaf probabilities.
//!
//! Fitting only depends on the seed and the data: candidate thresholds are
//! scanned in a stable sort order and the first best split wins.

use anyhow::{Result, ensure};
use linfa::Dataset;
use ndarray::{Array1, ArrayView1, ArrayView2, Axis, Ix1};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// How many columns are searched at each split.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MaxFeatures {
    /// `ceil(sqrt(n_features))`
    Sqrt,
    All,
    Count(usize),
}

impl MaxFeatures {
    fn resolve(self, n_features: usize) -> usize {
        let n = match self {
            MaxFeatures::Sqrt => (n_features as f64).sqrt().ceil() as usize,
            MaxFeatures::All => n_features,
            MaxFeatures::Count(n) => n,
        };
        n.clamp(1, n_features)
    }
}

/// Hyperparameters for [`RandomForest::fit`].
#[derive(Debug, Clone)]
pub struct ForestParams {
    pub n_trees: usize,
    pub seed: u64,
    pub max_features: MaxFeatures,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            seed: 42,
            max_features: MaxFeatures::Sqrt,
            max_depth: None,
            min_samples_split: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum Node {
    Leaf {
        /// Share of class `1` among the training rows that reached this leaf.
        positive: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    fn predict(&self, row: ArrayView1<f64>) -> f64 {
        let mut node = self;
        loop {
            match node {
                Node::Leaf { positive } => return *positive,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if row[*feature] <= *threshold {
                        left.as_ref()
                    } else {
                        right.as_ref()
                    };
                }
            }
        }
    }
}

fn gini(positive: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let p = positive as f64 / total as f64;
    1.0 - p * p - (1.0 - p) * (1.0 - p)
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

struct TreeBuilder<'a> {
    records: ArrayView2<'a, f64>,
    targets: ArrayView1<'a, usize>,
    params: &'a ForestParams,
    n_candidates: usize,
}

impl TreeBuilder<'_> {
    fn grow(&self, rows: Vec<usize>, depth: usize, rng: &mut StdRng) -> Node {
        let total = rows.len();
        let positive = rows.iter().filter(|&&r| self.targets[r] == 1).count();
        let leaf = Node::Leaf {
            positive: positive as f64 / total as f64,
        };

        let pure = positive == 0 || positive == total;
        let too_deep = self.params.max_depth.is_some_and(|max| depth >= max);
        if pure || too_deep || total < self.params.min_samples_split {
            return leaf;
        }

        let Some(best) = self.best_split(&rows, rng) else {
            return leaf;
        };

        let (left, right): (Vec<usize>, Vec<usize>) = rows
            .into_iter()
            .partition(|&r| self.records[[r, best.feature]] <= best.threshold);

        Node::Split {
            feature: best.feature,
            threshold: best.threshold,
            left: Box::new(self.grow(left, depth + 1, rng)),
            right: Box::new(self.grow(right, depth + 1, rng)),
        }
    }

    fn best_split(&self, rows: &[usize], rng: &mut StdRng) -> Option<BestSplit> {
        let mut features: Vec<usize> = (0..self.records.ncols()).collect();
        features.shuffle(rng);

        let total_positive = rows.iter().filter(|&&r| self.targets[r] == 1).count();
        let mut best: Option<BestSplit> = None;
        let mut searched = 0;
        let mut sorted = rows.to_vec();

        for feature in features {
            if searched == self.n_candidates {
                break;
            }
            let column = self.records.column(feature);
            sorted.sort_by(|&a, &b| column[a].total_cmp(&column[b]));
            if column[sorted[0]] == column[sorted[sorted.len() - 1]] {
                continue;
            }
            searched += 1;

            let mut left_positive = 0;
            for i in 0..sorted.len() - 1 {
                left_positive += usize::from(self.targets[sorted[i]] == 1);
                let (here, next) = (column[sorted[i]], column[sorted[i + 1]]);
                if here == next {
                    continue;
                }
                let n_left = i + 1;
                let n_right = sorted.len() - n_left;
                let impurity = n_left as f64 * gini(left_positive, n_left)
                    + n_right as f64 * gini(total_positive - left_positive, n_right);
                if best.as_ref().is_none_or(|b| impurity < b.impurity) {
                    let mid = here + (next - here) / 2.0;
                    best = Some(BestSplit {
                        feature,
                        threshold: if mid < next { mid } else { here },
                        impurity,
                    });
                }
            }
        }
        best
    }
}

/// A fitted binary random forest.
#[derive(Debug, Serialize, Deserialize)]
pub struct RandomForest {
    n_features: usize,
    trees: Vec<Node>,
}

impl RandomForest {
    /// Fits the forest. The same `params.seed` and data always produce the same forest.
    pub fn fit(dataset: &Dataset<f64, usize, Ix1>, params: &ForestParams) -> Result<Self> {
        let records = dataset.records().view();
        let targets = dataset.targets().view();
        let (n_rows, n_features) = records.dim();
        ensure!(n_rows > 0, "cannot fit a forest on an empty dataset");
        ensure!(n_features > 0, "cannot fit a forest without features");
        ensure!(params.n_trees > 0, "forest needs at least one tree");
        ensure!(
            targets.iter().all(|&t| t <= 1),
            "forest expects binary labels 0 and 1"
        );

        let builder = TreeBuilder {
            records,
            targets,
            params,
            n_candidates: params.max_features.resolve(n_features),
        };
        let mut rng = StdRng::seed_from_u64(params.seed);
        let trees = (0..params.n_trees)
            .map(|_| {
                let rows: Vec<usize> = (0..n_rows).map(|_| rng.random_range(0..n_rows)).collect();
                builder.grow(rows, 0, &mut rng)
            })
            .collect();

        Ok(Self { n_features, trees })
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Mean probability of class `1` across the trees, per row.
    pub fn predict_proba(&self, records: ArrayView2<f64>) -> Result<Array1<f64>> {
        ensure!(
            records.ncols() == self.n_features,
            "expected {} features, got {}",
            self.n_features,
            records.ncols()
        );
        let n_trees = self.trees.len() as f64;
        Ok(records
            .axis_iter(Axis(0))
            .map(|row| self.trees.iter().map(|t| t.predict(row)).sum::<f64>() / n_trees)
            .collect())
    }

    /// Class per row; an even split resolves to `0`.
    pub fn predict(&self, records: ArrayView2<f64>) -> Result<Array1<usize>> {
        Ok(self.predict_proba(records)?.mapv(|p| usize::from(p > 0.5)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array2, array};

    fn separable() -> Dataset<f64, usize, Ix1> {
        let x = array![
            [0.0, 10.0, 1.0],
            [1.0, 11.0, 0.0],
            [2.0, 12.0, 1.0],
            [3.0, 13.0, 0.0],
            [10.0, 0.0, 1.0],
            [11.0, 1.0, 0.0],
            [12.0, 2.0, 1.0],
            [13.0, 3.0, 0.0],
        ];
        let y = array![0, 0, 0, 0, 1, 1, 1, 1];
        Dataset::new(x, y)
    }

    #[test]
    fn max_features_resolution() {
        assert_eq!(MaxFeatures::Sqrt.resolve(8), 3);
        assert_eq!(MaxFeatures::Sqrt.resolve(1), 1);
        assert_eq!(MaxFeatures::All.resolve(8), 8);
        assert_eq!(MaxFeatures::Count(20).resolve(8), 8);
        assert_eq!(MaxFeatures::Count(0).resolve(8), 1);
    }

    #[test]
    fn gini_of_pure_and_even_nodes() {
        assert_eq!(gini(0, 4), 0.0);
        assert_eq!(gini(4, 4), 0.0);
        assert_eq!(gini(2, 4), 0.5);
    }

    #[test]
    fn fits_requested_number_of_trees() {
        let params = ForestParams {
            n_trees: 7,
            ..ForestParams::default()
        };
        let forest = RandomForest::fit(&separable(), &params).unwrap();
        assert_eq!(forest.n_trees(), 7);
    }

    #[test]
    fn separates_obvious_clusters() {
        let forest = RandomForest::fit(&separable(), &ForestParams::default()).unwrap();
        let probe = array![[0.5, 10.5, 0.0], [12.5, 1.5, 1.0]];
        let predicted = forest.predict(probe.view()).unwrap();
        assert_eq!(predicted, array![0, 1]);
    }

    #[test]
    fn single_informative_column_is_found_by_every_tree() {
        // Only column 5 carries the label; the rest are constant.
        let mut x = Array2::<f64>::ones((20, 8));
        let y: Array1<usize> = (0..20).map(|i| usize::from(i >= 10)).collect();
        for i in 0..20 {
            x[[i, 5]] = i as f64;
        }
        let forest = RandomForest::fit(&Dataset::new(x, y), &ForestParams::default()).unwrap();

        let mut fake = Array2::<f64>::ones((1, 8));
        fake[[0, 5]] = 18.0;
        assert_eq!(forest.predict_proba(fake.view()).unwrap()[0], 1.0);
    }

    #[test]
    fn same_seed_same_forest() {
        let params = ForestParams::default();
        let a = RandomForest::fit(&separable(), &params).unwrap();
        let b = RandomForest::fit(&separable(), &params).unwrap();
        assert_eq!(a.trees, b.trees);
    }

    #[test]
    fn max_depth_zero_gives_prior() {
        let params = ForestParams {
            n_trees: 1,
            max_depth: Some(0),
            ..ForestParams::default()
        };
        let forest = RandomForest::fit(&separable(), &params).unwrap();
        assert!(matches!(forest.trees[0], Node::Leaf { .. }));
    }

    #[test]
    fn rejects_wrong_width() {
        let forest = RandomForest::fit(&separable(), &ForestParams::default()).unwrap();
        let probe = array![[1.0, 2.0]];
        assert!(forest.predict_proba(probe.view()).is_err());
    }

    #[test]
    fn rejects_non_binary_labels() {
        let ds = Dataset::new(array![[1.0], [2.0]], array![0, 2]);
        assert!(RandomForest::fit(&ds, &ForestParams::default()).is_err());
    }

    #[test]
    fn empty_dataset_is_an_error() {
        let ds = Dataset::new(Array2::<f64>::zeros((0, 3)), Array1::<usize>::zeros(0));
        assert!(RandomForest::fit(&ds, &ForestParams::default()).is_err());
    }
}
