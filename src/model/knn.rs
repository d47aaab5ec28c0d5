//! k-nearest-neighbors classifier
//!
//! Lazy learner: fitting stores the training points as a tensor, and every
//! query computes Euclidean distances against all of them.

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use crate::{CloseGamesError, Result};

/// Number of classes the classifier votes over
pub const N_CLASSES: usize = 2;

/// Classifier configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnnConfig {
    /// Neighbors consulted per query
    pub k: usize,
}

impl Default for KnnConfig {
    fn default() -> Self {
        KnnConfig { k: 3 }
    }
}

/// A training point returned by a neighbor query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Row index into the training set
    pub index: usize,
    pub distance: f32,
    pub label: usize,
}

/// Fitted k-NN model: memorized training points and their labels
#[derive(Debug, Clone)]
pub struct KnnClassifier<B: Backend> {
    config: KnnConfig,
    /// Training points: [n_train, n_features]
    points: Tensor<B, 2>,
    labels: Vec<usize>,
    n_features: usize,
}

impl<B: Backend> KnnClassifier<B> {
    /// Store the training set. Requires 1 <= k <= n_train and labels in {0, 1}.
    pub fn fit(
        device: &B::Device,
        config: KnnConfig,
        rows: &[Vec<f32>],
        labels: &[usize],
    ) -> Result<Self> {
        if rows.len() != labels.len() {
            return Err(CloseGamesError::ShapeMismatch(format!(
                "{} training rows but {} labels",
                rows.len(),
                labels.len()
            )));
        }
        if config.k == 0 {
            return Err(CloseGamesError::InvalidModel(
                "k must be at least 1".to_string(),
            ));
        }
        if config.k > rows.len() {
            return Err(CloseGamesError::InvalidModel(format!(
                "k = {} exceeds the {} training samples",
                config.k,
                rows.len()
            )));
        }
        if let Some(bad) = labels.iter().find(|&&l| l >= N_CLASSES) {
            return Err(CloseGamesError::InvalidModel(format!(
                "label {} is not a binary class",
                bad
            )));
        }

        let n_features = rows[0].len();
        let mut flat = Vec::with_capacity(rows.len() * n_features);
        for (idx, row) in rows.iter().enumerate() {
            if row.len() != n_features {
                return Err(CloseGamesError::ShapeMismatch(format!(
                    "training row {} has {} features, expected {}",
                    idx,
                    row.len(),
                    n_features
                )));
            }
            flat.extend_from_slice(row);
        }

        let points = Tensor::<B, 1>::from_floats(flat.as_slice(), device)
            .reshape([rows.len(), n_features]);

        log::info!(
            "Fitted k-NN (k = {}) on {} samples x {} features",
            config.k,
            rows.len(),
            n_features
        );

        Ok(KnnClassifier {
            config,
            points,
            labels: labels.to_vec(),
            n_features,
        })
    }

    pub fn k(&self) -> usize {
        self.config.k
    }

    pub fn n_samples(&self) -> usize {
        self.labels.len()
    }

    /// Squared Euclidean distance from `query` to every training point
    fn squared_distances(&self, query: &[f32]) -> Result<Vec<f32>> {
        if query.len() != self.n_features {
            return Err(CloseGamesError::ShapeMismatch(format!(
                "query has {} features, model was fitted on {}",
                query.len(),
                self.n_features
            )));
        }

        let device = self.points.device();
        let query = Tensor::<B, 1>::from_floats(query, &device).unsqueeze_dim::<2>(0);

        // [n, d] - [1, d] broadcasts over training rows
        let diff = self.points.clone() - query;
        let dist = (diff.clone() * diff).sum_dim(1);

        let data = dist.into_data();
        let values = data
            .as_slice::<f32>()
            .map_err(|e| CloseGamesError::Tensor(format!("{:?}", e)))?;
        Ok(values.to_vec())
    }

    /// The k closest training points for each query row, nearest first.
    ///
    /// Equal distances are ordered by training row index.
    pub fn kneighbors(&self, queries: &[Vec<f32>]) -> Result<Vec<Vec<Neighbor>>> {
        queries
            .iter()
            .map(|query| {
                let distances = self.squared_distances(query)?;
                let mut order: Vec<usize> = (0..distances.len()).collect();
                // Stable sort keeps lower indices first among ties
                order.sort_by(|&a, &b| {
                    distances[a]
                        .partial_cmp(&distances[b])
                        .unwrap_or(std::cmp::Ordering::Equal)
                });
                Ok(order
                    .into_iter()
                    .take(self.config.k)
                    .map(|index| Neighbor {
                        index,
                        distance: distances[index].max(0.0).sqrt(),
                        label: self.labels[index],
                    })
                    .collect())
            })
            .collect()
    }

    /// Per-class vote fractions `[P(0), P(1)]` for each query row
    pub fn predict_proba(&self, queries: &[Vec<f32>]) -> Result<Vec<[f64; N_CLASSES]>> {
        let k = self.config.k as f64;
        Ok(self
            .kneighbors(queries)?
            .into_iter()
            .map(|neighbors| {
                let mut votes = [0usize; N_CLASSES];
                for n in &neighbors {
                    votes[n.label] += 1;
                }
                [votes[0] as f64 / k, votes[1] as f64 / k]
            })
            .collect())
    }

    /// Majority-vote label per query row; a tied vote goes to class 0
    pub fn predict(&self, queries: &[Vec<f32>]) -> Result<Vec<usize>> {
        Ok(self
            .predict_proba(queries)?
            .into_iter()
            .map(|p| if p[1] > p[0] { 1 } else { 0 })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    fn line_model(k: usize) -> KnnClassifier<TestBackend> {
        let device = Default::default();
        // Class 0 on the left, class 1 on the right of the x axis
        let rows = vec![
            vec![0.0, 0.0],
            vec![1.0, 0.0],
            vec![2.0, 0.0],
            vec![10.0, 0.0],
            vec![11.0, 0.0],
            vec![12.0, 0.0],
        ];
        let labels = vec![0, 0, 0, 1, 1, 1];
        KnnClassifier::fit(&device, KnnConfig { k }, &rows, &labels).unwrap()
    }

    #[test]
    fn test_kneighbors_order_and_distances() {
        let model = line_model(3);
        let neighbors = model.kneighbors(&[vec![1.2, 0.0]]).unwrap();

        let indices: Vec<usize> = neighbors[0].iter().map(|n| n.index).collect();
        assert_eq!(indices, vec![1, 2, 0]);
        assert!((neighbors[0][0].distance - 0.2).abs() < 1e-5);
        assert!((neighbors[0][2].distance - 1.2).abs() < 1e-5);
    }

    #[test]
    fn test_distance_ties_prefer_lower_index() {
        let model = line_model(1);
        // Exactly between rows 2 and 3
        let neighbors = model.kneighbors(&[vec![6.0, 0.0]]).unwrap();
        assert_eq!(neighbors[0][0].index, 2);
    }

    #[test]
    fn test_predict_and_proba() {
        let model = line_model(3);
        let queries = vec![vec![0.5, 0.0], vec![11.5, 1.0], vec![7.0, 0.0]];

        let proba = model.predict_proba(&queries).unwrap();
        assert_eq!(proba[0], [1.0, 0.0]);
        assert_eq!(proba[1], [0.0, 1.0]);
        // x=7: rows 10 and 11, then row 2 wins its tie with row 12
        assert!((proba[2][1] - 2.0 / 3.0).abs() < 1e-12);

        assert_eq!(model.predict(&queries).unwrap(), vec![0, 1, 1]);
    }

    #[test]
    fn test_even_vote_goes_to_class_zero() {
        let model = line_model(2);
        // Neighbors are row 2 (class 0) and row 3 (class 1)
        let preds = model.predict(&[vec![6.0, 0.0]]).unwrap();
        assert_eq!(preds, vec![0]);
    }

    #[test]
    fn test_fit_validation() {
        let device = Default::default();
        let rows = vec![vec![0.0], vec![1.0]];

        let too_many =
            KnnClassifier::<TestBackend>::fit(&device, KnnConfig { k: 3 }, &rows, &[0, 1]);
        assert!(matches!(too_many, Err(CloseGamesError::InvalidModel(_))));

        let zero = KnnClassifier::<TestBackend>::fit(&device, KnnConfig { k: 0 }, &rows, &[0, 1]);
        assert!(zero.is_err());

        let mismatched =
            KnnClassifier::<TestBackend>::fit(&device, KnnConfig::default(), &rows, &[0]);
        assert!(mismatched.is_err());

        let bad_label =
            KnnClassifier::<TestBackend>::fit(&device, KnnConfig { k: 1 }, &rows, &[0, 2]);
        assert!(bad_label.is_err());
    }

    #[test]
    fn test_query_width_mismatch() {
        let model = line_model(3);
        assert!(model.predict(&[vec![1.0]]).is_err());
    }
}
