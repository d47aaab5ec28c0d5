//! Split, scale, fit, evaluate
//!
//! Runs the whole experiment for one dataset and collects the results into
//! an [`EvaluationReport`].

use burn::data::dataset::Dataset;
use burn::tensor::backend::Backend;
use serde::Serialize;
use std::fmt;

use crate::data::GameDataset;
use crate::features::StandardScaler;
use crate::model::{KnnClassifier, KnnConfig};
use crate::training::metrics::{
    accuracy_score, roc_auc_score, ClassificationReport, ConfusionMatrix,
};
use crate::training::split::TrainTestSplit;
use crate::{Config, Result, SplitConfig};

/// Everything printed at the end of a run
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    pub k: usize,
    pub n_train: usize,
    pub n_test: usize,
    pub feature_names: Vec<String>,
    pub accuracy: f64,
    pub roc_auc: f64,
    pub confusion_matrix: ConfusionMatrix,
    pub classification_report: ClassificationReport,
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "k = {}", self.k)?;
        writeln!(f, "Accuracy: {:?}", self.accuracy)?;
        writeln!(f, "ROC AUC: {:?}", self.roc_auc)?;
        writeln!(f, "Confusion Matrix:\n {}", self.confusion_matrix)?;
        write!(f, "Classification Report:\n {}", self.classification_report)
    }
}

/// Train and test partitions after z-scoring
#[derive(Debug, Clone)]
pub struct ScaledPartitions {
    /// Fitted on the training rows only
    pub scaler: StandardScaler,
    pub x_train: Vec<Vec<f32>>,
    pub y_train: Vec<usize>,
    pub x_test: Vec<Vec<f32>>,
    pub y_test: Vec<usize>,
}

impl ScaledPartitions {
    pub fn from_split(split: &TrainTestSplit) -> Result<Self> {
        let (train_rows, y_train) = rows_and_labels(&split.train);
        let (test_rows, y_test) = rows_and_labels(&split.test);

        let (scaler, x_train) = StandardScaler::fit_transform(&train_rows)?;
        let x_test = scaler.transform(&test_rows)?;
        log::debug!("Scaler means: {:?}", scaler.mean);

        Ok(ScaledPartitions {
            scaler,
            x_train,
            y_train,
            x_test,
            y_test,
        })
    }
}

fn rows_and_labels(dataset: &GameDataset) -> (Vec<Vec<f32>>, Vec<usize>) {
    dataset
        .iter()
        .map(|sample| (sample.features, sample.outcome.label()))
        .unzip()
}

/// k-NN experiment on a seeded train/test split
pub struct KnnExperiment<B: Backend> {
    device: B::Device,
    split: SplitConfig,
    knn: KnnConfig,
}

impl<B: Backend> KnnExperiment<B> {
    pub fn new(device: B::Device, split: SplitConfig, knn: KnnConfig) -> Self {
        KnnExperiment { device, split, knn }
    }

    pub fn from_config(device: B::Device, config: &Config) -> Self {
        Self::new(
            device,
            config.split.clone(),
            KnnConfig { k: config.model.k },
        )
    }

    /// Load the winners/losers files named in the config and evaluate them
    pub fn load_and_run(device: B::Device, config: &Config) -> Result<EvaluationReport> {
        let dataset = GameDataset::load(&config.data)?;
        Self::from_config(device, config).run(&dataset)
    }

    pub fn run(&self, dataset: &GameDataset) -> Result<EvaluationReport> {
        let split = TrainTestSplit::from_dataset(dataset, &self.split)?;
        let ScaledPartitions {
            x_train,
            y_train,
            x_test,
            y_test,
            ..
        } = ScaledPartitions::from_split(&split)?;

        let model = KnnClassifier::<B>::fit(&self.device, self.knn, &x_train, &y_train)?;

        let y_pred = model.predict(&x_test)?;
        let y_prob: Vec<f64> = model
            .predict_proba(&x_test)?
            .into_iter()
            .map(|p| p[1])
            .collect();

        let accuracy = accuracy_score(&y_test, &y_pred)?;
        let roc_auc = roc_auc_score(&y_test, &y_prob)?;
        let confusion_matrix = ConfusionMatrix::from_predictions(&y_test, &y_pred)?;
        let classification_report = ClassificationReport::from_confusion(&confusion_matrix);

        log::info!(
            "Evaluated {} test samples: accuracy {:.3}, ROC AUC {:.3}",
            y_test.len(),
            accuracy,
            roc_auc
        );

        Ok(EvaluationReport {
            k: model.k(),
            n_train: model.n_samples(),
            n_test: y_test.len(),
            feature_names: dataset.feature_names().to_vec(),
            accuracy,
            roc_auc,
            confusion_matrix,
            classification_report,
        })
    }
}
