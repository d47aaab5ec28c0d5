//! Model training and evaluation
//!
//! Seeded train/test splitting, metrics, and the end-to-end k-NN experiment.

pub mod metrics;
pub mod pipeline;
pub mod split;

pub use metrics::{ClassificationReport, ConfusionMatrix};
pub use pipeline::{EvaluationReport, KnnExperiment, ScaledPartitions};
pub use split::TrainTestSplit;
