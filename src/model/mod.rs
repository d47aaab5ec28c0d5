//! Classification models

pub mod knn;

pub use knn::{KnnClassifier, KnnConfig, Neighbor};
