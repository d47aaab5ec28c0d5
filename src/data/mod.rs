//! Data ingestion
//!
//! CSV loading for winner/loser team statistics and the labeled game dataset.

pub mod dataset;
pub mod loader;

pub use dataset::{GameDataset, GameSample};
pub use loader::TeamStatsTable;
