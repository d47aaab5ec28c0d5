//! Close-game outcome classification with k-nearest-neighbors
//!
//! Loads winner/loser team statistics for historically close games, builds a
//! labeled feature matrix, and evaluates a k-NN classifier on a seeded
//! train/test split.

pub mod data;
pub mod features;
pub mod model;
pub mod training;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Class label for a game row: which side team A ended up on
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Loss,
    Win,
}

impl Outcome {
    /// Numeric label used by the classifier (0 = loss, 1 = win)
    pub fn label(self) -> usize {
        match self {
            Outcome::Loss => 0,
            Outcome::Win => 1,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// How each game is turned into labeled rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// One row per game; team A is the winner on even games, the loser on odd ones
    Alternate,
    /// Two rows per game, one from each side
    Mirrored,
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Orientation::Alternate => write!(f, "alternate"),
            Orientation::Mirrored => write!(f, "mirrored"),
        }
    }
}

/// How the two teams' statistics are merged into one feature row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureEncoding {
    /// stats(A) - stats(B)
    Difference,
    /// stats(A) followed by stats(B)
    Concatenate,
}

impl fmt::Display for FeatureEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureEncoding::Difference => write!(f, "difference"),
            FeatureEncoding::Concatenate => write!(f, "concatenate"),
        }
    }
}

/// Application-wide errors
#[derive(Debug, Error)]
pub enum CloseGamesError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Column '{column}' not found in {file}")]
    MissingColumn { file: String, column: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("Invalid split: {0}")]
    InvalidSplit(String),

    #[error("Invalid model: {0}")]
    InvalidModel(String),

    #[error("Metric error: {0}")]
    Metric(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Tensor error: {0}")]
    Tensor(String),
}

pub type Result<T> = std::result::Result<T, CloseGamesError>;

/// Application configuration loaded from config.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub data: DataConfig,
    pub split: SplitConfig,
    pub model: ModelConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    pub data_dir: String,
    pub winners_file: String,
    pub losers_file: String,
    /// Empty means every column shared by both files (minus the join key)
    #[serde(default)]
    pub feature_columns: Vec<String>,
    #[serde(default)]
    pub join_key: Option<String>,
    pub orientation: Orientation,
    pub encoding: FeatureEncoding,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitConfig {
    pub test_size: f64,
    pub seed: u64,
    #[serde(default)]
    pub stratify: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub k: usize,
}

impl DataConfig {
    pub fn winners_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join(&self.winners_file)
    }

    pub fn losers_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join(&self.losers_file)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data: DataConfig {
                data_dir: "CSV and Excel Files for Python Scripts/NewDataFiles/".to_string(),
                winners_file: "past_seasons_close_games_team_stats_winners.csv".to_string(),
                losers_file: "past_seasons_close_games_team_stats_losers.csv".to_string(),
                feature_columns: Vec::new(),
                join_key: None,
                orientation: Orientation::Alternate,
                encoding: FeatureEncoding::Difference,
            },
            split: SplitConfig {
                test_size: 0.2,
                seed: 216,
                // Unstratified unless asked for
                stratify: false,
            },
            model: ModelConfig { k: 3 },
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CloseGamesError::Config(format!("Failed to read config file {}: {}", path, e))
        })?;
        toml::from_str(&content)
            .map_err(|e| CloseGamesError::Config(format!("Failed to parse config: {}", e)))
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| CloseGamesError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
