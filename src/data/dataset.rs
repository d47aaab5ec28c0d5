//! Burn Dataset implementation for close-game rows
//!
//! Pairs each winner record with its loser record and turns the pair into a
//! labeled feature row from team A's point of view.

use crate::data::loader::{self, TeamStatsTable};
use crate::{CloseGamesError, DataConfig, FeatureEncoding, Orientation, Outcome, Result};
use burn::data::dataset::Dataset;
use std::collections::HashMap;

/// One labeled game row
#[derive(Debug, Clone, PartialEq)]
pub struct GameSample {
    /// Merged statistics for team A and team B
    pub features: Vec<f32>,
    /// Target: did team A win?
    pub outcome: Outcome,
}

/// Feature matrix and labels for the whole experiment
#[derive(Debug, Clone)]
pub struct GameDataset {
    samples: Vec<GameSample>,
    feature_names: Vec<String>,
}

impl GameDataset {
    /// Build from pre-computed samples; every row must match the column count
    pub fn new(samples: Vec<GameSample>, feature_names: Vec<String>) -> Result<Self> {
        if let Some((idx, bad)) = samples
            .iter()
            .enumerate()
            .find(|(_, s)| s.features.len() != feature_names.len())
        {
            return Err(CloseGamesError::ShapeMismatch(format!(
                "row {} has {} features, expected {}",
                idx,
                bad.features.len(),
                feature_names.len()
            )));
        }
        Ok(GameDataset {
            samples,
            feature_names,
        })
    }

    /// Load winners and losers files described by the data config
    pub fn load(config: &DataConfig) -> Result<Self> {
        let winners_path = config.winners_path();
        let losers_path = config.losers_path();
        let join_key = config.join_key.as_deref();

        let columns = loader::resolve_feature_columns(
            &loader::read_headers(&winners_path)?,
            &loader::read_headers(&losers_path)?,
            &config.feature_columns,
            join_key,
        )?;

        let winners = loader::load_team_stats(&winners_path, &columns, join_key)?;
        let losers = loader::load_team_stats(&losers_path, &columns, join_key)?;
        for table in [&winners, &losers] {
            if table.is_empty() {
                return Err(CloseGamesError::Parse(format!("{} has no data rows", table.file)));
            }
        }

        log::info!(
            "Loaded {} winner rows and {} loser rows with {} feature columns",
            winners.len(),
            losers.len(),
            columns.len()
        );

        let dataset =
            Self::from_team_stats(&winners, &losers, config.orientation, config.encoding)?;

        let [losses, wins] = dataset.class_counts();
        log::info!(
            "Built {} samples ({} wins, {} losses) using {} orientation, {} encoding",
            dataset.len(),
            wins,
            losses,
            config.orientation,
            config.encoding
        );

        Ok(dataset)
    }

    /// Merge winner and loser tables into labeled rows
    pub fn from_team_stats(
        winners: &TeamStatsTable,
        losers: &TeamStatsTable,
        orientation: Orientation,
        encoding: FeatureEncoding,
    ) -> Result<Self> {
        if winners.columns != losers.columns {
            return Err(CloseGamesError::ShapeMismatch(format!(
                "{} and {} were loaded with different feature columns",
                winners.file, losers.file
            )));
        }

        let pairs = pair_rows(winners, losers)?;
        let feature_names = encoded_names(&winners.columns, encoding);

        let mut samples = Vec::with_capacity(match orientation {
            Orientation::Alternate => pairs.len(),
            Orientation::Mirrored => pairs.len() * 2,
        });

        for (game_idx, (winner, loser)) in pairs.into_iter().enumerate() {
            match orientation {
                Orientation::Alternate => {
                    if game_idx % 2 == 0 {
                        samples.push(encode(winner, loser, encoding, Outcome::Win));
                    } else {
                        samples.push(encode(loser, winner, encoding, Outcome::Loss));
                    }
                }
                Orientation::Mirrored => {
                    samples.push(encode(winner, loser, encoding, Outcome::Win));
                    samples.push(encode(loser, winner, encoding, Outcome::Loss));
                }
            }
        }

        Self::new(samples, feature_names)
    }

    /// Get the number of samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Check if dataset is empty
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn samples(&self) -> &[GameSample] {
        &self.samples
    }

    /// Numeric labels (0 = loss, 1 = win)
    pub fn labels(&self) -> Vec<usize> {
        self.samples.iter().map(|s| s.outcome.label()).collect()
    }

    /// Sample counts per class, indexed by label
    pub fn class_counts(&self) -> [usize; 2] {
        let mut counts = [0usize; 2];
        for sample in &self.samples {
            counts[sample.outcome.label()] += 1;
        }
        counts
    }

    /// New dataset holding the given rows, in the given order
    pub fn subset(&self, indices: &[usize]) -> Result<Self> {
        let samples = indices
            .iter()
            .map(|&i| {
                self.samples.get(i).cloned().ok_or_else(|| {
                    CloseGamesError::ShapeMismatch(format!(
                        "row index {} out of range for {} samples",
                        i,
                        self.samples.len()
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(GameDataset {
            samples,
            feature_names: self.feature_names.clone(),
        })
    }
}

impl Dataset<GameSample> for GameDataset {
    fn get(&self, index: usize) -> Option<GameSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}

/// Match winner rows to loser rows, by join key when both tables carry one,
/// otherwise by position
fn pair_rows<'a>(
    winners: &'a TeamStatsTable,
    losers: &'a TeamStatsTable,
) -> Result<Vec<(&'a [f64], &'a [f64])>> {
    if winners.len() != losers.len() {
        return Err(CloseGamesError::ShapeMismatch(format!(
            "{} has {} rows but {} has {}",
            winners.file,
            winners.len(),
            losers.file,
            losers.len()
        )));
    }

    match (&winners.keys, &losers.keys) {
        (Some(winner_keys), Some(loser_keys)) => {
            let mut loser_index: HashMap<&str, usize> = HashMap::with_capacity(loser_keys.len());
            for (idx, key) in loser_keys.iter().enumerate() {
                if loser_index.insert(key.as_str(), idx).is_some() {
                    return Err(CloseGamesError::Parse(format!(
                        "duplicate key '{}' in {}",
                        key, losers.file
                    )));
                }
            }

            let mut used = vec![false; losers.len()];
            let mut pairs = Vec::with_capacity(winners.len());
            for (w_idx, key) in winner_keys.iter().enumerate() {
                let l_idx = *loser_index.get(key.as_str()).ok_or_else(|| {
                    CloseGamesError::ShapeMismatch(format!(
                        "key '{}' from {} has no match in {}",
                        key, winners.file, losers.file
                    ))
                })?;
                if used[l_idx] {
                    return Err(CloseGamesError::Parse(format!(
                        "duplicate key '{}' in {}",
                        key, winners.file
                    )));
                }
                used[l_idx] = true;
                pairs.push((winners.rows[w_idx].as_slice(), losers.rows[l_idx].as_slice()));
            }
            Ok(pairs)
        }
        (None, None) => Ok(winners
            .rows
            .iter()
            .zip(losers.rows.iter())
            .map(|(w, l)| (w.as_slice(), l.as_slice()))
            .collect()),
        _ => Err(CloseGamesError::Config(
            "join key must be present in both winners and losers tables".to_string(),
        )),
    }
}

fn encoded_names(columns: &[String], encoding: FeatureEncoding) -> Vec<String> {
    match encoding {
        FeatureEncoding::Difference => columns.to_vec(),
        FeatureEncoding::Concatenate => columns
            .iter()
            .map(|c| format!("a_{}", c))
            .chain(columns.iter().map(|c| format!("b_{}", c)))
            .collect(),
    }
}

fn encode(
    team_a: &[f64],
    team_b: &[f64],
    encoding: FeatureEncoding,
    outcome: Outcome,
) -> GameSample {
    let features = match encoding {
        FeatureEncoding::Difference => team_a
            .iter()
            .zip(team_b.iter())
            .map(|(a, b)| (a - b) as f32)
            .collect(),
        FeatureEncoding::Concatenate => team_a
            .iter()
            .chain(team_b.iter())
            .map(|&v| v as f32)
            .collect(),
    };
    GameSample { features, outcome }
}
