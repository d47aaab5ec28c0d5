//! Seeded random train/test splits

use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::data::GameDataset;
use crate::{CloseGamesError, Result, SplitConfig};

/// Train and test partitions of a dataset
#[derive(Debug, Clone)]
pub struct TrainTestSplit {
    pub train: GameDataset,
    pub test: GameDataset,
    /// Row indices into the source dataset, in partition order
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
}

impl TrainTestSplit {
    /// Shuffle with a fixed seed and cut off `ceil(test_size * n)` test rows
    pub fn from_dataset(dataset: &GameDataset, config: &SplitConfig) -> Result<Self> {
        let n = dataset.len();
        let n_test = test_count(n, config.test_size)?;

        let mut rng = rand::rngs::StdRng::seed_from_u64(config.seed);
        let (train_indices, test_indices) = if config.stratify {
            stratified_indices(&dataset.labels(), n_test, &mut rng)?
        } else {
            let mut indices: Vec<usize> = (0..n).collect();
            indices.shuffle(&mut rng);
            let test = indices[..n_test].to_vec();
            let train = indices[n_test..].to_vec();
            (train, test)
        };

        log::info!(
            "Split {} samples: train={}, test={} (seed {}{})",
            n,
            train_indices.len(),
            test_indices.len(),
            config.seed,
            if config.stratify { ", stratified" } else { "" }
        );

        Ok(TrainTestSplit {
            train: dataset.subset(&train_indices)?,
            test: dataset.subset(&test_indices)?,
            train_indices,
            test_indices,
        })
    }
}

/// Number of test rows; both partitions must end up non-empty
fn test_count(n: usize, test_size: f64) -> Result<usize> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(CloseGamesError::InvalidSplit(format!(
            "test_size must be in (0, 1), got {}",
            test_size
        )));
    }

    let n_test = (test_size * n as f64).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(CloseGamesError::InvalidSplit(format!(
            "test_size {} on {} samples leaves an empty partition",
            test_size, n
        )));
    }
    Ok(n_test)
}

/// Per-class shuffles with test slots allotted by largest remainder
fn stratified_indices(
    labels: &[usize],
    n_test: usize,
    rng: &mut rand::rngs::StdRng,
) -> Result<(Vec<usize>, Vec<usize>)> {
    let n = labels.len();
    let n_classes = labels.iter().max().map_or(0, |m| m + 1);

    let mut by_class: Vec<Vec<usize>> = vec![Vec::new(); n_classes];
    for (idx, &label) in labels.iter().enumerate() {
        by_class[label].push(idx);
    }

    let present = by_class.iter().filter(|c| !c.is_empty()).count();
    if present < 2 || by_class.iter().any(|c| c.len() == 1) {
        return Err(CloseGamesError::InvalidSplit(
            "stratified split needs at least two members of every class".to_string(),
        ));
    }

    let exact: Vec<f64> = by_class
        .iter()
        .map(|c| n_test as f64 * c.len() as f64 / n as f64)
        .collect();
    let mut alloc: Vec<usize> = exact.iter().map(|e| e.floor() as usize).collect();

    let mut remaining = n_test - alloc.iter().sum::<usize>();
    let mut by_remainder: Vec<usize> = (0..n_classes).collect();
    by_remainder.sort_by(|&a, &b| {
        let ra = exact[a] - exact[a].floor();
        let rb = exact[b] - exact[b].floor();
        rb.partial_cmp(&ra).unwrap_or(std::cmp::Ordering::Equal)
    });
    for class in by_remainder {
        if remaining == 0 {
            break;
        }
        if alloc[class] < by_class[class].len() {
            alloc[class] += 1;
            remaining -= 1;
        }
    }

    let mut train = Vec::with_capacity(n - n_test);
    let mut test = Vec::with_capacity(n_test);
    for (members, take) in by_class.iter_mut().zip(alloc.iter()) {
        members.shuffle(rng);
        test.extend_from_slice(&members[..*take]);
        train.extend_from_slice(&members[*take..]);
    }

    train.shuffle(rng);
    test.shuffle(rng);
    Ok((train, test))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::GameSample;
    use crate::Outcome;
    use std::collections::HashSet;

    fn dataset(n: usize, wins: usize) -> GameDataset {
        let samples = (0..n)
            .map(|i| GameSample {
                features: vec![i as f32],
                outcome: if i < wins { Outcome::Win } else { Outcome::Loss },
            })
            .collect();
        GameDataset::new(samples, vec!["idx".to_string()]).unwrap()
    }

    fn config(test_size: f64, seed: u64, stratify: bool) -> SplitConfig {
        SplitConfig {
            test_size,
            seed,
            stratify,
        }
    }

    #[test]
    fn test_split_sizes_and_disjoint_cover() {
        let ds = dataset(100, 50);
        let split = TrainTestSplit::from_dataset(&ds, &config(0.2, 216, false)).unwrap();

        assert_eq!(split.test.len(), 20);
        assert_eq!(split.train.len(), 80);

        let train: HashSet<usize> = split.train_indices.iter().copied().collect();
        let test: HashSet<usize> = split.test_indices.iter().copied().collect();
        assert!(train.is_disjoint(&test));
        assert_eq!(train.len() + test.len(), 100);

        // Partition rows line up with the recorded indices
        for (row, &idx) in split.test.samples().iter().zip(split.test_indices.iter()) {
            assert_eq!(row.features[0], idx as f32);
        }
    }

    #[test]
    fn test_split_is_reproducible_for_a_seed() {
        let ds = dataset(57, 30);
        let a = TrainTestSplit::from_dataset(&ds, &config(0.2, 216, false)).unwrap();
        let b = TrainTestSplit::from_dataset(&ds, &config(0.2, 216, false)).unwrap();
        let c = TrainTestSplit::from_dataset(&ds, &config(0.2, 7, false)).unwrap();

        assert_eq!(a.test_indices, b.test_indices);
        assert_eq!(a.train_indices, b.train_indices);
        assert_ne!(a.test_indices, c.test_indices);
    }

    #[test]
    fn test_test_count_rounds_up() {
        assert_eq!(test_count(10, 0.25).unwrap(), 3);
        assert_eq!(test_count(100, 0.2).unwrap(), 20);
        assert!(test_count(10, 0.0).is_err());
        assert!(test_count(10, 1.0).is_err());
        assert!(test_count(1, 0.2).is_err());
    }

    #[test]
    fn test_stratified_keeps_class_ratio() {
        let ds = dataset(100, 30);
        let split = TrainTestSplit::from_dataset(&ds, &config(0.2, 216, true)).unwrap();

        assert_eq!(split.test.len(), 20);
        assert_eq!(split.test.class_counts(), [14, 6]);
        assert_eq!(split.train.class_counts(), [56, 24]);
    }

    #[test]
    fn test_stratified_rejects_singleton_class() {
        let ds = dataset(10, 1);
        assert!(TrainTestSplit::from_dataset(&ds, &config(0.2, 216, true)).is_err());
    }
}
