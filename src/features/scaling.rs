//! Z-score standardization of feature rows

use crate::{CloseGamesError, Result};

/// Per-feature mean and scale, fitted from training rows
#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    /// Population standard deviation, or 1.0 for constant features
    pub scale: Vec<f64>,
    pub n_samples_seen: usize,
}

impl StandardScaler {
    /// Compute mean and population std (ddof = 0) per feature
    pub fn fit(rows: &[Vec<f32>]) -> Result<Self> {
        let first = rows.first().ok_or_else(|| {
            CloseGamesError::ShapeMismatch("cannot fit scaler on zero rows".to_string())
        })?;
        let dim = first.len();

        let mut sum = vec![0.0f64; dim];
        for (idx, row) in rows.iter().enumerate() {
            check_width(row, dim, idx)?;
            for (s, &v) in sum.iter_mut().zip(row.iter()) {
                *s += v as f64;
            }
        }

        let n = rows.len() as f64;
        let mean: Vec<f64> = sum.iter().map(|s| s / n).collect();

        // Second pass over centered values keeps the variance stable
        let mut sum_sq = vec![0.0f64; dim];
        for row in rows {
            for ((sq, &v), m) in sum_sq.iter_mut().zip(row.iter()).zip(mean.iter()) {
                let d = v as f64 - m;
                *sq += d * d;
            }
        }

        let scale = sum_sq
            .iter()
            .map(|sq| {
                let std = (sq / n).sqrt();
                if std > f64::EPSILON {
                    std
                } else {
                    1.0
                }
            })
            .collect();

        log::debug!("Fitted scaler on {} rows x {} features", rows.len(), dim);

        Ok(StandardScaler {
            mean,
            scale,
            n_samples_seen: rows.len(),
        })
    }

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    /// Apply (x - mean) / scale to every row
    pub fn transform(&self, rows: &[Vec<f32>]) -> Result<Vec<Vec<f32>>> {
        rows.iter()
            .enumerate()
            .map(|(idx, row)| {
                check_width(row, self.n_features(), idx)?;
                Ok(row
                    .iter()
                    .zip(self.mean.iter().zip(self.scale.iter()))
                    .map(|(&v, (m, s))| ((v as f64 - m) / s) as f32)
                    .collect())
            })
            .collect()
    }

    pub fn fit_transform(rows: &[Vec<f32>]) -> Result<(Self, Vec<Vec<f32>>)> {
        let scaler = Self::fit(rows)?;
        let scaled = scaler.transform(rows)?;
        Ok((scaler, scaled))
    }
}

fn check_width(row: &[f32], expected: usize, idx: usize) -> Result<()> {
    if row.len() != expected {
        return Err(CloseGamesError::ShapeMismatch(format!(
            "row {} has {} features, scaler expects {}",
            idx,
            row.len(),
            expected
        )));
    }
    Ok(())
}
