//! Evaluation metrics for binary classification
//!
//! Labels are `0` (loss) and `1` (win); class 1 is the positive class.

use serde::Serialize;
use std::fmt;

use crate::{CloseGamesError, Result};

fn check_lengths(y_true: &[usize], other: usize, what: &str) -> Result<()> {
    if y_true.len() != other {
        return Err(CloseGamesError::Metric(format!(
            "{} true labels but {} {}",
            y_true.len(),
            other,
            what
        )));
    }
    if y_true.is_empty() {
        return Err(CloseGamesError::Metric("no samples to score".to_string()));
    }
    Ok(())
}

/// Fraction of predictions equal to the true label
pub fn accuracy_score(y_true: &[usize], y_pred: &[usize]) -> Result<f64> {
    check_lengths(y_true, y_pred.len(), "predictions")?;
    let correct = y_true
        .iter()
        .zip(y_pred.iter())
        .filter(|(t, p)| t == p)
        .count();
    Ok(correct as f64 / y_true.len() as f64)
}

/// Area under the ROC curve for positive-class scores.
///
/// Computed as the normalized Mann-Whitney U statistic; tied scores share
/// their average rank. Undefined when only one class is present.
pub fn roc_auc_score(y_true: &[usize], y_score: &[f64]) -> Result<f64> {
    check_lengths(y_true, y_score.len(), "scores")?;

    let n_pos = y_true.iter().filter(|&&y| y == 1).count();
    let n_neg = y_true.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return Err(CloseGamesError::Metric(
            "ROC AUC is undefined when only one class is present in y_true".to_string(),
        ));
    }

    let mut order: Vec<usize> = (0..y_score.len()).collect();
    order.sort_by(|&a, &b| {
        y_score[a]
            .partial_cmp(&y_score[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut pos_rank_sum = 0.0;
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && y_score[order[end]] == y_score[order[start]] {
            end += 1;
        }
        // 1-based ranks start+1 ..= end share their mean
        let avg_rank = (start + 1 + end) as f64 / 2.0;
        let positives = order[start..end].iter().filter(|&&i| y_true[i] == 1).count();
        pos_rank_sum += avg_rank * positives as f64;
        start = end;
    }

    let n_pos = n_pos as f64;
    let n_neg = n_neg as f64;
    Ok((pos_rank_sum - n_pos * (n_pos + 1.0) / 2.0) / (n_pos * n_neg))
}

/// 2x2 confusion matrix: rows are true labels, columns predicted labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConfusionMatrix {
    /// `[[TN, FP], [FN, TP]]`
    pub cells: [[usize; 2]; 2],
}

impl ConfusionMatrix {
    pub fn from_predictions(y_true: &[usize], y_pred: &[usize]) -> Result<Self> {
        check_lengths(y_true, y_pred.len(), "predictions")?;
        let mut cells = [[0usize; 2]; 2];
        for (&t, &p) in y_true.iter().zip(y_pred.iter()) {
            if t > 1 || p > 1 {
                return Err(CloseGamesError::Metric(format!(
                    "non-binary label pair ({}, {})",
                    t, p
                )));
            }
            cells[t][p] += 1;
        }
        Ok(ConfusionMatrix { cells })
    }

    pub fn true_negatives(&self) -> usize {
        self.cells[0][0]
    }

    pub fn false_positives(&self) -> usize {
        self.cells[0][1]
    }

    pub fn false_negatives(&self) -> usize {
        self.cells[1][0]
    }

    pub fn true_positives(&self) -> usize {
        self.cells[1][1]
    }

    pub fn total(&self) -> usize {
        self.cells.iter().flatten().sum()
    }

    /// Samples whose true label is `class`
    pub fn support(&self, class: usize) -> usize {
        self.cells[class].iter().sum()
    }

    /// Samples predicted as `class`
    pub fn predicted(&self, class: usize) -> usize {
        self.cells[0][class] + self.cells[1][class]
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .cells
            .iter()
            .flatten()
            .map(|c| c.to_string().len())
            .max()
            .unwrap_or(1);
        let [[a, b], [c, d]] = self.cells;
        write!(
            f,
            "[[{:>w$} {:>w$}]\n [{:>w$} {:>w$}]]",
            a,
            b,
            c,
            d,
            w = width
        )
    }
}

/// Precision, recall, F1 and support for one class or average
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

fn ratio(num: usize, den: usize) -> f64 {
    // Zero-division yields 0.0
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// Per-class report with accuracy, macro and weighted averages
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationReport {
    /// Indexed by class label
    pub classes: Vec<ClassMetrics>,
    pub accuracy: f64,
    pub macro_avg: ClassMetrics,
    pub weighted_avg: ClassMetrics,
}

impl ClassificationReport {
    pub fn from_confusion(cm: &ConfusionMatrix) -> Self {
        let classes: Vec<ClassMetrics> = (0..2)
            .map(|c| {
                let tp = cm.cells[c][c];
                let precision = ratio(tp, cm.predicted(c));
                let recall = ratio(tp, cm.support(c));
                let f1 = if precision + recall > 0.0 {
                    2.0 * precision * recall / (precision + recall)
                } else {
                    0.0
                };
                ClassMetrics {
                    precision,
                    recall,
                    f1,
                    support: cm.support(c),
                }
            })
            .collect();

        let total = cm.total();
        let n = classes.len() as f64;
        let macro_avg = ClassMetrics {
            precision: classes.iter().map(|m| m.precision).sum::<f64>() / n,
            recall: classes.iter().map(|m| m.recall).sum::<f64>() / n,
            f1: classes.iter().map(|m| m.f1).sum::<f64>() / n,
            support: total,
        };

        let weighted = |get: fn(&ClassMetrics) -> f64| -> f64 {
            if total == 0 {
                0.0
            } else {
                classes
                    .iter()
                    .map(|m| get(m) * m.support as f64)
                    .sum::<f64>()
                    / total as f64
            }
        };
        let weighted_avg = ClassMetrics {
            precision: weighted(|m| m.precision),
            recall: weighted(|m| m.recall),
            f1: weighted(|m| m.f1),
            support: total,
        };

        ClassificationReport {
            accuracy: ratio(cm.true_negatives() + cm.true_positives(), total),
            classes,
            macro_avg,
            weighted_avg,
        }
    }

    pub fn from_predictions(y_true: &[usize], y_pred: &[usize]) -> Result<Self> {
        Ok(Self::from_confusion(&ConfusionMatrix::from_predictions(
            y_true, y_pred,
        )?))
    }

    pub fn total_support(&self) -> usize {
        self.classes.iter().map(|m| m.support).sum()
    }
}

fn write_row(f: &mut fmt::Formatter<'_>, name: &str, m: &ClassMetrics) -> fmt::Result {
    writeln!(
        f,
        "{:>12}  {:>9.2} {:>9.2} {:>9.2} {:>9}",
        name, m.precision, m.recall, m.f1, m.support
    )
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>12}  {:>9} {:>9} {:>9} {:>9}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;

        for (label, m) in self.classes.iter().enumerate() {
            write_row(f, &label.to_string(), m)?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>12}  {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy", "", "", self.accuracy, self.macro_avg.support
        )?;
        write_row(f, "macro avg", &self.macro_avg)?;
        write_row(f, "weighted avg", &self.weighted_avg)
    }
}
