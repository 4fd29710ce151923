use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Binary confusion-matrix counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionCounts {
    pub tn: u64,
    pub fp: u64,
    pub fn_: u64,
    pub tp: u64,
}

impl ConfusionCounts {
    pub fn new(tn: u64, fp: u64, fn_: u64, tp: u64) -> ConfusionCounts {
        ConfusionCounts { tn, fp, fn_, tp }
    }

    /// `2·TP / (2·TP + FN + FP)`; NaN when there are no positives at all.
    pub fn f1(&self) -> f64 {
        let tp = self.tp as f64;
        2.0 * tp / (2.0 * tp + self.fn_ as f64 + self.fp as f64)
    }

    /// `TP / (TP + FN + FP)`; NaN when there are no positives at all.
    pub fn iou(&self) -> f64 {
        let tp = self.tp as f64;
        tp / (tp + self.fn_ as f64 + self.fp as f64)
    }
}

impl std::ops::AddAssign for ConfusionCounts {
    fn add_assign(&mut self, rhs: Self) {
        self.tn += rhs.tn;
        self.fp += rhs.fp;
        self.fn_ += rhs.fn_;
        self.tp += rhs.tp;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfusionError {
    /// Truth and prediction together hold fewer or more than two labels, so
    /// there is no 2×2 matrix.
    #[error("expected exactly two distinct labels, found {distinct}")]
    NotBinary { distinct: usize },

    #[error("truth has {truth} elements, prediction has {prediction}")]
    LengthMismatch { truth: usize, prediction: usize },
}

/// Counts `(tn, fp, fn, tp)` between flattened truth and prediction labels.
///
/// The label set is the union of the values present in both inputs; the
/// smaller label is negative and the larger positive.
pub fn confusion_counts(truth: &[usize], prediction: &[usize]) -> Result<ConfusionCounts, ConfusionError> {
    if truth.len() != prediction.len() {
        return Err(ConfusionError::LengthMismatch { truth: truth.len(), prediction: prediction.len() });
    }
    let labels: BTreeSet<usize> = truth.iter().chain(prediction).copied().collect();
    if labels.len() != 2 {
        return Err(ConfusionError::NotBinary { distinct: labels.len() });
    }
    let positive = labels.iter().next_back().copied().unwrap_or_default();

    let mut counts = ConfusionCounts::default();
    for (&t, &p) in truth.iter().zip(prediction) {
        match (t == positive, p == positive) {
            (false, false) => counts.tn += 1,
            (false, true) => counts.fp += 1,
            (true, false) => counts.fn_ += 1,
            (true, true) => counts.tp += 1,
        }
    }
    Ok(counts)
}
