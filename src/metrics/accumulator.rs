use serde::{Deserialize, Serialize};

use crate::metrics::confusion::ConfusionCounts;
use crate::metrics::regression::RegressionScores;

/// Running sums over the batches of one validation or test phase.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhaseAccumulator {
    pub counts: ConfusionCounts,
    pub mae_sum: f64,
    pub mse_sum: f64,
    pub mse_excluding_zeros_sum: f64,
    pub batches: usize,
}

/// End-of-phase scores. F1 and IoU are fractions here; records scale them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhaseMetrics {
    /// Confusion counts summed over the phase.
    pub counts: ConfusionCounts,
    pub f1: f64,
    pub iou: f64,
    pub mae: f64,
    pub rmse: f64,
    pub crmse: f64,
}

impl PhaseAccumulator {
    pub fn new() -> PhaseAccumulator {
        PhaseAccumulator::default()
    }

    pub fn push(&mut self, counts: ConfusionCounts, scores: &RegressionScores) {
        self.counts += counts;
        self.mae_sum += scores.mae;
        self.mse_sum += scores.mse;
        self.mse_excluding_zeros_sum += scores.mse_excluding_zeros;
        self.batches += 1;
    }

    /// Reduces the sums. Regression errors are averaged per batch, so a
    /// partial final batch weighs as much as a full one.
    pub fn finish(&self) -> PhaseMetrics {
        let n = self.batches as f64;
        PhaseMetrics {
            counts: self.counts,
            f1: self.counts.f1(),
            iou: self.counts.iou(),
            mae: self.mae_sum / n,
            rmse: (self.mse_sum / n).sqrt(),
            crmse: (self.mse_excluding_zeros_sum / n).sqrt(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(mae: f64, mse: f64, excl: f64) -> RegressionScores {
        RegressionScores { mae, mse, mse_excluding_zeros: excl, max_error: 0.0 }
    }

    #[test]
    fn test_batch_count_weighting() {
        let mut acc = PhaseAccumulator::new();
        acc.push(ConfusionCounts::new(5, 1, 1, 3), &scores(1.0, 4.0, 8.0));
        acc.push(ConfusionCounts::new(2, 0, 1, 1), &scores(3.0, 12.0, 24.0));
        let m = acc.finish();
        assert_eq!(m.counts, ConfusionCounts::new(7, 1, 2, 4));
        assert_eq!(m.mae, 2.0);
        assert_eq!(m.rmse, 8.0f64.sqrt());
        assert_eq!(m.crmse, 4.0);
        assert!((m.f1 - 8.0 / 11.0).abs() < 1e-12);
        assert!((m.iou - 4.0 / 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_phase_is_nan() {
        let m = PhaseAccumulator::new().finish();
        assert!(m.mae.is_nan() && m.f1.is_nan());
    }
}
