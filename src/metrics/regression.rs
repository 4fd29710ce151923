use serde::{Deserialize, Serialize};

/// Per-batch regression errors between predictions and truth in physical units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RegressionScores {
    pub mae: f64,
    pub mse: f64,
    /// Mean squared error over the elements whose truth is non-zero.
    pub mse_excluding_zeros: f64,
    pub max_error: f64,
}

impl RegressionScores {
    pub fn compute(truth: &[f64], prediction: &[f64]) -> RegressionScores {
        RegressionScores {
            mae: mean_absolute_error(truth, prediction),
            mse: mse(truth, prediction),
            mse_excluding_zeros: mse_excluding_zeros(truth, prediction),
            max_error: max_error(truth, prediction),
        }
    }
}

pub fn mean_absolute_error(truth: &[f64], prediction: &[f64]) -> f64 {
    let sum: f64 = truth.iter().zip(prediction).map(|(t, p)| (t - p).abs()).sum();
    sum / truth.len() as f64
}

pub fn mse(truth: &[f64], prediction: &[f64]) -> f64 {
    let sum: f64 = truth.iter().zip(prediction).map(|(t, p)| (p - t).powi(2)).sum();
    sum / truth.len() as f64
}

/// Zero-truth elements are skipped in both the sum and the count. With no
/// non-zero truth the result is NaN.
pub fn mse_excluding_zeros(truth: &[f64], prediction: &[f64]) -> f64 {
    let (sum, count) = truth
        .iter()
        .zip(prediction)
        .filter(|(t, _)| **t != 0.0)
        .fold((0.0, 0usize), |(sum, count), (t, p)| (sum + (p - t).powi(2), count + 1));
    sum / count as f64
}

pub fn max_error(truth: &[f64], prediction: &[f64]) -> f64 {
    truth.iter().zip(prediction).fold(0.0, |m, (t, p)| m.max((t - p).abs()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scores() {
        let truth = [0.0, 2.0, 4.0, 0.0];
        let pred = [1.0, 2.0, 1.0, 0.0];
        let s = RegressionScores::compute(&truth, &pred);
        assert_eq!(s.mae, 1.0);
        assert_eq!(s.mse, 2.5);
        // (0 + 9) / 2 non-zero truth elements; the error at the first
        // (zero-truth) element is ignored
        assert_eq!(s.mse_excluding_zeros, 4.5);
        assert_eq!(s.max_error, 3.0);
    }

    #[test]
    fn test_all_zero_truth() {
        assert!(mse_excluding_zeros(&[0.0, 0.0], &[1.0, 0.0]).is_nan());
    }
}
