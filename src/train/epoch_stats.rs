use serde::{Deserialize, Serialize};

use crate::metrics::PhaseMetrics;

/// Mean training losses of one epoch, weighted by samples.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EpochLosses {
    pub loss2d: f64,
    pub loss3d: f64,
    /// `w2d · loss2d + w3d · loss3d`
    pub loss: f64,
}

/// One line of `stats.txt` per training epoch.
///
/// Scores are percentages; errors are in physical units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochRecord {
    pub epoch: usize,
    #[serde(rename = "Loss2D")]
    pub loss2d: f64,
    #[serde(rename = "Loss3D")]
    pub loss3d: f64,
    #[serde(rename = "Loss")]
    pub loss: f64,
    #[serde(rename = "RMSE")]
    pub rmse: f64,
    #[serde(rename = "cRMSE")]
    pub crmse: f64,
    #[serde(rename = "F1Score")]
    pub f1: f64,
    #[serde(rename = "IoU")]
    pub iou: f64,
}

impl EpochRecord {
    pub fn new(epoch: usize, losses: &EpochLosses, val: &PhaseMetrics) -> EpochRecord {
        EpochRecord {
            epoch,
            loss2d: losses.loss2d,
            loss3d: losses.loss3d,
            loss: losses.loss,
            rmse: val.rmse,
            crmse: val.crmse,
            f1: val.f1 * 100.0,
            iou: val.iou * 100.0,
        }
    }
}

/// The final line of `stats.txt`, written after the test phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestRecord {
    /// Always `"Test"`.
    pub epoch: String,
    #[serde(rename = "MeanAbsoluteError")]
    pub mae: f64,
    #[serde(rename = "RMSE")]
    pub rmse: f64,
    #[serde(rename = "cRMSE")]
    pub crmse: f64,
    #[serde(rename = "F1Score")]
    pub f1: f64,
    #[serde(rename = "IoU")]
    pub iou: f64,
}

impl TestRecord {
    pub fn new(test: &PhaseMetrics) -> TestRecord {
        TestRecord {
            epoch: "Test".to_string(),
            mae: test.mae,
            rmse: test.rmse,
            crmse: test.crmse,
            f1: test.f1 * 100.0,
            iou: test.iou * 100.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::ConfusionCounts;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_epoch_record_keys() {
        let losses = EpochLosses { loss2d: 0.5, loss3d: 0.25, loss: 0.375 };
        let val = PhaseMetrics { counts: ConfusionCounts::default(), f1: 0.5, iou: 0.25, mae: 1.0, rmse: 2.0, crmse: 3.0 };
        let json = serde_json::to_value(EpochRecord::new(4, &losses, &val)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "epoch": 4, "Loss2D": 0.5, "Loss3D": 0.25, "Loss": 0.375,
                "RMSE": 2.0, "cRMSE": 3.0, "F1Score": 50.0, "IoU": 25.0
            })
        );
    }

    #[test]
    fn test_test_record_keys() {
        let m = PhaseMetrics { counts: ConfusionCounts::default(), f1: 1.0, iou: 0.5, mae: 0.5, rmse: 1.5, crmse: 2.5 };
        let json = serde_json::to_value(TestRecord::new(&m)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "epoch": "Test", "MeanAbsoluteError": 0.5, "RMSE": 1.5,
                "cRMSE": 2.5, "F1Score": 100.0, "IoU": 50.0
            })
        );
    }
}
