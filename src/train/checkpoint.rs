use std::path::Path;

use tracing::{info, warn};

use crate::config::run_dirs::checkpoint_path;
use crate::error::{Error, Result};
use crate::model::{ChangeModel, StateDict};

/// Tag of the checkpoint holding the best F1 so far.
pub const TAG_2D: &str = "2d";
/// Tag of the checkpoint holding the best cRMSE so far.
pub const TAG_3D: &str = "3d";

/// Best validation scores seen in the run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BestTrackers {
    /// Highest F1, starts at 0.
    pub best2d: f64,
    /// Lowest cRMSE, starts at 1e6.
    pub best3d: f64,
}

impl Default for BestTrackers {
    fn default() -> Self {
        BestTrackers { best2d: 0.0, best3d: 1_000_000.0 }
    }
}

/// Which checkpoints to write after a validation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CheckpointDecision {
    pub save2d: bool,
    pub save3d: bool,
}

impl BestTrackers {
    /// Records `f1` and `crmse` when they strictly improve. The two checks
    /// are independent; NaN never counts as an improvement.
    pub fn update(&mut self, f1: f64, crmse: f64) -> CheckpointDecision {
        let save2d = f1 > self.best2d;
        if save2d {
            self.best2d = f1;
        }
        let save3d = crmse < self.best3d;
        if save3d {
            self.best3d = crmse;
        }
        CheckpointDecision { save2d, save3d }
    }
}

/// Writes the model's full state to `<out_dir>/<tag>bestnet.pth`.
pub fn save_checkpoint(model: &dyn ChangeModel, out_dir: &Path, tag: &str) -> Result<()> {
    let path = checkpoint_path(out_dir, tag);
    model.state_dict().save_json(&path)?;
    info!(path = %path.display(), "Checkpoint saved");
    Ok(())
}

/// Loads `<out_dir>/<tag>bestnet.pth` into `model` if it exists.
///
/// Returns `Ok(false)` when there is nothing to restore. An unreadable file
/// or a state that does not match the model is an error and leaves the model
/// untouched.
pub fn restore_checkpoint(model: &mut dyn ChangeModel, out_dir: &Path, tag: &str) -> Result<bool> {
    let path = checkpoint_path(out_dir, tag);
    if !path.is_file() {
        warn!(path = %path.display(), "No checkpoint to restore");
        return Ok(false);
    }
    let state = StateDict::load_json(&path).map_err(|e| Error::checkpoint(&path, e.to_string()))?;
    model
        .load_state_dict(&state)
        .map_err(|e| Error::checkpoint(&path, e.to_string()))?;
    info!(path = %path.display(), "Checkpoint restored");
    Ok(true)
}
