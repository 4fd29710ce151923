use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::info;

use crate::error::{Error, Result};
use crate::model::state::StateDict;
use crate::model::ChangeModel;

const ENCODER_PREFIX: &str = "encoder.";

/// How encoder weights are initialized before training.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PretrainStrategy {
    /// Random initialization.
    None,
    /// Encoder weights from `<checkpoints_path>/<feature_extractor_arch>.pth`.
    Checkpoint,
}

impl FromStr for PretrainStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "none" | "scratch" | "random" => Ok(PretrainStrategy::None),
            "checkpoint" | "pretrained" => Ok(PretrainStrategy::Checkpoint),
            other => Err(Error::config(format!("unknown pretraining strategy '{}'", other))),
        }
    }
}

impl PretrainStrategy {
    /// Location of the encoder weights for `arch`.
    pub fn encoder_path(checkpoints_path: &Path, arch: &str) -> PathBuf {
        checkpoints_path.join(format!("{}.pth", arch))
    }

    /// Applies the strategy to a freshly constructed model.
    ///
    /// Only `encoder.*` parameters are loaded; names and shapes must match.
    pub fn apply(&self, model: &mut dyn ChangeModel, checkpoints_path: &Path, arch: &str) -> Result<()> {
        match self {
            PretrainStrategy::None => {
                info!("Encoder initialized from scratch");
                Ok(())
            }
            PretrainStrategy::Checkpoint => {
                let path = PretrainStrategy::encoder_path(checkpoints_path, arch);
                let state = StateDict::load_json(&path)
                    .map_err(|e| Error::checkpoint(&path, e.to_string()))?;
                state
                    .load_matching(model.parameters_mut(), |name| name.starts_with(ENCODER_PREFIX))
                    .map_err(|e| Error::checkpoint(&path, e.to_string()))?;
                info!(path = %path.display(), "Encoder weights loaded");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{kind::ModelKind, pixel::PixelDualHead};
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_parse() {
        assert_eq!("none".parse::<PretrainStrategy>().unwrap(), PretrainStrategy::None);
        assert_eq!("Checkpoint".parse::<PretrainStrategy>().unwrap(), PretrainStrategy::Checkpoint);
        assert!("imagenet21k".parse::<PretrainStrategy>().is_err());
    }

    #[test]
    fn test_checkpoint_loads_only_encoder() {
        let dir = tempfile::tempdir().unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        let donor = PixelDualHead::new(ModelKind::Unet.arch_spec(), &mut rng);
        donor
            .state_dict()
            .save_json(&PretrainStrategy::encoder_path(dir.path(), "resnet18"))
            .unwrap();

        let mut model = PixelDualHead::new(ModelKind::Unet.arch_spec(), &mut rng);
        let head_before = model.state_dict().entries["head2d.weight"].clone();
        PretrainStrategy::Checkpoint.apply(&mut model, dir.path(), "resnet18").unwrap();

        let after = model.state_dict();
        assert_eq!(after.entries["encoder.0.weight"], donor.state_dict().entries["encoder.0.weight"]);
        assert_eq!(after.entries["head2d.weight"], head_before);
    }

    #[test]
    fn test_missing_encoder_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        let mut model = PixelDualHead::new(ModelKind::Unet.arch_spec(), &mut rng);
        let err = PretrainStrategy::Checkpoint.apply(&mut model, dir.path(), "resnet18").unwrap_err();
        assert!(matches!(err, Error::Checkpoint { .. }));
    }
}
