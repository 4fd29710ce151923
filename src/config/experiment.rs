use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A full experiment description, loaded once per run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    pub data: DataConfig,
    pub model: ModelConfig,
    pub optim: OptimConfig,
    #[serde(default)]
    pub run: RunConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    pub train: TrainSplit,
    pub val: Split,
    pub test: Split,
    pub augmentations: bool,
    /// Lower bound of the elevation-difference range, in physical units.
    pub min_value: f64,
    /// Upper bound of the elevation-difference range, in physical units.
    pub max_value: f64,
    /// Per-channel normalization mean.
    pub mean: Vec<f64>,
    /// Per-channel normalization standard deviation.
    pub std: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainSplit {
    pub path: PathBuf,
    pub batch_size: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Split {
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub model: String,
    pub num_classes: usize,
    pub pretraining_strategy: String,
    pub feature_extractor_arch: String,
    pub checkpoints_path: PathBuf,
    /// `[w2d, w3d]`
    pub loss_weights: Vec<f64>,
    #[serde(rename = "2d_loss_weights")]
    pub class_weights_2d: Vec<f64>,
    #[serde(rename = "2d_loss")]
    pub loss_2d: String,
    #[serde(rename = "3d_loss")]
    pub loss_3d: String,
    #[serde(default)]
    pub exclude_zeros: bool,
    /// Tag of the checkpoint restored before training and before testing;
    /// resolves to `<tag>bestnet.pth`.
    pub restore_checkpoints: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimConfig {
    pub num_epochs: usize,
    pub lr: f64,
    pub optim_type: String,
    pub lr_schedule_type: String,
    #[serde(default)]
    pub momentum: f64,
    #[serde(default)]
    pub weight_decay: f64,
    #[serde(default = "default_beta1")]
    pub beta1: f64,
    #[serde(default = "default_beta2")]
    pub beta2: f64,
    #[serde(default = "default_eps")]
    pub eps: f64,
    #[serde(default = "default_step_size")]
    pub step_size: usize,
    #[serde(default = "default_gamma")]
    pub gamma: f64,
    #[serde(default)]
    pub milestones: Vec<usize>,
    /// Cosine period; defaults to `num_epochs`.
    #[serde(default)]
    pub t_max: Option<usize>,
    #[serde(default)]
    pub eta_min: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default)]
    pub device: Device,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig { seed: default_seed(), device: Device::default() }
    }
}

/// Where tensors live during the run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Device {
    #[default]
    Cpu,
}

fn default_beta1() -> f64 {
    0.9
}

fn default_beta2() -> f64 {
    0.999
}

fn default_eps() -> f64 {
    1e-8
}

fn default_step_size() -> usize {
    10
}

fn default_gamma() -> f64 {
    0.1
}

fn default_seed() -> u64 {
    18
}

impl ExperimentConfig {
    /// Parses and validates a YAML document.
    pub fn from_yaml(yaml: &str) -> Result<ExperimentConfig> {
        let cfg: ExperimentConfig = serde_yaml::from_str(yaml)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: &Path) -> Result<ExperimentConfig> {
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("cannot read {}: {}", path.display(), e)))?;
        ExperimentConfig::from_yaml(&yaml)
    }

    /// `(w2d, w3d)`
    pub fn loss_weights(&self) -> (f64, f64) {
        (self.model.loss_weights[0], self.model.loss_weights[1])
    }

    pub fn validate(&self) -> Result<()> {
        let d = &self.data;
        if !(d.min_value < d.max_value) {
            return Err(Error::config(format!(
                "data.min_value ({}) must be below data.max_value ({})",
                d.min_value, d.max_value
            )));
        }
        if d.train.batch_size == 0 {
            return Err(Error::config("data.train.batch_size must be at least 1"));
        }
        if d.mean.len() != 3 || d.std.len() != 3 {
            return Err(Error::config("data.mean and data.std need one value per RGB channel"));
        }
        if d.std.iter().any(|s| *s <= 0.0) {
            return Err(Error::config("data.std values must be positive"));
        }

        let m = &self.model;
        if m.num_classes < 2 {
            return Err(Error::config("model.num_classes must be at least 2"));
        }
        if m.loss_weights.len() != 2 {
            return Err(Error::config(format!(
                "model.loss_weights needs [w2d, w3d], got {} values",
                m.loss_weights.len()
            )));
        }
        if m.class_weights_2d.len() != m.num_classes {
            return Err(Error::config(format!(
                "model.2d_loss_weights has {} values for {} classes",
                m.class_weights_2d.len(),
                m.num_classes
            )));
        }

        let o = &self.optim;
        if o.num_epochs == 0 {
            return Err(Error::config("optim.num_epochs must be at least 1"));
        }
        if !(o.lr > 0.0) {
            return Err(Error::config("optim.lr must be positive"));
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const SAMPLE: &str = r#"
data:
  train:
    path: data/train
    batch_size: 4
  val:
    path: data/val
  test:
    path: data/test
  augmentations: false
  min_value: -20.0
  max_value: 30.0
  mean: [0.485, 0.456, 0.406]
  std: [0.229, 0.224, 0.225]
model:
  model: SUNet18
  num_classes: 2
  pretraining_strategy: none
  feature_extractor_arch: resnet18
  checkpoints_path: checkpoints
  loss_weights: [0.5, 0.5]
  2d_loss_weights: [0.05, 0.95]
  2d_loss: cross_entropy
  3d_loss: mse
  exclude_zeros: false
  restore_checkpoints: "3d"
optim:
  num_epochs: 10
  lr: 0.001
  optim_type: adamw
  lr_schedule_type: step
  step_size: 5
"#;

    #[test]
    fn test_parse_sample() {
        let cfg = ExperimentConfig::from_yaml(SAMPLE).unwrap();
        assert_eq!(cfg.data.train.batch_size, 4);
        assert_eq!(cfg.model.class_weights_2d, vec![0.05, 0.95]);
        assert_eq!(cfg.model.loss_3d, "mse");
        assert_eq!(cfg.loss_weights(), (0.5, 0.5));
        assert_eq!(cfg.optim.step_size, 5);
        assert_eq!(cfg.optim.gamma, 0.1);
        assert_eq!(cfg.run.seed, 18);
        assert_eq!(cfg.run.device, Device::Cpu);
    }

    #[test]
    fn test_missing_field_is_fatal() {
        let yaml = SAMPLE.replace("  num_classes: 2\n", "");
        assert!(matches!(ExperimentConfig::from_yaml(&yaml), Err(Error::Yaml(_))));
    }

    #[test]
    fn test_inverted_scale_bounds() {
        let yaml = SAMPLE.replace("min_value: -20.0", "min_value: 40.0");
        assert!(matches!(ExperimentConfig::from_yaml(&yaml), Err(Error::Config(_))));
    }

    #[test]
    fn test_class_weight_count_must_match() {
        let yaml = SAMPLE.replace("[0.05, 0.95]", "[1.0]");
        assert!(matches!(ExperimentConfig::from_yaml(&yaml), Err(Error::Config(_))));
    }
}
