#![allow(dead_code)]

use std::path::Path;

use change3d::error::{Error, Result};
use change3d::layers::Parameter;
use change3d::model::{ArchSpec, ChangeModel, DualOutput};
use change3d::{Matrix, Sample, Tensor};
use rand::rngs::StdRng;

/// Deterministic model whose outputs ignore its parameters. With `d` the
/// channel mean of `t2 - t1` at a pixel: class-1 logit = `d`, class-0 logit =
/// 0, and 3-D output = `d / 10`, which is `d` in physical units for the
/// `[-10, 10]` range of [`config_yaml`].
pub struct DiffStub {
    weight: Parameter,
    training: bool,
    pub backward_calls: usize,
}

impl DiffStub {
    pub fn new() -> DiffStub {
        DiffStub { weight: Parameter::new(Matrix::zeros(1, 1)), training: true, backward_calls: 0 }
    }
}

pub fn diff_stub(_spec: &ArchSpec, _rng: &mut StdRng) -> Box<dyn ChangeModel> {
    Box::new(DiffStub::new())
}

impl ChangeModel for DiffStub {
    fn forward(&mut self, t1: &Tensor, t2: &Tensor) -> Result<DualOutput> {
        let (b, c, h, w) = t1.dims4()?;
        let plane = h * w;
        let mut logits = vec![0.0; b * 2 * plane];
        let mut elevation = vec![0.0; b * plane];
        for bi in 0..b {
            for p in 0..plane {
                let diff: f64 = (0..c)
                    .map(|ci| {
                        let i = bi * c * plane + ci * plane + p;
                        t2.data()[i] - t1.data()[i]
                    })
                    .sum();
                let d = diff / c as f64;
                logits[bi * 2 * plane + plane + p] = d;
                elevation[bi * plane + p] = d / 10.0;
            }
        }
        Ok(DualOutput {
            out2d: Tensor::new(vec![b, 2, h, w], logits)?,
            out3d: Tensor::new(vec![b, 1, h, w], elevation)?,
        })
    }

    fn backward(&mut self, _grad2d: &Tensor, _grad3d: &Tensor) -> Result<()> {
        if !self.training {
            return Err(Error::model("backward in eval mode"));
        }
        self.backward_calls += 1;
        Ok(())
    }

    fn parameters(&self) -> Vec<(String, &Parameter)> {
        vec![("encoder.0.weight".to_string(), &self.weight)]
    }

    fn parameters_mut(&mut self) -> Vec<(String, &mut Parameter)> {
        vec![("encoder.0.weight".to_string(), &mut self.weight)]
    }

    fn set_training(&mut self, training: bool) {
        self.training = training;
    }
}

/// A 2×2 sample with three-channel images.
pub fn sample(t1: [f64; 4], t2: [f64; 4], mask2d: [f64; 4], mask3d: [f64; 4]) -> Sample {
    let rgb = |px: [f64; 4]| {
        let data: Vec<f64> = (0..3).flat_map(|_| px).collect();
        Tensor::new(vec![3, 2, 2], data).unwrap()
    };
    Sample {
        t1: rgb(t1),
        t2: rgb(t2),
        mask2d: Tensor::new(vec![2, 2], mask2d.to_vec()).unwrap(),
        mask3d: Tensor::new(vec![2, 2], mask3d.to_vec()).unwrap(),
    }
}

/// Experiment YAML with the given data root, model and epoch count.
pub fn config_yaml(data_root: &Path, model: &str, num_epochs: usize, batch_size: usize) -> String {
    let root = data_root.display();
    format!(
        r#"data:
  train:
    path: '{root}/train'
    batch_size: {batch_size}
  val:
    path: '{root}/val'
  test:
    path: '{root}/test'
  augmentations: false
  min_value: -10.0
  max_value: 10.0
  mean: [0.0, 0.0, 0.0]
  std: [1.0, 1.0, 1.0]
model:
  model: {model}
  num_classes: 2
  pretraining_strategy: none
  feature_extractor_arch: resnet18
  checkpoints_path: '{root}/checkpoints'
  loss_weights: [0.5, 0.5]
  2d_loss_weights: [1.0, 1.0]
  2d_loss: cross_entropy
  3d_loss: mse
  exclude_zeros: false
  restore_checkpoints: "3d"
optim:
  num_epochs: {num_epochs}
  lr: 0.01
  optim_type: sgd
  lr_schedule_type: constant
"#
    )
}

pub fn stats_lines(out_dir: &Path) -> Vec<String> {
    std::fs::read_to_string(out_dir.join("stats.txt"))
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}
