use tracing::warn;

use crate::error::{Error, Result};
use crate::math::tensor::Tensor;

/// Applied to each `[C, H, W]` image as it is loaded.
pub trait Transform: Send + Sync {
    fn apply(&self, image: Tensor) -> Result<Tensor>;
}

/// Per-channel `(x - mean) / std`.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalize {
    pub mean: Vec<f64>,
    pub std: Vec<f64>,
}

impl Normalize {
    pub fn new(mean: &[f64], std: &[f64]) -> Normalize {
        Normalize { mean: mean.to_vec(), std: std.to_vec() }
    }
}

impl Transform for Normalize {
    fn apply(&self, mut image: Tensor) -> Result<Tensor> {
        let channels = image.shape().first().copied().unwrap_or(0);
        if image.rank() != 3 || channels != self.mean.len() {
            return Err(Error::shape(format!(
                "cannot normalize {:?} with {} channel statistics",
                image.shape(),
                self.mean.len()
            )));
        }
        let plane = image.len() / channels;
        for (c, chunk) in image.data_mut().chunks_mut(plane).enumerate() {
            let (m, s) = (self.mean[c], self.std[c]);
            chunk.iter_mut().for_each(|x| *x = (*x - m) / s);
        }
        Ok(image)
    }
}

/// Transform for the training split. Geometric augmentation is not provided;
/// with `augment` set only normalization is applied.
pub fn training_transform(augment: bool, mean: &[f64], std: &[f64]) -> Box<dyn Transform> {
    if augment {
        warn!("augmentations requested; only normalization is applied to training images");
    }
    Box::new(Normalize::new(mean, std))
}

/// Transform for the validation and test splits.
pub fn validation_transform(mean: &[f64], std: &[f64]) -> Box<dyn Transform> {
    Box::new(Normalize::new(mean, std))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_per_channel() {
        let image = Tensor::new(vec![2, 1, 2], vec![1.0, 3.0, 10.0, 20.0]).unwrap();
        let out = Normalize::new(&[1.0, 10.0], &[2.0, 5.0]).apply(image).unwrap();
        assert_eq!(out.data(), &[0.0, 1.0, 0.0, 2.0]);
    }

    #[test]
    fn test_channel_mismatch() {
        let image = Tensor::zeros(vec![1, 2, 2]);
        assert!(Normalize::new(&[0.0; 3], &[1.0; 3]).apply(image).is_err());
    }
}
