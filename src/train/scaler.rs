use crate::error::{Error, Result};
use crate::math::tensor::Tensor;

/// Maps elevation differences between physical units and `[-1, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueScaler {
    pub min: f64,
    pub max: f64,
}

impl ValueScaler {
    pub fn new(min: f64, max: f64) -> Result<ValueScaler> {
        if !(min < max) {
            return Err(Error::config(format!("scale range [{}, {}] is empty", min, max)));
        }
        Ok(ValueScaler { min, max })
    }

    pub fn normalize_value(&self, x: f64) -> f64 {
        2.0 * (x - self.min) / (self.max - self.min) - 1.0
    }

    pub fn denormalize_value(&self, y: f64) -> f64 {
        (y + 1.0) / 2.0 * (self.max - self.min) + self.min
    }

    pub fn normalize(&self, t: &Tensor) -> Tensor {
        t.map(|x| self.normalize_value(x))
    }

    pub fn denormalize(&self, t: &Tensor) -> Tensor {
        t.map(|y| self.denormalize_value(y))
    }
}
