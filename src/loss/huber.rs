use crate::error::Result;
use crate::loss::{reduce_elementwise, Criterion3d, LossOutput};
use crate::math::tensor::Tensor;

const DELTA: f64 = 1.0;

/// Huber loss with δ = 1 (identical to smooth L1 at that δ).
#[derive(Debug, Clone, Copy, Default)]
pub struct HuberLoss {
    pub exclude_zeros: bool,
}

impl HuberLoss {
    pub fn new(exclude_zeros: bool) -> HuberLoss {
        HuberLoss { exclude_zeros }
    }
}

impl Criterion3d for HuberLoss {
    /// mean(h(p − y)) where h(x) = 0.5·x² if |x| ≤ δ, else δ·(|x| − 0.5·δ)
    fn compute(&self, prediction: &Tensor, target: &Tensor, truth: &Tensor) -> Result<LossOutput> {
        reduce_elementwise(prediction, target, truth, self.exclude_zeros, |x| {
            if x.abs() <= DELTA {
                (0.5 * x * x, x)
            } else {
                (DELTA * (x.abs() - 0.5 * DELTA), DELTA * x.signum())
            }
        })
    }
}
