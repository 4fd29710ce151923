use crate::error::Result;
use crate::loss::{reduce_elementwise, Criterion3d, LossOutput};
use crate::math::tensor::Tensor;

#[derive(Debug, Clone, Copy, Default)]
pub struct MseLoss {
    pub exclude_zeros: bool,
}

impl MseLoss {
    pub fn new(exclude_zeros: bool) -> MseLoss {
        MseLoss { exclude_zeros }
    }
}

impl Criterion3d for MseLoss {
    /// mean((p - y)²); gradient 2(p - y)/n
    fn compute(&self, prediction: &Tensor, target: &Tensor, truth: &Tensor) -> Result<LossOutput> {
        reduce_elementwise(prediction, target, truth, self.exclude_zeros, |x| (x * x, 2.0 * x))
    }
}
