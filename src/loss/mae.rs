use crate::error::Result;
use crate::loss::{reduce_elementwise, Criterion3d, LossOutput};
use crate::math::tensor::Tensor;

#[derive(Debug, Clone, Copy, Default)]
pub struct MaeLoss {
    pub exclude_zeros: bool,
}

impl MaeLoss {
    pub fn new(exclude_zeros: bool) -> MaeLoss {
        MaeLoss { exclude_zeros }
    }
}

impl Criterion3d for MaeLoss {
    /// mean(|p - y|); subgradient sign(p - y)/n, 0 when equal
    fn compute(&self, prediction: &Tensor, target: &Tensor, truth: &Tensor) -> Result<LossOutput> {
        reduce_elementwise(prediction, target, truth, self.exclude_zeros, |x| {
            let d = if x > 0.0 { 1.0 } else if x < 0.0 { -1.0 } else { 0.0 };
            (x.abs(), d)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mae() {
        let p = Tensor::new(vec![2], vec![0.5, -1.0]).unwrap();
        let y = Tensor::new(vec![2], vec![0.0, 1.0]).unwrap();
        let out = MaeLoss::new(false).compute(&p, &y, &y).unwrap();
        assert_eq!(out.value, 1.25);
        assert_eq!(out.grad.data(), &[0.5, -0.5]);
    }
}
