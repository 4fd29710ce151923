//! Loss functions for the two heads.
//!
//! Each criterion returns the scalar loss together with its gradient with
//! respect to the prediction, which the training loop scales by the loss
//! weight and hands to [`ChangeModel::backward`](crate::model::ChangeModel::backward).

pub mod cross_entropy;
pub mod huber;
pub mod loss_type;
pub mod mae;
pub mod mse;

pub use cross_entropy::CrossEntropyLoss;
pub use huber::HuberLoss;
pub use loss_type::{choose_criterion2d, choose_criterion3d, Loss2dType, Loss3dType};
pub use mae::MaeLoss;
pub use mse::MseLoss;

use crate::error::{Error, Result};
use crate::math::tensor::Tensor;

/// A scalar loss and ∂loss/∂prediction (same shape as the prediction).
#[derive(Debug, Clone, PartialEq)]
pub struct LossOutput {
    pub value: f64,
    pub grad: Tensor,
}

/// `(logits [B, C, H, W], labels in [B, H, W] order) -> loss`.
pub trait Criterion2d {
    fn compute(&self, logits: &Tensor, labels: &[usize]) -> Result<LossOutput>;
}

/// `(prediction, target) -> loss` over same-shape tensors.
///
/// `truth` is the ground truth in physical units, aligned with `target`.
/// Criteria that exclude zeros test it rather than the rescaled target, since
/// rescaling moves a true zero away from zero.
pub trait Criterion3d {
    fn compute(&self, prediction: &Tensor, target: &Tensor, truth: &Tensor) -> Result<LossOutput>;
}

/// Shared reduction for element-wise regression losses.
///
/// `elementwise(diff)` returns `(loss, dloss/ddiff)` for `diff = pred - target`.
/// With `exclude_zeros`, elements whose `truth` is exactly zero are left out of
/// the mean and get zero gradient. An empty reduction yields zero loss.
pub(crate) fn reduce_elementwise<F>(
    prediction: &Tensor,
    target: &Tensor,
    truth: &Tensor,
    exclude_zeros: bool,
    elementwise: F,
) -> Result<LossOutput>
where
    F: Fn(f64) -> (f64, f64),
{
    if prediction.shape() != target.shape() {
        return Err(Error::shape(format!(
            "prediction {:?} and target {:?} differ",
            prediction.shape(),
            target.shape()
        )));
    }
    if truth.shape() != target.shape() {
        return Err(Error::shape(format!(
            "ground truth {:?} and target {:?} differ",
            truth.shape(),
            target.shape()
        )));
    }

    let included = |t: f64| !exclude_zeros || t != 0.0;
    let n = truth.data().iter().filter(|&&t| included(t)).count();
    let mut grad = Tensor::zeros(prediction.shape().to_vec());
    if n == 0 {
        return Ok(LossOutput { value: 0.0, grad });
    }

    let inv_n = 1.0 / n as f64;
    let mut total = 0.0;
    let elements = prediction.data().iter().zip(target.data()).zip(truth.data());
    for (g, ((&p, &t), &raw)) in grad.data_mut().iter_mut().zip(elements) {
        if included(raw) {
            let (l, d) = elementwise(p - t);
            total += l;
            *g = d * inv_n;
        }
    }
    Ok(LossOutput { value: total * inv_n, grad })
}
