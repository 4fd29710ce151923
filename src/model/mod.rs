//! Dual-head change-detection models.
//!
//! Every architecture is consumed through [`ChangeModel`]: given two
//! co-registered images it returns 2-D class logits and a bounded 3-D
//! elevation-difference map.

pub mod kind;
pub mod pixel;
pub mod pretrain;
pub mod registry;
pub mod state;

pub use kind::{ArchSpec, Backbone, ModelKind, TokenizerSpec};
pub use pixel::PixelDualHead;
pub use pretrain::PretrainStrategy;
pub use registry::{ModelConstructor, ModelRegistry};
pub use state::{ParamState, StateDict};

use crate::error::Result;
use crate::layers::parameter::Parameter;
use crate::math::tensor::Tensor;

/// Output of one forward pass.
#[derive(Debug, Clone, PartialEq)]
pub struct DualOutput {
    /// `[B, classes, H, W]` logits.
    pub out2d: Tensor,
    /// `[B, 1, H, W]`, expected in `[-1, 1]`.
    pub out3d: Tensor,
}

pub trait ChangeModel {
    fn forward(&mut self, t1: &Tensor, t2: &Tensor) -> Result<DualOutput>;

    /// Accumulates parameter gradients for the most recent `forward`, given
    /// ∂loss/∂out2d and ∂loss/∂out3d.
    fn backward(&mut self, grad2d: &Tensor, grad3d: &Tensor) -> Result<()>;

    fn parameters(&self) -> Vec<(String, &Parameter)>;

    fn parameters_mut(&mut self) -> Vec<(String, &mut Parameter)>;

    /// Switches between training and evaluation behaviour.
    fn set_training(&mut self, training: bool);

    fn zero_grad(&mut self) {
        for (_, p) in self.parameters_mut() {
            p.zero_grad();
        }
    }

    fn state_dict(&self) -> StateDict {
        StateDict::from_parameters(self.parameters())
    }

    /// Strict load: all names and shapes must match.
    fn load_state_dict(&mut self, state: &StateDict) -> Result<()> {
        state.load_into(self.parameters_mut())
    }
}
