use rand::Rng;

use crate::activation::activation::ActivationFunction;
use crate::error::{Error, Result};
use crate::layers::{dense::Dense, parameter::Parameter};
use crate::math::{matrix::Matrix, tensor::Tensor};
use crate::model::kind::ArchSpec;
use crate::model::{ChangeModel, DualOutput};

/// Reference CPU network that scores every pixel independently.
///
/// Per pixel the input features are `[t1, t2, t2 - t1]` (3 × `input_nc`),
/// followed by a two-layer ReLU encoder of width `embed_dim` and two heads:
/// identity logits for the 2-D mask and a Tanh unit for the 3-D map.
#[derive(Debug)]
pub struct PixelDualHead {
    spec: ArchSpec,
    encoder: Vec<Dense>,
    head2d: Dense,
    head3d: Dense,
    training: bool,
    /// `(B, H, W)` of the last forward pass.
    cached_dims: Option<(usize, usize, usize)>,
}

impl PixelDualHead {
    pub fn new<R: Rng>(spec: ArchSpec, rng: &mut R) -> PixelDualHead {
        let in_features = 3 * spec.input_nc;
        let width = spec.embed_dim;
        let encoder = vec![
            Dense::new(in_features, width, ActivationFunction::ReLU, rng),
            Dense::new(width, width, ActivationFunction::ReLU, rng),
        ];
        let head2d = Dense::new(width, spec.output_nc, ActivationFunction::Identity, rng);
        let head3d = Dense::new(width, 1, ActivationFunction::Tanh, rng);
        PixelDualHead {
            spec,
            encoder,
            head2d,
            head3d,
            training: true,
            cached_dims: None,
        }
    }

    pub fn spec(&self) -> &ArchSpec {
        &self.spec
    }

    pub fn is_training(&self) -> bool {
        self.training
    }

    /// Flattens two `[B, C, H, W]` images into `[B·H·W, 3C]` pixel rows.
    fn pixel_rows(&self, t1: &Tensor, t2: &Tensor) -> Result<(Matrix, (usize, usize, usize))> {
        let (b, c, h, w) = t1.dims4()?;
        if t2.dims4()? != (b, c, h, w) {
            return Err(Error::shape(format!(
                "image pair shapes differ: {:?} vs {:?}",
                t1.shape(),
                t2.shape()
            )));
        }
        if c != self.spec.input_nc {
            return Err(Error::shape(format!(
                "{} expects {} input channels, got {}",
                self.spec.kind, self.spec.input_nc, c
            )));
        }

        let plane = h * w;
        let cols = 3 * c;
        let (a, z) = (t1.data(), t2.data());
        let mut data = Vec::with_capacity(b * plane * cols);
        for bi in 0..b {
            let base = bi * c * plane;
            for p in 0..plane {
                for ci in 0..c {
                    data.push(a[base + ci * plane + p]);
                }
                for ci in 0..c {
                    data.push(z[base + ci * plane + p]);
                }
                for ci in 0..c {
                    data.push(z[base + ci * plane + p] - a[base + ci * plane + p]);
                }
            }
        }
        Ok((Matrix::from_vec(b * plane, cols, data), (b, h, w)))
    }
}

/// `[B·H·W, K]` rows back to a `[B, K, H, W]` tensor.
fn rows_to_tensor(m: &Matrix, (b, h, w): (usize, usize, usize)) -> Result<Tensor> {
    let plane = h * w;
    let k = m.cols;
    let mut data = vec![0.0; b * k * plane];
    for bi in 0..b {
        for p in 0..plane {
            let row = m.row(bi * plane + p);
            for (ki, v) in row.iter().enumerate() {
                data[bi * k * plane + ki * plane + p] = *v;
            }
        }
    }
    Tensor::new(vec![b, k, h, w], data)
}

/// `[B, K, H, W]` tensor to `[B·H·W, K]` rows.
fn tensor_to_rows(t: &Tensor, dims: (usize, usize, usize), k: usize) -> Result<Matrix> {
    let (b, h, w) = dims;
    if t.shape() != [b, k, h, w] {
        return Err(Error::shape(format!(
            "gradient shape {:?} does not match output [{}, {}, {}, {}]",
            t.shape(),
            b,
            k,
            h,
            w
        )));
    }
    let plane = h * w;
    let src = t.data();
    let mut m = Matrix::zeros(b * plane, k);
    for bi in 0..b {
        for ki in 0..k {
            for p in 0..plane {
                m.set(bi * plane + p, ki, src[bi * k * plane + ki * plane + p]);
            }
        }
    }
    Ok(m)
}

impl ChangeModel for PixelDualHead {
    fn forward(&mut self, t1: &Tensor, t2: &Tensor) -> Result<DualOutput> {
        let (x, dims) = self.pixel_rows(t1, t2)?;
        let features = self
            .encoder
            .iter_mut()
            .fold(x, |acc, layer| layer.forward(&acc));
        let logits = self.head2d.forward(&features);
        let elevation = self.head3d.forward(&features);
        self.cached_dims = Some(dims);

        Ok(DualOutput {
            out2d: rows_to_tensor(&logits, dims)?,
            out3d: rows_to_tensor(&elevation, dims)?,
        })
    }

    fn backward(&mut self, grad2d: &Tensor, grad3d: &Tensor) -> Result<()> {
        if !self.training {
            return Err(Error::model("backward called while the model is in eval mode"));
        }
        let dims = self
            .cached_dims
            .ok_or_else(|| Error::model("backward called before forward"))?;

        let g2 = tensor_to_rows(grad2d, dims, self.spec.output_nc)?;
        let g3 = tensor_to_rows(grad3d, dims, 1)?;
        let d2 = self.head2d.backward(&g2);
        let d3 = self.head3d.backward(&g3);

        let mut delta = &d2 + &d3;
        for layer in self.encoder.iter_mut().rev() {
            delta = layer.backward(&delta);
        }
        Ok(())
    }

    fn parameters(&self) -> Vec<(String, &Parameter)> {
        let mut params = Vec::with_capacity(2 * self.encoder.len() + 4);
        for (i, layer) in self.encoder.iter().enumerate() {
            params.push((format!("encoder.{}.weight", i), &layer.weights));
            params.push((format!("encoder.{}.bias", i), &layer.biases));
        }
        params.push(("head2d.weight".to_string(), &self.head2d.weights));
        params.push(("head2d.bias".to_string(), &self.head2d.biases));
        params.push(("head3d.weight".to_string(), &self.head3d.weights));
        params.push(("head3d.bias".to_string(), &self.head3d.biases));
        params
    }

    fn parameters_mut(&mut self) -> Vec<(String, &mut Parameter)> {
        let mut params = Vec::with_capacity(2 * self.encoder.len() + 4);
        for (i, layer) in self.encoder.iter_mut().enumerate() {
            params.push((format!("encoder.{}.weight", i), &mut layer.weights));
            params.push((format!("encoder.{}.bias", i), &mut layer.biases));
        }
        params.push(("head2d.weight".to_string(), &mut self.head2d.weights));
        params.push(("head2d.bias".to_string(), &mut self.head2d.biases));
        params.push(("head3d.weight".to_string(), &mut self.head3d.weights));
        params.push(("head3d.bias".to_string(), &mut self.head3d.biases));
        params
    }

    fn set_training(&mut self, training: bool) {
        self.training = training;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::kind::ModelKind;
    use rand::{rngs::StdRng, SeedableRng};

    fn images() -> (Tensor, Tensor) {
        let t1 = Tensor::new(vec![2, 3, 2, 2], (0..24).map(|i| i as f64 / 24.0).collect()).unwrap();
        let t2 = t1.map(|x| 1.0 - x);
        (t1, t2)
    }

    #[test]
    fn test_output_shapes_and_bounds() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut net = PixelDualHead::new(ModelKind::Unet.arch_spec(), &mut rng);
        let (t1, t2) = images();
        let out = net.forward(&t1, &t2).unwrap();
        assert_eq!(out.out2d.shape(), &[2, 2, 2, 2]);
        assert_eq!(out.out3d.shape(), &[2, 1, 2, 2]);
        assert!(out.out3d.data().iter().all(|v| (-1.0..=1.0).contains(v)));
    }

    #[test]
    fn test_wrong_channel_count_is_rejected() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut net = PixelDualHead::new(ModelKind::Unet.arch_spec(), &mut rng);
        let t = Tensor::zeros(vec![1, 1, 2, 2]);
        assert!(matches!(net.forward(&t, &t), Err(Error::Shape(_))));
    }

    #[test]
    fn test_backward_requires_training_mode() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut net = PixelDualHead::new(ModelKind::Unet.arch_spec(), &mut rng);
        let (t1, t2) = images();
        let out = net.forward(&t1, &t2).unwrap();
        net.set_training(false);
        let err = net.backward(&out.out2d, &out.out3d).unwrap_err();
        assert!(matches!(err, Error::Model(_)));
    }

    #[test]
    fn test_backward_fills_gradients() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut net = PixelDualHead::new(ModelKind::ChangeFormer.arch_spec(), &mut rng);
        let (t1, t2) = images();
        let out = net.forward(&t1, &t2).unwrap();
        net.zero_grad();
        net.backward(&out.out2d.map(|_| 0.1), &out.out3d.map(|_| 0.1)).unwrap();
        let total: f64 = net
            .parameters()
            .iter()
            .map(|(_, p)| p.grad.data.iter().map(|g| g.abs()).sum::<f64>())
            .sum();
        assert!(total > 0.0);
    }

    #[test]
    fn test_state_dict_round_trip_between_instances() {
        let mut rng = StdRng::seed_from_u64(11);
        let a = PixelDualHead::new(ModelKind::Unet.arch_spec(), &mut rng);
        let mut b = PixelDualHead::new(ModelKind::Unet.arch_spec(), &mut rng);
        b.load_state_dict(&a.state_dict()).unwrap();
        assert_eq!(a.state_dict(), b.state_dict());

        let mut wide = PixelDualHead::new(ModelKind::SUNet18.arch_spec(), &mut rng);
        assert!(wide.load_state_dict(&a.state_dict()).is_err());
    }
}
