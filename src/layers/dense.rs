use rand::Rng;

use crate::{activation::activation::ActivationFunction, layers::parameter::Parameter, math::matrix::Matrix};

/// Fully connected layer applied row-wise: `a = σ(X·W + b)`.
///
/// Each row of `X` is one pixel, so the same layer acts as a 1×1 convolution
/// over an image flattened to `[pixels, channels]`.
#[derive(Debug)]
pub struct Dense {
    pub weights: Parameter,
    pub biases: Parameter,
    pub activator: ActivationFunction,
    inputs: Matrix,
    pre_activations: Matrix, // z = XW + b, needed for σ'(z)
}

impl Dense {
    pub fn new<R: Rng>(input_size: usize, size: usize, activation: ActivationFunction, rng: &mut R) -> Dense {
        let weights = match activation {
            ActivationFunction::ReLU | ActivationFunction::LeakyReLU { .. } => Matrix::he(input_size, size, rng),
            ActivationFunction::Identity | ActivationFunction::Tanh => Matrix::xavier(input_size, size, rng),
        };
        Dense {
            weights: Parameter::new(weights),
            biases: Parameter::new(Matrix::zeros(1, size)),
            activator: activation,
            inputs: Matrix::default(),
            pre_activations: Matrix::default(),
        }
    }

    pub fn input_size(&self) -> usize {
        self.weights.value.rows
    }

    pub fn size(&self) -> usize {
        self.weights.value.cols
    }

    /// Forward pass; caches the input and pre-activation for `backward`.
    pub fn forward(&mut self, inputs: &Matrix) -> Matrix {
        let z = (inputs * &self.weights.value).add_row(&self.biases.value);
        let a = z.map(|x| self.activator.function(x));
        self.inputs = inputs.clone();
        self.pre_activations = z;
        a
    }

    /// Backward pass for the most recent `forward`.
    ///
    /// `output_delta` is ∂L/∂a. Accumulates ∂L/∂W and ∂L/∂b into the
    /// parameters and returns ∂L/∂X.
    pub fn backward(&mut self, output_delta: &Matrix) -> Matrix {
        let act_derivative = self.pre_activations.map(|x| self.activator.derivative(x));
        let delta = output_delta.hadamard(&act_derivative);

        self.weights.accumulate(&(&self.inputs.transpose() * &delta));
        self.biases.accumulate(&delta.column_sums());

        &delta * &self.weights.value.transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn loss(layer: &mut Dense, x: &Matrix) -> f64 {
        layer.forward(x).data.iter().map(|v| 0.5 * v * v).sum()
    }

    #[test]
    fn test_weight_gradient_matches_finite_difference() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut layer = Dense::new(3, 2, ActivationFunction::Tanh, &mut rng);
        let x = Matrix::from_vec(2, 3, vec![0.1, -0.4, 0.7, 0.3, 0.2, -0.5]);

        let out = layer.forward(&x);
        // dL/da = a for L = 0.5 * sum(a^2)
        layer.backward(&out);
        let analytic = layer.weights.grad.get(1, 0);

        let h = 1e-6;
        let w = layer.weights.value.get(1, 0);
        layer.weights.value.set(1, 0, w + h);
        let plus = loss(&mut layer, &x);
        layer.weights.value.set(1, 0, w - h);
        let minus = loss(&mut layer, &x);
        let numeric = (plus - minus) / (2.0 * h);

        assert!((numeric - analytic).abs() < 1e-6, "{} vs {}", numeric, analytic);
    }

    #[test]
    fn test_zero_grad() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut layer = Dense::new(2, 2, ActivationFunction::ReLU, &mut rng);
        let x = Matrix::from_vec(1, 2, vec![1.0, 1.0]);
        let out = layer.forward(&x);
        layer.backward(&out.map(|_| 1.0));
        layer.weights.zero_grad();
        assert!(layer.weights.grad.data.iter().all(|g| *g == 0.0));
    }
}
