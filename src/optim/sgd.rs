use std::collections::HashMap;

use crate::layers::parameter::Parameter;
use crate::optim::Optimizer;

/// Stochastic gradient descent with optional momentum and L2 weight decay.
///
///   g ← ∇ + λ·θ;  v ← μ·v + g;  θ ← θ − η·v
pub struct Sgd {
    pub learning_rate: f64,
    pub momentum: f64,
    pub weight_decay: f64,
    velocity: HashMap<String, Vec<f64>>,
}

impl Sgd {
    pub fn new(learning_rate: f64, momentum: f64, weight_decay: f64) -> Sgd {
        Sgd { learning_rate, momentum, weight_decay, velocity: HashMap::new() }
    }
}

impl Optimizer for Sgd {
    fn step(&mut self, params: Vec<(String, &mut Parameter)>) {
        for (name, param) in params {
            let grads: Vec<f64> = param
                .grad
                .data
                .iter()
                .zip(&param.value.data)
                .map(|(g, w)| g + self.weight_decay * w)
                .collect();

            let update = if self.momentum > 0.0 {
                // The first step seeds the buffer with the raw gradient.
                let momentum = self.momentum;
                let buf = self
                    .velocity
                    .entry(name)
                    .and_modify(|v| {
                        for (vi, g) in v.iter_mut().zip(&grads) {
                            *vi = momentum * *vi + g;
                        }
                    })
                    .or_insert_with(|| grads.clone());
                buf.clone()
            } else {
                grads
            };

            for (w, u) in param.value.data.iter_mut().zip(update) {
                *w -= self.learning_rate * u;
            }
        }
    }

    fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    fn set_learning_rate(&mut self, lr: f64) {
        self.learning_rate = lr;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::matrix::Matrix;

    fn param(value: f64, grad: f64) -> Parameter {
        let mut p = Parameter::new(Matrix::from_vec(1, 1, vec![value]));
        p.grad = Matrix::from_vec(1, 1, vec![grad]);
        p
    }

    #[test]
    fn test_plain_step() {
        let mut p = param(1.0, 0.5);
        Sgd::new(0.1, 0.0, 0.0).step(vec![("w".to_string(), &mut p)]);
        assert!((p.value.data[0] - 0.95).abs() < 1e-12);
    }

    #[test]
    fn test_momentum_accumulates() {
        let mut sgd = Sgd::new(1.0, 0.9, 0.0);
        let mut p = param(0.0, 1.0);
        sgd.step(vec![("w".to_string(), &mut p)]);
        assert!((p.value.data[0] + 1.0).abs() < 1e-12);
        sgd.step(vec![("w".to_string(), &mut p)]);
        // v = 0.9·1 + 1 = 1.9
        assert!((p.value.data[0] + 2.9).abs() < 1e-12);
    }
}
