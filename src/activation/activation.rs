use serde::{Serialize, Deserialize};

/// Element-wise activations used by the reference network.
///
/// `Tanh` bounds the 3-D head to `[-1, 1]`; elevation targets are rescaled
/// into that range before the loss.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ActivationFunction {
    ReLU,
    LeakyReLU { alpha: f64 },
    Identity,
    Tanh,
}

impl ActivationFunction {
    pub fn function(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::ReLU => if x > 0.0 { x } else { 0.0 },
            ActivationFunction::LeakyReLU { alpha } => if x > 0.0 { x } else { alpha * x },
            ActivationFunction::Identity => x,
            ActivationFunction::Tanh => x.tanh(),
        }
    }

    /// Derivative evaluated at the pre-activation `x`.
    pub fn derivative(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::ReLU => if x > 0.0 { 1.0 } else { 0.0 },
            ActivationFunction::LeakyReLU { alpha } => if x > 0.0 { 1.0 } else { *alpha },
            ActivationFunction::Identity => 1.0,
            ActivationFunction::Tanh => {
                let t = x.tanh();
                1.0 - t * t
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tanh_derivative_matches_finite_difference() {
        let f = ActivationFunction::Tanh;
        let x = 0.3;
        let h = 1e-6;
        let numeric = (f.function(x + h) - f.function(x - h)) / (2.0 * h);
        assert!((numeric - f.derivative(x)).abs() < 1e-6);
    }

    #[test]
    fn test_leaky_relu() {
        let f = ActivationFunction::LeakyReLU { alpha: 0.1 };
        assert_eq!(f.function(-2.0), -0.2);
        assert_eq!(f.derivative(-2.0), 0.1);
        assert_eq!(f.derivative(3.0), 1.0);
    }
}
