use std::collections::HashMap;

use crate::layers::parameter::Parameter;
use crate::optim::Optimizer;

/// Adam, or AdamW when `decoupled` is set.
pub struct Adam {
    pub learning_rate: f64,
    pub beta1: f64,
    pub beta2: f64,
    pub eps: f64,
    pub weight_decay: f64,
    /// Apply weight decay directly to the weights instead of the gradient.
    pub decoupled: bool,
    moments: HashMap<String, (Vec<f64>, Vec<f64>)>,
    steps: u32,
}

impl Adam {
    pub fn new(learning_rate: f64, beta1: f64, beta2: f64, eps: f64, weight_decay: f64) -> Adam {
        Adam {
            learning_rate,
            beta1,
            beta2,
            eps,
            weight_decay,
            decoupled: false,
            moments: HashMap::new(),
            steps: 0,
        }
    }

    pub fn decoupled(learning_rate: f64, beta1: f64, beta2: f64, eps: f64, weight_decay: f64) -> Adam {
        Adam { decoupled: true, ..Adam::new(learning_rate, beta1, beta2, eps, weight_decay) }
    }
}

impl Optimizer for Adam {
    fn step(&mut self, params: Vec<(String, &mut Parameter)>) {
        self.steps += 1;
        let bc1 = 1.0 - self.beta1.powi(self.steps as i32);
        let bc2 = 1.0 - self.beta2.powi(self.steps as i32);

        for (name, param) in params {
            let n = param.value.data.len();
            let (m, v) = self.moments.entry(name).or_insert_with(|| (vec![0.0; n], vec![0.0; n]));

            for i in 0..n {
                let w = param.value.data[i];
                let mut g = param.grad.data[i];
                if self.decoupled {
                    param.value.data[i] = w - self.learning_rate * self.weight_decay * w;
                } else {
                    g += self.weight_decay * w;
                }

                m[i] = self.beta1 * m[i] + (1.0 - self.beta1) * g;
                v[i] = self.beta2 * v[i] + (1.0 - self.beta2) * g * g;
                let m_hat = m[i] / bc1;
                let v_hat = v[i] / bc2;
                param.value.data[i] -= self.learning_rate * m_hat / (v_hat.sqrt() + self.eps);
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
