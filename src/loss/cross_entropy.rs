use crate::error::{Error, Result};
use crate::loss::{Criterion2d, LossOutput};
use crate::math::tensor::Tensor;

/// Class-weighted softmax cross-entropy over the channel axis.
///
///   L = Σᵢ w[yᵢ]·(−log softmax(zᵢ)[yᵢ]) / Σᵢ w[yᵢ]
///
/// and ∂L/∂zᵢ꜀ = w[yᵢ]·(p꜀ − 1[c = yᵢ]) / Σᵢ w[yᵢ]. A batch whose labels all
/// carry zero weight contributes zero loss.
#[derive(Debug, Clone)]
pub struct CrossEntropyLoss {
    pub class_weights: Vec<f64>,
}

impl CrossEntropyLoss {
    pub fn new(class_weights: Vec<f64>) -> CrossEntropyLoss {
        CrossEntropyLoss { class_weights }
    }
}

impl Criterion2d for CrossEntropyLoss {
    fn compute(&self, logits: &Tensor, labels: &[usize]) -> Result<LossOutput> {
        let (b, c, h, w) = logits.dims4()?;
        let plane = h * w;
        if labels.len() != b * plane {
            return Err(Error::shape(format!(
                "{} labels for logits of shape {:?}",
                labels.len(),
                logits.shape()
            )));
        }
        if self.class_weights.len() != c {
            return Err(Error::shape(format!(
                "{} class weights for {} classes",
                self.class_weights.len(),
                c
            )));
        }

        let z = logits.data();
        let mut grad = Tensor::zeros(logits.shape().to_vec());
        let g = grad.data_mut();
        let mut total = 0.0;
        let mut weight_sum = 0.0;
        let mut probs = vec![0.0; c];

        for bi in 0..b {
            let base = bi * c * plane;
            for p in 0..plane {
                let y = labels[bi * plane + p];
                if y >= c {
                    return Err(Error::shape(format!("label {} out of range for {} classes", y, c)));
                }

                // Numerically stable softmax.
                let max = (0..c).map(|ci| z[base + ci * plane + p]).fold(f64::NEG_INFINITY, f64::max);
                let mut denom = 0.0;
                for (ci, prob) in probs.iter_mut().enumerate() {
                    *prob = (z[base + ci * plane + p] - max).exp();
                    denom += *prob;
                }
                probs.iter_mut().for_each(|prob| *prob /= denom);

                let wy = self.class_weights[y];
                total += -wy * (z[base + y * plane + p] - max - denom.ln());
                weight_sum += wy;
                for (ci, prob) in probs.iter().enumerate() {
                    let target = if ci == y { 1.0 } else { 0.0 };
                    g[base + ci * plane + p] = wy * (prob - target);
                }
            }
        }

        if weight_sum == 0.0 {
            return Ok(LossOutput { value: 0.0, grad: Tensor::zeros(logits.shape().to_vec()) });
        }
        let inv = 1.0 / weight_sum;
        g.iter_mut().for_each(|v| *v *= inv);
        Ok(LossOutput { value: total * inv, grad })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_logits_give_log_c() {
        let logits = Tensor::zeros(vec![1, 2, 1, 2]);
        let out = CrossEntropyLoss::new(vec![1.0, 1.0]).compute(&logits, &[0, 1]).unwrap();
        assert!((out.value - 2f64.ln()).abs() < 1e-12);
        // p = 0.5 everywhere, each pixel contributes ±0.5 / 2
        assert_eq!(out.grad.data(), &[-0.25, 0.25, 0.25, -0.25]);
    }

    #[test]
    fn test_weights_follow_weighted_mean() {
        // Pixel 0: label 0, perfectly confident; pixel 1: label 1, uniform.
        let logits = Tensor::new(vec![1, 2, 1, 2], vec![50.0, 0.0, -50.0, 0.0]).unwrap();
        let out = CrossEntropyLoss::new(vec![1.0, 3.0]).compute(&logits, &[0, 1]).unwrap();
        // (1·0 + 3·ln 2) / (1 + 3)
        assert!((out.value - 3.0 * 2f64.ln() / 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_gradient_matches_finite_difference() {
        let logits = Tensor::new(vec![1, 3, 1, 1], vec![0.2, -0.7, 1.1]).unwrap();
        let loss = CrossEntropyLoss::new(vec![0.5, 1.0, 2.0]);
        let out = loss.compute(&logits, &[2]).unwrap();
        let h = 1e-6;
        for i in 0..3 {
            let mut plus = logits.clone();
            plus.data_mut()[i] += h;
            let mut minus = logits.clone();
            minus.data_mut()[i] -= h;
            let numeric = (loss.compute(&plus, &[2]).unwrap().value - loss.compute(&minus, &[2]).unwrap().value) / (2.0 * h);
            assert!((numeric - out.grad.data()[i]).abs() < 1e-6);
        }
    }

    #[test]
    fn test_out_of_range_label() {
        let logits = Tensor::zeros(vec![1, 2, 1, 1]);
        assert!(CrossEntropyLoss::new(vec![1.0, 1.0]).compute(&logits, &[2]).is_err());
    }
}
