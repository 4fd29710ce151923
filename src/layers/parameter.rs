use crate::math::matrix::Matrix;

/// A learnable matrix together with its accumulated gradient.
#[derive(Debug, Clone)]
pub struct Parameter {
    pub value: Matrix,
    pub grad: Matrix,
}

impl Parameter {
    pub fn new(value: Matrix) -> Parameter {
        let grad = Matrix::zeros(value.rows, value.cols);
        Parameter { value, grad }
    }

    pub fn shape(&self) -> Vec<usize> {
        vec![self.value.rows, self.value.cols]
    }

    pub fn zero_grad(&mut self) {
        self.grad.data.iter_mut().for_each(|g| *g = 0.0);
    }

    pub fn accumulate(&mut self, grad: &Matrix) {
        self.grad = &self.grad + grad;
    }
}
