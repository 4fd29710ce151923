use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// N-dimensional tensor: a shape plus row-major (C order) data.
///
/// Images are `[B, C, H, W]`, masks `[B, H, W]`. The model heads produce
/// `[B, classes, H, W]` and `[B, 1, H, W]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tensor {
    shape: Vec<usize>,
    data: Vec<f64>,
}

impl Tensor {
    pub fn new(shape: Vec<usize>, data: Vec<f64>) -> Result<Tensor> {
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(Error::shape(format!(
                "shape {:?} needs {} elements, got {}",
                shape,
                expected,
                data.len()
            )));
        }
        Ok(Tensor { shape, data })
    }

    pub fn zeros(shape: Vec<usize>) -> Tensor {
        Tensor::filled(shape, 0.0)
    }

    pub fn filled(shape: Vec<usize>, value: f64) -> Tensor {
        let n = shape.iter().product();
        Tensor { shape, data: vec![value; n] }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// Flattened view (the equivalent of `ravel`).
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [f64] {
        &mut self.data
    }

    pub fn into_data(self) -> Vec<f64> {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn map<F>(&self, f: F) -> Tensor
    where
        F: Fn(f64) -> f64,
    {
        Tensor {
            shape: self.shape.clone(),
            data: self.data.iter().map(|&x| f(x)).collect(),
        }
    }

    pub fn scale(&self, factor: f64) -> Tensor {
        self.map(|x| x * factor)
    }

    /// Drops axis `dim`, which must have size 1.
    pub fn squeeze(&self, dim: usize) -> Result<Tensor> {
        match self.shape.get(dim) {
            Some(1) => {
                let mut shape = self.shape.clone();
                shape.remove(dim);
                Ok(Tensor { shape, data: self.data.clone() })
            }
            other => Err(Error::shape(format!(
                "cannot squeeze axis {} of shape {:?} (size {:?})",
                dim, self.shape, other
            ))),
        }
    }

    /// Inserts a size-1 axis at `dim`.
    pub fn unsqueeze(&self, dim: usize) -> Result<Tensor> {
        if dim > self.shape.len() {
            return Err(Error::shape(format!(
                "cannot unsqueeze axis {} of shape {:?}",
                dim, self.shape
            )));
        }
        let mut shape = self.shape.clone();
        shape.insert(dim, 1);
        Ok(Tensor { shape, data: self.data.clone() })
    }

    /// Size of the leading (batch) axis.
    pub fn batch_len(&self) -> usize {
        self.shape.first().copied().unwrap_or(0)
    }

    /// Arg-max over axis 1 of a `[B, C, H, W]` tensor, returned flattened in
    /// `[B, H, W]` order.
    pub fn argmax_channels(&self) -> Result<Vec<usize>> {
        let (b, c, h, w) = self.dims4()?;
        let plane = h * w;
        let mut out = Vec::with_capacity(b * plane);
        for bi in 0..b {
            let base = bi * c * plane;
            for p in 0..plane {
                let mut best = 0;
                let mut best_val = f64::NEG_INFINITY;
                for ci in 0..c {
                    let v = self.data[base + ci * plane + p];
                    // Ties resolve to the lowest class index.
                    if v > best_val {
                        best_val = v;
                        best = ci;
                    }
                }
                out.push(best);
            }
        }
        Ok(out)
    }

    /// Interprets every element as a class index.
    pub fn to_class_labels(&self) -> Result<Vec<usize>> {
        self.data
            .iter()
            .map(|&v| {
                if v >= 0.0 && v.fract() == 0.0 {
                    Ok(v as usize)
                } else {
                    Err(Error::shape(format!("mask value {} is not a class index", v)))
                }
            })
            .collect()
    }

    pub fn max_abs(&self) -> f64 {
        self.data.iter().fold(0.0, |m, v| m.max(v.abs()))
    }

    /// `(B, C, H, W)` of a rank-4 tensor.
    pub fn dims4(&self) -> Result<(usize, usize, usize, usize)> {
        match self.shape.as_slice() {
            &[b, c, h, w] => Ok((b, c, h, w)),
            _ => Err(Error::shape(format!("expected a [B, C, H, W] tensor, got {:?}", self.shape))),
        }
    }

    /// Stacks same-shape tensors along a new leading axis.
    pub fn stack(items: &[Tensor]) -> Result<Tensor> {
        let first = items
            .first()
            .ok_or_else(|| Error::shape("cannot stack an empty list of tensors"))?;
        let mut data = Vec::with_capacity(first.len() * items.len());
        for t in items {
            if t.shape != first.shape {
                return Err(Error::shape(format!(
                    "cannot stack shapes {:?} and {:?}",
                    first.shape, t.shape
                )));
            }
            data.extend_from_slice(&t.data);
        }
        let mut shape = Vec::with_capacity(first.rank() + 1);
        shape.push(items.len());
        shape.extend_from_slice(&first.shape);
        Ok(Tensor { shape, data })
    }
}
