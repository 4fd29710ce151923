use crate::config::Device;
use crate::error::{Error, Result};
use crate::math::tensor::Tensor;

/// One aligned sample: two `[C, H, W]` images and two `[H, W]` masks.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub t1: Tensor,
    pub t2: Tensor,
    /// Class index per pixel.
    pub mask2d: Tensor,
    /// Elevation difference per pixel, in physical units.
    pub mask3d: Tensor,
}

impl Sample {
    /// Checks that all four tensors agree on `H × W`.
    pub fn validate(&self) -> Result<()> {
        let plane = self.mask2d.shape();
        let ok = self.t1.rank() == 3
            && self.t1.shape() == self.t2.shape()
            && plane.len() == 2
            && self.t1.shape()[1..] == plane[..]
            && self.mask3d.shape() == plane;
        if !ok {
            return Err(Error::dataset(format!(
                "misaligned sample: t1 {:?}, t2 {:?}, mask2d {:?}, mask3d {:?}",
                self.t1.shape(),
                self.t2.shape(),
                self.mask2d.shape(),
                self.mask3d.shape()
            )));
        }
        Ok(())
    }
}

/// Samples stacked along a leading batch axis.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub t1: Tensor,
    pub t2: Tensor,
    pub mask2d: Tensor,
    pub mask3d: Tensor,
}

impl Batch {
    pub fn collate(samples: &[Sample]) -> Result<Batch> {
        for s in samples {
            s.validate()?;
        }
        fn stack(samples: &[Sample], field: fn(&Sample) -> &Tensor) -> Result<Tensor> {
            let items: Vec<Tensor> = samples.iter().map(|s| field(s).clone()).collect();
            Tensor::stack(&items)
        }
        Ok(Batch {
            t1: stack(samples, |s| &s.t1)?,
            t2: stack(samples, |s| &s.t2)?,
            mask2d: stack(samples, |s| &s.mask2d)?,
            mask3d: stack(samples, |s| &s.mask3d)?,
        })
    }

    /// Number of samples in the batch.
    pub fn len(&self) -> usize {
        self.t1.batch_len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Places the batch on `device`.
    pub fn to_device(self, device: Device) -> Batch {
        match device {
            Device::Cpu => self,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(fill: f64) -> Sample {
        Sample {
            t1: Tensor::filled(vec![3, 2, 2], fill),
            t2: Tensor::filled(vec![3, 2, 2], fill),
            mask2d: Tensor::zeros(vec![2, 2]),
            mask3d: Tensor::filled(vec![2, 2], fill),
        }
    }

    #[test]
    fn test_collate() {
        let batch = Batch::collate(&[sample(1.0), sample(2.0)]).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.t1.shape(), &[2, 3, 2, 2]);
        assert_eq!(batch.mask3d.shape(), &[2, 2, 2]);
        assert_eq!(batch.mask3d.data()[4], 2.0);
    }

    #[test]
    fn test_misaligned_sample() {
        let mut s = sample(1.0);
        s.mask3d = Tensor::zeros(vec![3, 3]);
        assert!(matches!(Batch::collate(&[s]), Err(Error::Dataset(_))));
    }
}
