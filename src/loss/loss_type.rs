use std::str::FromStr;

use crate::error::{Error, Result};
use crate::loss::{Criterion2d, Criterion3d, CrossEntropyLoss, HuberLoss, MaeLoss, MseLoss};

/// Losses available for the 2-D head.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Loss2dType {
    CrossEntropy,
}

/// Losses available for the 3-D head.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Loss3dType {
    Mse,
    Mae,
    Huber,
}

impl FromStr for Loss2dType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "cross_entropy" | "crossentropy" | "ce" | "wce" => Ok(Loss2dType::CrossEntropy),
            other => Err(Error::config(format!("unknown 2D loss '{}'", other))),
        }
    }
}

impl FromStr for Loss3dType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "mse" | "l2" => Ok(Loss3dType::Mse),
            "mae" | "l1" => Ok(Loss3dType::Mae),
            "huber" | "smooth_l1" | "smoothl1" => Ok(Loss3dType::Huber),
            other => Err(Error::config(format!("unknown 3D loss '{}'", other))),
        }
    }
}

/// Builds the 2-D criterion named `name` with per-class weights.
pub fn choose_criterion2d(name: &str, class_weights: &[f64]) -> Result<Box<dyn Criterion2d>> {
    match name.parse::<Loss2dType>()? {
        Loss2dType::CrossEntropy => Ok(Box::new(CrossEntropyLoss::new(class_weights.to_vec()))),
    }
}

/// Builds the 3-D criterion named `name`.
pub fn choose_criterion3d(name: &str, exclude_zeros: bool) -> Result<Box<dyn Criterion3d>> {
    Ok(match name.parse::<Loss3dType>()? {
        Loss3dType::Mse => Box::new(MseLoss::new(exclude_zeros)),
        Loss3dType::Mae => Box::new(MaeLoss::new(exclude_zeros)),
        Loss3dType::Huber => Box::new(HuberLoss::new(exclude_zeros)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aliases() {
        assert_eq!("smooth_l1".parse::<Loss3dType>().unwrap(), Loss3dType::Huber);
        assert_eq!("L1".parse::<Loss3dType>().unwrap(), Loss3dType::Mae);
        assert_eq!("wce".parse::<Loss2dType>().unwrap(), Loss2dType::CrossEntropy);
    }

    #[test]
    fn test_unknown_names() {
        assert!(matches!(choose_criterion3d("ssim", false), Err(Error::Config(_))));
        assert!(matches!(choose_criterion2d("dice", &[1.0, 1.0]), Err(Error::Config(_))));
    }
}
