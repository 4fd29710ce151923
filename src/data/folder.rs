//! Dataset read from a directory tree:
//!
//! ```text
//! <root>/t1/<name>.<png|jpg|...>   first acquisition, RGB
//! <root>/t2/<name>.<png|jpg|...>   second acquisition, same file name
//! <root>/2d/<name>.<png|jpg|...>   grayscale change mask
//! <root>/3d/<stem>.csv             elevation difference, one CSV row per image row
//! ```
//!
//! Images are scaled to `[0, 1]` and then passed through the split's
//! transform. With two classes any non-zero mask pixel is class 1; otherwise
//! the gray level is the class index.
use std::path::{Path, PathBuf};

use crate::data::dataset::ChangeDataset;
use crate::data::sample::Sample;
use crate::data::transform::Transform;
use crate::error::{Error, Result};
use crate::math::tensor::Tensor;

const IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "bmp", "gif"];

pub struct FolderDataset {
    root: PathBuf,
    /// File names under `t1/`, sorted.
    names: Vec<String>,
    num_classes: usize,
    transform: Box<dyn Transform>,
}

impl FolderDataset {
    pub fn open(root: &Path, num_classes: usize, transform: Box<dyn Transform>) -> Result<FolderDataset> {
        let t1_dir = root.join("t1");
        let entries = std::fs::read_dir(&t1_dir)
            .map_err(|e| Error::dataset(format!("cannot list {}: {}", t1_dir.display(), e)))?;

        let mut names = Vec::new();
        for entry in entries {
            let path = entry?.path();
            let is_image = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
                .unwrap_or(false);
            if is_image {
                if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();

        Ok(FolderDataset { root: root.to_path_buf(), names, num_classes, transform })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    fn load_rgb(&self, path: &Path) -> Result<Tensor> {
        let img = image::open(path)?.to_rgb8();
        let (w, h) = (img.width() as usize, img.height() as usize);
        let plane = w * h;
        let mut data = vec![0.0; 3 * plane];
        for (i, px) in img.pixels().enumerate() {
            for c in 0..3 {
                data[c * plane + i] = px[c] as f64 / 255.0;
            }
        }
        self.transform.apply(Tensor::new(vec![3, h, w], data)?)
    }

    fn load_mask(&self, path: &Path) -> Result<Tensor> {
        let img = image::open(path)?.to_luma8();
        let (w, h) = (img.width() as usize, img.height() as usize);
        let mut data = Vec::with_capacity(w * h);
        for px in img.pixels() {
            let v = px[0] as usize;
            let class = if self.num_classes == 2 { usize::from(v > 0) } else { v };
            if class >= self.num_classes {
                return Err(Error::dataset(format!(
                    "{}: mask value {} exceeds {} classes",
                    path.display(),
                    v,
                    self.num_classes
                )));
            }
            data.push(class as f64);
        }
        Tensor::new(vec![h, w], data)
    }
}

/// Parses a rectangular grid of comma-separated floats into `[rows, cols]`.
pub fn parse_elevation_csv(text: &str) -> Result<Tensor> {
    let mut data = Vec::new();
    let mut cols = None;
    let mut rows = 0;
    for (line_no, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let row: Vec<f64> = line
            .split(',')
            .map(|cell| {
                cell.trim().parse::<f64>().map_err(|_| {
                    Error::dataset(format!("line {}: '{}' is not a number", line_no + 1, cell.trim()))
                })
            })
            .collect::<Result<_>>()?;
        match cols {
            None => cols = Some(row.len()),
            Some(n) if n != row.len() => {
                return Err(Error::dataset(format!(
                    "line {}: expected {} values, got {}",
                    line_no + 1,
                    n,
                    row.len()
                )))
            }
            Some(_) => {}
        }
        data.extend(row);
        rows += 1;
    }
    Tensor::new(vec![rows, cols.unwrap_or(0)], data)
}

impl ChangeDataset for FolderDataset {
    fn len(&self) -> usize {
        self.names.len()
    }

    fn get(&self, index: usize) -> Result<Sample> {
        let name = self
            .names
            .get(index)
            .ok_or_else(|| Error::dataset(format!("index {} out of range ({} samples)", index, self.names.len())))?;
        let stem = Path::new(name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(name);

        let elevation_path = self.root.join("3d").join(format!("{}.csv", stem));
        let text = std::fs::read_to_string(&elevation_path)
            .map_err(|e| Error::dataset(format!("cannot read {}: {}", elevation_path.display(), e)))?;

        let sample = Sample {
            t1: self.load_rgb(&self.root.join("t1").join(name))?,
            t2: self.load_rgb(&self.root.join("t2").join(name))?,
            mask2d: self.load_mask(&self.root.join("2d").join(name))?,
            mask3d: parse_elevation_csv(&text)?,
        };
        sample.validate()?;
        Ok(sample)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::transform::Normalize;
    use image::{GrayImage, Luma, Rgb, RgbImage};

    #[test]
    fn test_parse_elevation_csv() {
        let t = parse_elevation_csv("1.5, -2\n0,3\n\n").unwrap();
        assert_eq!(t.shape(), &[2, 2]);
        assert_eq!(t.data(), &[1.5, -2.0, 0.0, 3.0]);
        assert!(parse_elevation_csv("1,2\n3\n").is_err());
        assert!(parse_elevation_csv("1,x\n").is_err());
    }

    #[test]
    fn test_reads_a_sample_from_disk() {
        let root = tempfile::tempdir().unwrap();
        for dir in ["t1", "t2", "2d", "3d"] {
            std::fs::create_dir_all(root.path().join(dir)).unwrap();
        }
        RgbImage::from_pixel(2, 1, Rgb([255, 0, 51])).save(root.path().join("t1/a.png")).unwrap();
        RgbImage::from_pixel(2, 1, Rgb([0, 0, 0])).save(root.path().join("t2/a.png")).unwrap();
        let mut mask = GrayImage::new(2, 1);
        mask.put_pixel(1, 0, Luma([255]));
        mask.save(root.path().join("2d/a.png")).unwrap();
        std::fs::write(root.path().join("3d/a.csv"), "0.0,4.5\n").unwrap();

        let ds = FolderDataset::open(root.path(), 2, Box::new(Normalize::new(&[0.0; 3], &[1.0; 3]))).unwrap();
        assert_eq!(ds.len(), 1);
        let s = ds.get(0).unwrap();
        assert_eq!(s.t1.shape(), &[3, 1, 2]);
        assert_eq!(s.t1.data()[0], 1.0);
        assert!((s.t1.data()[4] - 0.2).abs() < 1e-12);
        assert_eq!(s.mask2d.data(), &[0.0, 1.0]);
        assert_eq!(s.mask3d.data(), &[0.0, 4.5]);
    }
}
