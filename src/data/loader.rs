use std::thread;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::data::dataset::ChangeDataset;
use crate::data::sample::{Batch, Sample};
use crate::error::{Error, Result};

/// Batches a dataset, optionally reshuffling every epoch.
///
/// Samples of a batch are read by up to `num_workers` scoped threads; the
/// resulting batch keeps the order of the index list, so iteration order only
/// depends on the shuffle.
pub struct DataLoader<'a> {
    dataset: &'a dyn ChangeDataset,
    batch_size: usize,
    shuffle: bool,
    num_workers: usize,
    rng: StdRng,
}

impl<'a> DataLoader<'a> {
    pub fn new(dataset: &'a dyn ChangeDataset, batch_size: usize, shuffle: bool, num_workers: usize, seed: u64) -> DataLoader<'a> {
        DataLoader {
            dataset,
            batch_size: batch_size.max(1),
            shuffle,
            num_workers,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Number of samples in the underlying dataset.
    pub fn dataset_len(&self) -> usize {
        self.dataset.len()
    }

    /// Number of batches per epoch, counting a partial final batch.
    pub fn len(&self) -> usize {
        self.dataset.len().div_ceil(self.batch_size)
    }

    pub fn is_empty(&self) -> bool {
        self.dataset.is_empty()
    }

    /// Starts a new pass over the dataset.
    pub fn epoch(&mut self) -> Batches<'a> {
        let mut order: Vec<usize> = (0..self.dataset.len()).collect();
        if self.shuffle {
            order.shuffle(&mut self.rng);
        }
        Batches {
            dataset: self.dataset,
            batch_size: self.batch_size,
            num_workers: self.num_workers,
            order,
            cursor: 0,
        }
    }
}

/// One epoch of batches.
pub struct Batches<'a> {
    dataset: &'a dyn ChangeDataset,
    batch_size: usize,
    num_workers: usize,
    order: Vec<usize>,
    cursor: usize,
}

impl Iterator for Batches<'_> {
    type Item = Result<Batch>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor >= self.order.len() {
            return None;
        }
        let end = (self.cursor + self.batch_size).min(self.order.len());
        let indices = &self.order[self.cursor..end];
        self.cursor = end;
        Some(load_samples(self.dataset, indices, self.num_workers).and_then(|s| Batch::collate(&s)))
    }
}

fn load_samples(dataset: &dyn ChangeDataset, indices: &[usize], num_workers: usize) -> Result<Vec<Sample>> {
    if num_workers <= 1 || indices.len() <= 1 {
        return indices.iter().map(|&i| dataset.get(i)).collect();
    }

    let chunk = indices.len().div_ceil(num_workers);
    let results: Vec<Result<Vec<Sample>>> = thread::scope(|scope| {
        let handles: Vec<_> = indices
            .chunks(chunk)
            .map(|part| scope.spawn(move || part.iter().map(|&i| dataset.get(i)).collect::<Result<Vec<_>>>()))
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap_or_else(|_| Err(Error::dataset("loader worker panicked"))))
            .collect()
    });

    let mut samples = Vec::with_capacity(indices.len());
    for part in results {
        samples.extend(part?);
    }
    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::dataset::InMemoryDataset;
    use crate::math::tensor::Tensor;

    fn dataset(n: usize) -> InMemoryDataset {
        InMemoryDataset::new(
            (0..n)
                .map(|i| Sample {
                    t1: Tensor::filled(vec![3, 1, 1], i as f64),
                    t2: Tensor::filled(vec![3, 1, 1], i as f64),
                    mask2d: Tensor::zeros(vec![1, 1]),
                    mask3d: Tensor::filled(vec![1, 1], i as f64),
                })
                .collect(),
        )
    }

    fn ids(batch: &Batch) -> Vec<f64> {
        batch.mask3d.data().to_vec()
    }

    #[test]
    fn test_partial_final_batch() {
        let ds = dataset(5);
        let mut loader = DataLoader::new(&ds, 2, false, 0, 1);
        assert_eq!(loader.len(), 3);
        let batches: Vec<Batch> = loader.epoch().collect::<Result<_>>().unwrap();
        assert_eq!(batches.iter().map(Batch::len).collect::<Vec<_>>(), vec![2, 2, 1]);
        assert_eq!(ids(&batches[2]), vec![4.0]);
    }

    #[test]
    fn test_workers_preserve_order() {
        let ds = dataset(7);
        let mut serial = DataLoader::new(&ds, 7, true, 0, 42);
        let mut parallel = DataLoader::new(&ds, 7, true, 3, 42);
        let a = serial.epoch().next().unwrap().unwrap();
        let b = parallel.epoch().next().unwrap().unwrap();
        assert_eq!(ids(&a), ids(&b));
    }

    #[test]
    fn test_shuffle_is_seeded_and_covers_everything() {
        let ds = dataset(6);
        let mut loader = DataLoader::new(&ds, 6, true, 0, 9);
        let mut seen = ids(&loader.epoch().next().unwrap().unwrap());
        seen.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(seen, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
    }
}
