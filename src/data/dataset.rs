use crate::data::sample::Sample;
use crate::error::{Error, Result};

/// Random-access source of samples. `Sync` so loader workers can share it.
pub trait ChangeDataset: Sync {
    fn len(&self) -> usize;

    fn get(&self, index: usize) -> Result<Sample>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Samples held in memory; used for synthetic runs and tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDataset {
    samples: Vec<Sample>,
}

impl InMemoryDataset {
    pub fn new(samples: Vec<Sample>) -> InMemoryDataset {
        InMemoryDataset { samples }
    }
}

impl ChangeDataset for InMemoryDataset {
    fn len(&self) -> usize {
        self.samples.len()
    }

    fn get(&self, index: usize) -> Result<Sample> {
        self.samples
            .get(index)
            .cloned()
            .ok_or_else(|| Error::dataset(format!("index {} out of range ({} samples)", index, self.samples.len())))
    }
}
