//! Datasets of co-registered image pairs with 2-D and 3-D ground truth, and
//! the loader that batches them.

pub mod dataset;
pub mod folder;
pub mod loader;
pub mod sample;
pub mod transform;

pub use dataset::{ChangeDataset, InMemoryDataset};
pub use folder::FolderDataset;
pub use loader::{Batches, DataLoader};
pub use sample::{Batch, Sample};
pub use transform::{training_transform, validation_transform, Normalize, Transform};
