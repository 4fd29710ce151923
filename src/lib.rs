pub mod math;
pub mod activation;
pub mod layers;
pub mod model;
pub mod loss;
pub mod optim;
pub mod data;
pub mod config;
pub mod metrics;
pub mod train;
pub mod error;

// Convenience re-exports
pub use math::matrix::Matrix;
pub use math::tensor::Tensor;
pub use activation::activation::ActivationFunction;
pub use layers::{Dense, Parameter};
pub use model::{ChangeModel, DualOutput, ModelKind, ModelRegistry, PixelDualHead, StateDict};
pub use config::{ExperimentConfig, RunDirs};
pub use data::{Batch, ChangeDataset, DataLoader, FolderDataset, InMemoryDataset, Sample};
pub use metrics::{ConfusionCounts, PhaseMetrics};
pub use train::{run_experiment, RunArgs, RunContext, RunSummary, Trainer};
pub use error::{Error, Result};
