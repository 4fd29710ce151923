//! Experiment configuration and run directory setup.

pub mod experiment;
pub mod run_dirs;

pub use experiment::{DataConfig, Device, ExperimentConfig, ModelConfig, OptimConfig, RunConfig, Split, TrainSplit};
pub use run_dirs::RunDirs;
