//! The training and evaluation loop of a dual-head change-detection run.

pub mod checkpoint;
pub mod context;
pub mod epoch_stats;
pub mod experiment;
pub mod loop_fn;
pub mod scaler;
pub mod stats_log;

pub use checkpoint::{restore_checkpoint, save_checkpoint, BestTrackers, CheckpointDecision, TAG_2D, TAG_3D};
pub use context::RunContext;
pub use epoch_stats::{EpochLosses, EpochRecord, TestRecord};
pub use experiment::{execute, open_context, run_experiment, Datasets, RunArgs, RunSummary};
pub use loop_fn::Trainer;
pub use scaler::ValueScaler;
pub use stats_log::StatsLog;
