//! Validation and test metrics.
//!
//! Per-batch confusion counts and regression errors are summed over a phase
//! and reduced at the end. Every batch weighs the same regardless of its size.

pub mod accumulator;
pub mod confusion;
pub mod regression;

pub use accumulator::{PhaseAccumulator, PhaseMetrics};
pub use confusion::{confusion_counts, ConfusionCounts, ConfusionError};
pub use regression::{max_error, mean_absolute_error, mse, mse_excluding_zeros, RegressionScores};
