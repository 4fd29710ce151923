use std::path::PathBuf;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::{Device, RunConfig};
use crate::train::checkpoint::BestTrackers;
use crate::train::stats_log::StatsLog;

/// Mutable state shared by every phase of one run.
#[derive(Debug)]
pub struct RunContext {
    pub device: Device,
    pub seed: u64,
    /// Drives weight initialization. Loaders derive their own generators
    /// from `seed`.
    pub rng: StdRng,
    pub trackers: BestTrackers,
    pub out_dir: PathBuf,
    pub stats: StatsLog,
}

impl RunContext {
    pub fn new(run: &RunConfig, out_dir: PathBuf, stats: StatsLog) -> RunContext {
        RunContext {
            device: run.device,
            seed: run.seed,
            rng: StdRng::seed_from_u64(run.seed),
            trackers: BestTrackers::default(),
            out_dir,
            stats,
        }
    }
}
