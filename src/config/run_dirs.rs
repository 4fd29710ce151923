use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::experiment::ExperimentConfig;
use crate::error::Result;

pub const CONFIG_COPY: &str = "config.yaml";
pub const STATS_FILE: &str = "stats.txt";

/// Filesystem locations of one named experiment.
///
/// ```text
/// <config_dir>/<name>.yaml            input
/// <results_dir>/<name>/config.yaml    provenance copy
/// <results_dir>/<name>/stats.txt      append-only statistics log
/// <results_dir>/<name>/<tag>bestnet.pth
/// ```
#[derive(Debug, Clone)]
pub struct RunDirs {
    pub name: String,
    pub config_path: PathBuf,
    pub out_dir: PathBuf,
}

impl RunDirs {
    pub fn new(config_dir: &Path, results_dir: &Path, name: &str) -> RunDirs {
        RunDirs {
            name: name.to_string(),
            config_path: config_dir.join(format!("{}.yaml", name)),
            out_dir: results_dir.join(name),
        }
    }

    /// Creates the output directory (idempotent), loads the config and copies
    /// it into the output directory. A missing or malformed config is fatal.
    pub fn prepare(&self) -> Result<ExperimentConfig> {
        std::fs::create_dir_all(&self.out_dir)?;

        info!(path = %self.config_path.display(), "Loading experiment");
        let cfg = ExperimentConfig::load(&self.config_path)?;

        info!(dir = %self.out_dir.display(), "Logs and checkpoints will be stored here");
        std::fs::copy(&self.config_path, self.out_dir.join(CONFIG_COPY))?;
        info!("Config file saved");
        Ok(cfg)
    }

    pub fn stats_path(&self) -> PathBuf {
        self.out_dir.join(STATS_FILE)
    }

    /// `<out_dir>/<tag>bestnet.pth`
    pub fn checkpoint_path(&self, tag: &str) -> PathBuf {
        checkpoint_path(&self.out_dir, tag)
    }
}

pub fn checkpoint_path(out_dir: &Path, tag: &str) -> PathBuf {
    out_dir.join(format!("{}bestnet.pth", tag))
}
