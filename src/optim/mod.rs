//! Optimizers and per-epoch learning-rate schedules.

pub mod adam;
pub mod scheduler;
pub mod sgd;

pub use adam::Adam;
pub use scheduler::{EpochScheduler, LrScheduler, Schedule};
pub use sgd::Sgd;

use tracing::info;

use crate::config::OptimConfig;
use crate::error::{Error, Result};
use crate::layers::parameter::Parameter;

pub trait Optimizer {
    /// Applies one update to every parameter from its accumulated gradient.
    fn step(&mut self, params: Vec<(String, &mut Parameter)>);

    fn learning_rate(&self) -> f64;

    fn set_learning_rate(&mut self, lr: f64);
}

/// Builds the optimizer named by `optim_type`.
pub fn set_optimizer(cfg: &OptimConfig) -> Result<Box<dyn Optimizer>> {
    let optimizer: Box<dyn Optimizer> = match cfg.optim_type.to_ascii_lowercase().as_str() {
        "sgd" => Box::new(Sgd::new(cfg.lr, cfg.momentum, cfg.weight_decay)),
        "adam" => Box::new(Adam::new(cfg.lr, cfg.beta1, cfg.beta2, cfg.eps, cfg.weight_decay)),
        "adamw" => Box::new(Adam::decoupled(cfg.lr, cfg.beta1, cfg.beta2, cfg.eps, cfg.weight_decay)),
        other => return Err(Error::config(format!("unknown optimizer '{}'", other))),
    };
    info!(optimizer = %cfg.optim_type, lr = cfg.lr, "Optimizer selected");
    Ok(optimizer)
}

/// Builds the scheduler named by `lr_schedule_type`.
pub fn set_scheduler(cfg: &OptimConfig) -> Result<Box<dyn LrScheduler>> {
    let schedule = match cfg.lr_schedule_type.to_ascii_lowercase().as_str() {
        "none" | "constant" => Schedule::Constant,
        "step" => Schedule::Step { step_size: cfg.step_size, gamma: cfg.gamma },
        "multistep" => Schedule::MultiStep { milestones: cfg.milestones.clone(), gamma: cfg.gamma },
        "exponential" => Schedule::Exponential { gamma: cfg.gamma },
        "cosine" => Schedule::Cosine {
            t_max: cfg.t_max.unwrap_or(cfg.num_epochs),
            eta_min: cfg.eta_min,
        },
        other => return Err(Error::config(format!("unknown lr schedule '{}'", other))),
    };
    if let Schedule::Step { step_size: 0, .. } | Schedule::Cosine { t_max: 0, .. } = schedule {
        return Err(Error::config(format!("lr schedule '{}' needs a positive period", cfg.lr_schedule_type)));
    }
    info!(scheduler = %cfg.lr_schedule_type, "Scheduler selected");
    Ok(Box::new(EpochScheduler::new(schedule, cfg.lr)))
}
