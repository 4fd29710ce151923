use std::f64::consts::PI;

use crate::optim::Optimizer;

/// Advances the learning rate once per epoch.
pub trait LrScheduler {
    fn step(&mut self, optimizer: &mut dyn Optimizer);
}

#[derive(Debug, Clone, PartialEq)]
pub enum Schedule {
    Constant,
    /// Multiply by `gamma` every `step_size` epochs.
    Step { step_size: usize, gamma: f64 },
    /// Multiply by `gamma` at each milestone epoch.
    MultiStep { milestones: Vec<usize>, gamma: f64 },
    Exponential { gamma: f64 },
    /// Cosine annealing from the base rate to `eta_min` over `t_max` epochs.
    Cosine { t_max: usize, eta_min: f64 },
}

/// Closed-form schedule evaluated at the number of completed epochs.
#[derive(Debug, Clone)]
pub struct EpochScheduler {
    pub schedule: Schedule,
    pub base_lr: f64,
    epoch: usize,
}

impl EpochScheduler {
    pub fn new(schedule: Schedule, base_lr: f64) -> EpochScheduler {
        EpochScheduler { schedule, base_lr, epoch: 0 }
    }

    pub fn lr_at(&self, epoch: usize) -> f64 {
        match &self.schedule {
            Schedule::Constant => self.base_lr,
            Schedule::Step { step_size, gamma } => self.base_lr * gamma.powi((epoch / step_size) as i32),
            Schedule::MultiStep { milestones, gamma } => {
                let passed = milestones.iter().filter(|&&m| m <= epoch).count();
                self.base_lr * gamma.powi(passed as i32)
            }
            Schedule::Exponential { gamma } => self.base_lr * gamma.powi(epoch as i32),
            Schedule::Cosine { t_max, eta_min } => {
                let t = epoch.min(*t_max) as f64;
                eta_min + (self.base_lr - eta_min) * (1.0 + (PI * t / *t_max as f64).cos()) / 2.0
            }
        }
    }
}

impl LrScheduler for EpochScheduler {
    fn step(&mut self, optimizer: &mut dyn Optimizer) {
        self.epoch += 1;
        optimizer.set_learning_rate(self.lr_at(self.epoch));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optim::sgd::Sgd;

    #[test]
    fn test_step_schedule() {
        let mut opt = Sgd::new(1.0, 0.0, 0.0);
        let mut s = EpochScheduler::new(Schedule::Step { step_size: 2, gamma: 0.5 }, 1.0);
        let lrs: Vec<f64> = (0..4)
            .map(|_| {
                s.step(&mut opt);
                opt.learning_rate()
            })
            .collect();
        assert_eq!(lrs, vec![1.0, 0.5, 0.5, 0.25]);
    }

    #[test]
    fn test_multistep_and_cosine() {
        let ms = EpochScheduler::new(Schedule::MultiStep { milestones: vec![1, 3], gamma: 0.1 }, 1.0);
        assert_eq!(ms.lr_at(0), 1.0);
        assert!((ms.lr_at(3) - 0.01).abs() < 1e-12);

        let cos = EpochScheduler::new(Schedule::Cosine { t_max: 10, eta_min: 0.0 }, 1.0);
        assert!((cos.lr_at(5) - 0.5).abs() < 1e-12);
        assert!(cos.lr_at(10).abs() < 1e-12);
        assert!(cos.lr_at(20).abs() < 1e-12);
    }
}
