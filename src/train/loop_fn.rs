use tracing::{debug, info, warn};

use crate::config::{Device, ExperimentConfig};
use crate::data::loader::DataLoader;
use crate::error::{Error, Result};
use crate::loss::{choose_criterion2d, choose_criterion3d, Criterion2d, Criterion3d};
use crate::metrics::{confusion_counts, ConfusionCounts, ConfusionError, PhaseAccumulator, PhaseMetrics, RegressionScores};
use crate::model::ChangeModel;
use crate::optim::{set_optimizer, set_scheduler, LrScheduler, Optimizer};
use crate::train::checkpoint::{save_checkpoint, TAG_2D, TAG_3D};
use crate::train::context::RunContext;
use crate::train::epoch_stats::{EpochLosses, EpochRecord, TestRecord};
use crate::train::scaler::ValueScaler;

/// Everything needed to optimize and score one model.
pub struct Trainer {
    pub model: Box<dyn ChangeModel>,
    pub criterion2d: Box<dyn Criterion2d>,
    pub criterion3d: Box<dyn Criterion3d>,
    pub optimizer: Box<dyn Optimizer>,
    pub scheduler: Box<dyn LrScheduler>,
    pub scaler: ValueScaler,
    /// Loss weight of the 2-D head.
    pub w2d: f64,
    /// Loss weight of the 3-D head.
    pub w3d: f64,
    /// Log per-batch scores during the test phase.
    pub verbose: bool,
}

impl Trainer {
    /// Wires losses, optimizer, scheduler and target scaling from `cfg`.
    pub fn from_config(model: Box<dyn ChangeModel>, cfg: &ExperimentConfig, verbose: bool) -> Result<Trainer> {
        let m = &cfg.model;
        let criterion2d = choose_criterion2d(&m.loss_2d, &m.class_weights_2d)?;
        let criterion3d = choose_criterion3d(&m.loss_3d, m.exclude_zeros)?;
        info!(loss2d = %m.loss_2d, loss3d = %m.loss_3d, exclude_zeros = m.exclude_zeros, "Losses selected");
        let (w2d, w3d) = cfg.loss_weights();
        Ok(Trainer {
            model,
            criterion2d,
            criterion3d,
            optimizer: set_optimizer(&cfg.optim)?,
            scheduler: set_scheduler(&cfg.optim)?,
            scaler: ValueScaler::new(cfg.data.min_value, cfg.data.max_value)?,
            w2d,
            w3d,
            verbose,
        })
    }

    // -----------------------------------------------------------------------
    // Phases
    // -----------------------------------------------------------------------

    /// One pass over the training set.
    ///
    /// Batch losses are weighted by the number of samples actually in the
    /// batch and divided by the dataset size, so a partial final batch counts
    /// proportionally.
    pub fn train_epoch(&mut self, loader: &mut DataLoader<'_>, device: Device) -> Result<EpochLosses> {
        let n = loader.dataset_len();
        if n == 0 {
            return Err(Error::dataset("training set is empty"));
        }
        self.model.set_training(true);

        let (mut sum2d, mut sum3d) = (0.0, 0.0);
        for batch in loader.epoch() {
            let batch = batch?.to_device(device);
            let samples = batch.len() as f64;

            let labels = batch.mask2d.to_class_labels()?;
            let target3d = self.scaler.normalize(&batch.mask3d);

            let out = self.model.forward(&batch.t1, &batch.t2)?;
            let l2 = self.criterion2d.compute(&out.out2d, &labels)?;
            let l3 = self.criterion3d.compute(&out.out3d.squeeze(1)?, &target3d, &batch.mask3d)?;

            self.model.zero_grad();
            let grad2d = l2.grad.scale(self.w2d);
            let grad3d = l3.grad.scale(self.w3d).unsqueeze(1)?;
            self.model.backward(&grad2d, &grad3d)?;
            self.optimizer.step(self.model.parameters_mut());

            sum2d += l2.value * samples;
            sum3d += l3.value * samples;
        }

        let loss2d = sum2d / n as f64;
        let loss3d = sum3d / n as f64;
        Ok(EpochLosses { loss2d, loss3d, loss: self.w2d * loss2d + self.w3d * loss3d })
    }

    /// Scores the model on `loader` without updating it.
    ///
    /// With `verbose`, per-batch confusion counts and errors are logged.
    pub fn evaluate(&mut self, loader: &mut DataLoader<'_>, device: Device, verbose: bool) -> Result<PhaseMetrics> {
        self.model.set_training(false);
        let mut acc = PhaseAccumulator::new();

        for (index, batch) in loader.epoch().enumerate() {
            let batch = batch?.to_device(device);
            let out = self.model.forward(&batch.t1, &batch.t2)?;

            let truth = batch.mask2d.to_class_labels()?;
            let prediction = out.out2d.argmax_channels()?;
            let counts = match confusion_counts(&truth, &prediction) {
                Ok(counts) => counts,
                Err(ConfusionError::NotBinary { distinct }) => {
                    warn!(batch = index, distinct, "Confusion matrix needs exactly two labels, batch adds no counts");
                    ConfusionCounts::default()
                }
                Err(e) => return Err(Error::shape(e.to_string())),
            };

            let pred3d = self.scaler.denormalize(&out.out3d.squeeze(1)?);
            if pred3d.shape() != batch.mask3d.shape() {
                return Err(Error::shape(format!(
                    "3D prediction {:?} does not match target {:?}",
                    pred3d.shape(),
                    batch.mask3d.shape()
                )));
            }
            let scores = RegressionScores::compute(batch.mask3d.data(), pred3d.data());

            if verbose {
                info!(
                    batch = index,
                    tn = counts.tn,
                    fn_ = counts.fn_,
                    tp = counts.tp,
                    fp = counts.fp,
                    mae = scores.mae,
                    rmse = scores.mse.sqrt(),
                    max_error = scores.max_error,
                    max_truth = batch.mask3d.max_abs(),
                    "Test batch"
                );
            }
            acc.push(counts, &scores);
        }
        Ok(acc.finish())
    }

    /// Runs epochs `1..=num_epochs`: train, advance the schedule, validate,
    /// save whichever checkpoints improved, and append the epoch record.
    pub fn fit(
        &mut self,
        train_loader: &mut DataLoader<'_>,
        val_loader: &mut DataLoader<'_>,
        num_epochs: usize,
        ctx: &mut RunContext,
    ) -> Result<()> {
        for epoch in 1..=num_epochs {
            info!(epoch, num_epochs, lr = self.optimizer.learning_rate(), "Starting epoch");

            let losses = self.train_epoch(train_loader, ctx.device)?;
            self.scheduler.step(self.optimizer.as_mut());
            let val = self.evaluate(val_loader, ctx.device, false)?;

            let decision = ctx.trackers.update(val.f1, val.crmse);
            if decision.save2d {
                save_checkpoint(self.model.as_ref(), &ctx.out_dir, TAG_2D)?;
            }
            if decision.save3d {
                save_checkpoint(self.model.as_ref(), &ctx.out_dir, TAG_3D)?;
            }

            let record = EpochRecord::new(epoch, &losses, &val);
            ctx.stats.append_record(&record)?;
            info!(
                epoch,
                loss = losses.loss,
                loss2d = losses.loss2d,
                loss3d = losses.loss3d,
                f1 = record.f1,
                iou = record.iou,
                rmse = val.rmse,
                crmse = val.crmse,
                "Epoch finished"
            );
            debug!(?decision, "Checkpoint decision");
        }
        Ok(())
    }

    /// Scores the test set and appends the `"Test"` record. Never writes
    /// checkpoints.
    pub fn test(&mut self, loader: &mut DataLoader<'_>, ctx: &mut RunContext) -> Result<PhaseMetrics> {
        let metrics = self.evaluate(loader, ctx.device, self.verbose)?;
        ctx.stats.append_record(&TestRecord::new(&metrics))?;
        info!(
            mae = metrics.mae,
            rmse = metrics.rmse,
            crmse = metrics.crmse,
            f1 = metrics.f1 * 100.0,
            iou = metrics.iou * 100.0,
            "Test finished"
        );
        Ok(metrics)
    }
}
