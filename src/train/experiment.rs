use std::path::PathBuf;
use std::time::Instant;

use tracing::info;

use crate::config::{ExperimentConfig, RunDirs};
use crate::data::{training_transform, validation_transform, ChangeDataset, DataLoader, FolderDataset};
use crate::error::Result;
use crate::metrics::PhaseMetrics;
use crate::model::{ModelRegistry, PretrainStrategy};
use crate::train::checkpoint::{restore_checkpoint, BestTrackers};
use crate::train::context::RunContext;
use crate::train::loop_fn::Trainer;
use crate::train::stats_log::StatsLog;

/// Invocation parameters of one run.
#[derive(Debug, Clone)]
pub struct RunArgs {
    pub config_dir: PathBuf,
    pub results_dir: PathBuf,
    /// Experiment name: selects `<config_dir>/<name>.yaml` and
    /// `<results_dir>/<name>/`.
    pub name: String,
    pub num_workers: usize,
    pub verbose: bool,
    /// Command line as invoked, written to the head of the stats log.
    pub argv: Vec<String>,
}

/// The three splits of a run.
pub struct Datasets {
    pub train: Box<dyn ChangeDataset>,
    pub val: Box<dyn ChangeDataset>,
    pub test: Box<dyn ChangeDataset>,
}

impl Datasets {
    /// Opens the folder datasets named by `cfg.data`.
    pub fn from_config(cfg: &ExperimentConfig) -> Result<Datasets> {
        let d = &cfg.data;
        let classes = cfg.model.num_classes;
        let train = FolderDataset::open(&d.train.path, classes, training_transform(d.augmentations, &d.mean, &d.std))?;
        let val = FolderDataset::open(&d.val.path, classes, validation_transform(&d.mean, &d.std))?;
        let test = FolderDataset::open(&d.test.path, classes, validation_transform(&d.mean, &d.std))?;
        info!(train = train.len(), val = val.len(), test = test.len(), "Datasets opened");
        Ok(Datasets { train: Box::new(train), val: Box::new(val), test: Box::new(test) })
    }
}

/// Outcome of a completed run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    pub best: BestTrackers,
    pub test: PhaseMetrics,
}

/// Runs a full experiment from its config file with the default models and
/// the folder datasets it names.
pub fn run_experiment(args: &RunArgs) -> Result<RunSummary> {
    let dirs = RunDirs::new(&args.config_dir, &args.results_dir, &args.name);
    let cfg = dirs.prepare()?;
    let mut ctx = open_context(&dirs, &cfg, args)?;
    let datasets = Datasets::from_config(&cfg)?;
    execute(&cfg, &mut ctx, &ModelRegistry::with_defaults(), &datasets, args)
}

/// Opens the stats log and writes the invocation and the loaded config to it.
pub fn open_context(dirs: &RunDirs, cfg: &ExperimentConfig, args: &RunArgs) -> Result<RunContext> {
    let mut stats = StatsLog::open(&dirs.stats_path())?;
    stats.write_line(&args.argv.join(" "))?;
    stats.append_record(cfg)?;
    Ok(RunContext::new(&cfg.run, dirs.out_dir.clone(), stats))
}

/// Builds the model and trainer, trains, then tests the restored checkpoint.
pub fn execute(
    cfg: &ExperimentConfig,
    ctx: &mut RunContext,
    registry: &ModelRegistry,
    datasets: &Datasets,
    args: &RunArgs,
) -> Result<RunSummary> {
    let mut train_loader = DataLoader::new(
        datasets.train.as_ref(),
        cfg.data.train.batch_size,
        true,
        args.num_workers,
        ctx.seed,
    );
    let mut val_loader = DataLoader::new(datasets.val.as_ref(), 1, false, args.num_workers, ctx.seed);
    let mut test_loader = DataLoader::new(datasets.test.as_ref(), 1, false, args.num_workers, ctx.seed);

    let mut model = registry.build(&cfg.model.model, cfg.model.num_classes, &mut ctx.rng)?;
    let strategy: PretrainStrategy = cfg.model.pretraining_strategy.parse()?;
    strategy.apply(model.as_mut(), &cfg.model.checkpoints_path, &cfg.model.feature_extractor_arch)?;

    let tag = cfg.model.restore_checkpoints.as_str();
    restore_checkpoint(model.as_mut(), &ctx.out_dir, tag)?;

    let mut trainer = Trainer::from_config(model, cfg, args.verbose)?;

    let start = Instant::now();
    trainer.fit(&mut train_loader, &mut val_loader, cfg.optim.num_epochs, ctx)?;
    info!(
        elapsed = ?start.elapsed(),
        best_f1 = ctx.trackers.best2d * 100.0,
        best_crmse = ctx.trackers.best3d,
        "Training finished"
    );

    restore_checkpoint(trainer.model.as_mut(), &ctx.out_dir, tag)?;
    let test = trainer.test(&mut test_loader, ctx)?;
    Ok(RunSummary { best: ctx.trackers, test })
}
