use std::path::PathBuf;

use anyhow::Context as _;
use chrono::Utc;
use gaforest_data::{FeatureRanges, csv::MAX_AUGMENTED_SAMPLES};
use gaforest_inference::TraversalEvaluator;
use gaforest_training::{
    BoostingTrainer, StageSummary, TrainingObserver, TrainingParams, augment,
    seed::{AUGMENT_STREAM, RunSeed},
};
use gaforest_tree::{TreeTemplate, model_file::save_model_file};
use rand::Rng as _;

use crate::{
    schema::report::TrainingReportFile,
    util::{JsonSink, print_class_accuracy, read_dataset_file, read_json_file},
};

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct TrainArg {
    /// Training samples (comma-separated, label in the last column)
    dataset: PathBuf,
    /// Model file path
    #[arg(long, default_value = "model.bin")]
    output: PathBuf,
    /// Training parameters (JSON); missing fields take their defaults
    #[arg(long)]
    params: Option<PathBuf>,
    /// Run seed as 32 hexadecimal digits; random if omitted
    #[arg(long)]
    seed: Option<RunSeed>,
    /// Training report path (JSON), `-` for standard output
    #[arg(long)]
    report: Option<PathBuf>,
    /// Noisy copies added per sample before training
    #[arg(long, default_value_t = 0)]
    augment: usize,
    /// Evaluate population members on a single thread
    #[arg(long)]
    sequential: bool,
}

/// Prints one line per finished stage.
struct StageProgress;

impl TrainingObserver for StageProgress {
    fn on_stage(&mut self, summary: &StageSummary) {
        let holdout = summary
            .holdout_accuracy
            .map_or_else(|| "n/a".to_owned(), |a| format!("{a:.4}"));
        eprintln!(
            "Stage #{} (trees {:?}): {} generations, train {:.4}, holdout {holdout}{}",
            summary.stage,
            summary.trees,
            summary.generations,
            summary.train_accuracy,
            if summary.converged { ", converged" } else { "" },
        );
    }
}

pub(crate) fn run(arg: &TrainArg) -> anyhow::Result<()> {
    let TrainArg {
        dataset,
        output,
        params,
        seed,
        report,
        augment: augment_factor,
        sequential,
    } = arg;

    let mut params = match params {
        Some(path) => read_json_file::<TrainingParams>("training parameters", path)?,
        None => TrainingParams::default(),
    };
    if *sequential {
        params.parallel = false;
    }
    let template = TreeTemplate::standard();
    params
        .validate(template)
        .context("Invalid training parameters")?;

    let load = read_dataset_file(dataset, params.n_features)?;
    let seed = seed.unwrap_or_else(|| rand::rng().random());
    eprintln!("Seed: {seed}");

    let samples = load.dataset.into_samples();
    let pool = if *augment_factor > 0 {
        let ranges = FeatureRanges::from_samples(&samples, params.n_features);
        let pool = augment(
            &samples,
            &ranges,
            *augment_factor,
            MAX_AUGMENTED_SAMPLES,
            &mut seed.substream(AUGMENT_STREAM).fork(),
        );
        eprintln!("Augmented {} samples to {}", samples.len(), pool.len());
        pool
    } else {
        samples
    };

    let evaluator = TraversalEvaluator::new(params.vote_classes);
    let trainer = BoostingTrainer::new(params, template, &evaluator)?;
    let result = trainer.train(pool, seed, &mut StageProgress)?;

    save_model_file(output, &result.golden)
        .with_context(|| format!("Failed to save model file: {}", output.display()))?;

    eprintln!();
    eprintln!("Model saved successfully");
    eprintln!("  Path: {}", output.display());
    eprintln!("  Trees: {}", result.golden.len());
    eprintln!("  Seed: {}", result.seed);
    print_class_accuracy(&result.final_evaluation.classes);

    if let Some(path) = report {
        let name = dataset
            .file_stem()
            .map_or_else(|| "dataset".to_owned(), |s| s.to_string_lossy().into_owned());
        let report = TrainingReportFile {
            name,
            trained_at: Utc::now(),
            seed: result.seed,
            final_accuracy: result.final_evaluation.accuracy,
            final_classes: result.final_evaluation.classes,
            stages: result.stages,
            params: trainer.params().clone(),
        };
        let sink = JsonSink::create(path)?;
        let destination = sink.name();
        sink.write(&report)?;
        eprintln!("Report written to {destination}");
    }

    Ok(())
}
