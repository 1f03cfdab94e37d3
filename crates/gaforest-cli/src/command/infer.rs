use std::{path::PathBuf, time::Instant};

use anyhow::Context as _;
use gaforest_data::csv::DEFAULT_N_FEATURES;
use gaforest_inference::{
    Evaluation, SoftwareOracle, VOTE_CLASSES, count_mismatches, predict_in_bursts,
};
use gaforest_tree::{TreeTemplate, model_file::open_model_file};

use crate::util::{print_class_accuracy, read_dataset_file};

const DEFAULT_N_TREES: usize = 128;

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct InferArg {
    /// Samples to classify (comma-separated, label in the last column)
    dataset: PathBuf,
    /// Model file written by `train`
    model: PathBuf,
    /// Number of trees in the model
    #[arg(long, default_value_t = DEFAULT_N_TREES)]
    n_trees: usize,
    /// Feature vector length of every sample
    #[arg(long, default_value_t = DEFAULT_N_FEATURES)]
    n_features: usize,
    /// Classes counted by the ensemble vote
    #[arg(long, default_value_t = VOTE_CLASSES)]
    vote_classes: usize,
}

pub(crate) fn run(arg: &InferArg) -> anyhow::Result<()> {
    let InferArg {
        dataset,
        model,
        n_trees,
        n_features,
        vote_classes,
    } = arg;

    let template = TreeTemplate::standard();
    let load = read_dataset_file(dataset, *n_features)?;
    let ensemble = open_model_file(model, *n_trees, template.len())
        .with_context(|| format!("Failed to load model file: {}", model.display()))?;
    eprintln!("Loaded {} trees from {}", ensemble.len(), model.display());

    let mut oracle = SoftwareOracle::new(template, *n_features, *vote_classes);
    let samples = load.dataset.samples();
    let started = Instant::now();
    let predictions = predict_in_bursts(&mut oracle, &ensemble, samples)
        .context("Inference failed")?;
    let oracle_elapsed = started.elapsed();
    let n_abstained = predictions.iter().filter(|p| p.is_none()).count();

    // cross-check against host traversal
    let started = Instant::now();
    let n_mismatches = count_mismatches(&ensemble, samples, &predictions, *vote_classes);
    let traversal_elapsed = started.elapsed();

    let evaluation = Evaluation::from_predictions(samples, &predictions, load.dataset.n_classes())
        .context("Inference returned an incomplete result")?;
    eprintln!();
    eprintln!("Inference completed");
    eprintln!("  Samples: {}", samples.len());
    eprintln!("  No consensus: {n_abstained}");
    eprintln!("  Mismatches against traversal: {n_mismatches}");
    eprintln!(
        "  Oracle: {:.3}s, traversal: {:.3}s, speedup {:.2}x",
        oracle_elapsed.as_secs_f64(),
        traversal_elapsed.as_secs_f64(),
        traversal_elapsed.as_secs_f64() / oracle_elapsed.as_secs_f64().max(f64::EPSILON),
    );
    print_class_accuracy(&evaluation.classes);
    if n_mismatches > 0 {
        anyhow::bail!("{n_mismatches} oracle predictions disagree with tree traversal");
    }

    Ok(())
}
