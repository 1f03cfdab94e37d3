use clap::{Parser, Subcommand};

use self::{infer::InferArg, train::TrainArg};

mod infer;
mod train;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Train a boosted tree ensemble with the genetic algorithm
    Train(#[clap(flatten)] TrainArg),
    /// Classify a dataset with a trained model and report its accuracy
    Infer(#[clap(flatten)] InferArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    match args.mode {
        Mode::Train(arg) => train::run(&arg)?,
        Mode::Infer(arg) => infer::run(&arg)?,
    }
    Ok(())
}
