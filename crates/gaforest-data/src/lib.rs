//! Labelled datasets: samples, observed feature ranges, and CSV loading.

use std::{io, path::PathBuf};

pub use self::{
    csv::{CsvLoad, CsvOptions, load_csv, read_csv},
    dataset::{Dataset, Sample, fraction_of},
    range::{FeatureRange, FeatureRanges},
};

pub mod csv;
pub mod dataset;
pub mod range;

#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum DatasetError {
    #[display("failed to open dataset {}: {source}", path.display())]
    Open { path: PathBuf, source: io::Error },
    #[display("failed to read dataset: {_0}")]
    #[from]
    Read(io::Error),
    #[display("sample {index} has {found} features, expected {expected}")]
    FeatureCountMismatch {
        index: usize,
        expected: usize,
        found: usize,
    },
}
