//! Best-effort comma-separated dataset reader.
//!
//! Each line holds feature values followed by the class label. The reader never rejects a
//! line it can split:
//!
//! - lines longer than [`MAX_LINE_LENGTH`] bytes are truncated;
//! - empty fields (`a,,b`) are skipped, so consecutive commas act as one separator;
//! - fields that do not parse as numbers read as `0.0`;
//! - only the first `n_features + 1` fields are used, and the last of those is the label;
//! - features missing from a short line stay `0.0`;
//! - labels are converted to `u8`, saturating at the bounds;
//! - blank lines are skipped.

use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use log::{debug, warn};

use crate::{
    DatasetError,
    dataset::{Dataset, Sample},
};

/// Lines are truncated to this many bytes.
pub const MAX_LINE_LENGTH: usize = 1024;

/// Default limit on the number of samples read.
pub const MAX_SAMPLES: usize = 30_000;

/// Limit on the training pool after noisy copies are added.
pub const MAX_AUGMENTED_SAMPLES: usize = 10 * MAX_SAMPLES;

/// Default number of features per sample.
pub const DEFAULT_N_FEATURES: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvOptions {
    /// Feature vector length of every sample.
    pub n_features: usize,
    /// Stop after this many samples.
    pub max_samples: usize,
    /// Truncate lines longer than this many bytes.
    pub max_line_length: usize,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            n_features: DEFAULT_N_FEATURES,
            max_samples: MAX_SAMPLES,
            max_line_length: MAX_LINE_LENGTH,
        }
    }
}

/// Result of reading a dataset file.
#[derive(Debug, Clone)]
pub struct CsvLoad {
    pub dataset: Dataset,
    /// Number of feature fields (excluding the label) on the last line read.
    pub feature_columns: usize,
}

/// Reads samples from `reader`.
pub fn read_csv<R>(mut reader: R, options: &CsvOptions) -> Result<CsvLoad, DatasetError>
where
    R: BufRead,
{
    let mut samples = vec![];
    let mut feature_columns = 0;
    let mut truncated_lines = 0;
    let mut unparsable_fields = 0;
    let mut line = vec![];

    while samples.len() < options.max_samples {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            break;
        }
        if line.len() > options.max_line_length {
            line.truncate(options.max_line_length);
            truncated_lines += 1;
        }

        let text = String::from_utf8_lossy(&line);
        let fields = text
            .trim_end_matches(['\r', '\n'])
            .split(',')
            .filter(|field| !field.is_empty())
            .take(options.n_features + 1)
            .map(|field| {
                field.trim().parse::<f32>().unwrap_or_else(|_| {
                    unparsable_fields += 1;
                    0.0
                })
            })
            .collect::<Vec<_>>();
        let Some((&label, feature_values)) = fields.split_last() else {
            continue;
        };

        let mut features = vec![0.0; options.n_features];
        features[..feature_values.len()].copy_from_slice(feature_values);
        feature_columns = feature_values.len();
        samples.push(Sample::new(features, label_from_value(label)));
    }

    if truncated_lines > 0 {
        warn!("{truncated_lines} lines exceeded {} bytes and were truncated", options.max_line_length);
    }
    if unparsable_fields > 0 {
        warn!("{unparsable_fields} unparsable fields were read as 0");
    }
    debug!("read {} samples with {feature_columns} feature columns", samples.len());

    Ok(CsvLoad {
        dataset: Dataset::new(samples, options.n_features)?,
        feature_columns,
    })
}

/// Opens and reads a dataset file.
pub fn load_csv<P>(path: P, options: &CsvOptions) -> Result<CsvLoad, DatasetError>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| DatasetError::Open {
        path: path.to_owned(),
        source,
    })?;
    read_csv(BufReader::new(file), options)
}

#[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn label_from_value(value: f32) -> u8 {
    value as u8
}
