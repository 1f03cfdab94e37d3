//! Noise-based oversampling of the training pool.

use gaforest_data::{FeatureRanges, Sample, fraction_of};
use rand::{Rng, seq::SliceRandom as _};

/// Expands `samples` with noisy copies.
///
/// Each sample is emitted unchanged, followed by `factor` copies whose features are shifted
/// by noise drawn from a tenth of the feature's range. Labels are kept. The output stops at
/// `max_len` samples.
pub fn augment<R>(
    samples: &[Sample],
    ranges: &FeatureRanges,
    factor: usize,
    max_len: usize,
    rng: &mut R,
) -> Vec<Sample>
where
    R: Rng + ?Sized,
{
    let capacity = samples.len().saturating_mul(factor + 1).min(max_len);
    let mut expanded = Vec::with_capacity(capacity);
    'outer: for sample in samples {
        if expanded.len() >= max_len {
            break;
        }
        expanded.push(sample.clone());
        for _ in 0..factor {
            if expanded.len() >= max_len {
                break 'outer;
            }
            let features = sample
                .features
                .iter()
                .enumerate()
                .map(|(i, &v)| v + ranges.get(i).sample_perturbation(rng))
                .collect();
            expanded.push(Sample::new(features, sample.label));
        }
    }
    expanded
}

/// Shuffles the pool and keeps its leading `fraction`, at least one sample.
pub fn subsample<R>(samples: &mut Vec<Sample>, fraction: f32, rng: &mut R)
where
    R: Rng + ?Sized,
{
    if fraction >= 1.0 || samples.is_empty() {
        return;
    }
    samples.shuffle(rng);
    samples.truncate(fraction_of(samples.len(), fraction).max(1));
}
