//! Observed feature ranges and the 1% value grid sampled over them.
//!
//! Thresholds, threshold deltas and augmentation noise are all drawn from the same grid: a
//! range `[min, max]` is divided into 100 equal steps and one of the 101 grid points is chosen
//! uniformly.

use rand::Rng;

use crate::dataset::Sample;

/// Number of equal steps the grid divides a range into.
pub const GRID_STEPS: f32 = 100.0;

/// Divisor applied to a feature range to obtain the range of small perturbations.
pub const PERTURBATION_DIVISOR: f32 = 10.0;

/// Observed `[min, max]` of one feature.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FeatureRange {
    pub min: f32,
    pub max: f32,
}

impl FeatureRange {
    #[must_use]
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Returns `true` for the exact `[0, 1]` range of a binary feature.
    #[allow(clippy::float_cmp)]
    #[must_use]
    pub fn is_binary(&self) -> bool {
        self.min == 0.0 && self.max == 1.0
    }

    /// Range of small perturbations: both bounds divided by [`PERTURBATION_DIVISOR`].
    #[must_use]
    pub fn perturbation(&self) -> Self {
        Self {
            min: self.min / PERTURBATION_DIVISOR,
            max: self.max / PERTURBATION_DIVISOR,
        }
    }

    /// Samples a grid point of this range.
    ///
    /// Degenerate ranges (`max <= min`, or non-finite width) always return `min`.
    pub fn sample_grid<R>(&self, rng: &mut R) -> f32
    where
        R: Rng + ?Sized,
    {
        let width = self.max - self.min;
        if width <= 0.0 || !width.is_finite() {
            return self.min;
        }
        let step = width / GRID_STEPS;
        let r: f32 = rng.random();
        self.min + (r * GRID_STEPS).round() * step
    }

    /// Samples a decision threshold for a feature with this range.
    ///
    /// Binary features draw 0 or 1 with equal probability; every other range samples the grid.
    pub fn sample_threshold<R>(&self, rng: &mut R) -> f32
    where
        R: Rng + ?Sized,
    {
        if self.is_binary() {
            if rng.random_bool(0.5) { 1.0 } else { 0.0 }
        } else {
            self.sample_grid(rng)
        }
    }

    /// Samples a small perturbation on the grid of [`perturbation`](Self::perturbation).
    ///
    /// A degenerate range has no spread to perturb within and always returns 0.
    pub fn sample_perturbation<R>(&self, rng: &mut R) -> f32
    where
        R: Rng + ?Sized,
    {
        let width = self.max - self.min;
        if width <= 0.0 || !width.is_finite() {
            return 0.0;
        }
        self.perturbation().sample_grid(rng)
    }
}

/// Per-feature observed ranges of a dataset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureRanges {
    ranges: Vec<FeatureRange>,
}

impl FeatureRanges {
    #[must_use]
    pub fn new(ranges: Vec<FeatureRange>) -> Self {
        Self { ranges }
    }

    /// Scans `samples` for the range of each of the first `n_features` features.
    ///
    /// Every range is `[0, 0]` when there are no samples.
    #[must_use]
    pub fn from_samples(samples: &[Sample], n_features: usize) -> Self {
        let Some((first, rest)) = samples.split_first() else {
            return Self {
                ranges: vec![FeatureRange::default(); n_features],
            };
        };
        let mut ranges = (0..n_features)
            .map(|i| {
                let v = first.features.get(i).copied().unwrap_or(0.0);
                FeatureRange::new(v, v)
            })
            .collect::<Vec<_>>();
        for sample in rest {
            for (range, &v) in ranges.iter_mut().zip(&sample.features) {
                if v > range.max {
                    range.max = v;
                }
                if v < range.min {
                    range.min = v;
                }
            }
        }
        Self { ranges }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Range of `feature`; features beyond the known ones have range `[0, 0]`.
    #[must_use]
    pub fn get(&self, feature: usize) -> FeatureRange {
        self.ranges.get(feature).copied().unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FeatureRange> {
        self.ranges.iter()
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;

    #[test]
    fn test_from_samples() {
        let samples = vec![
            Sample::new(vec![1.0, -2.0], 0),
            Sample::new(vec![3.0, -5.0], 1),
            Sample::new(vec![2.0, 4.0], 0),
        ];
        let ranges = FeatureRanges::from_samples(&samples, 2);
        assert_eq!(ranges.get(0), FeatureRange::new(1.0, 3.0));
        assert_eq!(ranges.get(1), FeatureRange::new(-5.0, 4.0));
        assert_eq!(ranges.get(7), FeatureRange::default());
    }

    #[test]
    fn test_empty_samples_have_zero_ranges() {
        let ranges = FeatureRanges::from_samples(&[], 3);
        assert_eq!(ranges.len(), 3);
        assert!(ranges.iter().all(|r| *r == FeatureRange::default()));
    }

    #[test]
    fn test_grid_values_stay_on_grid() {
        let mut rng = Pcg32::seed_from_u64(11);
        let range = FeatureRange::new(-2.0, 6.0);
        for _ in 0..1000 {
            let v = range.sample_grid(&mut rng);
            assert!((-2.0..=6.0 + 1e-4).contains(&v), "{v}");
            let steps = (v + 2.0) / 0.08;
            assert!((steps - steps.round()).abs() < 1e-3, "{v}");
        }
    }

    #[test]
    fn test_degenerate_range_returns_min() {
        let mut rng = Pcg32::seed_from_u64(0);
        assert_eq!(FeatureRange::new(3.0, 3.0).sample_grid(&mut rng), 3.0);
        assert_eq!(FeatureRange::new(3.0, 1.0).sample_threshold(&mut rng), 3.0);
    }

    #[test]
    fn test_binary_threshold_is_zero_or_one() {
        let mut rng = Pcg32::seed_from_u64(5);
        let range = FeatureRange::new(0.0, 1.0);
        let mut seen = [false; 2];
        for _ in 0..100 {
            let t = range.sample_threshold(&mut rng);
            assert!(t == 0.0 || t == 1.0);
            seen[usize::from(t == 1.0)] = true;
        }
        assert_eq!(seen, [true, true]);
    }

    #[test]
    fn test_perturbation_range() {
        let range = FeatureRange::new(-10.0, 20.0).perturbation();
        assert_eq!(range, FeatureRange::new(-1.0, 2.0));
    }

    #[test]
    fn test_degenerate_range_is_not_perturbed() {
        let mut rng = Pcg32::seed_from_u64(6);
        assert_eq!(FeatureRange::new(10.0, 10.0).sample_perturbation(&mut rng), 0.0);
        assert_eq!(FeatureRange::new(4.0, -4.0).sample_perturbation(&mut rng), 0.0);
        for _ in 0..100 {
            let v = FeatureRange::new(10.0, 20.0).sample_perturbation(&mut rng);
            assert!((1.0..=2.0 + 1e-4).contains(&v), "{v}");
        }
    }
}
