use serde::{Deserialize, Serialize};

/// Summary of a set of fitness scores.
///
/// Used to log how a whole population is doing, not only its best member.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DescriptiveStats {
    /// The lowest score.
    pub min: f32,
    /// The highest score.
    pub max: f32,
    /// The arithmetic mean of the scores.
    pub mean: f32,
    /// The upper median (element at `len / 2` after sorting).
    pub median: f32,
    /// The population standard deviation.
    pub std_dev: f32,
}

impl DescriptiveStats {
    /// Computes statistics from unsorted values.
    ///
    /// Returns `None` if `values` is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// # use gaforest_stats::descriptive::DescriptiveStats;
    /// let stats = DescriptiveStats::new([0.5, 0.75, 0.25, 1.0]).unwrap();
    /// assert_eq!(stats.min, 0.25);
    /// assert_eq!(stats.max, 1.0);
    /// assert_eq!(stats.mean, 0.625);
    /// assert_eq!(stats.median, 0.75);
    /// ```
    #[must_use]
    pub fn new<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = f32>,
    {
        let mut values = values.into_iter().collect::<Vec<_>>();
        values.sort_by(f32::total_cmp);
        Self::from_sorted(&values)
    }

    /// Computes statistics from values already sorted in ascending order.
    ///
    /// # Panics
    ///
    /// Panics if `sorted_values` is not sorted in ascending order.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn from_sorted(sorted_values: &[f32]) -> Option<Self> {
        assert!(
            sorted_values.is_sorted_by(|a, b| a <= b),
            "values must be sorted in ascending order"
        );

        let min = *sorted_values.first()?;
        let max = *sorted_values.last()?;
        let n = sorted_values.len() as f32;
        let mean = sorted_values.iter().sum::<f32>() / n;
        let median = sorted_values[sorted_values.len() / 2];
        let variance = sorted_values
            .iter()
            .map(|v| (v - mean).powi(2))
            .sum::<f32>()
            / n;

        Some(Self {
            min,
            max,
            mean,
            median,
            std_dev: variance.sqrt(),
        })
    }
}
