use serde::{Deserialize, Serialize};

/// Hit/total counts for one class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassTally {
    pub correct: usize,
    pub total: usize,
}

impl ClassTally {
    /// Fraction of correct predictions, `None` if the class was never seen.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn accuracy(&self) -> Option<f32> {
        (self.total > 0).then(|| self.correct as f32 / self.total as f32)
    }
}

/// Per-class and overall accuracy of a batch of predictions.
///
/// Predictions are compared against labels one sample at a time. A prediction of `None`
/// ("no consensus") never counts as correct.
///
/// # Examples
///
/// ```
/// use gaforest_stats::class_accuracy::ClassAccuracy;
///
/// let mut accuracy = ClassAccuracy::new(3);
/// accuracy.record(0, Some(0));
/// accuracy.record(0, Some(1));
/// accuracy.record(1, None);
///
/// assert_eq!(accuracy.overall(), 1.0 / 3.0);
/// assert_eq!(accuracy.class_accuracy(0), Some(0.5));
/// assert_eq!(accuracy.class_accuracy(1), Some(0.0));
/// assert_eq!(accuracy.class_accuracy(2), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassAccuracy {
    classes: Vec<ClassTally>,
    correct: usize,
    total: usize,
}

impl ClassAccuracy {
    /// Creates an empty tally for labels in `[0, n_classes)`.
    #[must_use]
    pub fn new(n_classes: usize) -> Self {
        Self {
            classes: vec![ClassTally::default(); n_classes],
            correct: 0,
            total: 0,
        }
    }

    /// Records one prediction for a sample labelled `label`.
    ///
    /// Labels outside `[0, n_classes)` count toward the overall accuracy only.
    pub fn record(&mut self, label: usize, predicted: Option<usize>) {
        let hit = predicted == Some(label);
        self.total += 1;
        self.correct += usize::from(hit);
        if let Some(tally) = self.classes.get_mut(label) {
            tally.total += 1;
            tally.correct += usize::from(hit);
        }
    }

    /// Fraction of correct predictions over every recorded sample, 0 when nothing was recorded.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn overall(&self) -> f32 {
        if self.total == 0 {
            return 0.0;
        }
        self.correct as f32 / self.total as f32
    }

    #[must_use]
    pub fn class_accuracy(&self, class: usize) -> Option<f32> {
        self.classes.get(class)?.accuracy()
    }

    #[must_use]
    pub fn classes(&self) -> &[ClassTally] {
        &self.classes
    }

    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }

    #[must_use]
    pub fn correct(&self) -> usize {
        self.correct
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.total
    }

    /// Per-class accuracies with unseen classes reported as `default`.
    #[must_use]
    pub fn accuracies_or(&self, default: f32) -> Vec<f32> {
        self.classes
            .iter()
            .map(|tally| tally.accuracy().unwrap_or(default))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_batch_has_zero_accuracy() {
        let accuracy = ClassAccuracy::new(4);
        assert_eq!(accuracy.overall(), 0.0);
        assert!((0..4).all(|c| accuracy.class_accuracy(c).is_none()));
    }

    #[test]
    fn test_out_of_range_label_counts_overall_only() {
        let mut accuracy = ClassAccuracy::new(2);
        accuracy.record(5, Some(5));
        assert_eq!(accuracy.overall(), 1.0);
        assert_eq!(accuracy.classes(), &[ClassTally::default(); 2]);
    }

    #[test]
    fn test_no_consensus_is_wrong() {
        let mut accuracy = ClassAccuracy::new(1);
        accuracy.record(0, None);
        assert_eq!(accuracy.correct(), 0);
        assert_eq!(accuracy.total(), 1);
        assert_eq!(accuracy.class_accuracy(0), Some(0.0));
    }

    #[test]
    fn test_accuracies_or_fills_unseen_classes() {
        let mut accuracy = ClassAccuracy::new(3);
        accuracy.record(1, Some(1));
        assert_eq!(accuracy.accuracies_or(0.0), vec![0.0, 1.0, 0.0]);
    }
}
