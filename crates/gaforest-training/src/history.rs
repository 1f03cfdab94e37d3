//! Adaptive mutation pressure from the recent best accuracies.

/// Mutation factor derived from the accuracy history after one generation.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MutationPressure {
    /// Added to the base mutation and tuning rates.
    pub factor: f32,
    /// Set when nearly every remembered generation was at least as good as the newest one.
    pub saturated: bool,
}

/// Circular memory of the best accuracy of the last `size` generations.
///
/// After each generation the newest best accuracy is compared against every other entry.
/// Each entry at least as good as the newest one raises the mutation factor by `increment`,
/// so a stalled search mutates harder. Entries start at 0.
#[derive(Debug, Clone, PartialEq)]
pub struct AccuracyMemory {
    history: Vec<f32>,
    current: usize,
    increment: f32,
    saturation_count: usize,
}

impl AccuracyMemory {
    #[must_use]
    pub fn new(size: usize, increment: f32, saturation_count: usize) -> Self {
        Self {
            history: vec![0.0; size.max(1)],
            current: 0,
            increment,
            saturation_count,
        }
    }

    /// Stores the best accuracy of a new generation and returns the resulting pressure.
    #[expect(clippy::cast_precision_loss)]
    pub fn record(&mut self, best: f32) -> MutationPressure {
        self.current = (self.current + 1) % self.history.len();
        self.history[self.current] = best;
        let count = self
            .history
            .iter()
            .enumerate()
            .filter(|&(j, &accuracy)| j != self.current && best <= accuracy)
            .count();
        MutationPressure {
            factor: self.increment * count as f32,
            saturated: count >= self.saturation_count,
        }
    }

    /// Forgets every remembered accuracy.
    pub fn reset(&mut self) {
        self.history.fill(0.0);
        self.current = 0;
    }

    #[must_use]
    pub fn history(&self) -> &[f32] {
        &self.history
    }
}
