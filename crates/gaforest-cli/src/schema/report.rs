use chrono::{DateTime, Utc};
use gaforest_stats::class_accuracy::ClassAccuracy;
use gaforest_training::{StageSummary, TrainingParams, seed::RunSeed};
use serde::{Deserialize, Serialize};

/// JSON summary written next to a trained model file.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TrainingReportFile {
    pub name: String,
    pub trained_at: DateTime<Utc>,
    pub seed: RunSeed,
    pub final_accuracy: f32,
    pub final_classes: ClassAccuracy,
    pub stages: Vec<StageSummary>,
    pub params: TrainingParams,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_json_shape() {
        let report = TrainingReportFile {
            name: "iris".to_owned(),
            trained_at: DateTime::UNIX_EPOCH,
            seed: RunSeed::from_bytes([0x11; 16]),
            final_accuracy: 0.75,
            final_classes: ClassAccuracy::new(2),
            stages: vec![StageSummary {
                stage: 0,
                trees: 0..32,
                generations: 3,
                train_accuracy: 0.8,
                holdout_accuracy: None,
                converged: false,
            }],
            params: TrainingParams::default(),
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["seed"], "11".repeat(16));
        assert_eq!(json["stages"][0]["trees"]["end"], 32);
        assert_eq!(json["params"]["population"], 128);

        let back: TrainingReportFile = serde_json::from_value(json).unwrap();
        assert_eq!(back.stages, report.stages);
    }
}
