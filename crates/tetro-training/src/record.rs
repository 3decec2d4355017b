//! Score log entries.
//!
//! One [`GenerationRecord`] is appended per evaluated generation. Records are never
//! modified once written; external tools read them to plot training progress.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tetro_evaluator::board_feature::BoardFeature;

use crate::genetic::GenerationReport;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRecord {
    pub generation: usize,
    pub timestamp: DateTime<Utc>,
    pub best_fitness: u64,
    pub mean_fitness: f64,
    /// Feature of each entry of `weights`, in order.
    pub features: Vec<BoardFeature>,
    pub weights: Vec<f32>,
}

impl GenerationRecord {
    #[must_use]
    pub fn new(
        report: &GenerationReport,
        features: &[BoardFeature],
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            generation: report.generation,
            timestamp,
            best_fitness: report.best.fitness().unwrap_or(0),
            mean_fitness: report.summary.mean,
            features: features.to_vec(),
            weights: report.best.weights().to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone as _;

    use super::*;
    use crate::{config::TrainingConfig, genetic::GeneticOptimizer};

    #[test]
    fn test_record_from_report() {
        let config = TrainingConfig {
            population_size: 4,
            max_generations: 1,
            move_cap: 30,
            ..TrainingConfig::default()
        };
        let features = config.features.clone();
        let mut optimizer = GeneticOptimizer::new(config).unwrap();
        let report = optimizer.step().unwrap();
        let timestamp = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();

        let record = GenerationRecord::new(&report, &features, timestamp);
        assert_eq!(record.generation, 0);
        assert_eq!(Some(record.best_fitness), report.best.fitness());
        assert_eq!(record.weights, report.best.weights());
        assert_eq!(record.features, BoardFeature::DEFAULT);

        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"timestamp\":\"2026-01-02T03:04:05Z\""));
        assert!(json.contains("\"aggregate-height\""));
        let back: GenerationRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
