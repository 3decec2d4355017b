use std::path::Path;

use anyhow::{Context as _, bail};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tetro_evaluator::{board_feature::BoardFeature, placement_evaluator::FeatureEvaluator};
use tetro_training::weights;

use crate::util;

/// Contents of a weight file.
///
/// Either a bare array of coefficients for the default features, or a trained model that
/// names its features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WeightFile {
    Plain(Vec<f32>),
    Model(TrainedModel),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedModel {
    pub name: String,
    pub trained_at: DateTime<Utc>,
    /// Generation the weights were taken from.
    pub generation: usize,
    /// Lines cleared in that generation's evaluation.
    pub fitness: u64,
    pub features: Vec<BoardFeature>,
    pub weights: Vec<f32>,
}

impl WeightFile {
    pub fn open<P>(path: P) -> anyhow::Result<Self>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let file: Self = util::read_json_file("weight", path)?;
        file.check()
            .with_context(|| format!("Corrupt weight file: {}", path.display()))?;
        Ok(file)
    }

    pub fn features(&self) -> &[BoardFeature] {
        match self {
            Self::Plain(_) => &BoardFeature::DEFAULT,
            Self::Model(model) => &model.features,
        }
    }

    pub fn weights(&self) -> &[f32] {
        match self {
            Self::Plain(weights) => weights,
            Self::Model(model) => &model.weights,
        }
    }

    fn check(&self) -> anyhow::Result<()> {
        if self.weights().len() != self.features().len() {
            bail!(
                "{} weights for {} features",
                self.weights().len(),
                self.features().len()
            );
        }
        weights::validate(self.weights(), f32::MAX)?;
        Ok(())
    }

    pub fn to_evaluator(&self) -> anyhow::Result<FeatureEvaluator> {
        Ok(FeatureEvaluator::new(
            self.features().to_vec(),
            self.weights().to_vec(),
        )?)
    }

    /// Reorders the weights to match `features`, failing if one of them is missing.
    pub fn weights_for(&self, features: &[BoardFeature]) -> anyhow::Result<Vec<f32>> {
        features
            .iter()
            .map(|feature| {
                let index = self
                    .features()
                    .iter()
                    .position(|f| f == feature)
                    .with_context(|| format!("Feature `{feature}` not found in weight file"))?;
                Ok(self.weights()[index])
            })
            .collect()
    }
}
