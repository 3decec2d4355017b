//! Run configuration (the properties file).
//!
//! A properties file is TOML with one `key = value` per line. Every key is optional and
//! unknown keys are rejected:
//!
//! ```toml
//! # 10x20 board, 50 individuals for 100 generations
//! board_width = 10
//! board_height = 20
//! population_size = 50
//! max_generations = 100
//! crossover = "single-point"
//! mutation_rate = 0.1
//! move_cap = 500
//! seed = 42
//! features = ["aggregate-height", "complete-lines", "holes", "bumpiness"]
//! ```
//!
//! The configuration is loaded once and is immutable for the rest of the run.

use serde::{Deserialize, Serialize};
use tetro_engine::BoardSize;
use tetro_evaluator::board_feature::BoardFeature;

use crate::weights::{CrossoverPolicy, MAX_BLEND_ALPHA, Mutation};

/// Malformed or out-of-range properties.
#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::IsVariant)]
pub enum ConfigError {
    #[display("malformed properties file: {_0}")]
    Parse(#[error(source)] toml::de::Error),
    #[display("invalid `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrainingConfig {
    pub board_width: usize,
    pub board_height: usize,
    pub population_size: usize,
    /// Best individuals copied unchanged into the next generation.
    pub elite_count: usize,
    pub tournament_size: usize,
    pub crossover: CrossoverPolicy,
    /// α of [`CrossoverPolicy::Blend`].
    pub blend_alpha: f32,
    /// Probability that a single coefficient of a child is mutated.
    pub mutation_rate: f32,
    pub mutation_sigma: f32,
    pub max_mutation_delta: f32,
    /// Coefficients are kept within `[-weight_range, weight_range]`.
    pub weight_range: f32,
    pub max_generations: usize,
    /// Training stops early once the best fitness reaches this many lines.
    pub target_fitness: Option<u64>,
    /// A generation whose best fitness is at most this value is replaced by fresh random
    /// individuals (elites excepted).
    pub restart_fitness: u64,
    /// Pieces per simulated game.
    pub move_cap: usize,
    pub games_per_individual: usize,
    pub seed: u64,
    pub parallel_evaluation: bool,
    pub features: Vec<BoardFeature>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            board_width: BoardSize::STANDARD.width(),
            board_height: BoardSize::STANDARD.height(),
            population_size: 50,
            elite_count: 1,
            tournament_size: 3,
            crossover: CrossoverPolicy::SinglePoint,
            blend_alpha: 0.5,
            mutation_rate: 0.1,
            mutation_sigma: 0.2,
            max_mutation_delta: 0.5,
            weight_range: 1.0,
            max_generations: 100,
            target_fitness: None,
            restart_fitness: 0,
            move_cap: 500,
            games_per_individual: 1,
            seed: 0,
            parallel_evaluation: false,
            features: BoardFeature::DEFAULT.to_vec(),
        }
    }
}

impl TrainingConfig {
    /// Parses and validates a properties file.
    ///
    /// ```
    /// use tetro_training::{config::TrainingConfig, weights::CrossoverPolicy};
    ///
    /// let config = TrainingConfig::from_toml_str(
    ///     r#"
    ///     population_size = 20
    ///     crossover = "blend"
    ///     "#,
    /// )?;
    /// assert_eq!(config.population_size, 20);
    /// assert_eq!(config.crossover, CrossoverPolicy::Blend);
    /// assert_eq!(config.move_cap, 500);
    ///
    /// assert!(TrainingConfig::from_toml_str("population = 20").is_err());
    /// # Ok::<(), tetro_training::config::ConfigError>(())
    /// ```
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.board_size()?;
        self.mutation()?;
        if self.population_size < 2 {
            return Err(ConfigError::invalid("population_size", "must be at least 2"));
        }
        if self.elite_count >= self.population_size {
            return Err(ConfigError::invalid(
                "elite_count",
                "must be less than population_size",
            ));
        }
        if !(1..=self.population_size).contains(&self.tournament_size) {
            return Err(ConfigError::invalid(
                "tournament_size",
                "must be within 1..=population_size",
            ));
        }
        if !(0.0..=MAX_BLEND_ALPHA).contains(&self.blend_alpha) {
            return Err(ConfigError::invalid(
                "blend_alpha",
                format!("must be within [0, {MAX_BLEND_ALPHA}]"),
            ));
        }
        if self.max_generations == 0 {
            return Err(ConfigError::invalid("max_generations", "must be at least 1"));
        }
        if self.move_cap == 0 {
            return Err(ConfigError::invalid("move_cap", "must be at least 1"));
        }
        if self.games_per_individual == 0 {
            return Err(ConfigError::invalid(
                "games_per_individual",
                "must be at least 1",
            ));
        }
        if self.features.is_empty() {
            return Err(ConfigError::invalid("features", "must not be empty"));
        }
        if let Some(f) = self
            .features
            .iter()
            .find(|f| f.required_width() > self.board_width)
        {
            return Err(ConfigError::invalid(
                "features",
                format!("`{f}` needs a board at least {} wide", f.required_width()),
            ));
        }
        if let Some((i, f)) = self
            .features
            .iter()
            .enumerate()
            .find(|(i, f)| self.features[..*i].contains(f))
        {
            return Err(ConfigError::invalid(
                "features",
                format!("`{f}` is listed twice (entry #{i})"),
            ));
        }
        Ok(())
    }

    pub fn board_size(&self) -> Result<BoardSize, ConfigError> {
        BoardSize::new(self.board_width, self.board_height)
            .map_err(|e| ConfigError::invalid("board_width/board_height", e.to_string()))
    }

    pub fn mutation(&self) -> Result<Mutation, ConfigError> {
        Mutation::new(
            self.mutation_rate,
            self.mutation_sigma,
            self.max_mutation_delta,
            self.weight_range,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invalid_key(toml: &str) -> &'static str {
        match TrainingConfig::from_toml_str(toml).unwrap_err() {
            ConfigError::Invalid { key, .. } => key,
            ConfigError::Parse(e) => panic!("unexpected parse error: {e}"),
        }
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = TrainingConfig::default();
        config.validate().unwrap();
        assert_eq!(config.board_size().unwrap(), BoardSize::STANDARD);
        assert_eq!(TrainingConfig::from_toml_str("").unwrap(), config);
    }

    #[test]
    fn test_parse_all_keys() {
        let config = TrainingConfig::from_toml_str(
            r#"
            # comment lines are allowed
            board_width = 8
            board_height = 16
            population_size = 30
            elite_count = 2
            tournament_size = 4
            crossover = "average"
            blend_alpha = 0.3
            mutation_rate = 0.25
            mutation_sigma = 0.1
            max_mutation_delta = 0.3
            weight_range = 2
            max_generations = 40
            target_fitness = 1000
            restart_fitness = 3
            move_cap = 250
            games_per_individual = 2
            seed = 99
            parallel_evaluation = true
            features = ["holes", "max-height", "well-depth"]
            "#,
        )
        .unwrap();
        assert_eq!(config.board_size().unwrap().width(), 8);
        assert_eq!(config.crossover, CrossoverPolicy::Average);
        assert_eq!(config.weight_range, 2.0);
        assert_eq!(config.target_fitness, Some(1000));
        assert_eq!(config.games_per_individual, 2);
        assert!(config.parallel_evaluation);
        assert_eq!(
            config.features,
            [
                BoardFeature::Holes,
                BoardFeature::MaxHeight,
                BoardFeature::WellDepth
            ]
        );
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let err = TrainingConfig::from_toml_str("mutation_chance = 0.5").unwrap_err();
        assert!(err.is_parse());
        let err = TrainingConfig::from_toml_str("crossover = \"two-point\"").unwrap_err();
        assert!(err.is_parse());
        let err = TrainingConfig::from_toml_str("features = [\"tetrises\"]").unwrap_err();
        assert!(err.is_parse());
    }

    #[test]
    fn test_out_of_range_values() {
        assert_eq!(invalid_key("board_width = 13"), "board_width/board_height");
        assert_eq!(invalid_key("board_height = 2"), "board_width/board_height");
        assert_eq!(invalid_key("population_size = 1"), "population_size");
        assert_eq!(
            invalid_key("population_size = 4\nelite_count = 4"),
            "elite_count"
        );
        assert_eq!(invalid_key("tournament_size = 0"), "tournament_size");
        assert_eq!(invalid_key("mutation_rate = 1.5"), "mutation_rate");
        assert_eq!(invalid_key("mutation_sigma = -1.0"), "mutation_sigma");
        assert_eq!(invalid_key("weight_range = 0.0"), "weight_range");
        assert_eq!(invalid_key("blend_alpha = -0.5"), "blend_alpha");
        assert_eq!(invalid_key("blend_alpha = nan"), "blend_alpha");
        assert_eq!(invalid_key("max_generations = 0"), "max_generations");
        assert_eq!(invalid_key("move_cap = 0"), "move_cap");
        assert_eq!(invalid_key("games_per_individual = 0"), "games_per_individual");
        assert_eq!(invalid_key("features = []"), "features");
        assert_eq!(invalid_key("features = [\"holes\", \"holes\"]"), "features");
    }

    #[test]
    fn test_huge_ranges_are_rejected() {
        assert_eq!(
            invalid_key("crossover = \"blend\"\nblend_alpha = 1e38"),
            "blend_alpha"
        );
        assert_eq!(invalid_key("blend_alpha = inf"), "blend_alpha");
        assert_eq!(invalid_key("weight_range = 1e38"), "weight_range");
        assert_eq!(invalid_key("weight_range = inf"), "weight_range");
        assert_eq!(invalid_key("weight_range = nan"), "weight_range");

        let config =
            TrainingConfig::from_toml_str("blend_alpha = 10\nweight_range = 1e6").unwrap();
        assert_eq!(config.blend_alpha, MAX_BLEND_ALPHA);
    }

    #[test]
    fn test_bucketed_features() {
        let config = TrainingConfig::from_toml_str(
            r#"
            board_width = 6
            features = ["row-filled-0", "row-filled-6", "hole-height-5", "column-diff-0"]
            "#,
        )
        .unwrap();
        assert_eq!(config.features[1], BoardFeature::RowFilled(6));
        assert_eq!(config.features[2], BoardFeature::HoleHeight(5));

        assert_eq!(
            invalid_key("board_width = 6\nfeatures = [\"row-filled-7\"]"),
            "features"
        );
    }

    #[test]
    fn test_error_message_names_key() {
        let err = TrainingConfig::from_toml_str("move_cap = 0").unwrap_err();
        assert_eq!(err.to_string(), "invalid `move_cap`: must be at least 1");
    }
}
