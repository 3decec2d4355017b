use std::{path::PathBuf, time::Instant};

use chrono::Utc;
use tetro_training::{
    config::TrainingConfig,
    genetic::{GenerationReport, GeneticOptimizer},
    record::GenerationRecord,
};

use crate::{
    model::{TrainedModel, WeightFile},
    util::{self, ScoreLog},
};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct TrainArg {
    /// Properties file (TOML); built-in defaults are used when omitted
    #[arg(long)]
    properties: Option<PathBuf>,
    /// Output file path for the best weights (stdout when omitted)
    #[arg(long)]
    weights_out: Option<PathBuf>,
    /// Score log to append one JSON line per generation to
    #[arg(long)]
    score_log: Option<PathBuf>,
    /// Random seed, overriding the properties file
    #[arg(long)]
    seed: Option<u64>,
    /// Weight file to seed the initial population with
    #[arg(long)]
    resume: Option<PathBuf>,
    /// Model name stored in the weight file
    #[arg(long, default_value = "tetro")]
    name: String,
}

pub(crate) fn run(arg: &TrainArg) -> anyhow::Result<()> {
    let TrainArg {
        properties,
        weights_out,
        score_log,
        seed,
        resume,
        name,
    } = arg;

    let mut config = match properties {
        Some(path) => util::read_properties_file(path)?,
        None => TrainingConfig::default(),
    };
    if let Some(seed) = seed {
        config.seed = *seed;
    }
    let features = config.features.clone();
    tracing::info!(
        population = config.population_size,
        generations = config.max_generations,
        move_cap = config.move_cap,
        crossover = %config.crossover,
        seed = config.seed,
        "starting training"
    );

    let mut optimizer = match resume {
        Some(path) => {
            let initial = WeightFile::open(path)?.weights_for(&features)?;
            GeneticOptimizer::with_initial_weights(config, [initial])?
        }
        None => GeneticOptimizer::new(config)?,
    };
    let mut score_log = score_log.clone().map(ScoreLog::open).transpose()?;

    let started = Instant::now();
    let mut last: Option<GenerationReport> = None;
    while let Some(report) = optimizer.step() {
        tracing::info!(
            generation = report.generation,
            best = report.summary.max,
            mean = format_args!("{:.1}", report.summary.mean),
            median = report.summary.median,
            std_dev = format_args!("{:.1}", report.summary.std_dev),
            elapsed = ?started.elapsed(),
            "generation evaluated"
        );
        tracing::debug!(weights = ?report.best.weights(), "best individual");
        if let Some(log) = &mut score_log {
            log.append(&GenerationRecord::new(&report, &features, Utc::now()))?;
        }
        last = Some(report);
    }

    let Some(best) = last else {
        anyhow::bail!("training finished without evaluating a generation");
    };
    if let Some(reason) = optimizer.termination_reason() {
        tracing::info!(%reason, generations = best.generation + 1, "training completed");
    }

    let model = WeightFile::Model(TrainedModel {
        name: name.clone(),
        trained_at: Utc::now(),
        generation: best.generation,
        fitness: best.best.fitness().unwrap_or(0),
        features,
        weights: best.best.weights().to_vec(),
    });
    util::write_json(&model, weights_out.as_deref())?;

    if let Some(path) = weights_out {
        tracing::info!(
            path = %path.display(),
            fitness = best.best.fitness().unwrap_or(0),
            "model saved"
        );
    }

    Ok(())
}
