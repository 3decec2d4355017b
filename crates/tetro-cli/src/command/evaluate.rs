use std::path::PathBuf;

use rand::{Rng as _, SeedableRng as _};
use rand_pcg::Pcg64Mcg;
use serde::Serialize;
use tetro_engine::{GameStats, PieceBag, PieceSeed};
use tetro_evaluator::simulator::{GameEnd, GameSimulator, HeuristicAgent};
use tetro_training::summary::FitnessSummary;

use super::BoardArg;
use crate::{model::WeightFile, util};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct EvaluateArg {
    /// Weight file (JSON array or trained model)
    #[arg(long)]
    weights: PathBuf,
    /// Number of games to play
    #[arg(long, default_value_t = 10)]
    games: usize,
    /// Seed from which the piece seed of every game is drawn
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Maximum number of pieces per game
    #[arg(long, default_value_t = 500)]
    move_cap: usize,
    /// Output file path for the per-game results (stdout when omitted)
    #[arg(long)]
    output: Option<PathBuf>,
    #[clap(flatten)]
    board: BoardArg,
}

#[derive(Debug, Serialize)]
struct GameResult {
    seed: PieceSeed,
    end: GameEnd,
    stats: GameStats,
}

#[derive(Debug, Serialize)]
struct EvaluationReport {
    games: Vec<GameResult>,
    /// Lines cleared per game.
    summary: Option<FitnessSummary>,
}

pub(crate) fn run(arg: &EvaluateArg) -> anyhow::Result<()> {
    let EvaluateArg {
        weights,
        games,
        seed,
        move_cap,
        output,
        board,
    } = arg;

    let model = WeightFile::open(weights)?;
    let mut agent = HeuristicAgent::new(model.to_evaluator()?);
    let simulator = GameSimulator::new(board.size()?, *move_cap);

    let mut rng = Pcg64Mcg::seed_from_u64(*seed);
    let results = (0..*games)
        .map(|game| {
            let seed: PieceSeed = rng.random();
            let outcome = simulator.run(&mut agent, PieceBag::with_seed(seed));
            tracing::info!(
                game,
                lines = outcome.total_score(),
                pieces = outcome.stats.completed_pieces(),
                end = ?outcome.end,
                "game finished"
            );
            GameResult {
                seed,
                end: outcome.end,
                stats: outcome.stats,
            }
        })
        .collect::<Vec<_>>();

    let summary = FitnessSummary::new(results.iter().map(|r| {
        u64::try_from(r.stats.total_cleared_lines()).unwrap_or(u64::MAX)
    }));
    if let Some(summary) = &summary {
        tracing::info!(
            games,
            min = summary.min,
            max = summary.max,
            mean = format_args!("{:.1}", summary.mean),
            median = summary.median,
            "evaluation completed"
        );
    }

    let report = EvaluationReport {
        games: results,
        summary,
    };
    util::write_json(&report, output.as_deref())?;
    Ok(())
}
