use std::{
    io::{self, BufWriter, Write as _},
    num::NonZeroUsize,
    path::PathBuf,
};

use tetro_engine::{PieceBag, PieceSeed, PieceSequence, PieceSource};
use tetro_evaluator::simulator::{GameSimulator, HeuristicAgent, SimulationOutcome, Turn};

use super::BoardArg;
use crate::model::WeightFile;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct ReplayArg {
    /// Weight file (JSON array or trained model)
    #[arg(long)]
    weights: PathBuf,
    /// Seed of the piece bag
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Literal piece order such as "IOTSZJL", instead of the seeded bag
    #[arg(long)]
    pieces: Option<PieceSequence>,
    /// Maximum number of pieces to place
    #[arg(long, default_value_t = 500)]
    move_cap: usize,
    /// Print every n-th move
    #[arg(long, default_value = "1")]
    every: NonZeroUsize,
    #[clap(flatten)]
    board: BoardArg,
}

pub(crate) fn run(arg: &ReplayArg) -> anyhow::Result<()> {
    let ReplayArg {
        weights,
        seed,
        pieces,
        move_cap,
        every,
        board,
    } = arg;

    let model = WeightFile::open(weights)?;
    let agent = HeuristicAgent::new(model.to_evaluator()?);
    let simulator = GameSimulator::new(board.size()?, *move_cap);
    let mut sequence;
    let mut bag;
    let pieces: &mut dyn PieceSource = match pieces {
        Some(pieces) => {
            sequence = pieces.clone();
            &mut sequence
        }
        None => {
            bag = PieceBag::with_seed(PieceSeed::from_u64(*seed));
            &mut bag
        }
    };

    let mut out = BufWriter::new(io::stdout().lock());
    let mut written = Ok(());
    let outcome = simulator.run_observed(agent, pieces, |turn| {
        if written.is_ok() && (turn.index + 1) % every.get() == 0 {
            written = write_frame(&mut out, turn);
        }
    });
    written?;
    write_summary(&mut out, &outcome)?;
    out.flush()?;
    Ok(())
}

fn write_frame<W>(out: &mut W, turn: &Turn<'_>) -> io::Result<()>
where
    W: io::Write,
{
    writeln!(
        out,
        "#{:<4} {}  rotation {}  column {:>2}  lines {}",
        turn.index + 1,
        turn.piece.as_char(),
        turn.placement.rotation.index(),
        turn.placement.column,
        turn.cleared_lines
    )?;
    writeln!(out, "{}", turn.board)?;
    Ok(())
}

fn write_summary<W>(out: &mut W, outcome: &SimulationOutcome) -> io::Result<()>
where
    W: io::Write,
{
    let stats = &outcome.stats;
    writeln!(out, "Game ended: {:?}", outcome.end)?;
    writeln!(out, "  Pieces:  {}", stats.completed_pieces())?;
    writeln!(out, "  Lines:   {}", stats.total_cleared_lines())?;
    writeln!(out, "  Score:   {}", stats.score())?;
    writeln!(
        out,
        "  Clears:  {:?} (single, double, triple, tetris)",
        &stats.line_cleared_counter()[1..]
    )?;
    Ok(())
}
