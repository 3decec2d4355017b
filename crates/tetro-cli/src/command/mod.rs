use clap::{Parser, Subcommand};
use tetro_engine::BoardSize;

use self::{evaluate::EvaluateArg, replay::ReplayArg, train::TrainArg};

mod evaluate;
mod replay;
mod train;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Tune heuristic weights with the genetic algorithm
    Train(#[clap(flatten)] TrainArg),
    /// Watch a saved weight vector play, one ASCII frame per move
    Replay(#[clap(flatten)] ReplayArg),
    /// Measure the fitness of a saved weight vector over several games
    Evaluate(#[clap(flatten)] EvaluateArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    match args.mode {
        Mode::Train(arg) => train::run(&arg)?,
        Mode::Replay(arg) => replay::run(&arg)?,
        Mode::Evaluate(arg) => evaluate::run(&arg)?,
    }
    Ok(())
}

/// Board dimensions of commands that play games outside of training.
#[derive(Debug, Clone, Copy, clap::Args)]
struct BoardArg {
    /// Board width in columns
    #[arg(long, default_value_t = BoardSize::STANDARD.width())]
    width: usize,
    /// Board height in rows
    #[arg(long, default_value_t = BoardSize::STANDARD.height())]
    height: usize,
}

impl BoardArg {
    fn size(self) -> anyhow::Result<BoardSize> {
        Ok(BoardSize::new(self.width, self.height)?)
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory as _;

    use super::*;

    #[test]
    fn test_command_definition() {
        CommandArgs::command().debug_assert();
    }

    #[test]
    fn test_parse_train() {
        let args = CommandArgs::try_parse_from([
            "tetro",
            "train",
            "--properties",
            "train.toml",
            "--seed",
            "7",
        ])
        .unwrap();
        assert!(matches!(args.mode, Mode::Train(_)));
    }

    #[test]
    fn test_board_arg_rejects_bad_size() {
        let board = BoardArg {
            width: 3,
            height: 20,
        };
        assert!(board.size().is_err());
        let board = BoardArg {
            width: 10,
            height: 20,
        };
        assert_eq!(board.size().unwrap(), BoardSize::STANDARD);
    }
}
