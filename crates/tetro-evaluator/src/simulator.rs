//! Game simulation: playing a whole game with an agent.
//!
//! [`GameSimulator`] repeatedly takes the next piece from a [`PieceSource`], asks an
//! [`Agent`] where to put it and applies the move, until one of the following happens:
//!
//! - `move_cap` pieces have been placed ([`GameEnd::MoveCapReached`])
//! - the spawn region is occupied, or the agent finds no legal move ([`GameEnd::GameOver`])
//! - a finite piece source runs dry ([`GameEnd::PiecesExhausted`])
//!
//! The move cap bounds every simulation: a good agent can clear lines indefinitely.
//!
//! # Example
//!
//! ```
//! use tetro_engine::{BoardSize, PieceBag, PieceSeed};
//! use tetro_evaluator::simulator::{GameSimulator, HeuristicAgent};
//!
//! let mut agent = HeuristicAgent::from_weights(vec![-0.51, 0.76, -0.36, -0.18])?;
//! let simulator = GameSimulator::new(BoardSize::STANDARD, 50);
//! let outcome = simulator.run(&mut agent, PieceBag::with_seed(PieceSeed::from_u64(3)));
//!
//! assert!(outcome.stats.completed_pieces() <= 50);
//! # Ok::<(), tetro_evaluator::WeightDimensionMismatch>(())
//! ```

use serde::Serialize;
use tetro_engine::{Board, BoardSize, GameStats, PieceKind, PieceSource};

use crate::{
    WeightDimensionMismatch,
    move_search::{self, MoveChoice, NoLegalMove, Placement},
    placement_evaluator::{FeatureEvaluator, PlacementEvaluator},
};

/// Chooses where each piece goes.
///
/// The heuristic [`HeuristicAgent`] is the default; an interactive front end can implement
/// this trait to inject moves of its own.
pub trait Agent {
    fn choose_move(
        &mut self,
        board: &Board,
        piece: PieceKind,
    ) -> Result<MoveChoice, NoLegalMove>;
}

/// Agent that plays the best move according to a placement evaluator.
#[derive(Debug, Clone)]
pub struct HeuristicAgent<E = FeatureEvaluator> {
    evaluator: E,
}

impl<E> HeuristicAgent<E>
where
    E: PlacementEvaluator,
{
    #[must_use]
    pub fn new(evaluator: E) -> Self {
        Self { evaluator }
    }

    #[must_use]
    pub fn evaluator(&self) -> &E {
        &self.evaluator
    }
}

impl HeuristicAgent {
    /// Builds an agent over the default feature set.
    pub fn from_weights(weights: Vec<f32>) -> Result<Self, WeightDimensionMismatch> {
        Ok(Self::new(FeatureEvaluator::with_default_features(weights)?))
    }
}

impl<E> Agent for HeuristicAgent<E>
where
    E: PlacementEvaluator,
{
    fn choose_move(
        &mut self,
        board: &Board,
        piece: PieceKind,
    ) -> Result<MoveChoice, NoLegalMove> {
        move_search::best_move(board, piece, &self.evaluator)
    }
}

impl<A> Agent for &mut A
where
    A: Agent + ?Sized,
{
    fn choose_move(
        &mut self,
        board: &Board,
        piece: PieceKind,
    ) -> Result<MoveChoice, NoLegalMove> {
        (**self).choose_move(board, piece)
    }
}

/// Why a simulated game stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, derive_more::IsVariant)]
#[serde(rename_all = "kebab-case")]
pub enum GameEnd {
    GameOver,
    MoveCapReached,
    PiecesExhausted,
}

/// One applied move, as seen by an observer.
#[derive(Debug, Clone, Copy)]
pub struct Turn<'a> {
    /// Zero-based index of the piece within the game.
    pub index: usize,
    pub piece: PieceKind,
    pub placement: Placement,
    pub cleared_lines: usize,
    pub score: f32,
    /// Board after the piece locked and lines cleared.
    pub board: &'a Board,
}

#[derive(Debug, Clone)]
pub struct SimulationOutcome {
    pub stats: GameStats,
    pub end: GameEnd,
    pub board: Board,
}

impl SimulationOutcome {
    /// Total lines cleared, the fitness of the agent's weights.
    #[must_use]
    pub fn total_score(&self) -> u64 {
        u64::try_from(self.stats.total_cleared_lines()).unwrap_or(u64::MAX)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameSimulator {
    board_size: BoardSize,
    move_cap: usize,
}

impl GameSimulator {
    #[must_use]
    pub fn new(board_size: BoardSize, move_cap: usize) -> Self {
        Self {
            board_size,
            move_cap,
        }
    }

    #[must_use]
    pub fn board_size(&self) -> BoardSize {
        self.board_size
    }

    #[must_use]
    pub fn move_cap(&self) -> usize {
        self.move_cap
    }

    /// Plays one game on an empty board.
    pub fn run<A, S>(&self, agent: A, pieces: S) -> SimulationOutcome
    where
        A: Agent,
        S: PieceSource,
    {
        self.run_observed(agent, pieces, |_| {})
    }

    /// Like [`Self::run`], calling `observer` after every applied move.
    pub fn run_observed<A, S, F>(
        &self,
        mut agent: A,
        mut pieces: S,
        mut observer: F,
    ) -> SimulationOutcome
    where
        A: Agent,
        S: PieceSource,
        F: FnMut(&Turn<'_>),
    {
        let mut board = Board::new(self.board_size);
        let mut stats = GameStats::new();

        let end = loop {
            if stats.completed_pieces() >= self.move_cap {
                break GameEnd::MoveCapReached;
            }
            if board.is_game_over() {
                break GameEnd::GameOver;
            }
            let Some(piece) = pieces.next_piece() else {
                break GameEnd::PiecesExhausted;
            };
            let Ok(choice) = agent.choose_move(&board, piece) else {
                break GameEnd::GameOver;
            };

            let index = stats.completed_pieces();
            stats.complete_piece_drop(choice.cleared_lines);
            board = choice.board;
            observer(&Turn {
                index,
                piece,
                placement: choice.placement,
                cleared_lines: choice.cleared_lines,
                score: choice.score,
                board: &board,
            });
        };

        tracing::debug!(
            ?end,
            pieces = stats.completed_pieces(),
            lines = stats.total_cleared_lines(),
            "game finished"
        );
        SimulationOutcome { stats, end, board }
    }
}
