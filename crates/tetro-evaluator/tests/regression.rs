//! End-to-end regression: a fixed weight vector playing a fixed 14-piece sequence.
//!
//! The expected values pin the feature formulas, the enumeration order and the tie-break
//! together; any change to them shows up here first.

use tetro_engine::{Board, BoardSize, PieceSequence};
use tetro_evaluator::simulator::{GameEnd, GameSimulator, HeuristicAgent};

const WEIGHTS: [f32; 4] = [-0.51, 0.76, -0.36, -0.18];
const SEQUENCE: &str = "IOTSZJLLJZSTOI";

fn play() -> (tetro_evaluator::simulator::SimulationOutcome, Vec<(usize, usize, usize)>) {
    let agent = HeuristicAgent::from_weights(WEIGHTS.to_vec()).unwrap();
    let simulator = GameSimulator::new(BoardSize::STANDARD, 14);
    let pieces: PieceSequence = SEQUENCE.parse().unwrap();
    let mut moves = Vec::new();
    let outcome = simulator.run_observed(agent, pieces, |turn| {
        moves.push((
            turn.placement.rotation.index(),
            turn.placement.column,
            turn.cleared_lines,
        ));
    });
    (outcome, moves)
}

#[test]
fn fixed_bag_total_score() {
    let (outcome, _) = play();
    assert_eq!(outcome.total_score(), 4);
    assert_eq!(outcome.stats.completed_pieces(), 14);
    assert_eq!(outcome.end, GameEnd::MoveCapReached);
}

#[test]
fn fixed_bag_move_sequence() {
    let (_, moves) = play();
    assert_eq!(
        moves,
        [
            (0, 0, 0),
            (0, 0, 0),
            (0, 4, 0),
            (0, 3, 0),
            (1, 2, 0),
            (0, 7, 1),
            (3, 5, 0),
            (1, 8, 1),
            (1, 7, 0),
            (1, 4, 0),
            (0, 1, 0),
            (1, 0, 0),
            (0, 1, 0),
            (1, 9, 2),
        ]
    );
}

#[test]
fn fixed_bag_final_board() {
    let (outcome, _) = play();
    let expected = Board::from_ascii(
        "
        .##.......
        ###..#...#
        ######.###
        ",
    );
    assert_eq!(outcome.board, expected);
}

#[test]
fn fixed_bag_is_reproducible() {
    let (a, moves_a) = play();
    let (b, moves_b) = play();
    assert_eq!(moves_a, moves_b);
    assert_eq!(a.stats, b.stats);
    assert_eq!(a.board, b.board);
}
