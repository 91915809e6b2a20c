use outpost::board::Board;
use outpost::moves::execute::{generate_legal, generate_tactical, make_move, undo_move};
use outpost::moves::magic::{MagicTables, load_magic_tables};
use outpost::moves::square_control::in_check;
use outpost::moves::types::MoveList;
use outpost::search::INF;
use outpost::search::context::RepetitionWindow;
use outpost::search::eval::evaluate;
use outpost::search::search::{SearchOutcome, SearchParams, think};
use outpost::search::tt::TranspositionTable;
use std::str::FromStr;

fn params(depth: i32) -> SearchParams {
    SearchParams {
        max_depth: depth,
        budget_ms: u64::MAX,
        analyzing: false,
        koth: false,
        level: 100,
        chess960: false,
    }
}

fn run(fen: &str, params: &SearchParams) -> SearchOutcome {
    let mut board = Board::from_str(fen).unwrap();
    let tables = load_magic_tables();
    let mut tt = TranspositionTable::new();
    let mut window = RepetitionWindow::new();
    let mut out = std::io::sink();
    think(&mut board, &tables, &mut tt, &mut window, None, params, &mut out)
}

/// Brute-force one-ply score: the best of the children's negated static
/// evals. Valid only when no child has tactical continuations, which the
/// helper asserts.
fn naive_depth_one(board: &mut Board, tables: &MagicTables) -> i32 {
    let mut tt = TranspositionTable::new();
    let mut moves = MoveList::new();
    generate_legal(board, tables, &mut moves, true);
    assert!(moves.len() > 1, "need several moves for a meaningful test");
    let mut best = -INF;
    for sm in &moves {
        let undo = make_move(board, sm.mv);
        assert!(
            !in_check(board, board.side_to_move, tables),
            "test position must stay quiet"
        );
        let mut tactical = MoveList::new();
        generate_tactical(board, tables, &mut tactical, false);
        assert!(tactical.is_empty(), "test position must stay quiet");

        let child_rel =
            board.side_to_move.sign() * evaluate(board, tables, &mut tt, false, 100);
        undo_move(board, undo);
        best = best.max(-child_rel);
    }
    best
}

#[test]
fn depth_one_equals_naive_minimax() {
    // Locked pawn endings: no captures or checks anywhere in the one-ply
    // tree, so pruning cannot change the exact score.
    let fens = [
        "k7/p7/P7/8/8/8/5K2/8 w - - 0 1",
        "k7/p7/P7/8/8/8/8/K7 w - - 0 1",
        "5k2/8/8/8/8/8/8/5K2 w - - 0 1",
        "8/8/1k6/8/8/p7/P4K2/8 b - - 0 1",
    ];
    let tables = load_magic_tables();
    for fen in fens {
        let mut board = Board::from_str(fen).unwrap();
        let expected = naive_depth_one(&mut board, &tables);
        let outcome = run(fen, &params(1));
        assert_eq!(outcome.score, expected, "fen {}", fen);
    }
}

#[test]
fn finds_mate_in_one_with_mate_scale_score() {
    let outcome = run("6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1", &params(4));
    assert_eq!(outcome.best.unwrap().to_string(), "a1a8");
    assert!(outcome.score >= INF / 2, "score {}", outcome.score);
}

#[test]
fn king_and_pawn_endgame_is_not_losing() {
    let outcome = run("4k3/8/8/8/8/8/4P3/4K3 w - - 0 1", &params(8));
    assert!(outcome.score >= 0, "score {}", outcome.score);
    assert!(outcome.best.is_some());
}

#[test]
fn stalemate_yields_no_move() {
    let outcome = run("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1", &params(4));
    assert!(outcome.best.is_none());
    assert_eq!(outcome.score, 0);
}

#[test]
fn repetition_inside_the_window_scores_zero() {
    // White is a queen down; shuffling back to an already twice-seen
    // position claims the draw.
    let fen = "3q3k/8/8/8/8/8/8/K7 w - - 4 1";
    let mut board = Board::from_str(fen).unwrap();
    let tables = load_magic_tables();

    // Hash of the position after Kb1, pre-seeded as seen twice before at
    // the matching clock parity.
    let mut moves = MoveList::new();
    generate_legal(&mut board, &tables, &mut moves, true);
    let shuffle = moves
        .iter()
        .find(|m| m.mv.to_string() == "a1b1")
        .unwrap()
        .mv;
    let undo = make_move(&mut board, shuffle);
    let repeated_hash = board.zobrist;
    undo_move(&mut board, undo);

    let mut window = RepetitionWindow::new();
    window.record(1, repeated_hash);
    window.record(3, repeated_hash);

    let mut tt = TranspositionTable::new();
    let mut out = std::io::sink();
    let outcome = think(
        &mut board,
        &tables,
        &mut tt,
        &mut window,
        None,
        &params(2),
        &mut out,
    );
    assert_eq!(outcome.best.unwrap().to_string(), "a1b1");
    assert_eq!(outcome.score, 0);
}

#[test]
fn fifty_move_rule_drains_the_score() {
    // Two queens up, but the clock is exhausted: every continuation is a
    // dead draw.
    let outcome = run("7k/8/8/8/8/8/8/QQ5K w - - 100 1", &params(2));
    assert_eq!(outcome.score, 0);
}

#[test]
fn koth_search_walks_onto_the_hill() {
    let mut p = params(2);
    p.koth = true;
    let outcome = run("7k/8/8/8/8/4K3/8/8 w - - 0 1", &p);
    let best = outcome.best.unwrap().to_string();
    assert!(
        best == "e3e4" || best == "e3d4",
        "expected a hill entry, got {}",
        best
    );
    assert!(outcome.score >= INF / 2, "score {}", outcome.score);
}

#[test]
fn single_legal_move_is_played_instantly() {
    // The b8 rook boxes the king in; taking the a2 pawn is the only move,
    // and a forced move skips the search entirely.
    let outcome = run("1r5k/8/8/8/8/8/p7/K7 w - - 0 1", &params(6));
    assert_eq!(outcome.best.unwrap().to_string(), "a1a2");
    assert_eq!(outcome.nodes, 0);
}

#[test]
fn deeper_search_does_not_lose_the_rook_endgame() {
    // KRK: white must still be winning at modest depth.
    let outcome = run("8/8/8/3k4/8/8/8/R3K3 w - - 0 1", &params(5));
    assert!(outcome.score > 2000, "score {}", outcome.score);
}
