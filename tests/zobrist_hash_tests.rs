use outpost::board::{Board, STARTPOS};
use outpost::moves::execute::{generate_legal, make_move, undo_move};
use outpost::moves::magic::load_magic_tables;
use outpost::moves::types::MoveList;
use std::str::FromStr;

/// Apply a scripted line, asserting the incremental hash equals a full
/// recompute after every move.
fn play_checked(fen: &str, line: &[&str]) -> Board {
    let tables = load_magic_tables();
    let mut board = Board::from_str(fen).unwrap();
    for token in line {
        let mut moves = MoveList::new();
        generate_legal(&mut board, &tables, &mut moves, true);
        let mv = moves
            .iter()
            .find(|m| m.mv.to_string() == *token)
            .unwrap_or_else(|| panic!("move {} not found", token))
            .mv;
        make_move(&mut board, mv);
        assert_eq!(
            board.zobrist,
            board.compute_zobrist_full(),
            "hash drift after {}",
            token
        );
    }
    board
}

#[test]
fn hash_stays_incremental_through_an_opening() {
    play_checked(
        STARTPOS,
        &[
            "e2e4", "c7c5", "g1f3", "d7d6", "d2d4", "c5d4", "f3d4", "g8f6", "b1c3", "a7a6",
            "c1g5", "e7e6", "f2f4", "f8e7", "d1f3", "d8c7", "e1c1", "b8d7",
        ],
    );
}

#[test]
fn hash_covers_castling_and_en_passant() {
    // Both sides castle; a double push creates a capturable ep square.
    play_checked(
        STARTPOS,
        &[
            "e2e4", "e7e5", "g1f3", "g8f6", "f1c4", "f8c5", "e1g1", "e8g8", "d2d4", "e5d4",
            "e4e5", "d7d5", "e5d6",
        ],
    );
}

#[test]
fn transpositions_reach_identical_hashes() {
    let a = play_checked(STARTPOS, &["g1f3", "g8f6", "d2d4", "d7d5"]);
    let b = play_checked(STARTPOS, &["d2d4", "d7d5", "g1f3", "g8f6"]);
    assert_eq!(a.zobrist, b.zobrist);
    // Same placement and rights; only the clocks differ between the orders.
    assert_eq!(a.piece_on_sq, b.piece_on_sq);
    assert_eq!(a.castling_rights, b.castling_rights);
}

#[test]
fn different_castling_rights_hash_differently() {
    let with = Board::from_str("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
    let without = Board::from_str("r3k2r/8/8/8/8/8/8/R3K2R w - - 0 1").unwrap();
    assert_ne!(with.zobrist, without.zobrist);
}

#[test]
fn side_to_move_hashes_differently() {
    let white = Board::from_str("4k3/8/8/8/8/8/4P3/4K3 w - - 0 1").unwrap();
    let black = Board::from_str("4k3/8/8/8/8/8/4P3/4K3 b - - 0 1").unwrap();
    assert_ne!(white.zobrist, black.zobrist);
}

#[test]
fn dead_en_passant_square_does_not_change_the_hash() {
    // h3 is set but no black pawn can take; the hash must match the same
    // position without the ep square.
    let with_ep =
        Board::from_str("rnbqkbnr/pppppppp/8/8/7P/8/PPPPPPP1/RNBQKBNR b KQkq h3 0 1").unwrap();
    let without =
        Board::from_str("rnbqkbnr/pppppppp/8/8/7P/8/PPPPPPP1/RNBQKBNR b KQkq - 0 1").unwrap();
    assert_eq!(with_ep.zobrist, without.zobrist);
}

#[test]
fn undo_restores_the_hash_exactly() {
    let tables = load_magic_tables();
    let mut board =
        Board::from_str("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1")
            .unwrap();
    let before = board.zobrist;
    let mut moves = MoveList::new();
    generate_legal(&mut board, &tables, &mut moves, true);
    for sm in &moves {
        let undo = make_move(&mut board, sm.mv);
        undo_move(&mut board, undo);
        assert_eq!(board.zobrist, before, "hash not restored after {}", sm.mv);
    }
}
