use outpost::board::{Board, FenError, STARTPOS};
use std::str::FromStr;

#[test]
fn parse_format_is_a_fixed_point() {
    let fens = [
        STARTPOS,
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
        "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
        "4k3/8/8/8/8/8/4P3/4K3 w - - 0 1",
        "6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1",
    ];
    for fen in fens {
        let board = Board::from_str(fen).unwrap();
        assert_eq!(board.to_fen(), fen);
        // And once more through the formatter.
        let again = Board::from_str(&board.to_fen()).unwrap();
        assert_eq!(again, board);
    }
}

#[test]
fn fullmove_field_is_accepted_and_ignored_by_identity() {
    let a = Board::from_str("4k3/8/8/8/8/8/4P3/4K3 w - - 0 1").unwrap();
    let b = Board::from_str("4k3/8/8/8/8/8/4P3/4K3 w - - 0 41").unwrap();
    assert_eq!(a.zobrist, b.zobrist);
    assert_eq!(b.fullmove_number, 41);
}

#[test]
fn shredder_fen_round_trips() {
    let fen = "nrk1brqn/pppppppp/8/8/8/8/PPPPPPPP/NRK1BRQN w FBfb - 0 1";
    let board = Board::from_str(fen).unwrap();
    assert_eq!(board.to_fen(), fen);
    assert_eq!(board.rook_start[0], [5, 1]);
    assert_eq!(board.rook_start[1], [61, 57]);
}

#[test]
fn x_fen_letters_resolve_to_outermost_rooks() {
    // Orthodox letters on a 960 back rank: K/Q pick the rooks outside the
    // king even though they are not on the corner files.
    let fen = "1rk3r1/pppppppp/8/8/8/8/PPPPPPPP/1RK3R1 w KQkq - 0 1";
    let board = Board::from_str(fen).unwrap();
    assert_eq!(board.rook_start[0], [6, 1]);
    assert_eq!(board.rook_start[1], [62, 57]);
    // Formatting uses shredder letters because the rooks are off-corner.
    assert_eq!(board.to_fen(), "1rk3r1/pppppppp/8/8/8/8/PPPPPPPP/1RK3R1 w GBgb - 0 1");
}

#[test]
fn rejects_malformed_input() {
    for bad in [
        "",
        "hello world",
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR",  // missing fields
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP w KQkq - 0 1", // 7 ranks
        "rnbqkbnr/pppppppp/9/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR z KQkq - 0 1",
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KXkq - 0 1",
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq e5 0 1",
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - x 1",
    ] {
        assert!(Board::from_str(bad).is_err(), "accepted: {}", bad);
    }
}

#[test]
fn king_count_is_enforced() {
    assert_eq!(
        Board::from_str("8/8/8/8/8/8/8/KK5k w - - 0 1"),
        Err(FenError::KingCount)
    );
    assert_eq!(
        Board::from_str("8/8/8/8/8/8/8/K7 w - - 0 1"),
        Err(FenError::KingCount)
    );
}

#[test]
fn clock_fields_may_be_omitted() {
    let board = Board::from_str("4k3/8/8/8/8/8/4P3/4K3 b - -").unwrap();
    assert_eq!(board.halfmove_clock, 0);
    assert_eq!(board.fullmove_number, 1);
    assert_eq!(board.to_fen(), "4k3/8/8/8/8/8/4P3/4K3 b - - 0 1");
}
