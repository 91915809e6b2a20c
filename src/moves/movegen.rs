use crate::bitboard::{BitboardExt, Bits};
use crate::board::{Board, Color, KINGSIDE, Piece, QUEENSIDE, castle_bit};
use crate::moves::attacks::{king_attacks, knight_attacks, pawn_attacks};
use crate::moves::magic::MagicTables;
use crate::moves::square_control::any_square_attacked;
use crate::moves::types::{
    CAPTURE, DOUBLE_PAWN_PUSH, EN_PASSANT, KINGSIDE_CASTLE, Move, MoveList, PROMOTION,
    PROMOTION_CAPTURE, QUEENSIDE_CASTLE, QUIET_MOVE, ScoredMove,
};
use crate::square::Square;

/// Capture ordering scores, `[attacker][victim]`, most valuable victim by
/// least valuable attacker.
const MVV: [[i32; 6]; 6] = [
    [85, 96, 97, 98, 99, 100],
    [84, 86, 93, 94, 95, 100],
    [82, 83, 87, 91, 92, 100],
    [79, 80, 81, 88, 90, 100],
    [75, 76, 77, 78, 89, 100],
    [70, 71, 72, 73, 74, 100],
];

/// Fixed tactical scores.
const SCORE_PROMOTION: i32 = 100;
const SCORE_EN_PASSANT: i32 = 85;
const SCORE_PAWN_TO_SEVENTH: i32 = 102;

const PROMOS_ALL: [Piece; 4] = [Piece::Knight, Piece::Bishop, Piece::Rook, Piece::Queen];
const PROMOS_QUEEN_ONLY: [Piece; 1] = [Piece::Queen];

#[inline(always)]
fn push(list: &mut MoveList, mv: Move, score: i32) {
    list.push(ScoredMove { mv, score, index: 0 });
}

/// Shared jump/slider move emitter; scores captures by MVV/LVA.
fn push_piece_moves(board: &Board, from: u8, targets: u64, piece: Piece, list: &mut MoveList) {
    for to in Bits(targets) {
        let (score, flags) = match board.piece_type_at(Square::from_index(to)) {
            Some(victim) => (MVV[piece as usize][victim as usize], CAPTURE),
            None => (0, QUIET_MOVE),
        };
        push(
            list,
            Move {
                from: Square::from_index(from),
                to: Square::from_index(to),
                piece,
                promotion: None,
                flags,
            },
            score,
        );
    }
}

fn push_promotions(
    board: &Board,
    from: u8,
    to: u8,
    underpromos: bool,
    list: &mut MoveList,
) {
    let is_capture = board.piece_type_at(Square::from_index(to)).is_some();
    let pieces: &[Piece] = if underpromos {
        &PROMOS_ALL
    } else {
        &PROMOS_QUEEN_ONLY
    };
    for &promo in pieces {
        push(
            list,
            Move {
                from: Square::from_index(from),
                to: Square::from_index(to),
                piece: Piece::Pawn,
                promotion: Some(promo),
                flags: if is_capture { PROMOTION_CAPTURE } else { PROMOTION },
            },
            SCORE_PROMOTION,
        );
    }
}

fn pawn_capture_score(board: &Board, to: u8, to_rank_rel: u8) -> i32 {
    // Any pawn landing on the seventh relative rank outranks its capture
    // score: it is one step from promotion.
    if to_rank_rel == 6 {
        return SCORE_PAWN_TO_SEVENTH;
    }
    match board.piece_type_at(Square::from_index(to)) {
        Some(victim) => MVV[Piece::Pawn as usize][victim as usize],
        None => 0,
    }
}

fn generate_pawn_moves(board: &Board, list: &mut MoveList, underpromos: bool, tactical: bool) {
    let color = board.side_to_move;
    let enemy = board.opponent_occupancy(color);
    let empty = !board.occupied();
    let ep_bb = board.en_passant.map_or(0, |sq| sq.bb());

    let (start_rank, promo_from_rank, up): (u8, u8, i8) = match color {
        Color::White => (1, 6, 8),
        Color::Black => (6, 1, -8),
    };

    for from in Bits(board.pieces(Piece::Pawn, color)) {
        let rank = from >> 3;
        let on_promo_rank = rank == promo_from_rank;

        // Captures, including en passant.
        let caps = pawn_attacks(from as usize, color) & (enemy | ep_bb);
        for to in Bits(caps) {
            if on_promo_rank {
                push_promotions(board, from, to, underpromos, list);
            } else if ep_bb.contains(to) {
                push(
                    list,
                    Move {
                        from: Square::from_index(from),
                        to: Square::from_index(to),
                        piece: Piece::Pawn,
                        promotion: None,
                        flags: EN_PASSANT,
                    },
                    SCORE_EN_PASSANT,
                );
            } else {
                let to_rank_rel = relative_rank(to >> 3, color);
                push(
                    list,
                    Move {
                        from: Square::from_index(from),
                        to: Square::from_index(to),
                        piece: Piece::Pawn,
                        promotion: None,
                        flags: CAPTURE,
                    },
                    pawn_capture_score(board, to, to_rank_rel),
                );
            }
        }

        // Pushes. In tactical mode only the promotion push survives.
        let one = (from as i8 + up) as u8;
        if !empty.contains(one) {
            continue;
        }
        if on_promo_rank {
            push_promotions(board, from, one, underpromos, list);
            continue;
        }
        if tactical {
            continue;
        }
        let to_rank_rel = relative_rank(one >> 3, color);
        push(
            list,
            Move {
                from: Square::from_index(from),
                to: Square::from_index(one),
                piece: Piece::Pawn,
                promotion: None,
                flags: QUIET_MOVE,
            },
            if to_rank_rel == 6 { SCORE_PAWN_TO_SEVENTH } else { 0 },
        );
        if rank == start_rank {
            let two = (one as i8 + up) as u8;
            if empty.contains(two) {
                push(
                    list,
                    Move {
                        from: Square::from_index(from),
                        to: Square::from_index(two),
                        piece: Piece::Pawn,
                        promotion: None,
                        flags: DOUBLE_PAWN_PUSH,
                    },
                    0,
                );
            }
        }
    }
}

#[inline(always)]
fn relative_rank(rank: u8, color: Color) -> u8 {
    match color {
        Color::White => rank,
        Color::Black => 7 - rank,
    }
}

fn generate_castling(board: &Board, tables: &MagicTables, list: &mut MoveList) {
    let color = board.side_to_move;
    let ci = color as usize;
    let occ = board.occupied();
    let base = 56 * ci as u8;

    for (side, king_to) in [(KINGSIDE, base + 6), (QUEENSIDE, base + 2)] {
        if !board.has_castling(castle_bit(ci, side)) {
            continue;
        }
        // All crossed and entered squares empty, the moving king and rook
        // excepted (their bits are not part of the clear mask).
        if board.castle_clear[ci][side] & occ != 0 {
            continue;
        }
        // The king may not pass through or land on an attacked square; its
        // origin is part of the path, so castling out of check fails here.
        if any_square_attacked(
            board,
            board.castle_path[ci][side],
            color.opposite(),
            tables,
        ) {
            continue;
        }
        push(
            list,
            Move {
                from: Square::from_index(board.king_start[ci]),
                to: Square::from_index(king_to),
                piece: Piece::King,
                promotion: None,
                flags: if side == KINGSIDE { KINGSIDE_CASTLE } else { QUEENSIDE_CASTLE },
            },
            0,
        );
    }
}

/// All pseudo-legal moves for the side to move. Legality (own king left in
/// check) is filtered by the caller via make/unmake.
pub fn generate_pseudo_legal(
    board: &Board,
    tables: &MagicTables,
    list: &mut MoveList,
    underpromos: bool,
) {
    generate_piece_moves(board, tables, list, !board.occupancy(board.side_to_move));
    generate_pawn_moves(board, list, underpromos, false);
    generate_castling(board, tables, list);
}

/// Pseudo-legal captures and promotions only (quiescence feed).
pub fn generate_pseudo_tactical(
    board: &Board,
    tables: &MagicTables,
    list: &mut MoveList,
    underpromos: bool,
) {
    generate_piece_moves(board, tables, list, board.opponent_occupancy(board.side_to_move));
    generate_pawn_moves(board, list, underpromos, true);
}

fn generate_piece_moves(board: &Board, tables: &MagicTables, list: &mut MoveList, allowed: u64) {
    let color = board.side_to_move;
    let occ = board.occupied();

    for from in Bits(board.pieces(Piece::Knight, color)) {
        push_piece_moves(board, from, knight_attacks(from as usize) & allowed, Piece::Knight, list);
    }
    for from in Bits(board.pieces(Piece::Bishop, color)) {
        let reach = tables.bishop.get_attacks(from as usize, occ);
        push_piece_moves(board, from, reach & allowed, Piece::Bishop, list);
    }
    for from in Bits(board.pieces(Piece::Rook, color)) {
        let reach = tables.rook.get_attacks(from as usize, occ);
        push_piece_moves(board, from, reach & allowed, Piece::Rook, list);
    }
    for from in Bits(board.pieces(Piece::Queen, color)) {
        let reach = tables.queen_attacks(from as usize, occ);
        push_piece_moves(board, from, reach & allowed, Piece::Queen, list);
    }
    let king = board.pieces(Piece::King, color);
    if king != 0 {
        let from = king.lsb();
        push_piece_moves(board, from, king_attacks(from as usize) & allowed, Piece::King, list);
    }
}
