use crate::board::{Board, Color, KINGSIDE, Piece, QUEENSIDE, castle_bit};
use crate::hash::zobrist::{ep_file_to_hash, keys, xor_castling_rights_delta};
use crate::moves::magic::MagicTables;
use crate::moves::movegen::{generate_pseudo_legal, generate_pseudo_tactical};
use crate::moves::square_control::in_check;
use crate::moves::types::{Move, MoveList, ScoredMove, Undo};
use crate::square::Square;

#[inline(always)]
fn remove_piece(board: &mut Board, color: Color, piece: Piece, idx: u8) {
    let bb = board.bb(color, piece) & !(1u64 << idx);
    board.set_bb(color, piece, bb);
}

#[inline(always)]
fn place_piece(board: &mut Board, color: Color, piece: Piece, idx: u8) {
    let bb = board.bb(color, piece) | (1u64 << idx);
    board.set_bb(color, piece, bb);
}

/// Clear any castling right whose rook starting square is `sq`.
#[inline(always)]
fn clear_rights_for_rook_square(board: &mut Board, color: Color, sq: u8) {
    let ci = color as usize;
    for side in [KINGSIDE, QUEENSIDE] {
        if board.rook_start[ci][side] == sq {
            board.castling_rights &= !castle_bit(ci, side);
        }
    }
}

/// Apply `mv` for the side to move and return the undo snapshot. The hash is
/// maintained incrementally; castling is applied remove-both-then-place-both
/// so Chess960 king/rook overlaps cannot clobber each other.
pub fn make_move(board: &mut Board, mv: Move) -> Undo {
    let zob = keys();
    let color = board.side_to_move;
    let ci = color as usize;

    let mut undo = Undo {
        mv,
        color,
        capture: None,
        castling_rook: None,
        prev_castling_rights: board.castling_rights,
        prev_en_passant: board.en_passant,
        prev_halfmove_clock: board.halfmove_clock,
        prev_fullmove_number: board.fullmove_number,
        prev_zobrist: board.zobrist,
    };

    if let Some(file) = ep_file_to_hash(board) {
        board.zobrist ^= zob.ep_file[file as usize];
    }
    board.en_passant = None;

    let from = mv.from.index();
    let to = mv.to.index();

    if mv.is_castling() {
        let side = if mv.is_kingside_castle() { KINGSIDE } else { QUEENSIDE };
        let rook_from = board.rook_start[ci][side];
        let rook_to = 56 * ci as u8 + if side == KINGSIDE { 5 } else { 3 };

        remove_piece(board, color, Piece::King, from);
        remove_piece(board, color, Piece::Rook, rook_from);
        place_piece(board, color, Piece::King, to);
        place_piece(board, color, Piece::Rook, rook_to);

        undo.castling_rook = Some((Square::from_index(rook_from), Square::from_index(rook_to)));
        board.castling_rights &= !(castle_bit(ci, KINGSIDE) | castle_bit(ci, QUEENSIDE));
        board.halfmove_clock = 0;
    } else {
        if mv.is_en_passant() {
            let cap_sq = if color == Color::White { to - 8 } else { to + 8 };
            remove_piece(board, color.opposite(), Piece::Pawn, cap_sq);
            undo.capture = Some((Piece::Pawn, Square::from_index(cap_sq)));
        } else if let Some((cap_color, cap_piece)) = board.piece_at(mv.to) {
            debug_assert_eq!(cap_color, color.opposite());
            remove_piece(board, cap_color, cap_piece, to);
            undo.capture = Some((cap_piece, mv.to));
            if cap_piece == Piece::Rook {
                clear_rights_for_rook_square(board, cap_color, to);
            }
        }

        remove_piece(board, color, mv.piece, from);
        place_piece(board, color, mv.promotion.unwrap_or(mv.piece), to);

        if mv.piece == Piece::Pawn || undo.capture.is_some() {
            board.halfmove_clock = 0;
        } else {
            board.halfmove_clock += 1;
        }

        if mv.is_double_pawn_push() {
            let ep = if color == Color::White { from + 8 } else { from - 8 };
            board.en_passant = Some(Square::from_index(ep));
        }

        match mv.piece {
            Piece::King => {
                board.castling_rights &=
                    !(castle_bit(ci, KINGSIDE) | castle_bit(ci, QUEENSIDE));
            }
            Piece::Rook => clear_rights_for_rook_square(board, color, from),
            _ => {}
        }
    }

    xor_castling_rights_delta(
        &mut board.zobrist,
        zob,
        undo.prev_castling_rights,
        board.castling_rights,
    );

    if color == Color::Black {
        board.fullmove_number += 1;
    }
    board.side_to_move = color.opposite();
    board.zobrist ^= zob.side_to_move;

    if let Some(file) = ep_file_to_hash(board) {
        board.zobrist ^= zob.ep_file[file as usize];
    }

    undo
}

/// Exact inverse of `make_move`; the saved hash is restored wholesale.
pub fn undo_move(board: &mut Board, undo: Undo) {
    let mv = undo.mv;
    let color = undo.color;

    if let Some((rook_from, rook_to)) = undo.castling_rook {
        remove_piece(board, color, Piece::King, mv.to.index());
        remove_piece(board, color, Piece::Rook, rook_to.index());
        place_piece(board, color, Piece::King, mv.from.index());
        place_piece(board, color, Piece::Rook, rook_from.index());
    } else {
        remove_piece(board, color, mv.promotion.unwrap_or(mv.piece), mv.to.index());
        place_piece(board, color, mv.piece, mv.from.index());
        if let Some((cap_piece, cap_sq)) = undo.capture {
            place_piece(board, color.opposite(), cap_piece, cap_sq.index());
        }
    }

    board.side_to_move = color;
    board.castling_rights = undo.prev_castling_rights;
    board.en_passant = undo.prev_en_passant;
    board.halfmove_clock = undo.prev_halfmove_clock;
    board.fullmove_number = undo.prev_fullmove_number;
    board.zobrist = undo.prev_zobrist;
}

fn filter_legal(
    board: &mut Board,
    tables: &MagicTables,
    pseudo: &MoveList,
    list: &mut MoveList,
) {
    list.clear();
    let mover = board.side_to_move;
    for sm in pseudo {
        let undo = make_move(board, sm.mv);
        let legal = !in_check(board, mover, tables);
        undo_move(board, undo);
        if legal {
            let index = list.len() as u8;
            list.push(ScoredMove { index, ..*sm });
        }
    }
}

/// All legal moves, each stamped with its position in the emitted list (the
/// ordering cache stores these indices).
pub fn generate_legal(
    board: &mut Board,
    tables: &MagicTables,
    list: &mut MoveList,
    underpromos: bool,
) {
    let mut pseudo = MoveList::new();
    generate_pseudo_legal(board, tables, &mut pseudo, underpromos);
    filter_legal(board, tables, &pseudo, list);
}

/// Tactical moves only; when in check every legal move is an evasion and the
/// full set is returned instead.
pub fn generate_tactical(
    board: &mut Board,
    tables: &MagicTables,
    list: &mut MoveList,
    underpromos: bool,
) {
    if in_check(board, board.side_to_move, tables) {
        generate_legal(board, tables, list, underpromos);
        return;
    }
    let mut pseudo = MoveList::new();
    generate_pseudo_tactical(board, tables, &mut pseudo, underpromos);
    filter_legal(board, tables, &pseudo, list);
}
