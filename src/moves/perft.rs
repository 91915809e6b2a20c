use crate::board::Board;
use crate::moves::execute::{generate_legal, make_move, undo_move};
use crate::moves::magic::MagicTables;
use crate::moves::types::{Move, MoveList};
use tracing::instrument;

fn perft_inner(board: &mut Board, tables: &MagicTables, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }
    let mut moves = MoveList::new();
    generate_legal(board, tables, &mut moves, true);
    if depth == 1 {
        return moves.len() as u64;
    }
    let mut nodes = 0;
    for sm in &moves {
        let undo = make_move(board, sm.mv);
        nodes += perft_inner(board, tables, depth - 1);
        undo_move(board, undo);
    }
    nodes
}

/// Count leaf nodes of the legal move tree to `depth`.
#[instrument(skip(board, tables))]
pub fn perft(board: &mut Board, tables: &MagicTables, depth: u32) -> u64 {
    perft_inner(board, tables, depth)
}

/// Per-root-move node counts, for debugging move generation differences.
pub fn perft_divide(
    board: &mut Board,
    tables: &MagicTables,
    depth: u32,
) -> Vec<(Move, u64)> {
    let mut moves = MoveList::new();
    generate_legal(board, tables, &mut moves, true);
    let mut out = Vec::with_capacity(moves.len());
    for sm in &moves {
        let undo = make_move(board, sm.mv);
        let nodes = if depth == 0 {
            1
        } else {
            perft_inner(board, tables, depth - 1)
        };
        undo_move(board, undo);
        out.push((sm.mv, nodes));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moves::magic::load_magic_tables;

    #[test]
    fn divide_sums_to_perft() {
        let tables = load_magic_tables();
        let mut board = Board::new();
        let total = perft(&mut board, &tables, 3);
        let divided: u64 = perft_divide(&mut board, &tables, 3)
            .iter()
            .map(|(_, n)| n)
            .sum();
        assert_eq!(total, divided);
    }
}
