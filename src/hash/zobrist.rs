use crate::bitboard::{FILE_A, FILE_H};
use crate::board::castle_bits::{CASTLE_BK, CASTLE_BQ, CASTLE_WK, CASTLE_WQ};
use crate::board::{Board, Color, Piece};
use once_cell::sync::OnceCell;
use rand::{RngCore, SeedableRng, rngs::StdRng};

#[cfg(feature = "deterministic_zobrist")]
const ZOBRIST_SEED: u64 = 0x51ED_270B_9C4F_F12D;

/// Random key material for position hashing.
pub struct Keys {
    /// `[color][piece][square]`, {White=0, Black=1} x {P,N,B,R,Q,K}.
    pub piece: [[[u64; 64]; 6]; 2],
    /// XORed in when black is to move.
    pub side_to_move: u64,
    /// One key per right, bit order K, Q, k, q.
    pub castling: [u64; 4],
    /// Files a..h.
    pub ep_file: [u64; 8],
}

/// Global key table, generated on first use.
pub fn keys() -> &'static Keys {
    static KEYS: OnceCell<Keys> = OnceCell::new();
    KEYS.get_or_init(generate_keys)
}

fn generate_keys() -> Keys {
    #[cfg(feature = "deterministic_zobrist")]
    let mut rng = StdRng::seed_from_u64(ZOBRIST_SEED);
    #[cfg(not(feature = "deterministic_zobrist"))]
    let mut rng = {
        let mut seed = [0u8; 32];
        rand::rng().fill_bytes(&mut seed);
        StdRng::from_seed(seed)
    };

    // Zero keys would make unrelated fields cancel; skip them.
    let mut next = move || loop {
        let v = rng.next_u64();
        if v != 0 {
            return v;
        }
    };

    let mut keys = Keys {
        piece: [[[0; 64]; 6]; 2],
        side_to_move: next(),
        castling: [0; 4],
        ep_file: [0; 8],
    };
    for color in 0..2 {
        for piece in 0..6 {
            for sq in 0..64 {
                keys.piece[color][piece][sq] = next();
            }
        }
    }
    for right in keys.castling.iter_mut() {
        *right = next();
    }
    for file in keys.ep_file.iter_mut() {
        *file = next();
    }
    keys
}

/// XOR the castling keys for every right that differs between `old` and `new`.
#[inline]
pub fn xor_castling_rights_delta(hash: &mut u64, zob: &Keys, old: u8, new: u8) {
    let delta = old ^ new;
    for (i, flag) in [CASTLE_WK, CASTLE_WQ, CASTLE_BK, CASTLE_BQ].into_iter().enumerate() {
        if delta & flag != 0 {
            *hash ^= zob.castling[i];
        }
    }
}

/// File (0..7) of the en-passant square if it should contribute to the hash
/// this ply. The square only counts while the side to move actually has a
/// pawn that could capture onto it (pseudo-legally; pins are ignored), so
/// transpositions that differ only in a dead en-passant square hash alike.
pub fn ep_file_to_hash(board: &Board) -> Option<u8> {
    let ep = board.en_passant?;
    let target = ep.bb();

    let capturers = match board.side_to_move {
        Color::White => {
            if ep.rank() != 5 {
                return None;
            }
            ((target >> 9) & !FILE_H) | ((target >> 7) & !FILE_A)
        }
        Color::Black => {
            if ep.rank() != 2 {
                return None;
            }
            ((target << 7) & !FILE_A) | ((target << 9) & !FILE_H)
        }
    };

    if capturers & board.bb(board.side_to_move, Piece::Pawn) != 0 {
        Some(ep.file())
    } else {
        None
    }
}
