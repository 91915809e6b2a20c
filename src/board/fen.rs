use super::{Board, COLORS, Color, KINGSIDE, Piece, QUEENSIDE, castle_bit};
use crate::bitboard::BitboardExt;
use crate::square::Square;
use thiserror::Error;

/// Orthodox starting position.
pub const STARTPOS: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Reasons a FEN string is rejected. All of these are fatal at the driver.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FenError {
    #[error("expected 4 to 6 FEN fields, got {0}")]
    FieldCount(usize),
    #[error("bad piece placement: {0}")]
    Placement(String),
    #[error("bad side to move: {0}")]
    SideToMove(String),
    #[error("bad castling field: {0}")]
    Castling(String),
    #[error("bad en passant square: {0}")]
    EnPassant(String),
    #[error("bad halfmove clock: {0}")]
    HalfmoveClock(String),
    #[error("each side needs exactly one king")]
    KingCount,
}

pub(crate) fn piece_glyph(color: Color, piece: Piece) -> char {
    let glyph = match piece {
        Piece::Pawn => 'p',
        Piece::Knight => 'n',
        Piece::Bishop => 'b',
        Piece::Rook => 'r',
        Piece::Queen => 'q',
        Piece::King => 'k',
    };
    match color {
        Color::White => glyph.to_ascii_uppercase(),
        Color::Black => glyph,
    }
}

fn piece_from_glyph(c: char) -> Option<(Color, Piece)> {
    let color = if c.is_ascii_uppercase() {
        Color::White
    } else {
        Color::Black
    };
    let piece = match c.to_ascii_lowercase() {
        'p' => Piece::Pawn,
        'n' => Piece::Knight,
        'b' => Piece::Bishop,
        'r' => Piece::Rook,
        'q' => Piece::Queen,
        'k' => Piece::King,
        _ => return None,
    };
    Some((color, piece))
}

impl Board {
    /// Load a position from a FEN string. Fields five (halfmove clock) and
    /// six (fullmove number) may be omitted; field six is stored but takes
    /// no part in hashing or search.
    pub fn set_fen(&mut self, fen: &str) -> Result<(), FenError> {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if !(4..=6).contains(&fields.len()) {
            return Err(FenError::FieldCount(fields.len()));
        }

        *self = Board::new_empty();
        self.parse_placement(fields[0])?;

        self.side_to_move = match fields[1] {
            "w" => Color::White,
            "b" => Color::Black,
            other => return Err(FenError::SideToMove(other.into())),
        };

        for &color in &COLORS {
            if self.bb(color, Piece::King).count_ones() != 1 {
                return Err(FenError::KingCount);
            }
            self.king_start[color as usize] = self.bb(color, Piece::King).lsb();
        }

        self.castling_rights = 0;
        self.parse_castling(fields[2])?;
        self.rebuild_castle_masks();

        self.en_passant = match fields[3] {
            "-" => None,
            s => {
                let sq: Square = s
                    .parse()
                    .map_err(|_| FenError::EnPassant(s.into()))?;
                if sq.rank() != 2 && sq.rank() != 5 {
                    return Err(FenError::EnPassant(s.into()));
                }
                Some(sq)
            }
        };

        self.halfmove_clock = match fields.get(4) {
            None | Some(&"-") => 0,
            Some(s) => s
                .parse::<u32>()
                .map(|n| n.min(100))
                .map_err(|_| FenError::HalfmoveClock((*s).into()))?,
        };
        self.fullmove_number = fields
            .get(5)
            .and_then(|s| s.parse().ok())
            .unwrap_or(1);

        self.refresh_zobrist();
        Ok(())
    }

    fn parse_placement(&mut self, placement: &str) -> Result<(), FenError> {
        let ranks: Vec<&str> = placement.split('/').collect();
        if ranks.len() != 8 {
            return Err(FenError::Placement(placement.into()));
        }
        for (i, rank_str) in ranks.iter().enumerate() {
            let rank = 7 - i as u8;
            let mut file = 0u8;
            for c in rank_str.chars() {
                if let Some(skip) = c.to_digit(10) {
                    file += skip as u8;
                } else if let Some((color, piece)) = piece_from_glyph(c) {
                    if file > 7 {
                        return Err(FenError::Placement(placement.into()));
                    }
                    let sq = Square::from_coords(file, rank);
                    self.set_bb(color, piece, self.bb(color, piece) | sq.bb());
                    file += 1;
                } else {
                    return Err(FenError::Placement(placement.into()));
                }
            }
            if file != 8 {
                return Err(FenError::Placement(placement.into()));
            }
        }
        Ok(())
    }

    /// Castling field: `-`, orthodox `KQkq`, or shredder rook files `A-H`
    /// / `a-h`. `K`/`Q` resolve to the outermost rook on the king's side so
    /// X-FEN positions load too.
    fn parse_castling(&mut self, field: &str) -> Result<(), FenError> {
        if field == "-" {
            return Ok(());
        }
        for c in field.chars() {
            let (color, side, rook_file) = match c {
                'K' => (Color::White, KINGSIDE, self.outermost_rook(Color::White, KINGSIDE)),
                'Q' => (Color::White, QUEENSIDE, self.outermost_rook(Color::White, QUEENSIDE)),
                'k' => (Color::Black, KINGSIDE, self.outermost_rook(Color::Black, KINGSIDE)),
                'q' => (Color::Black, QUEENSIDE, self.outermost_rook(Color::Black, QUEENSIDE)),
                'A'..='H' => {
                    let file = c as u8 - b'A';
                    let side = self.side_for_rook_file(Color::White, file, field)?;
                    (Color::White, side, Some(file))
                }
                'a'..='h' => {
                    let file = c as u8 - b'a';
                    let side = self.side_for_rook_file(Color::Black, file, field)?;
                    (Color::Black, side, Some(file))
                }
                _ => return Err(FenError::Castling(field.into())),
            };
            // A live right implies the king still stands on its back rank.
            if self.king_start[color as usize] >> 3 != 7 * color as u8 {
                return Err(FenError::Castling(field.into()));
            }
            let Some(rook_file) = rook_file else {
                return Err(FenError::Castling(field.into()));
            };
            let rook_sq = rook_file + 56 * color as u8;
            if !self.bb(color, Piece::Rook).contains(rook_sq) {
                return Err(FenError::Castling(field.into()));
            }
            self.rook_start[color as usize][side] = rook_sq;
            self.castling_rights |= castle_bit(color as usize, side);
        }
        Ok(())
    }

    fn outermost_rook(&self, color: Color, side: usize) -> Option<u8> {
        let king_file = self.king_start[color as usize] & 7;
        let rooks = self.bb(color, Piece::Rook);
        let base = 56 * color as u8;
        if side == KINGSIDE {
            (king_file + 1..8).rev().find(|&f| rooks.contains(base + f))
        } else {
            (0..king_file).find(|&f| rooks.contains(base + f))
        }
    }

    fn side_for_rook_file(&self, color: Color, file: u8, field: &str) -> Result<usize, FenError> {
        let king_file = self.king_start[color as usize] & 7;
        if file > king_file {
            Ok(KINGSIDE)
        } else if file < king_file {
            Ok(QUEENSIDE)
        } else {
            Err(FenError::Castling(field.into()))
        }
    }

    /// Render the position as a six-field FEN. Shredder rook-file letters
    /// are emitted whenever a right's rook does not stand on the classical
    /// corner square.
    pub fn to_fen(&self) -> String {
        let mut out = String::new();
        for rank in (0..8u8).rev() {
            let mut empty = 0;
            for file in 0..8u8 {
                match self.piece_at(Square::from_coords(file, rank)) {
                    Some((color, piece)) => {
                        if empty > 0 {
                            out.push_str(&empty.to_string());
                            empty = 0;
                        }
                        out.push(piece_glyph(color, piece));
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                out.push_str(&empty.to_string());
            }
            if rank > 0 {
                out.push('/');
            }
        }

        out.push(' ');
        out.push(match self.side_to_move {
            Color::White => 'w',
            Color::Black => 'b',
        });

        out.push(' ');
        if self.castling_rights == 0 {
            out.push('-');
        } else {
            for (color, side, classical, letter) in [
                (Color::White, KINGSIDE, 7u8, 'K'),
                (Color::White, QUEENSIDE, 0, 'Q'),
                (Color::Black, KINGSIDE, 63, 'k'),
                (Color::Black, QUEENSIDE, 56, 'q'),
            ] {
                if !self.has_castling(castle_bit(color as usize, side)) {
                    continue;
                }
                let rook_sq = self.rook_start[color as usize][side];
                if rook_sq == classical {
                    out.push(letter);
                } else {
                    let file_letter = (b'A' + (rook_sq & 7)) as char;
                    out.push(match color {
                        Color::White => file_letter,
                        Color::Black => file_letter.to_ascii_lowercase(),
                    });
                }
            }
        }

        out.push(' ');
        match self.en_passant {
            Some(sq) => out.push_str(&sq.to_string()),
            None => out.push('-'),
        }
        out.push_str(&format!(" {} {}", self.halfmove_clock, self.fullmove_number));
        out
    }
}
