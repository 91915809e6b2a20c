use crate::board::{Board, Color, FenError, STARTPOS};
use crate::moves::execute::{generate_legal, make_move};
use crate::moves::magic::{MagicTables, load_magic_tables};
use crate::moves::types::MoveList;
use crate::search::context::{InputQueue, RepetitionWindow};
use crate::search::search::{SearchParams, think};
use crate::search::tt::TranspositionTable;
use crate::search::DEPTH_LIMIT;
use std::io::Write;
use thiserror::Error;
use tracing::debug;

pub const NAME: &str = "Outpost 0.9";
pub const AUTHOR: &str = "the Outpost authors";

/// Fatal input problems; the driver prints one diagnostic and exits nonzero.
#[derive(Debug, Error)]
pub enum UciError {
    #[error("bad fen: {0}")]
    Fen(#[from] FenError),
    #[error("bad move: {0}")]
    BadMove(String),
}

/// Parsed GUI commands. Anything unrecognized maps to `Unknown` and is
/// silently dropped, as the protocol asks.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Uci,
    IsReady,
    NewGame,
    SetOption { name: String, value: String },
    Position { fen: Option<String>, moves: Vec<String> },
    Go(GoParams),
    Stop,
    Quit,
    Display,
    Fen,
    Perft(u32),
    Unknown,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GoParams {
    pub infinite: bool,
    pub movetime: Option<u64>,
    pub depth: Option<i32>,
    pub wtime: Option<u64>,
    pub btime: Option<u64>,
    pub winc: u64,
    pub binc: u64,
    pub movestogo: Option<u64>,
}

impl Command {
    pub fn parse(line: &str) -> Command {
        let mut tokens = line.split_whitespace();
        match tokens.next() {
            Some("uci") => Command::Uci,
            Some("isready") => Command::IsReady,
            Some("ucinewgame") => Command::NewGame,
            Some("setoption") => Self::parse_setoption(&mut tokens),
            Some("position") => Self::parse_position(&mut tokens),
            Some("go") => Command::Go(Self::parse_go(&mut tokens)),
            Some("stop") => Command::Stop,
            Some("quit") => Command::Quit,
            Some("d") | Some("display") => Command::Display,
            Some("fen") => Command::Fen,
            Some("perft") => Command::Perft(
                tokens.next().and_then(|t| t.parse().ok()).unwrap_or(1),
            ),
            _ => Command::Unknown,
        }
    }

    fn parse_setoption<'b>(tokens: &mut impl Iterator<Item = &'b str>) -> Command {
        // setoption name <X> value <Y>; both X and Y may span words.
        let mut name = String::new();
        let mut value = String::new();
        let mut in_value = false;
        for token in tokens {
            match token {
                "name" => in_value = false,
                "value" => in_value = true,
                word => {
                    let buf = if in_value { &mut value } else { &mut name };
                    if !buf.is_empty() {
                        buf.push(' ');
                    }
                    buf.push_str(word);
                }
            }
        }
        Command::SetOption { name, value }
    }

    fn parse_position<'b>(tokens: &mut impl Iterator<Item = &'b str>) -> Command {
        let fen = None;
        let mut moves = Vec::new();
        match tokens.next() {
            Some("startpos") => {}
            Some("fen") => {
                let mut fields = Vec::new();
                while let Some(token) = tokens.next() {
                    if token == "moves" {
                        return Command::Position {
                            fen: Some(fields.join(" ")),
                            moves: tokens.map(str::to_string).collect(),
                        };
                    }
                    fields.push(token);
                }
                return Command::Position {
                    fen: Some(fields.join(" ")),
                    moves,
                };
            }
            _ => return Command::Position { fen, moves },
        }
        if tokens.next() == Some("moves") {
            moves = tokens.map(str::to_string).collect();
        }
        Command::Position { fen, moves }
    }

    fn parse_go<'b>(tokens: &mut impl Iterator<Item = &'b str>) -> GoParams {
        let words: Vec<&str> = tokens.collect();
        let number = |i: usize, default: u64| -> u64 {
            words
                .get(i + 1)
                .and_then(|t| t.parse().ok())
                .unwrap_or(default)
        };
        let mut params = GoParams::default();
        let mut i = 0;
        while i < words.len() {
            match words[i] {
                "infinite" => {
                    params.infinite = true;
                    i += 1;
                    continue;
                }
                "movetime" => params.movetime = Some(number(i, 0)),
                "depth" => params.depth = Some(number(i, 1) as i32),
                "wtime" => params.wtime = Some(number(i, 0)),
                "btime" => params.btime = Some(number(i, 0)),
                "winc" => params.winc = number(i, 0),
                "binc" => params.binc = number(i, 0),
                "movestogo" => params.movestogo = Some(number(i, 30)),
                _ => {
                    i += 1;
                    continue;
                }
            }
            i += 2;
        }
        params
    }
}

/// Runtime-configurable behavior, reported under `uci`.
#[derive(Debug, Clone)]
pub struct Options {
    pub chess960: bool,
    pub koth: bool,
    pub level: u8,
    pub move_overhead: u64,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            chess960: false,
            koth: false,
            level: 100,
            move_overhead: 15,
        }
    }
}

/// The engine proper: one authoritative position plus the caches that
/// persist between searches.
pub struct Engine {
    pub board: Board,
    tables: MagicTables,
    tt: TranspositionTable,
    window: RepetitionWindow,
    pub options: Options,
}

impl Engine {
    pub fn new() -> Self {
        let mut board = Board::new_empty();
        board
            .set_fen(STARTPOS)
            .expect("startpos fen is well formed");
        Engine {
            board,
            tables: load_magic_tables(),
            tt: TranspositionTable::new(),
            window: RepetitionWindow::new(),
            options: Options::default(),
        }
    }

    pub fn tables(&self) -> &MagicTables {
        &self.tables
    }

    /// Handle one line. Returns `Ok(false)` when the session should end.
    pub fn handle<W: Write>(
        &mut self,
        line: &str,
        out: &mut W,
        input: Option<&InputQueue>,
    ) -> Result<bool, UciError> {
        let command = Command::parse(line);
        debug!(?command, "uci command");
        match command {
            Command::Uci => {
                let opts = &self.options;
                let _ = writeln!(out, "id name {}", NAME);
                let _ = writeln!(out, "id author {}", AUTHOR);
                let _ = writeln!(
                    out,
                    "option name UCI_Chess960 type check default {}",
                    opts.chess960
                );
                let _ = writeln!(
                    out,
                    "option name UCI_Kingofthehill type check default {}",
                    opts.koth
                );
                let _ = writeln!(
                    out,
                    "option name Level type spin default {} min 0 max 100",
                    opts.level
                );
                let _ = writeln!(
                    out,
                    "option name MoveOverhead type spin default {} min 0 max 5000",
                    opts.move_overhead
                );
                let _ = writeln!(out, "uciok");
            }
            Command::IsReady => {
                let _ = writeln!(out, "readyok");
            }
            Command::NewGame => {
                self.board.set_fen(STARTPOS)?;
                self.window.clear();
                self.tt.clear();
            }
            Command::SetOption { name, value } => self.set_option(&name, &value),
            Command::Position { fen, moves } => {
                self.window.clear();
                self.board.set_fen(fen.as_deref().unwrap_or(STARTPOS))?;
                for token in &moves {
                    self.apply_uci_move(token)?;
                }
            }
            Command::Go(params) => {
                let outcome = self.go(&params, out, input);
                if outcome {
                    return Ok(false);
                }
            }
            Command::Display => {
                let _ = write!(out, "{}", self.board.pretty());
            }
            Command::Fen => {
                let _ = writeln!(out, "{}", self.board.to_fen());
            }
            Command::Quit => return Ok(false),
            Command::Stop | Command::Perft(_) | Command::Unknown => {}
        }
        let _ = out.flush();
        Ok(true)
    }

    fn set_option(&mut self, name: &str, value: &str) {
        match name {
            "UCI_Chess960" => self.options.chess960 = value == "true",
            "UCI_Kingofthehill" => self.options.koth = value == "true",
            "Level" => {
                if let Ok(level) = value.parse::<i64>() {
                    self.options.level = level.clamp(0, 100) as u8;
                }
            }
            "MoveOverhead" => {
                if let Ok(ms) = value.parse::<i64>() {
                    self.options.move_overhead = ms.clamp(0, 5000) as u64;
                }
            }
            _ => {}
        }
    }

    /// Apply one long-algebraic move to the game position, recording the
    /// pre-move hash in the repetition ring.
    fn apply_uci_move(&mut self, token: &str) -> Result<(), UciError> {
        let mut legal = MoveList::new();
        generate_legal(&mut self.board, &self.tables, &mut legal, true);
        let chess960 = self.options.chess960;
        let Some(found) = legal
            .iter()
            .find(|sm| sm.mv.to_uci(&self.board, chess960) == token)
        else {
            return Err(UciError::BadMove(token.to_string()));
        };
        self.window
            .record(self.board.halfmove_clock, self.board.zobrist);
        make_move(&mut self.board, found.mv);
        Ok(())
    }

    /// Run a search per the `go` arguments and emit `bestmove`. Returns true
    /// when a `quit` arrived mid-search.
    fn go<W: Write>(&mut self, go: &GoParams, out: &mut W, input: Option<&InputQueue>) -> bool {
        let opts = &self.options;
        let mut params = SearchParams {
            max_depth: DEPTH_LIMIT,
            budget_ms: u64::MAX,
            analyzing: false,
            koth: opts.koth,
            level: opts.level,
            chess960: opts.chess960,
        };

        if go.infinite {
            params.analyzing = true;
        } else if let Some(ms) = go.movetime {
            params.budget_ms = ms;
        } else if let Some(depth) = go.depth {
            params.max_depth = depth.clamp(1, DEPTH_LIMIT);
        } else {
            let overhead = opts.move_overhead;
            let (time, inc) = match self.board.side_to_move {
                Color::White => (go.wtime.unwrap_or(0), go.winc),
                Color::Black => (go.btime.unwrap_or(0), go.binc),
            };
            let time = time.saturating_sub(overhead);
            let inc = if inc > 0 { inc.saturating_sub(overhead) } else { 0 };
            let mtg = go.movestogo.unwrap_or(30).clamp(1, 30);
            params.budget_ms = time / mtg + inc;
        }

        let outcome = think(
            &mut self.board,
            &self.tables,
            &mut self.tt,
            &mut self.window,
            input,
            &params,
            out,
        );

        match outcome.best {
            Some(mv) => {
                let _ = writeln!(out, "bestmove {}", mv.to_uci(&self.board, self.options.chess960));
            }
            None => {
                let _ = writeln!(out, "bestmove 0000");
            }
        }
        let _ = out.flush();
        outcome.quit
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
