use crate::board::{Board, Piece};
use crate::moves::execute::{generate_legal, generate_tactical, make_move, undo_move};
use crate::moves::magic::MagicTables;
use crate::moves::square_control::in_check;
use crate::moves::types::{Move, MoveList, ScoredMove};
use crate::search::context::{InputQueue, RepetitionWindow, SearchClock};
use crate::search::eval::evaluate;
use crate::search::ordering;
use crate::search::tables::HILL_SQUARES;
use crate::search::tt::{HintKind, TranspositionTable};
use crate::search::{DEPTH_LIMIT, INF};
use rand::Rng;
use std::io::Write;
use tracing::debug;

/// One `go` invocation's limits and rules.
pub struct SearchParams {
    /// Iterative-deepening ceiling, 1..=DEPTH_LIMIT.
    pub max_depth: i32,
    pub budget_ms: u64,
    /// `go infinite`: poll the input queue for `stop`.
    pub analyzing: bool,
    pub koth: bool,
    pub level: u8,
    pub chess960: bool,
}

pub struct SearchOutcome {
    /// Side-to-move-relative score of the last completed depth.
    pub score: i32,
    pub best: Option<Move>,
    pub nodes: u64,
    /// A `quit` arrived while searching.
    pub quit: bool,
}

struct RootMove {
    sm: ScoredMove,
    sort: i32,
}

struct Searcher<'a> {
    board: &'a mut Board,
    tables: &'a MagicTables,
    tt: &'a mut TranspositionTable,
    window: &'a mut RepetitionWindow,
    input: Option<&'a InputQueue>,
    clock: SearchClock,
    nodes: u64,
    qs_depth: i32,
    koth: bool,
    level: u8,
}

impl<'a> Searcher<'a> {
    /// Sticky stop plus the 1-in-256 node poll of clock and input.
    #[inline(always)]
    fn stop_now(&mut self) -> bool {
        if self.clock.stop {
            return true;
        }
        if self.nodes & 0xFF == 0 {
            return self.clock.poll(self.input);
        }
        false
    }

    #[inline(always)]
    fn side_eval(&mut self) -> i32 {
        self.board.side_to_move.sign()
            * evaluate(self.board, self.tables, self.tt, self.koth, self.level)
    }

    /// KOTH is decided the moment either king stands on the hill.
    fn hill_terminal(&self) -> Option<i32> {
        if !self.koth {
            return None;
        }
        let us = self.board.side_to_move;
        if self.board.bb(us, Piece::King) & HILL_SQUARES != 0 {
            return Some(INF);
        }
        if self.board.bb(us.opposite(), Piece::King) & HILL_SQUARES != 0 {
            return Some(-INF);
        }
        None
    }

    fn quiescence(&mut self, mut alpha: i32, beta: i32, depth: i32) -> i32 {
        self.nodes += 1;
        if self.stop_now() {
            return 0;
        }
        // Stand pat: the side to move may decline all tactics.
        let stand = self.side_eval();
        if stand > alpha {
            alpha = stand;
        }
        if depth <= 0 || alpha >= beta {
            return alpha;
        }
        let mut moves = MoveList::new();
        generate_tactical(self.board, self.tables, &mut moves, false);
        ordering::sort_all(&mut moves);
        for i in 0..moves.len() {
            let undo = make_move(self.board, moves[i].mv);
            let score = -self.quiescence(-beta, -alpha, depth - 1);
            undo_move(self.board, undo);
            if score > alpha {
                alpha = score;
                if alpha >= beta {
                    return alpha;
                }
            }
        }
        alpha
    }

    fn negamax(&mut self, alpha: i32, beta: i32, depth: i32, ply: i32) -> i32 {
        self.nodes += 1;
        if self.stop_now() {
            return 0;
        }
        if let Some(terminal) = self.hill_terminal() {
            return terminal;
        }
        if depth <= 0 || ply >= DEPTH_LIMIT {
            return self.quiescence(alpha, beta, self.qs_depth);
        }

        // Park this node's hash in the clock-indexed slot for descendants to
        // compare against; the displaced value comes back on unwind.
        let clock = self.board.halfmove_clock;
        let prev = self.window.record(clock, self.board.zobrist);
        let score = if clock >= 100 || self.window.is_repetition(clock) {
            0
        } else {
            self.search_moves(alpha, beta, depth, ply)
        };
        self.window.restore(clock, prev);
        score
    }

    fn search_moves(&mut self, mut alpha: i32, beta: i32, mut depth: i32, ply: i32) -> i32 {
        let hash = self.board.zobrist;
        let us = self.board.side_to_move;
        let checked = in_check(self.board, us, self.tables);

        let mut moves = MoveList::new();
        generate_legal(self.board, self.tables, &mut moves, false);
        if moves.is_empty() {
            return if checked { -INF } else { 0 };
        }
        // Forced replies and early checks see one ply deeper.
        if moves.len() == 1 || (ply < 5 && checked) {
            depth += 1;
        }

        let mut ok_lmr = moves.len() >= 5 && depth >= 2 && !checked;
        ordering::sort_with_hints(&mut moves, self.tt, hash);

        for i in 0..moves.len() {
            let sm = moves[i];
            let undo = make_move(self.board, sm.mv);

            // Late quiet moves get a reduced look first; only a score above
            // alpha earns the full-depth search.
            if ok_lmr
                && i >= 2
                && sm.score == 0
                && !in_check(self.board, self.board.side_to_move, self.tables)
            {
                let reduction = 2 + (i as i32 / 23).min(1);
                let reduced = -self.negamax(-beta, -alpha, depth - reduction, ply + 1);
                if reduced <= alpha {
                    undo_move(self.board, undo);
                    continue;
                }
            }

            let score = -self.negamax(-beta, -alpha, depth - 1, ply + 1);
            undo_move(self.board, undo);
            if self.clock.stop {
                return 0;
            }

            if score > alpha {
                alpha = score;
                ok_lmr = false;
                if alpha >= beta {
                    self.tt.store_hint(hash, HintKind::Killer, sm.index);
                    return alpha;
                }
                let kind = if sm.score != 0 { HintKind::Good } else { HintKind::Quiet };
                self.tt.store_hint(hash, kind, sm.index);
            }
        }
        alpha
    }

    /// Root move list with underpromotions restored, ordered by a static
    /// pre-score: generation score, castle bonus, underpromotion penalty,
    /// the child's eval and a little jitter.
    fn root_moves(&mut self) -> Vec<RootMove> {
        let sign = self.board.side_to_move.sign();
        let mut list = MoveList::new();
        generate_legal(self.board, self.tables, &mut list, true);

        let mut rng = rand::rng();
        let mut root: Vec<RootMove> = list
            .iter()
            .map(|&sm| {
                let undo = make_move(self.board, sm.mv);
                let child_eval =
                    sign * evaluate(self.board, self.tables, self.tt, self.koth, self.level);
                undo_move(self.board, undo);

                let mut sort = sm.score + child_eval + rng.random_range(-5..=5);
                if sm.mv.is_castling() {
                    sort += 5000;
                }
                if let Some(promo) = sm.mv.promotion
                    && promo != Piece::Queen
                {
                    sort -= 10000;
                }
                RootMove { sm, sort }
            })
            .collect();
        root.sort_by_key(|r| std::cmp::Reverse(r.sort));
        root
    }

    /// One full-depth pass over the root moves. The first move gets the
    /// open window; later moves must first beat alpha in a null window
    /// before the verifying re-search. The best move rotates to the front.
    fn root_search(&mut self, root: &mut [RootMove], depth: i32, prev_best: i32) -> i32 {
        let mut alpha = -INF;
        let mut best_i = 0;
        for i in 0..root.len() {
            let undo = make_move(self.board, root[i].sm.mv);
            let score = if depth >= 1 && i >= 1 {
                let scout = -self.negamax(-(alpha + 1), -alpha, depth, 0);
                if scout > alpha {
                    -self.negamax(-INF, -alpha, depth, 0)
                } else {
                    scout
                }
            } else {
                -self.negamax(-INF, -alpha, depth, 0)
            };
            undo_move(self.board, undo);
            if self.clock.stop {
                return prev_best;
            }
            if score > alpha {
                alpha = score;
                best_i = i;
            }
        }
        root[..=best_i].rotate_right(1);
        alpha
    }

    fn speak<W: Write>(&mut self, out: &mut W, params: &SearchParams, depth: i32, score: i32, root: &[RootMove]) {
        let ms = self.clock.elapsed_ms();
        let nps = 1000 * self.nodes / (ms + 1);
        let factor: f32 = if score.abs() >= INF / 2 { 0.01 } else { 0.1 };
        let cp = (factor * score as f32) as i32;
        let _ = writeln!(
            out,
            "info depth {} nodes {} time {} nps {} score cp {} pv {}",
            params.max_depth.min(depth + 1),
            self.nodes,
            ms,
            nps,
            cp,
            root[0].sm.mv.to_uci(self.board, params.chess960)
        );
        let _ = out.flush();
    }
}

/// Iterative deepening driver. Reports one `info` line per completed depth
/// and leaves the chosen move at the front of the root list.
pub fn think<W: Write>(
    board: &mut Board,
    tables: &MagicTables,
    tt: &mut TranspositionTable,
    window: &mut RepetitionWindow,
    input: Option<&InputQueue>,
    params: &SearchParams,
    out: &mut W,
) -> SearchOutcome {
    let mut searcher = Searcher {
        board,
        tables,
        tt,
        window,
        input,
        clock: SearchClock::new(params.budget_ms, params.analyzing),
        nodes: 0,
        qs_depth: 4,
        koth: params.koth,
        level: params.level,
    };

    let mut root = searcher.root_moves();
    if root.is_empty() {
        return SearchOutcome {
            score: 0,
            best: None,
            nodes: 0,
            quit: false,
        };
    }

    // Level 0 plays a uniformly random legal move without searching.
    if params.level == 0 {
        let pick = rand::rng().random_range(0..root.len());
        root.swap(0, pick);
        searcher.speak(out, params, 0, 0, &root);
        return SearchOutcome {
            score: 0,
            best: Some(root[0].sm.mv),
            nodes: 0,
            quit: false,
        };
    }

    let mut best_score: i32 = 0;
    let mut depth = 0;
    if root.len() > 1 {
        while best_score.abs() < INF / 2 && depth < params.max_depth && !searcher.clock.stop {
            best_score = searcher.root_search(&mut root, depth, best_score);
            searcher.speak(out, params, depth, best_score, &root);
            debug!(depth, best_score, nodes = searcher.nodes, "depth complete");
            searcher.qs_depth = (searcher.qs_depth + 2).min(12);
            depth += 1;
        }
    }
    searcher.speak(out, params, depth, best_score, &root);

    SearchOutcome {
        score: best_score,
        best: Some(root[0].sm.mv),
        nodes: searcher.nodes,
        quit: searcher.clock.quit,
    }
}
