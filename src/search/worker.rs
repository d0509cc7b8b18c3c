//! A single search worker: iterative deepening with aspiration windows
//! over a principal-variation negamax with quiescence extension.

use crate::board::{evaluate, Board, Move, MoveKind, Piece};
use crate::ordering::MoveSorter;
use crate::tt::{Bound, TranspositionTable, TtEntry};

use super::constants::{
    ASPIRATION_MIN_DEPTH, ASPIRATION_WINDOW, CHECKMATE_SCORE, CHECKMATE_THRESHOLD,
    CHECK_STOP_EVERY, DRAW_SCORE, MAX_PLY, SEARCH_MAX, SEARCH_MIN,
};
use super::{Deadline, SearchReport, SharedData};

/// Triangular principal-variation storage.
struct PvTable {
    moves: [[Move; MAX_PLY + 2]; MAX_PLY + 2],
    len: [usize; MAX_PLY + 2],
}

impl PvTable {
    fn new() -> Box<PvTable> {
        Box::new(PvTable {
            moves: [[Move::EMPTY; MAX_PLY + 2]; MAX_PLY + 2],
            len: [0; MAX_PLY + 2],
        })
    }

    /// Set the PV at `ply` to `mv` followed by the child PV at `ply + 1`.
    fn adopt(&mut self, ply: usize, mv: Move) {
        let child_len = self.len[ply + 1];
        let (head, tail) = self.moves.split_at_mut(ply + 1);
        head[ply][ply] = mv;
        head[ply][ply + 1..child_len].copy_from_slice(&tail[0][ply + 1..child_len]);
        self.len[ply] = child_len.max(ply + 1);
    }

    fn root_line(&self) -> Vec<Move> {
        self.moves[0][..self.len[0]].to_vec()
    }
}

#[derive(Default)]
struct WorkerStats {
    nodes: u64,
    seldepth: usize,
    tt_hits: u64,
}

/// Mate scores from the table are distance-corrected so mates at different
/// plies do not alias.
fn correct_mate_score(value: i32, ply: usize) -> i32 {
    if value > CHECKMATE_THRESHOLD {
        value - ply as i32
    } else if value < -CHECKMATE_THRESHOLD {
        value + ply as i32
    } else {
        value
    }
}

/// One lazy-SMP worker. Owns its position and per-thread search state;
/// shares the transposition table, killer slots, and progress data with
/// its siblings.
pub(super) struct Worker<'a> {
    board: Board,
    tt: &'a TranspositionTable,
    sorter: &'a MoveSorter,
    shared: &'a SharedData<'a>,
    deadline: &'a Deadline<'a>,

    pv: Box<PvTable>,
    ply: usize,
    stats: WorkerStats,
    stop_counter: u32,
    stopped: bool,
    last_best_score: i32,
}

impl<'a> Worker<'a> {
    pub(super) fn new(
        board: Board,
        tt: &'a TranspositionTable,
        sorter: &'a MoveSorter,
        shared: &'a SharedData<'a>,
        deadline: &'a Deadline<'a>,
    ) -> Self {
        Worker {
            board,
            tt,
            sorter,
            shared,
            deadline,
            pv: PvTable::new(),
            ply: 0,
            stats: WorkerStats::default(),
            stop_counter: 0,
            stopped: false,
            last_best_score: 0,
        }
    }

    /// Pull root depths from the shared dispenser until the search is told
    /// to stop or the depth bound is exhausted.
    pub(super) fn run(&mut self, max_depth: i32) {
        while let Some(depth) = self.shared.next_depth(max_depth) {
            self.search_root(depth);
            if self.stopped || self.deadline.expired() {
                break;
            }
        }
    }

    /// One iterative-deepening pass at root depth `depth`, with an
    /// aspiration window seeded by this worker's previous score.
    fn search_root(&mut self, depth: i32) {
        self.stats = WorkerStats::default();
        self.stop_counter = 0;
        self.stopped = false;
        self.ply = 0;
        self.pv.len.fill(0);

        let mut alpha = SEARCH_MIN;
        let mut beta = SEARCH_MAX;
        let mut window = ASPIRATION_WINDOW;
        if depth >= ASPIRATION_MIN_DEPTH {
            alpha = self.last_best_score - window;
            beta = self.last_best_score + window;
        }

        let mut score = 0;
        while !self.should_stop() {
            score = self.alpha_beta::<true>(depth, alpha, beta);
            if score <= alpha {
                beta = (alpha + beta) / 2;
                alpha = (alpha - window).max(SEARCH_MIN);
            } else if score >= beta {
                beta = (alpha + window).min(SEARCH_MAX);
            } else {
                break;
            }
            window += window / 3 + 5;
        }

        if self.stopped {
            return;
        }

        self.last_best_score = score;
        self.shared.complete_depth(&SearchReport {
            depth,
            score,
            pv: self.pv.root_line(),
            nodes: self.stats.nodes,
            seldepth: self.stats.seldepth,
            tt_hits: self.stats.tt_hits,
            book: false,
        });
    }

    /// Cooperative cancellation, polled every few thousand node visits.
    fn should_stop(&mut self) -> bool {
        if self.stopped {
            return true;
        }
        self.stop_counter += 1;
        if self.stop_counter % CHECK_STOP_EVERY == 0 {
            self.stopped = self.deadline.expired();
        }
        self.stopped
    }

    fn alpha_beta<const PV: bool>(&mut self, mut depth: i32, mut alpha: i32, mut beta: i32) -> i32 {
        if self.should_stop() {
            return 0;
        }

        let in_check = self.board.checkers().any();
        if in_check {
            depth += 1;
        }

        self.stats.nodes += 1;
        self.stats.seldepth = self.stats.seldepth.max(self.ply);
        self.pv.len[self.ply] = self.ply;

        // Aggressive draw handling: a repetition anywhere, including along
        // the current search path, is scored as a draw
        if self.board.halfmove_clock() >= 50 || self.board.max_repetitions() >= 3 {
            return DRAW_SCORE;
        }

        if self.ply >= MAX_PLY {
            return evaluate(&self.board);
        }

        let is_root = self.ply == 0;
        let mut tt_entry: Option<TtEntry> = None;

        if !is_root {
            tt_entry = self.tt.probe(self.board.hash());
            // A stored move that is impossible here means the entry is
            // stale or aliased; discard it
            if let Some(entry) = tt_entry {
                if !self.board.is_legal(entry.best_move) {
                    tt_entry = None;
                }
            }
            if let Some(entry) = tt_entry {
                if !entry.from_quiescence {
                    if let Some(hit) = entry.apply(depth, &mut alpha, &mut beta) {
                        self.stats.tt_hits += 1;
                        if hit == Bound::Exact {
                            return correct_mate_score(entry.value, self.ply);
                        }
                        if alpha >= beta {
                            return alpha;
                        }
                    }
                }
            }
        }

        // Internal iterative reduction: a PV node without a table move is
        // unlikely to be on the final line
        if PV && self.ply > 2 && tt_entry.is_none() {
            depth -= 2;
        }

        if depth <= 0 {
            return self.quiescence(depth, alpha, beta);
        }

        let moves = self.board.generate_moves();
        let tt_move = tt_entry.map_or(Move::EMPTY, |entry| entry.best_move);
        let tt_move_is_capture = tt_move.is_capture();
        let mut scored = self.sorter.score_moves(&self.board, &moves, self.ply, tt_move);
        let count = scored.len();

        let mut do_pvs = false;
        let mut best_score = i32::MIN;
        let mut best_move = Move::EMPTY;
        let mut legal_moves = 0;
        let mut entry_bound = Bound::Alpha;

        // Late-move pruning: on quiet non-PV nodes, the tail of the ordered
        // list is not worth visiting
        let mut cut_late_moves = !in_check && !PV && self.ply > 2;
        let cut_index = count * 2 / 3;

        for index in 0..count {
            let scored_move = scored.pick(index);
            let mv = scored_move.mv;

            if cut_late_moves
                && index >= cut_index
                && !mv.is_capture()
                && scored_move.moved != Piece::Pawn
            {
                break;
            }

            if !mv.is_castle() && !self.board.is_legal(mv) {
                continue;
            }

            legal_moves += 1;
            self.ply += 1;
            self.board.make_move(mv);

            let gives_check = self.board.checkers().any();
            let mut lmr = 0;
            if !do_pvs
                && legal_moves > 1
                && depth >= 3
                && !in_check
                && !gives_check
                && mv.kind() != MoveKind::Quiet
                && scored_move.moved != Piece::Pawn
                && !self.sorter.is_killer(mv, self.ply - 1)
            {
                lmr = 1 + if legal_moves > 6 {
                    self.ply as i32 / 3
                } else {
                    0
                };
                if PV {
                    lmr = lmr * 2 / 3;
                }
                if tt_move_is_capture {
                    lmr += 1;
                }
            }

            let new_depth = depth - lmr;

            let score = if do_pvs {
                let mut score = -self.alpha_beta::<true>(new_depth - 1, -alpha - 1, -alpha);
                if score > alpha && score < beta {
                    score = -self.alpha_beta::<true>(new_depth - 1, -beta, -alpha);
                }
                score
            } else {
                let mut score = -self.alpha_beta::<false>(new_depth - 1, -beta, -alpha);
                if score > alpha && lmr > 0 {
                    // Fail-high on a reduced search: verify at full depth
                    score = -self.alpha_beta::<false>(depth - 1, -beta, -alpha);
                }
                score
            };

            self.board.undo_move();
            self.ply -= 1;

            if self.stopped {
                return 0;
            }

            if score > best_score {
                best_score = score;
                best_move = mv;
            }

            if score >= beta {
                self.tt.insert(TtEntry {
                    hash: self.board.hash(),
                    best_move,
                    bound: Bound::Beta,
                    depth,
                    value: beta,
                    from_quiescence: false,
                });
                // Quiet promotions are not really quiet
                if mv.kind() == MoveKind::Quiet {
                    self.sorter.store_killer(mv, scored_move.score, self.ply);
                }
                return beta;
            }

            if score > alpha {
                cut_late_moves = false;
                do_pvs = true;
                self.pv.adopt(self.ply, mv);
                alpha = score;
                entry_bound = Bound::Exact;
            }
        }

        if legal_moves == 0 {
            return if in_check {
                CHECKMATE_SCORE + self.ply as i32
            } else {
                DRAW_SCORE
            };
        }

        self.tt.insert(TtEntry {
            hash: self.board.hash(),
            best_move,
            bound: entry_bound,
            depth,
            value: alpha,
            from_quiescence: false,
        });

        alpha
    }

    fn quiescence(&mut self, depth: i32, mut alpha: i32, mut beta: i32) -> i32 {
        if self.should_stop() {
            return 0;
        }

        self.stats.nodes += 1;
        self.stats.seldepth = self.stats.seldepth.max(self.ply);
        self.pv.len[self.ply] = self.ply;

        if self.board.halfmove_clock() >= 50 || self.board.max_repetitions() >= 3 {
            return DRAW_SCORE;
        }

        let start_alpha = alpha;
        let in_check = self.board.checkers().any();
        let mut stand_pat = i32::MIN;
        let mut tt_move = Move::EMPTY;

        if !in_check {
            let mut tt_entry = self.tt.probe(self.board.hash());
            if let Some(entry) = tt_entry {
                if !self.board.is_legal(entry.best_move) {
                    tt_entry = None;
                }
            }
            if let Some(entry) = tt_entry {
                tt_move = entry.best_move;
                if let Some(hit) = entry.apply(depth, &mut alpha, &mut beta) {
                    self.stats.tt_hits += 1;
                    if hit == Bound::Exact {
                        return correct_mate_score(entry.value, self.ply);
                    }
                    if alpha >= beta {
                        return alpha;
                    }
                }
            }

            stand_pat = evaluate(&self.board);
            alpha = alpha.max(stand_pat);
            if alpha >= beta {
                return stand_pat;
            }
        }

        if self.ply >= MAX_PLY {
            return if in_check {
                evaluate(&self.board)
            } else {
                stand_pat
            };
        }

        // In check every evasion matters, otherwise only tactical moves
        let moves = if in_check {
            self.board.generate_moves()
        } else {
            self.board.generate_noisy_moves()
        };
        let mut scored = self.sorter.score_moves(&self.board, &moves, self.ply, tt_move);
        let count = scored.len();

        let mut best_move = Move::EMPTY;
        let mut legal_moves = 0;

        for index in 0..count {
            let scored_move = scored.pick(index);
            let mv = scored_move.mv;

            if !mv.is_castle() && !self.board.is_legal(mv) {
                continue;
            }

            legal_moves += 1;
            self.ply += 1;
            self.board.make_move(mv);

            let score = -self.quiescence(depth - 1, -beta, -alpha);

            self.board.undo_move();
            self.ply -= 1;

            if self.stopped {
                return 0;
            }

            if score >= beta {
                break;
            }

            if score > alpha {
                best_move = mv;
                self.pv.adopt(self.ply, mv);
                alpha = score;
            }
        }

        if legal_moves == 0 {
            return if in_check {
                CHECKMATE_SCORE + self.ply as i32
            } else {
                alpha
            };
        }

        if !in_check {
            let bound = if alpha <= start_alpha {
                Bound::Alpha
            } else if alpha >= beta {
                Bound::Beta
            } else {
                Bound::Exact
            };
            self.tt.insert(TtEntry {
                hash: self.board.hash(),
                best_move,
                bound,
                depth,
                value: alpha,
                from_quiescence: true,
            });
        }

        alpha
    }
}
