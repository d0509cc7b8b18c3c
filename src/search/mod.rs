//! Parallel iterative-deepening search.
//!
//! Lazy-SMP: every worker runs the same iterative deepening over its own
//! clone of the root position, cooperating only through the shared
//! transposition table and killer slots. A shared depth dispenser fans the
//! workers out across root depths, and the first worker to complete a depth
//! publishes its line.

mod constants;
mod worker;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use parking_lot::Mutex;

use crate::board::{Board, Move};
use crate::book::BookSelector;
use crate::ordering::MoveSorter;
use crate::tt::TranspositionTable;

pub use constants::MAX_PLY;
use worker::Worker;

/// Tuning knobs for one search call.
#[derive(Clone, Debug)]
pub struct SearchParams {
    /// Soft deadline in seconds, measured from search start (including the
    /// book lookup); zero or negative disables the deadline.
    pub max_time: f64,
    /// Worker threads to use, capped by the hardware parallelism.
    pub max_workers: usize,
    /// Transposition-table bucket count.
    pub table_size: usize,
    /// Entries per transposition-table bucket.
    pub table_bucket_size: usize,
    /// Maximum root depth; zero means no limit.
    pub max_depth: i32,
    /// Opening-book sampling temperature; zero picks the top weight.
    pub book_temperature: f64,
}

impl Default for SearchParams {
    fn default() -> Self {
        SearchParams {
            max_time: 0.0,
            max_workers: 1,
            table_size: 256_000,
            table_bucket_size: 4,
            max_depth: 0,
            book_temperature: 0.0,
        }
    }
}

/// A completed iteration (or book hit) published to the host.
#[derive(Clone, Debug)]
pub struct SearchReport {
    /// Root depth of the completed iteration; zero for book hits.
    pub depth: i32,
    /// Score in centipawns from the side to move.
    pub score: i32,
    /// Principal variation, best move first.
    pub pv: Vec<Move>,
    /// Nodes visited by the publishing worker during this iteration.
    pub nodes: u64,
    /// Deepest ply reached by the publishing worker.
    pub seldepth: usize,
    /// Transposition-table hits of the publishing worker.
    pub tt_hits: u64,
    /// True when the move came straight from the opening book.
    pub book: bool,
}

/// Callback invoked once per completed depth, in increasing depth order.
pub type SearchHook<'a> = dyn Fn(&SearchReport) + Send + Sync + 'a;

/// Cancellation predicate shared by all workers of one search.
pub(crate) struct Deadline<'a> {
    stop: &'a AtomicBool,
    start: Instant,
    max_time: f64,
}

impl Deadline<'_> {
    pub(crate) fn expired(&self) -> bool {
        if self.stop.load(Ordering::Acquire) {
            return true;
        }
        self.max_time > 0.0 && self.start.elapsed().as_secs_f64() > self.max_time
    }
}

struct Progress {
    next_depth: i32,
    completed: i32,
}

/// Depth dispenser and result publication, shared by all workers.
pub(crate) struct SharedData<'a> {
    progress: Mutex<Progress>,
    hook: Option<&'a SearchHook<'a>>,
    verbose: bool,
}

impl<'a> SharedData<'a> {
    fn new(hook: Option<&'a SearchHook<'a>>, verbose: bool) -> Self {
        SharedData {
            progress: Mutex::new(Progress {
                next_depth: 1,
                completed: 0,
            }),
            hook,
            verbose,
        }
    }

    /// Hand out the next root depth to a free worker. Depths already
    /// completed by a sibling are skipped.
    pub(crate) fn next_depth(&self, max_depth: i32) -> Option<i32> {
        let mut progress = self.progress.lock();
        let depth = progress.next_depth.max(progress.completed + 1);
        if depth > max_depth {
            return None;
        }
        progress.next_depth = depth + 1;
        Some(depth)
    }

    /// Publish a finished iteration if it is the first to reach its depth.
    /// Publication is serialized and depths are strictly increasing.
    pub(crate) fn complete_depth(&self, report: &SearchReport) {
        let mut progress = self.progress.lock();
        if report.depth <= progress.completed {
            return;
        }
        progress.completed = report.depth;
        self.publish(report);
    }

    fn publish(&self, report: &SearchReport) {
        if self.verbose {
            if report.book {
                log::info!("book move {}", report.pv[0]);
            } else {
                let pv: Vec<String> = report.pv.iter().map(ToString::to_string).collect();
                log::info!(
                    "depth {} score {} pv {} nodes {} seldepth {} tthits {}",
                    report.depth,
                    report.score,
                    pv.join(" "),
                    report.nodes,
                    report.seldepth,
                    report.tt_hits
                );
            }
        }
        if let Some(hook) = self.hook {
            hook(report);
        }
    }
}

/// One search owner: holds the stop flag shared with the host.
pub struct Search {
    stop: Arc<AtomicBool>,
}

impl Search {
    #[must_use]
    pub fn new() -> Self {
        Search {
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// The stop flag; setting it cancels the running search.
    #[must_use]
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// Request cancellation of the running search.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Release);
    }

    /// Search `board` and report completed depths through `hook`.
    ///
    /// Consults the opening book first; on a hit the book move is published
    /// as depth 0 and no search runs. The caller's board is not modified.
    /// Blocks until every worker has finished.
    pub fn start_search<'a>(
        &self,
        board: &Board,
        params: &SearchParams,
        book: Option<&BookSelector>,
        verbose: bool,
        hook: Option<&'a SearchHook<'a>>,
    ) {
        // The book lookup counts toward the deadline
        let start = Instant::now();
        self.stop.store(false, Ordering::Release);

        let shared = SharedData::new(hook, verbose);

        if let Some(book) = book {
            let legal = board.generate_moves();
            if let Some(mv) = book.try_select(board.hash(), &legal, params.book_temperature) {
                shared.publish(&SearchReport {
                    depth: 0,
                    score: 0,
                    pv: vec![mv],
                    nodes: 0,
                    seldepth: 0,
                    tt_hits: 0,
                    book: true,
                });
                return;
            }
        }

        let tt = TranspositionTable::new(params.table_size, params.table_bucket_size);
        let sorter = MoveSorter::new();
        let deadline = Deadline {
            stop: &self.stop,
            start,
            max_time: params.max_time,
        };

        let depth_bound = MAX_PLY as i32 + 1;
        let max_depth = if params.max_depth > 0 {
            params.max_depth.min(depth_bound)
        } else {
            depth_bound
        };

        let hardware = thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get);
        let helpers = params.max_workers.max(1).saturating_sub(1).min(hardware);

        thread::scope(|scope| {
            for _ in 0..helpers {
                let mut helper = Worker::new(
                    board.clone_without_history(),
                    &tt,
                    &sorter,
                    &shared,
                    &deadline,
                );
                scope.spawn(move || helper.run(max_depth));
            }

            let mut main = Worker::new(
                board.clone_without_history(),
                &tt,
                &sorter,
                &shared,
                &deadline,
            );
            main.run(max_depth);
        });
    }
}

impl Default for Search {
    fn default() -> Self {
        Search::new()
    }
}
