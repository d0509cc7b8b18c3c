//! Score and control constants for the search.

/// Deepest ply the search will reach.
pub const MAX_PLY: usize = 125;

/// Mate scores start here; ply distance is added so nearer mates win.
pub(crate) const CHECKMATE_SCORE: i32 = -10_000;

/// Scores beyond this magnitude are treated as mate scores.
pub(crate) const CHECKMATE_THRESHOLD: i32 = 9_500;

pub(crate) const DRAW_SCORE: i32 = 0;

/// Full search window bounds.
pub(crate) const SEARCH_MIN: i32 = -100_000;
pub(crate) const SEARCH_MAX: i32 = 100_000;

/// Initial aspiration half-window in centipawns.
pub(crate) const ASPIRATION_WINDOW: i32 = 25;

/// Root depth from which aspiration windows are used.
pub(crate) const ASPIRATION_MIN_DEPTH: i32 = 5;

/// Node visits between cancellation checks.
pub(crate) const CHECK_STOP_EVERY: u32 = 2048;
