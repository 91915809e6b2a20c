pub mod context;
pub mod eval;
pub mod ordering;
pub mod search;
pub mod tables;
pub mod tt;

/// Mate-scale score bound; real evaluations stay far inside it.
pub const INF: i32 = 1_048_576;

/// Hard ply ceiling for the main search.
pub const DEPTH_LIMIT: i32 = 30;
