#![forbid(unsafe_code)]

//! # consistent-rank
//!
//! Consistent rankings from noisy, possibly contradictory pairwise comparisons.
//!
//! Each comparison is a probability that one item dominates another. The
//! crate finds the smallest total L1 change to those probabilities that makes
//! them transitive, by solving a mixed-integer program, and then layers the
//! resolved relations into compact ranks with a second, independent LP. The
//! minimal change doubles as an inconsistency score for the input.
//!
//! Two variants:
//! - [`find_ranking`]: every pair resolves to greater or less.
//! - [`find_ranking_tolerant`]: pairs near 0.5 may resolve to equal, and ties
//!   share a rank.
//!
//! ```no_run
//! let ranking = consistent_rank::find_ranking([
//!     (("a", "b"), 0.9),
//!     (("b", "c"), 0.8),
//!     (("c", "a"), 0.7),
//! ])?;
//! println!("{:?} {:?} cost={}", ranking.nodes, ranking.ranks, ranking.total_cost);
//! # Ok::<(), consistent_rank::RankingError>(())
//! ```
//!
//! ## Solver backend
//!
//! Models go through [`good_lp`]. The default build uses its pure-Rust
//! `microlp` backend, which needs no system libraries but slows down quickly
//! past a dozen or so nodes. Enable the `highs` cargo feature to have
//! `good_lp::default_solver` pick HiGHS instead.

pub mod comparisons;
pub mod consistency;
pub mod error;
pub mod extract;
pub mod ranking;
pub mod solver;

pub use comparisons::{ComparisonSet, DuplicatePolicy};
pub use consistency::{PairRelation, ResolvedRelation};
pub use error::{Phase, PreconditionViolation, RankingError};
pub use ranking::{
    find_ranking, find_ranking_tolerant, rank_with_config, PairResolution, Ranking,
    RankingConfig, TolerantConfig, Variant, DEFAULT_EQUAL_WIDTH,
};
