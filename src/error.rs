//! Error types for ranking calls.

use std::fmt;

use thiserror::Error;

/// Which of the two solves a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Minimal-correction model that resolves every compared pair.
    Consistency,
    /// Longest-chain layering over the resolved relations.
    MinimalRank,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Consistency => f.write_str("consistency"),
            Phase::MinimalRank => f.write_str("minimal-rank"),
        }
    }
}

/// Input or configuration rejected before any model is built.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PreconditionViolation {
    #[error("comparison {pair} has strength {value}, expected a value in [0, 1]")]
    ProbabilityOutOfRange { pair: String, value: f64 },
    #[error("item {item} is compared with itself")]
    SelfComparison { item: String },
    #[error("comparison {pair} is given twice with different strengths ({first} vs {second})")]
    ConflictingComparison {
        pair: String,
        first: f64,
        second: f64,
    },
    #[error("equal_width must lie in [0, 1], got {equal_width}")]
    EqualWidthOutOfRange { equal_width: f64 },
    #[error("max_rank must be at least 1")]
    ZeroMaxRank,
}

/// Errors returned by [`crate::find_ranking`] and friends.
#[derive(Debug, Error)]
pub enum RankingError {
    #[error("precondition violated: {0}")]
    Precondition(#[from] PreconditionViolation),

    /// Cannot happen for validated input: corrections always admit a feasible point.
    #[error("{phase} model is infeasible")]
    Infeasible { phase: Phase },

    /// Both halves of an absolute-value split came back positive.
    #[error("abs linearization broken for pair {pair}: positive part {positive}, negative part {negative}")]
    NumericalInconsistency {
        pair: String,
        positive: f64,
        negative: f64,
    },

    #[error("solver failed during {phase} solve: {source}")]
    Solver {
        phase: Phase,
        #[source]
        source: good_lp::ResolutionError,
    },
}

impl RankingError {
    pub(crate) fn from_resolution(phase: Phase, source: good_lp::ResolutionError) -> Self {
        match source {
            good_lp::ResolutionError::Infeasible => RankingError::Infeasible { phase },
            source => RankingError::Solver { phase, source },
        }
    }

    /// True for failures caused by the caller's input rather than the solve.
    pub fn is_precondition(&self) -> bool {
        matches!(self, RankingError::Precondition(_))
    }
}
