//! Phase 1: minimal-correction consistency models.
//!
//! Each observed strength `s` gets a signed correction `e` so that `s + e`
//! lands in the region of a hard decision (greater / less, and equal for the
//! tolerant variant). Triangle closure plus a bounded rank surrogate force the
//! decisions to be globally acyclic, and the objective is the total L1
//! correction.
//!
//! Two variants share the plumbing in this module:
//! - [`basic`]: one binary per pair, threshold at 0.5.
//! - [`tolerant`]: one-hot greater / less / equal with a tie band around 0.5.

pub mod basic;
pub mod surrogate;
pub mod tolerant;

use std::fmt::Debug;

use good_lp::{Expression, Variable};
use serde::{Deserialize, Serialize};

use crate::comparisons::{CanonicalPair, ComparisonSet};
use crate::error::RankingError;
use crate::solver::{complement, LinearModel, Relation, SolvedModel, VarKind};

/// Largest value `min(positive, negative)` may take before the abs split counts as broken.
const ABS_SPLIT_TOLERANCE: f64 = 1e-6;

/// A correction below this is solver round-off, not a change to the observation.
pub const CORRECTION_TOLERANCE: f64 = 1e-6;

// =============================================================================
// Resolved relations
// =============================================================================

/// Resolved relation of a canonical pair `(i, j)`, read as "i ? j".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairRelation {
    Greater,
    Less,
    Equal,
}

impl PairRelation {
    /// Relation seen from the other end of the pair.
    pub fn flip(self) -> Self {
        match self {
            PairRelation::Greater => PairRelation::Less,
            PairRelation::Less => PairRelation::Greater,
            PairRelation::Equal => PairRelation::Equal,
        }
    }
}

/// Phase-1 verdict for one canonical pair; all phase 2 ever sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedRelation {
    pub i: usize,
    pub j: usize,
    pub relation: PairRelation,
}

/// Output of a phase-1 solve.
#[derive(Debug, Clone)]
pub struct ConsistencyOutcome {
    /// One entry per canonical pair, in [`ComparisonSet::pairs`] order.
    pub relations: Vec<ResolvedRelation>,
    /// Total L1 correction; the inconsistency score of the input.
    pub total_cost: f64,
}

impl ConsistencyOutcome {
    pub fn count(&self, relation: PairRelation) -> usize {
        self.relations
            .iter()
            .filter(|r| r.relation == relation)
            .count()
    }
}

// =============================================================================
// Decision regions
// =============================================================================

/// Where a corrected strength must land for each relation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DecisionRule {
    /// Greater at or above 0.5, less at or below it.
    Midpoint,
    /// Greater at or above `upper`, less at or below `lower`, equal in between.
    Band { lower: f64, upper: f64 },
}

impl DecisionRule {
    pub fn band(equal_width: f64) -> Self {
        DecisionRule::Band {
            lower: 0.5 - equal_width / 2.0,
            upper: 0.5 + equal_width / 2.0,
        }
    }

    /// Closed interval of corrected strengths compatible with `relation`.
    pub fn region(&self, relation: PairRelation) -> (f64, f64) {
        let (lower, upper) = match *self {
            DecisionRule::Midpoint => (0.5, 0.5),
            DecisionRule::Band { lower, upper } => (lower, upper),
        };
        match relation {
            PairRelation::Greater => (upper, 1.0),
            PairRelation::Less => (0.0, lower),
            PairRelation::Equal => (lower, upper),
        }
    }

    /// Smallest |e| that moves `strength` into the region of `relation`.
    pub fn correction(&self, strength: f64, relation: PairRelation) -> f64 {
        let (lo, hi) = self.region(relation);
        (lo - strength).max(strength - hi).max(0.0)
    }
}

// =============================================================================
// Shared model pieces
// =============================================================================

/// Split of `e` into nonnegative parts, only for interior observations.
#[derive(Debug, Clone, Copy)]
pub(crate) struct AbsSplit {
    positive: Variable,
    negative: Variable,
}

/// Correction variable of one canonical pair.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Correction {
    error: Variable,
    strength: f64,
    abs: Option<AbsSplit>,
}

impl Correction {
    /// `s + e`
    pub(crate) fn corrected(&self) -> Expression {
        Expression::from(self.error) + self.strength
    }

    /// |e| as a linear term: the bound on `e` already fixes its sign at 0 and 1.
    pub(crate) fn cost(&self) -> Expression {
        match self.abs {
            Some(split) => Expression::from(split.positive) + split.negative,
            None if self.strength == 1.0 => Expression::default() - self.error,
            None => Expression::from(self.error),
        }
    }
}

/// Declare `e` in `[-s, 1 - s]` for every pair, plus the abs split for interior `s`.
pub(crate) fn declare_corrections(model: &mut LinearModel, pairs: &[CanonicalPair]) -> Vec<Correction> {
    pairs
        .iter()
        .map(|pair| {
            let s = pair.strength;
            let error = model.declare_variable(VarKind::Continuous, -s, 1.0 - s);
            let abs = if pair.is_extreme() {
                None
            } else {
                let positive = model.declare_variable(VarKind::Continuous, 0.0, 1.0 - s);
                let negative = model.declare_variable(VarKind::Continuous, 0.0, s);
                // e = positive - negative
                model.add_constraint(
                    Expression::from(error) - positive + negative,
                    Relation::Equal,
                    0.0,
                );
                Some(AbsSplit { positive, negative })
            };
            Correction {
                error,
                strength: s,
                abs,
            }
        })
        .collect()
}

/// Total L1 correction over all pairs.
pub(crate) fn correction_cost(corrections: &[Correction]) -> Expression {
    corrections
        .iter()
        .fold(Expression::default(), |acc, c| acc + c.cost())
}

/// `indicator = 1` iff the corrected strength is at least `threshold`.
pub(crate) fn bracket_at_least(
    model: &mut LinearModel,
    correction: &Correction,
    threshold: f64,
    indicator: Variable,
) {
    // s + e - t >= indicator - 1
    model.add_constraint(
        correction.corrected() - indicator,
        Relation::GreaterEq,
        threshold - 1.0,
    );
    // s + e - t <= indicator
    model.add_constraint(
        correction.corrected() - indicator,
        Relation::LessEq,
        threshold,
    );
}

/// `indicator = 1` iff the corrected strength is at most `threshold`.
pub(crate) fn bracket_at_most(
    model: &mut LinearModel,
    correction: &Correction,
    threshold: f64,
    indicator: Variable,
) {
    // s + e - t >= -indicator
    model.add_constraint(
        correction.corrected() + indicator,
        Relation::GreaterEq,
        threshold,
    );
    // s + e - t <= 1 - indicator
    model.add_constraint(
        correction.corrected() + indicator,
        Relation::LessEq,
        threshold + 1.0,
    );
}

/// `a + b <= 1 + c`: whenever both premises hold, so does the conclusion.
pub(crate) fn add_closure(model: &mut LinearModel, a: &Expression, b: &Expression, c: &Expression) {
    model.add_constraint(a.clone() + b.clone() - c.clone(), Relation::LessEq, 1.0);
}

/// Closure on the complemented indicators: `(1-a) + (1-b) <= 1 + (1-c)`.
pub(crate) fn add_complement_closure(
    model: &mut LinearModel,
    a: &Expression,
    b: &Expression,
    c: &Expression,
) {
    add_closure(
        model,
        &complement(a.clone()),
        &complement(b.clone()),
        &complement(c.clone()),
    );
}

/// Verify `min(positive, negative) = 0` for every interior pair.
pub(crate) fn check_abs_split<N: Debug>(
    solved: &SolvedModel,
    corrections: &[Correction],
    set: &ComparisonSet<N>,
) -> Result<(), RankingError> {
    for (pair, correction) in set.pairs().iter().zip(corrections) {
        let Some(split) = correction.abs else {
            continue;
        };
        let positive = solved.value(split.positive);
        let negative = solved.value(split.negative);
        if positive.min(negative) > ABS_SPLIT_TOLERANCE {
            let nodes = set.nodes();
            return Err(RankingError::NumericalInconsistency {
                pair: format!("({:?}, {:?})", nodes[pair.i], nodes[pair.j]),
                positive,
                negative,
            });
        }
    }
    Ok(())
}

/// Solver noise can push a zero cost a hair below zero.
pub(crate) fn clamp_cost(cost: f64) -> f64 {
    if cost < 0.0 {
        0.0
    } else {
        cost
    }
}
