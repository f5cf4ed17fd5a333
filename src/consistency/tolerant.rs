//! Tolerant variant: pairs may also resolve to "equal".
//!
//! Each canonical pair carries a one-hot triple `(ge, le, eq)`. With the tie
//! band `[0.5 - w/2, 0.5 + w/2]`, `ge = 1` iff the corrected strength is at
//! least the upper edge, `le = 1` iff it is at most the lower edge, and `eq`
//! covers the rest. Closure is emitted for every way two relations compose,
//! and the rank surrogate is bounded by `max_rank`: a small bound leaves less
//! room for strict chains and so favours equal decisions.

use std::fmt::Debug;

use good_lp::{Expression, Variable};
use tracing::info;

use crate::comparisons::{ComparisonSet, Oriented};
use crate::error::{Phase, RankingError};
use crate::solver::{LinearModel, Relation};

use super::surrogate::RankSurrogate;
use super::{
    add_closure, bracket_at_least, bracket_at_most, check_abs_split, clamp_cost,
    correction_cost, declare_corrections, ConsistencyOutcome, DecisionRule, PairRelation,
    ResolvedRelation,
};

/// Weight on strict decisions for observations sitting exactly at 0.5.
///
/// Only breaks ties between zero-cost alternatives; far below any real correction.
const MIDPOINT_TIE_WEIGHT: f64 = 1e-7;

#[derive(Debug, Clone, Copy)]
struct Decision {
    greater: Variable,
    less: Variable,
    equal: Variable,
}

/// Indicators of one triangle leg, oriented as read.
struct Leg {
    greater: Expression,
    less: Expression,
    equal: Expression,
}

impl Decision {
    fn leg(&self, flipped: bool) -> Leg {
        let (greater, less) = if flipped {
            (self.less, self.greater)
        } else {
            (self.greater, self.less)
        };
        Leg {
            greater: greater.into(),
            less: less.into(),
            equal: self.equal.into(),
        }
    }
}

/// Resolve every pair to greater, less or equal at minimal L1 correction.
///
/// `equal_width` and `max_rank` are expected to be validated by the caller.
pub fn solve<N: Debug>(
    set: &ComparisonSet<N>,
    equal_width: f64,
    max_rank: usize,
) -> Result<ConsistencyOutcome, RankingError> {
    let node_count = set.node_count();
    let rule = DecisionRule::band(equal_width);
    let (lower, upper) = rule.region(PairRelation::Equal);
    let mut model = LinearModel::new("consistency-tolerant");

    let corrections = declare_corrections(&mut model, set.pairs());
    let decisions: Vec<Decision> = corrections
        .iter()
        .map(|correction| {
            let decision = Decision {
                greater: model.declare_binary(),
                less: model.declare_binary(),
                equal: model.declare_binary(),
            };
            bracket_at_least(&mut model, correction, upper, decision.greater);
            bracket_at_most(&mut model, correction, lower, decision.less);
            model.add_constraint(
                Expression::from(decision.greater) + decision.less + decision.equal,
                Relation::Equal,
                1.0,
            );
            decision
        })
        .collect();

    let leg = |o: Oriented| decisions[o.pair].leg(o.flipped);

    for triangle in set.triangles() {
        let a = decisions[triangle.first].leg(false);
        let b = leg(triangle.second);
        let c = leg(triangle.closing);

        add_closure(&mut model, &a.greater, &b.greater, &c.greater);
        add_closure(&mut model, &a.less, &b.less, &c.less);
        add_closure(&mut model, &a.less, &b.equal, &c.less);
        add_closure(&mut model, &a.equal, &b.less, &c.less);
        add_closure(&mut model, &a.greater, &b.equal, &c.greater);
        add_closure(&mut model, &a.equal, &b.greater, &c.greater);
        add_closure(&mut model, &a.equal, &b.equal, &c.equal);
    }

    let surrogate = RankSurrogate::declare(&mut model, node_count, max_rank);
    for (pair, decision) in set.pairs().iter().zip(&decisions) {
        surrogate.strict(&mut model, pair.i, pair.j, decision.greater.into());
        surrogate.strict(&mut model, pair.j, pair.i, decision.less.into());
        surrogate.equal(&mut model, pair.i, pair.j, decision.equal.into());
    }

    let cost = correction_cost(&corrections);
    let tie_break = set
        .pairs()
        .iter()
        .zip(&decisions)
        .filter(|(pair, _)| pair.strength == 0.5)
        .fold(Expression::default(), |acc, (_, d)| {
            acc + (Expression::from(d.greater) + d.less) * MIDPOINT_TIE_WEIGHT
        });
    model.set_objective(cost.clone() + tie_break);

    let solved = model
        .optimize()
        .map_err(|e| RankingError::from_resolution(Phase::Consistency, e))?;
    check_abs_split(&solved, &corrections, set)?;

    let relations: Vec<ResolvedRelation> = set
        .pairs()
        .iter()
        .zip(&decisions)
        .map(|(pair, d)| ResolvedRelation {
            i: pair.i,
            j: pair.j,
            relation: if solved.is_set(d.greater) {
                PairRelation::Greater
            } else if solved.is_set(d.less) {
                PairRelation::Less
            } else {
                PairRelation::Equal
            },
        })
        .collect();

    let outcome = ConsistencyOutcome {
        relations,
        total_cost: clamp_cost(solved.eval(&cost)),
    };
    info!(
        variant = "tolerant",
        nodes = node_count,
        pairs = set.pairs().len(),
        equal_width,
        max_rank,
        equal = outcome.count(PairRelation::Equal),
        total_cost = outcome.total_cost,
        "resolved pairwise relations"
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparisons::DuplicatePolicy;

    fn set(raw: &[(&'static str, &'static str, f64)]) -> ComparisonSet<&'static str> {
        ComparisonSet::normalize(
            raw.iter().map(|&(a, b, v)| ((a, b), v)),
            DuplicatePolicy::Reject,
        )
        .unwrap()
    }

    #[test]
    fn observations_inside_the_band_resolve_equal() {
        let s = set(&[("a", "b", 0.55), ("b", "c", 0.9)]);
        let outcome = solve(&s, 0.2, 3).unwrap();
        assert!(outcome.total_cost.abs() < 1e-6);
        assert_eq!(outcome.relations[0].relation, PairRelation::Equal);
        assert_eq!(outcome.relations[1].relation, PairRelation::Greater);
    }

    #[test]
    fn midpoint_prefers_equal_even_with_zero_width() {
        let s = set(&[("a", "b", 0.5)]);
        for width in [0.0, 0.2] {
            let outcome = solve(&s, width, 2).unwrap();
            assert_eq!(outcome.relations[0].relation, PairRelation::Equal, "width {width}");
            assert!(outcome.total_cost.abs() < 1e-6);
        }
    }

    #[test]
    fn three_cycle_is_repaired_by_crossing_the_band() {
        // a > b, b > c, c > a. Reversing one edge only has to reach the band edge.
        let s = set(&[("a", "b", 1.0), ("b", "c", 1.0), ("c", "a", 1.0)]);
        let outcome = solve(&s, 0.2, 3).unwrap();
        assert!((outcome.total_cost - 0.6).abs() < 1e-6, "cost {}", outcome.total_cost);
    }

    #[test]
    fn equal_chain_propagates_through_closure() {
        // a = b and b = c observed; a vs c observed as strongly greater.
        // Either a = c (cost 0.4) or one of the equal legs moves (cost 0.1 each).
        let s = set(&[("a", "b", 0.5), ("b", "c", 0.5), ("a", "c", 1.0)]);
        let outcome = solve(&s, 0.2, 3).unwrap();
        assert!((outcome.total_cost - 0.1).abs() < 1e-6, "cost {}", outcome.total_cost);
        assert_eq!(outcome.count(PairRelation::Equal), 1);
    }

    #[test]
    fn tight_max_rank_forces_ties() {
        let s = set(&[("a", "b", 0.7), ("b", "c", 0.7)]);
        let roomy = solve(&s, 0.2, 3).unwrap();
        assert!(roomy.total_cost.abs() < 1e-6);
        assert_eq!(roomy.count(PairRelation::Equal), 0);

        // With max_rank = 1 the relaxed reverse inequality caps every compared
        // gap at zero, so no strict decision survives.
        let tight = solve(&s, 0.2, 1).unwrap();
        assert_eq!(tight.count(PairRelation::Equal), 2);
        assert!((tight.total_cost - 0.2).abs() < 1e-6, "cost {}", tight.total_cost);
    }
}
