//! Basic variant: every pair resolves to greater or less.
//!
//! One binary `z` per canonical pair `(i, j)`, with `z = 1` meaning `i > j`.
//! The corrected strength decides `z` through a pair of bracketing
//! inequalities around 0.5; at exactly 0.5 either side is admissible.

use std::fmt::Debug;

use good_lp::{Expression, Variable};
use tracing::info;

use crate::comparisons::{ComparisonSet, Oriented};
use crate::error::{Phase, RankingError};
use crate::solver::{complement, LinearModel};

use super::surrogate::RankSurrogate;
use super::{
    add_closure, add_complement_closure, bracket_at_least, check_abs_split, clamp_cost,
    correction_cost, declare_corrections, ConsistencyOutcome, PairRelation, ResolvedRelation,
};

/// Resolve every pair to a strict relation at minimal L1 correction.
pub fn solve<N: Debug>(set: &ComparisonSet<N>) -> Result<ConsistencyOutcome, RankingError> {
    let node_count = set.node_count();
    let mut model = LinearModel::new("consistency-basic");

    let corrections = declare_corrections(&mut model, set.pairs());
    let dominance: Vec<Variable> = corrections
        .iter()
        .map(|correction| {
            let z = model.declare_binary();
            bracket_at_least(&mut model, correction, 0.5, z);
            z
        })
        .collect();

    let oriented = |o: Oriented| -> Expression {
        if o.flipped {
            complement(dominance[o.pair])
        } else {
            Expression::from(dominance[o.pair])
        }
    };

    for triangle in set.triangles() {
        let a = Expression::from(dominance[triangle.first]);
        let b = oriented(triangle.second);
        let c = oriented(triangle.closing);
        // i > j and j > k  =>  i > k
        add_closure(&mut model, &a, &b, &c);
        // i < j and j < k  =>  i < k
        add_complement_closure(&mut model, &a, &b, &c);
    }

    let surrogate = RankSurrogate::declare(&mut model, node_count, node_count);
    for (pair, &z) in set.pairs().iter().zip(&dominance) {
        surrogate.strict(&mut model, pair.i, pair.j, Expression::from(z));
        surrogate.strict(&mut model, pair.j, pair.i, complement(z));
    }

    let cost = correction_cost(&corrections);
    model.set_objective(cost.clone());

    let solved = model
        .optimize()
        .map_err(|e| RankingError::from_resolution(Phase::Consistency, e))?;
    check_abs_split(&solved, &corrections, set)?;

    let relations: Vec<ResolvedRelation> = set
        .pairs()
        .iter()
        .zip(&dominance)
        .map(|(pair, &z)| ResolvedRelation {
            i: pair.i,
            j: pair.j,
            relation: if solved.is_set(z) {
                PairRelation::Greater
            } else {
                PairRelation::Less
            },
        })
        .collect();

    let outcome = ConsistencyOutcome {
        relations,
        total_cost: clamp_cost(solved.eval(&cost)),
    };
    info!(
        variant = "basic",
        nodes = node_count,
        pairs = set.pairs().len(),
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
    fn consistent_chain_costs_nothing() {
        let s = set(&[("a", "b", 1.0), ("b", "c", 1.0), ("a", "c", 1.0)]);
        let outcome = solve(&s).unwrap();
        assert!(outcome.total_cost.abs() < 1e-6);
        assert!(outcome
            .relations
            .iter()
            .all(|r| r.relation == PairRelation::Greater));
    }

    #[test]
    fn three_cycle_moves_one_edge_across_the_midpoint() {
        // a > b, b > c, c > a
        let s = set(&[("a", "b", 1.0), ("b", "c", 1.0), ("c", "a", 1.0)]);
        let outcome = solve(&s).unwrap();
        assert!((outcome.total_cost - 0.5).abs() < 1e-6, "cost {}", outcome.total_cost);
        assert_eq!(outcome.count(PairRelation::Equal), 0);
    }

    #[test]
    fn soft_observations_follow_their_side() {
        let s = set(&[("a", "b", 0.8), ("b", "c", 0.3)]);
        let outcome = solve(&s).unwrap();
        assert!(outcome.total_cost.abs() < 1e-6);
        assert_eq!(outcome.relations[0].relation, PairRelation::Greater);
        assert_eq!(outcome.relations[1].relation, PairRelation::Less);
    }

    #[test]
    fn soft_cycle_breaks_weakest_edge() {
        // a > b (0.9), b > c (0.9), c > a (0.6): reversing c > a is cheapest.
        let s = set(&[("a", "b", 0.9), ("b", "c", 0.9), ("c", "a", 0.6)]);
        let outcome = solve(&s).unwrap();
        assert!((outcome.total_cost - 0.1).abs() < 1e-6, "cost {}", outcome.total_cost);
        // Canonical (a, c) was stored as 0.4; it must now read a > c.
        let ac = outcome
            .relations
            .iter()
            .find(|r| (r.i, r.j) == (0, 2))
            .unwrap();
        assert_eq!(ac.relation, PairRelation::Greater);
    }

    #[test]
    fn four_cycle_without_triangles_is_still_broken() {
        // a > b > c > d > a has no closed triangle; only the surrogate catches it.
        let s = set(&[("a", "b", 1.0), ("b", "c", 1.0), ("c", "d", 1.0), ("d", "a", 1.0)]);
        assert_eq!(s.triangles().count(), 0);
        let outcome = solve(&s).unwrap();
        assert!((outcome.total_cost - 0.5).abs() < 1e-6, "cost {}", outcome.total_cost);
    }
}
