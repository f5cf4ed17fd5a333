//! Phase 2: compact ranks from resolved relations.
//!
//! A fresh LP over `r_i` in `[0, n]`: a strict relation puts the winner at
//! least one unit above the loser, an equal relation pins both to the same
//! value, and `sum(r_i)` is minimized. The optimum is the longest-chain
//! layering of the resolved relation graph (equal groups collapsed), so the
//! weakest items sit at rank 0 and ties share a rank.
//!
//! The model is built from [`ResolvedRelation`]s only; no phase-1 solver state
//! is reachable from here.

use good_lp::Expression;
use tracing::debug;

use crate::consistency::{PairRelation, ResolvedRelation};
use crate::error::{Phase, RankingError};
use crate::solver::{LinearModel, Relation, VarKind};

/// Ranks this close to an integer are reported as that integer.
const RANK_SNAP_TOLERANCE: f64 = 1e-6;

/// Minimal ranks for `node_count` nodes, indexed like the node list.
pub fn minimal_ranks(
    node_count: usize,
    relations: &[ResolvedRelation],
) -> Result<Vec<f64>, RankingError> {
    if node_count == 0 {
        return Ok(Vec::new());
    }

    let mut model = LinearModel::new("minimal-rank");
    let upper = node_count as f64;
    let ranks: Vec<_> = (0..node_count)
        .map(|_| model.declare_variable(VarKind::Continuous, 0.0, upper))
        .collect();

    for rel in relations {
        let (ri, rj) = (ranks[rel.i], ranks[rel.j]);
        match rel.relation {
            PairRelation::Greater => {
                model.add_constraint(Expression::from(ri) - rj, Relation::GreaterEq, 1.0)
            }
            PairRelation::Less => {
                model.add_constraint(Expression::from(rj) - ri, Relation::GreaterEq, 1.0)
            }
            PairRelation::Equal => {
                model.add_constraint(Expression::from(ri) - rj, Relation::Equal, 0.0)
            }
        }
    }

    model.set_objective(
        ranks
            .iter()
            .fold(Expression::default(), |acc, &r| acc + r),
    );

    let solved = model
        .optimize()
        .map_err(|e| RankingError::from_resolution(Phase::MinimalRank, e))?;
    debug!(
        nodes = node_count,
        relations = relations.len(),
        rank_sum = solved.objective_value(),
        "extracted minimal ranks"
    );

    Ok(ranks.iter().map(|&r| snap(solved.value(r))).collect())
}

fn snap(value: f64) -> f64 {
    let rounded = value.round();
    if (value - rounded).abs() <= RANK_SNAP_TOLERANCE {
        rounded
    } else {
        value
    }
}
