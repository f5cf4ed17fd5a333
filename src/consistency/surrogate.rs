//! Bounded rank surrogate.
//!
//! Triangle closure only constrains pairs that share a triangle, so a sparse
//! comparison graph can still resolve into a long cycle. Every node gets a
//! continuous `R` in `[0, max_rank]`; an active strict decision forces the
//! winner at least one unit above the loser and an active equal decision pins
//! both to the same value. Inactive decisions are relaxed by a big-M term with
//! `M = max_rank`. Any feasible assignment of `R` is a witness that the
//! resolved relations admit a linear extension.
//!
//! The relaxation is not free: an inactive strict inequality still bounds
//! `|R[i] - R[j]|` by `max_rank - 1` for every compared pair, so
//! `max_rank = 1` leaves room for equal decisions only.
//!
//! The surrogate values are never reported; phase 2 recomputes compact ranks.

use good_lp::{Expression, Variable};

use crate::solver::{complement, LinearModel, Relation, VarKind};

pub(crate) struct RankSurrogate {
    ranks: Vec<Variable>,
    big_m: f64,
}

impl RankSurrogate {
    pub(crate) fn declare(model: &mut LinearModel, node_count: usize, max_rank: usize) -> Self {
        let upper = max_rank as f64;
        let ranks = (0..node_count)
            .map(|_| model.declare_variable(VarKind::Continuous, 0.0, upper))
            .collect();
        Self {
            ranks,
            big_m: upper,
        }
    }

    /// `M * (1 - active) + R[winner] >= R[loser] + 1`
    pub(crate) fn strict(
        &self,
        model: &mut LinearModel,
        winner: usize,
        loser: usize,
        active: Expression,
    ) {
        model.add_constraint(
            self.slack(active) + self.ranks[winner] - self.ranks[loser],
            Relation::GreaterEq,
            1.0,
        );
    }

    /// `R[a] = R[b]` while `active` is set, as two big-M inequalities.
    pub(crate) fn equal(&self, model: &mut LinearModel, a: usize, b: usize, active: Expression) {
        model.add_constraint(
            self.slack(active.clone()) + self.ranks[b] - self.ranks[a],
            Relation::GreaterEq,
            0.0,
        );
        model.add_constraint(
            self.slack(active) + self.ranks[a] - self.ranks[b],
            Relation::GreaterEq,
            0.0,
        );
    }

    fn slack(&self, active: Expression) -> Expression {
        complement(active) * self.big_m
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_strict_chain_needs_room() {
        // Three nodes forced into a strict chain fit only if max_rank >= 2.
        for (max_rank, feasible) in [(1usize, false), (2, true)] {
            let mut model = LinearModel::new("surrogate-test");
            let surrogate = RankSurrogate::declare(&mut model, 3, max_rank);
            surrogate.strict(&mut model, 0, 1, crate::solver::constant(1.0));
            surrogate.strict(&mut model, 1, 2, crate::solver::constant(1.0));
            model.set_objective(Expression::default());
            assert_eq!(model.optimize().is_ok(), feasible, "max_rank={max_rank}");
        }
    }

    #[test]
    fn inactive_strict_cycle_is_feasible() {
        let mut model = LinearModel::new("surrogate-test");
        let surrogate = RankSurrogate::declare(&mut model, 2, 2);
        surrogate.strict(&mut model, 0, 1, crate::solver::constant(1.0));
        surrogate.strict(&mut model, 1, 0, crate::solver::constant(0.0));
        model.set_objective(Expression::default());
        assert!(model.optimize().is_ok());
    }

    #[test]
    fn active_equal_pins_ranks_together() {
        let mut model = LinearModel::new("surrogate-test");
        let surrogate = RankSurrogate::declare(&mut model, 2, 3);
        surrogate.equal(&mut model, 0, 1, crate::solver::constant(1.0));
        // Push node 0 up; node 1 must follow.
        model.set_objective(Expression::default() - surrogate.ranks[0]);
        let solved = model.optimize().unwrap();
        assert!((solved.value(surrogate.ranks[0]) - 3.0).abs() < 1e-6);
        assert!((solved.value(surrogate.ranks[1]) - 3.0).abs() < 1e-6);
    }
}
