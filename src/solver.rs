//! Thin adapter over the external MILP solver.
//!
//! Exposes the declare / constrain / minimize / read cycle the model builders
//! need and nothing else. Each [`LinearModel`] is a fresh, self-contained
//! context: it is consumed by [`LinearModel::optimize`] and nothing leaks into
//! the next solve.

use std::collections::HashMap;

use good_lp::{
    constraint, default_solver, variable, Constraint, Expression, ProblemVariables,
    ResolutionError, Solution, SolverModel, Variable,
};
use tracing::debug;

/// Domain of a declared variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    Continuous,
    /// Integral within its bounds; declare with bounds `[0, 1]` for a binary.
    Integer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    LessEq,
    GreaterEq,
    Equal,
}

/// Affine expression holding just a constant.
pub fn constant(value: f64) -> Expression {
    Expression::from_other_affine(value)
}

/// `1 - x`, the complement of a 0/1 indicator.
pub fn complement(indicator: impl Into<Expression>) -> Expression {
    constant(1.0) - indicator.into()
}

/// A minimization model under construction.
pub struct LinearModel {
    name: &'static str,
    vars: ProblemVariables,
    declared: Vec<Variable>,
    constraints: Vec<Constraint>,
    objective: Expression,
}

impl LinearModel {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            vars: ProblemVariables::new(),
            declared: Vec::new(),
            constraints: Vec::new(),
            objective: Expression::default(),
        }
    }

    pub fn declare_variable(&mut self, kind: VarKind, lower: f64, upper: f64) -> Variable {
        let def = match kind {
            VarKind::Continuous => variable().min(lower).max(upper),
            VarKind::Integer => variable().integer().min(lower).max(upper),
        };
        let var = self.vars.add(def);
        self.declared.push(var);
        var
    }

    pub fn declare_binary(&mut self) -> Variable {
        self.declare_variable(VarKind::Integer, 0.0, 1.0)
    }

    pub fn add_constraint(&mut self, lhs: Expression, relation: Relation, rhs: f64) {
        let row = match relation {
            Relation::LessEq => constraint::leq(lhs, rhs),
            Relation::GreaterEq => constraint::geq(lhs, rhs),
            Relation::Equal => constraint::eq(lhs, rhs),
        };
        self.constraints.push(row);
    }

    pub fn set_objective(&mut self, objective: Expression) {
        self.objective = objective;
    }

    pub fn variable_count(&self) -> usize {
        self.declared.len()
    }

    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    /// Minimize the objective and read back every declared variable.
    pub fn optimize(self) -> Result<SolvedModel, ResolutionError> {
        debug!(
            model = self.name,
            variables = self.variable_count(),
            constraints = self.constraint_count(),
            "solving model"
        );

        let mut problem = self
            .vars
            .minimise(self.objective.clone())
            .using(default_solver);
        for row in self.constraints {
            problem = problem.with(row);
        }
        let solution = problem.solve()?;

        let values = self
            .declared
            .iter()
            .map(|&var| (var, solution.value(var)))
            .collect();
        let objective = self.objective.eval_with(&solution);

        Ok(SolvedModel { values, objective })
    }
}

/// Optimal values read out of a finished solve.
#[derive(Debug, Clone)]
pub struct SolvedModel {
    values: HashMap<Variable, f64>,
    objective: f64,
}

impl SolvedModel {
    /// Optimal value of a variable declared on the model that produced this solution.
    ///
    /// Variables are plain indices, so a handle from another model is a caller
    /// bug: it trips a debug assertion and reads as 0 in release builds.
    pub fn value(&self, var: Variable) -> f64 {
        let value = self.values.get(&var).copied();
        debug_assert!(value.is_some(), "variable {var:?} not declared on this model");
        value.unwrap_or(0.0)
    }

    /// Evaluate an expression over the optimal values.
    pub fn eval(&self, expr: &Expression) -> f64 {
        expr.eval_with(&self.values)
    }

    pub fn objective_value(&self) -> f64 {
        self.objective
    }

    /// Read a 0/1 indicator, tolerating solver round-off.
    pub fn is_set(&self, indicator: Variable) -> bool {
        self.value(indicator) > 0.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solves_small_lp() {
        // min x + y  s.t.  x + y >= 1.5, x <= 1
        let mut model = LinearModel::new("test");
        let x = model.declare_variable(VarKind::Continuous, 0.0, 1.0);
        let y = model.declare_variable(VarKind::Continuous, 0.0, 10.0);
        model.add_constraint(Expression::from(x) + y, Relation::GreaterEq, 1.5);
        model.set_objective(Expression::from(x) + y);

        let solved = model.optimize().unwrap();
        assert!((solved.objective_value() - 1.5).abs() < 1e-6);
        assert!((solved.value(x) + solved.value(y) - 1.5).abs() < 1e-6);
    }

    #[test]
    fn integer_variables_take_integral_values() {
        // min b  s.t.  b >= 0.3  with b binary
        let mut model = LinearModel::new("test");
        let b = model.declare_binary();
        model.add_constraint(Expression::from(b), Relation::GreaterEq, 0.3);
        model.set_objective(Expression::from(b));

        let solved = model.optimize().unwrap();
        assert!(solved.is_set(b));
        assert!((solved.objective_value() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn equality_and_complement() {
        let mut model = LinearModel::new("test");
        let b = model.declare_binary();
        model.add_constraint(complement(b), Relation::Equal, 1.0);
        model.set_objective(constant(0.0) - b);

        let solved = model.optimize().unwrap();
        assert!(!solved.is_set(b));
        assert!((solved.eval(&complement(b)) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn counts_declared_variables_and_rows() {
        let mut model = LinearModel::new("test");
        let x = model.declare_variable(VarKind::Continuous, 0.0, 1.0);
        let b = model.declare_binary();
        model.add_constraint(Expression::from(x) + b, Relation::LessEq, 1.0);
        assert_eq!(model.variable_count(), 2);
        assert_eq!(model.constraint_count(), 1);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "not declared on this model")]
    fn reading_a_foreign_variable_panics_in_debug() {
        let mut small = LinearModel::new("small");
        small.declare_variable(VarKind::Continuous, 0.0, 1.0);
        let solved = small.optimize().unwrap();

        let mut large = LinearModel::new("large");
        large.declare_variable(VarKind::Continuous, 0.0, 1.0);
        let foreign = large.declare_variable(VarKind::Continuous, 0.0, 1.0);
        solved.value(foreign);
    }

    #[test]
    fn infeasible_model_reports_infeasible() {
        let mut model = LinearModel::new("test");
        let x = model.declare_variable(VarKind::Continuous, 0.0, 1.0);
        model.add_constraint(Expression::from(x), Relation::GreaterEq, 2.0);
        model.set_objective(Expression::from(x));

        assert!(matches!(model.optimize(), Err(ResolutionError::Infeasible)));
    }
}
