// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layout constraints a node contributes to an external solver.
//!
//! The solver itself is a collaborator behind [`LayoutSolver`]. Each node
//! owns a [`ConstraintRegistry`] of linear constraints and the variables
//! they refer to. Entries are only ever active in the solver while their
//! node is mounted:
//!
//! - mount activates pending variables first, then constraints;
//! - unmount deactivates constraints first, then variables, before the
//!   node's children are torn down;
//! - the change step of a process pass copies solved values back into the
//!   node's variables before `did_change` runs.

use std::borrow::Cow;

/// Handle to a constraint owned by some node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConstraintKey(pub(crate) u32);

/// Handle to a constraint variable owned by some node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VariableKey(pub(crate) u32);

impl ConstraintKey {
    /// Returns the raw key (for diagnostics and solver bookkeeping).
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl VariableKey {
    /// Returns the raw key (for diagnostics and solver bookkeeping).
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

/// Comparison between the two sides of a [`Constraint`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Relation {
    /// `expression <= 0`
    Le,
    /// `expression == 0`
    Eq,
    /// `expression >= 0`
    Ge,
}

/// A linear constraint `sum(coefficient * variable) + constant <relation> 0`.
#[derive(Clone, Debug, PartialEq)]
pub struct Constraint {
    /// Variable terms with their coefficients.
    pub terms: Vec<(VariableKey, f64)>,
    /// Constant term.
    pub constant: f64,
    /// Relation to zero.
    pub relation: Relation,
    /// Solver strength; see the associated constants.
    pub strength: f64,
}

impl Constraint {
    /// Strength of a constraint that must hold.
    pub const REQUIRED: f64 = 1_001_001_000.0;
    /// Strength of a strong preference.
    pub const STRONG: f64 = 1_000_000.0;
    /// Strength of a medium preference.
    pub const MEDIUM: f64 = 1_000.0;
    /// Strength of a weak preference.
    pub const WEAK: f64 = 1.0;

    /// A required constraint.
    #[must_use]
    pub fn new(terms: Vec<(VariableKey, f64)>, constant: f64, relation: Relation) -> Self {
        Self {
            terms,
            constant,
            relation,
            strength: Self::REQUIRED,
        }
    }

    /// Sets the strength.
    #[must_use]
    pub fn with_strength(mut self, strength: f64) -> Self {
        self.strength = strength;
        self
    }
}

/// A named variable whose value is solved externally.
#[derive(Clone, Debug, PartialEq)]
pub struct ConstraintVariable {
    /// Diagnostic name.
    pub name: Cow<'static, str>,
    /// Last value read back from the solver.
    pub value: f64,
}

/// A solver rejected an entry.
#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
#[error("{0}")]
pub struct SolverError(pub Cow<'static, str>);

/// An external constraint solver.
pub trait LayoutSolver {
    /// Adds a variable to the system.
    fn activate_variable(
        &mut self,
        key: VariableKey,
        variable: &ConstraintVariable,
    ) -> Result<(), SolverError>;

    /// Removes a variable from the system.
    fn deactivate_variable(&mut self, key: VariableKey);

    /// Adds a constraint to the system.
    fn activate_constraint(
        &mut self,
        key: ConstraintKey,
        constraint: &Constraint,
    ) -> Result<(), SolverError>;

    /// Removes a constraint from the system.
    fn deactivate_constraint(&mut self, key: ConstraintKey);

    /// Returns the solved value of an active variable.
    fn variable_value(&self, key: VariableKey) -> Option<f64>;
}

#[derive(Debug)]
struct Entry<K, T> {
    key: K,
    value: T,
    active: bool,
}

/// Constraints and variables contributed by one node.
#[derive(Debug, Default)]
pub struct ConstraintRegistry {
    constraints: Vec<Entry<ConstraintKey, Constraint>>,
    variables: Vec<Entry<VariableKey, ConstraintVariable>>,
}

impl ConstraintRegistry {
    /// Whether the registry holds nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty() && self.variables.is_empty()
    }

    /// Keys of the registered constraints.
    pub fn constraint_keys(&self) -> impl Iterator<Item = ConstraintKey> + '_ {
        self.constraints.iter().map(|e| e.key)
    }

    /// Keys of the registered variables.
    pub fn variable_keys(&self) -> impl Iterator<Item = VariableKey> + '_ {
        self.variables.iter().map(|e| e.key)
    }

    /// Returns a registered variable.
    #[must_use]
    pub fn variable(&self, key: VariableKey) -> Option<&ConstraintVariable> {
        self.variables
            .iter()
            .find(|e| e.key == key)
            .map(|e| &e.value)
    }

    /// Whether the constraint is currently active in the solver.
    #[must_use]
    pub fn is_constraint_active(&self, key: ConstraintKey) -> bool {
        self.constraints.iter().any(|e| e.key == key && e.active)
    }

    pub(crate) fn insert_constraint(&mut self, key: ConstraintKey, constraint: Constraint) {
        self.constraints.push(Entry {
            key,
            value: constraint,
            active: false,
        });
    }

    pub(crate) fn insert_variable(&mut self, key: VariableKey, variable: ConstraintVariable) {
        self.variables.push(Entry {
            key,
            value: variable,
            active: false,
        });
    }

    /// Removes a constraint, deactivating it first. Returns `false` if the
    /// key is not registered here.
    pub(crate) fn remove_constraint(
        &mut self,
        key: ConstraintKey,
        solver: Option<&mut dyn LayoutSolver>,
    ) -> bool {
        let Some(pos) = self.constraints.iter().position(|e| e.key == key) else {
            return false;
        };
        let entry = self.constraints.remove(pos);
        if entry.active
            && let Some(solver) = solver
        {
            solver.deactivate_constraint(key);
        }
        true
    }

    /// Removes a variable, deactivating it first. Returns `false` if the key
    /// is not registered here.
    pub(crate) fn remove_variable(
        &mut self,
        key: VariableKey,
        solver: Option<&mut dyn LayoutSolver>,
    ) -> bool {
        let Some(pos) = self.variables.iter().position(|e| e.key == key) else {
            return false;
        };
        let entry = self.variables.remove(pos);
        if entry.active
            && let Some(solver) = solver
        {
            solver.deactivate_variable(key);
        }
        true
    }

    /// Activates every pending entry, variables first.
    pub(crate) fn activate(&mut self, solver: &mut dyn LayoutSolver) -> Result<(), SolverError> {
        for entry in self.variables.iter_mut().filter(|e| !e.active) {
            solver.activate_variable(entry.key, &entry.value)?;
            entry.active = true;
        }
        for entry in self.constraints.iter_mut().filter(|e| !e.active) {
            solver.activate_constraint(entry.key, &entry.value)?;
            entry.active = true;
        }
        Ok(())
    }

    /// Deactivates every active entry, constraints first.
    pub(crate) fn deactivate(&mut self, solver: &mut dyn LayoutSolver) {
        for entry in self.constraints.iter_mut().filter(|e| e.active) {
            solver.deactivate_constraint(entry.key);
            entry.active = false;
        }
        for entry in self.variables.iter_mut().filter(|e| e.active) {
            solver.deactivate_variable(entry.key);
            entry.active = false;
        }
    }

    /// Copies solved values into active variables.
    pub(crate) fn refresh(&mut self, solver: &dyn LayoutSolver) {
        for entry in self.variables.iter_mut().filter(|e| e.active) {
            if let Some(value) = solver.variable_value(entry.key) {
                entry.value.value = value;
            }
        }
    }
}
