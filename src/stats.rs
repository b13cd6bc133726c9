//! This module contains the counters the engine keeps while exploring.

use std::fmt::{Display, Formatter};

use crate::backend::Solution;

/// The execution and solver counters for one exploration run.
///
/// Every solver query is accounted under exactly one of `sat`, `unsat` or
/// `timeout`; a satisfiable outcome bumps `sat` by the number of models the
/// solver returned.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Statistics {
    /// The number of traces executed.
    executions: usize,

    /// The number of models returned across all satisfiable queries.
    sat: usize,

    /// The number of unsatisfiable queries.
    unsat: usize,

    /// The number of queries that exhausted their wall-clock budget.
    timeout: usize,
}

impl Statistics {
    /// Creates zeroed statistics.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Accounts one solver outcome.
    pub fn record(&mut self, solution: &Solution) {
        match solution {
            Solution::Sat(models) => self.sat += models.len(),
            Solution::Unsat => self.unsat += 1,
            Solution::Timeout => self.timeout += 1,
        }
    }

    /// Records the completion of one trace.
    pub fn record_execution(&mut self) {
        self.executions += 1;
    }

    /// Gets the number of traces executed so far.
    #[must_use]
    pub fn executions(&self) -> usize {
        self.executions
    }

    /// Gets the number of models returned across all satisfiable queries.
    #[must_use]
    pub fn sat(&self) -> usize {
        self.sat
    }

    /// Gets the number of unsatisfiable queries.
    #[must_use]
    pub fn unsat(&self) -> usize {
        self.unsat
    }

    /// Gets the number of timed-out queries.
    #[must_use]
    pub fn timeout(&self) -> usize {
        self.timeout
    }
}

impl Display for Statistics {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "exec: {}, sat: {}, unsat: {}, timeout: {}",
            self.executions, self.sat, self.unsat, self.timeout
        )
    }
}
