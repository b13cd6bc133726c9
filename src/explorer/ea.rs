//! This module contains the effective-address expander.
//!
//! Under the back-end's aligned-memory mode, a memory access whose address
//! depends on symbolic input (an array indexed by an attacker-controlled
//! byte, say) collapses to its concrete address and would never exhibit
//! alternative aliasing. The expander asks the solver for inputs that steer
//! each such access to a *different* address before the trace commits to
//! the concrete one.

use crate::{
    backend::{Context, ProcessedInstruction, Solution},
    explorer::Explorer,
};

impl<C: Context> Explorer<C> {
    /// Expands every symbolic effective address of the just-processed
    /// instruction.
    ///
    /// Per symbolic memory operand: a path-prefix encoding (the source
    /// addresses of the constraints accumulated so far, extended with the
    /// instruction's own address) guards the query in the donelist; if
    /// fresh, the solver is asked for up to
    /// [`crate::explorer::Config::ea_model_limit`] models of
    /// `path ∧ (ea ≠ concrete)` and each model is pushed at the head of
    /// the worklist. Whether or not the query ran, `ea = concrete` is
    /// appended to the path predicate, hardening the access to the address
    /// this trace actually used.
    pub(super) fn symbolize_effective_address(
        &mut self,
        instruction: &ProcessedInstruction<C::Expr>,
    ) {
        for operand in &instruction.memory_operands {
            if !operand.is_symbolic {
                continue;
            }

            let mut encoding = self.path_addresses();
            encoding.push(instruction.address);
            if self.donelist.insert(encoding) {
                let concrete = self.context.bitvector(operand.concrete, operand.bit_width);
                let differs = self.context.distinct(&operand.expression, &concrete);
                let predicate = self.context.path_predicate();
                let query = self.context.and(&predicate, &differs);

                let solution = self.context.solve_many(
                    &query,
                    self.config.ea_model_limit,
                    self.config.solver_timeout,
                );
                self.stats.record(&solution);
                if let Solution::Sat(models) = solution {
                    for model in models {
                        self.worklist.push_front(model);
                    }
                }
            }

            let concrete = self.context.bitvector(operand.concrete, operand.bit_width);
            let frozen = self.context.equal(&operand.expression, &concrete);
            self.context.push_path_predicate(frozen);
        }
    }

    /// Builds the path-prefix encoding of the current trace: the source
    /// address of each accumulated path constraint, in order.
    pub(super) fn path_addresses(&self) -> Vec<u64> {
        self.context
            .path_constraints()
            .iter()
            .map(|constraint| constraint.source_address)
            .collect()
    }
}
