//! This module contains the new-input generator, run once after each
//! trace.
//!
//! The generator walks the branch records the trace accumulated and, for
//! each branch the trace did *not* take, asks the solver for an input that
//! would take it, under the conjunction of everything the path committed
//! to before that branch. Negating only the not-taken alternatives avoids
//! redundant work: the taken side is the trace that just executed.

use crate::{
    backend::{Context, Solution},
    explorer::Explorer,
};

impl<C: Context> Explorer<C> {
    /// Generates fresh seeds by negating the branches of the trace just
    /// executed, pushing every model at the head of the worklist.
    ///
    /// The running conjunction starts at `true` and folds in each
    /// constraint's taken predicate after its branches are processed, so
    /// every query stays on the actually-taken path prefix. Each branch is
    /// keyed in the donelist by the path-prefix source addresses extended
    /// with the branch target, and is solved at most once across the
    /// explorer's lifetime; taken branches are keyed without solving.
    ///
    /// Ordinary conditionals solve `predicate ∧ branch.predicate` for a
    /// single model on the not-taken side only. Computed jumps expose each
    /// discovered target as its own branch, and negating the chosen target
    /// (`predicate ∧ ¬branch.predicate`) is asked for up to
    /// [`crate::explorer::Config::jmp_model_limit`] models to enumerate
    /// the alternatives.
    pub(super) fn find_new_inputs(&mut self) {
        let constraints = self.context.path_constraints();
        let mut predicate = self.context.truth();
        let mut path_addresses: Vec<u64> = Vec::with_capacity(constraints.len());

        for constraint in &constraints {
            path_addresses.push(constraint.source_address);

            for branch in &constraint.branches {
                let mut encoding = path_addresses.clone();
                encoding.push(branch.target_address);
                if !self.donelist.insert(encoding) {
                    continue;
                }

                if constraint.multiple_branches {
                    if !branch.taken {
                        let query = self.context.and(&predicate, &branch.predicate);
                        let solution = self.context.solve(&query, self.config.solver_timeout);
                        self.stats.record(&solution);
                        if let Solution::Sat(models) = solution {
                            for model in models {
                                self.worklist.push_front(model);
                            }
                        }
                    }
                } else {
                    let negated = self.context.not(&branch.predicate);
                    let query = self.context.and(&predicate, &negated);
                    let solution = self.context.solve_many(
                        &query,
                        self.config.jmp_model_limit,
                        self.config.solver_timeout,
                    );
                    self.stats.record(&solution);
                    if let Solution::Sat(models) = solution {
                        for model in models {
                            self.worklist.push_front(model);
                        }
                    }
                }
            }

            predicate = self.context.and(&predicate, &constraint.taken_predicate);
        }
    }
}
