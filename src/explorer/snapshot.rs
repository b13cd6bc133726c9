//! This module contains the context snapshot machinery: rebuilding one
//! back-end context from another between traces.

use crate::backend::Context;

/// Rebuilds `destination` as a copy of `source`.
///
/// Four things are copied, in order: the concrete machine state (the
/// register file and concrete memory, deep-copied through the back-end's
/// architecture-specific clone); the symbolic register table, cleared and
/// replayed; the symbolic memory table, cleared and replayed; and the
/// ordered path-constraint list, cleared and repushed.
///
/// Expression handles are shared between the two contexts rather than
/// duplicated; they are immutable nodes owned by the back-end's arena.
/// What must be distinct, and is, are the assignment tables and the
/// constraint list themselves.
///
/// Both contexts must be of the same architecture, which holds by
/// construction when `destination` came from [`Context::mirror`].
pub fn copy_context<C: Context>(source: &C, destination: &mut C) {
    source.clone_cpu_into(destination);

    destination.concretize_registers();
    for (register, expression) in source.symbolic_registers() {
        destination.assign_register_expression(&register, expression);
    }

    destination.concretize_memory();
    for (address, expression) in source.symbolic_memory() {
        destination.assign_memory_expression(address, expression);
    }

    destination.clear_path_constraints();
    for constraint in source.path_constraints() {
        destination.push_path_constraint(constraint);
    }
}
