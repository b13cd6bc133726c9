//! This module contains the façade through which the exploration engine
//! drives the concrete+symbolic back-end.
//!
//! The back-end (an emulator, an expression arena, and a constraint
//! solver) is an external collaborator. The engine never parses binaries and
//! never solves formulas itself; it only orchestrates the operations below.
//! A back-end instance is passed to the explorer at construction, so there
//! is exactly one back-end per explorer and no process-wide state.

pub mod arch;

use std::{
    fmt::{Debug, Display, Formatter},
    time::Duration,
};

use crate::{backend::arch::Arch, seed::Seed};

/// The identifier of a symbolic variable.
///
/// The back-end allocates these densely from zero, one per symbolic input
/// byte, and the variable set does not change during exploration.
pub type VariableId = usize;

/// The raw bytes of one instruction, as fetched from the target's memory at
/// the program counter.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Instruction {
    /// The address the bytes were fetched from.
    address: u64,

    /// The fetched bytes, up to
    /// [`crate::constant::INSTRUCTION_FETCH_BYTES`] of them. The back-end
    /// consumes only as many as the decoded instruction occupies.
    bytes: Vec<u8>,
}

impl Instruction {
    /// Constructs a new instruction from the `bytes` fetched at `address`.
    #[must_use]
    pub fn new(address: u64, bytes: Vec<u8>) -> Self {
        Self { address, bytes }
    }

    /// Gets the address the instruction was fetched from.
    #[must_use]
    pub fn address(&self) -> u64 {
        self.address
    }

    /// Gets the fetched bytes.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        self.bytes.as_slice()
    }
}

/// The record the back-end hands back after successfully processing one
/// instruction.
#[derive(Clone, Debug)]
pub struct ProcessedInstruction<E> {
    /// The address of the processed instruction.
    pub address: u64,

    /// The effective addresses of the instruction's memory operands, in
    /// operand order.
    pub memory_operands: Vec<EffectiveAddress<E>>,
}

/// The effective address of one memory operand of a processed instruction.
#[derive(Clone, Debug)]
pub struct EffectiveAddress<E> {
    /// The address expression, possibly depending on symbolic variables.
    pub expression: E,

    /// The concrete value the expression evaluates to under the current
    /// variable values.
    pub concrete: u64,

    /// The width of the address expression in bits.
    pub bit_width: u32,

    /// Whether the expression depends on at least one symbolic variable.
    pub is_symbolic: bool,
}

/// A fault raised by the back-end while processing an instruction.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Fault {
    /// The fetched bytes did not decode to an instruction.
    Decode,

    /// The instruction decoded but raised a processor fault while
    /// executing.
    Processor,
}

impl Display for Fault {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Decode => "instruction decoding failed",
            Self::Processor => "processor fault",
        };
        write!(f, "{name}")
    }
}

/// One branching instruction of the current path, as recorded by the
/// back-end when processing it.
#[derive(Clone, Debug, PartialEq)]
pub struct PathConstraint<E> {
    /// The address of the branching instruction.
    pub source_address: u64,

    /// True for ordinary conditional branches, which carry both the taken
    /// and the not-taken alternative; false for computed jumps, which carry
    /// one alternative per concrete target the back-end discovered.
    pub multiple_branches: bool,

    /// The branch alternatives, each carrying whether it was the direction
    /// actually executed.
    pub branches: Vec<Branch<E>>,

    /// The conjunct asserting the direction actually executed.
    pub taken_predicate: E,
}

/// One alternative of a branching instruction.
#[derive(Clone, Debug, PartialEq)]
pub struct Branch<E> {
    /// Whether this alternative is the direction the trace actually took.
    pub taken: bool,

    /// The address execution transfers to along this alternative.
    pub target_address: u64,

    /// The condition under which this alternative is taken.
    pub predicate: E,
}

/// The outcome of a solver query.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Solution {
    /// The formula is satisfiable. Single-model queries return exactly one
    /// model here; multi-model queries return as many distinct models as
    /// the solver found, up to the requested limit. A model with no
    /// bindings means any assignment satisfies the formula.
    Sat(Vec<Seed>),

    /// The formula is unsatisfiable.
    Unsat,

    /// The solver gave up after the configured wall-clock budget. Treated
    /// as unsatisfiable for worklist purposes.
    Timeout,
}

/// The interface to the concrete+symbolic back-end driven by the
/// exploration engine.
///
/// # Expression Handles
///
/// The associated [`Self::Expr`] type is a cheap handle to an immutable
/// expression node owned by the back-end's arena. Handles may share
/// sub-expressions freely; the engine never inspects them, it only passes
/// them back into the builder and solver operations.
///
/// # Snapshot Support
///
/// The `mirror`/`clone_cpu_into`/assignment-table operations exist so that
/// [`crate::explorer::snapshot::copy_context`] can rebuild one context from
/// another: the concrete machine state is deep-copied, while the symbolic
/// assignment tables and the path-constraint list are cleared and replayed.
/// `mirror` must produce a context of the same architecture, which makes
/// the state copy total over [`Arch`].
pub trait Context {
    /// A handle to an immutable expression node owned by the back-end.
    type Expr: Clone + Debug;

    /// Gets the architecture of the emulated machine.
    fn architecture(&self) -> Arch;

    /// Gets the concrete value of the program counter.
    fn program_counter(&self) -> u64;

    /// Gets the concrete value of the named register, or [`None`] if the
    /// architecture has no such register.
    fn read_register(&self, name: &str) -> Option<u64>;

    /// Sets the concrete value of the named register. Unknown registers are
    /// ignored.
    fn write_register(&mut self, name: &str, value: u64);

    /// Reads `len` bytes of concrete memory starting at `address`.
    /// Undefined bytes read as zero.
    fn read_memory(&self, address: u64, len: usize) -> Vec<u8>;

    /// Writes the provided bytes into concrete memory starting at
    /// `address`, defining any previously-undefined bytes.
    fn write_memory(&mut self, address: u64, bytes: &[u8]);

    /// Checks whether all of the `len` bytes starting at `address` are
    /// defined.
    fn is_memory_defined(&self, address: u64, len: usize) -> bool;

    /// Turns the `len` bytes starting at `address` into fresh one-byte
    /// symbolic variables and returns their identifiers.
    fn symbolize_memory(&mut self, address: u64, len: usize) -> Vec<VariableId>;

    /// Gets the number of symbolic variables. Identifiers are dense in
    /// `[0, variable_count())`.
    fn variable_count(&self) -> usize;

    /// Gets the concrete value currently backing the given variable.
    fn variable_value(&self, variable: VariableId) -> u8;

    /// Sets the concrete value backing the given variable.
    fn set_variable_value(&mut self, variable: VariableId, value: u8);

    /// Gets the conjunction of every branch condition taken so far in the
    /// current trace.
    fn path_predicate(&self) -> Self::Expr;

    /// Gets the ordered list of branch records accumulated in the current
    /// trace.
    fn path_constraints(&self) -> Vec<PathConstraint<Self::Expr>>;

    /// Appends a full branch record to the path constraints. Used when
    /// replaying one context's constraints into another.
    fn push_path_constraint(&mut self, constraint: PathConstraint<Self::Expr>);

    /// Appends a bare expression to the path predicate as an always-taken
    /// constraint.
    fn push_path_predicate(&mut self, expression: Self::Expr);

    /// Clears the accumulated path constraints.
    fn clear_path_constraints(&mut self);

    /// Decodes and executes one instruction, advancing the machine state
    /// and appending a branch record if the instruction branches.
    ///
    /// # Errors
    ///
    /// Returns the [`Fault`] the processor raised, if any. A faulted
    /// instruction must leave the context in a state that is safe to
    /// snapshot over.
    fn process(
        &mut self,
        instruction: &Instruction,
    ) -> std::result::Result<ProcessedInstruction<Self::Expr>, Fault>;

    /// Asks the solver for a single model of `formula`, within `timeout`.
    fn solve(&self, formula: &Self::Expr, timeout: Duration) -> Solution;

    /// Asks the solver for up to `limit` distinct models of `formula`,
    /// within `timeout`.
    fn solve_many(&self, formula: &Self::Expr, limit: usize, timeout: Duration) -> Solution;

    /// Builds the conjunction of two boolean expressions.
    fn and(&mut self, lhs: &Self::Expr, rhs: &Self::Expr) -> Self::Expr;

    /// Builds the negation of a boolean expression.
    fn not(&mut self, expr: &Self::Expr) -> Self::Expr;

    /// Builds the expression asserting that two bitvectors differ.
    fn distinct(&mut self, lhs: &Self::Expr, rhs: &Self::Expr) -> Self::Expr;

    /// Builds the expression asserting that two bitvectors are equal.
    fn equal(&mut self, lhs: &Self::Expr, rhs: &Self::Expr) -> Self::Expr;

    /// Builds a bitvector constant of the given width.
    fn bitvector(&mut self, value: u64, bits: u32) -> Self::Expr;

    /// Builds the boolean constant `true`.
    fn truth(&mut self) -> Self::Expr;

    /// Creates a blank context of the same architecture, suitable as the
    /// destination of a state copy.
    fn mirror(&self) -> Self
    where
        Self: Sized;

    /// Deep-copies the concrete machine state, the register file and
    /// concrete memory both, into `destination`, which must be of the same
    /// architecture.
    fn clone_cpu_into(&self, destination: &mut Self);

    /// Gets the symbolic register assignments as register-name/expression
    /// pairs.
    fn symbolic_registers(&self) -> Vec<(String, Self::Expr)>;

    /// Assigns an expression to the named register in the symbolic
    /// register table.
    fn assign_register_expression(&mut self, register: &str, expression: Self::Expr);

    /// Clears the symbolic register table, leaving every register
    /// concrete.
    fn concretize_registers(&mut self);

    /// Gets the byte-granular symbolic memory assignments as
    /// address/expression pairs.
    fn symbolic_memory(&self) -> Vec<(u64, Self::Expr)>;

    /// Assigns an expression to the byte at `address` in the symbolic
    /// memory table.
    fn assign_memory_expression(&mut self, address: u64, expression: Self::Expr);

    /// Clears the symbolic memory table, leaving all of memory concrete.
    fn concretize_memory(&mut self);
}
