//! This module contains common testing utilities: a scripted back-end
//! implementing the engine's context façade over a small programmed
//! transition table, with a canned solver and a shared observation journal.
#![cfg(test)]
#![allow(unused)] // Not every harness uses every helper.

use std::{
    cell::RefCell,
    collections::{BTreeMap, VecDeque},
    rc::Rc,
};

use concolic_explorer::{
    backend::{
        arch::Arch,
        Branch,
        Context,
        EffectiveAddress,
        Fault,
        Instruction,
        PathConstraint,
        ProcessedInstruction,
        Solution,
        VariableId,
    },
    seed::Seed,
};

/// A tiny expression tree standing in for the back-end's arena-owned AST
/// nodes. Handles are reference-counted and immutable, as the engine
/// expects.
#[derive(Clone, Debug, PartialEq)]
pub enum Ast {
    True,
    Bv { value: u64, bits: u32 },
    Var(VariableId),
    And(AstRef, AstRef),
    Not(AstRef),
    Equal(AstRef, AstRef),
    Distinct(AstRef, AstRef),
}

pub type AstRef = Rc<Ast>;

/// One programmed instruction of the scripted target.
#[derive(Clone, Debug)]
pub enum ScriptedOp {
    /// Advance to `next`, optionally reporting memory operands.
    Jump {
        next: u64,
        operands: Vec<EffectiveAddress<AstRef>>,
    },

    /// A conditional branch on the concrete value of a symbolic variable,
    /// recording a two-alternative path constraint.
    BranchIfVar {
        variable: VariableId,
        equals: u8,
        then_target: u64,
        else_target: u64,
    },

    /// A computed jump to `next`, recording a single-alternative,
    /// non-multiple-branches path constraint.
    ComputedJump { next: u64 },

    /// Raise the given fault when processed.
    Fault(Fault),
}

impl ScriptedOp {
    /// A plain fall-through instruction.
    pub fn jump(next: u64) -> Self {
        Self::Jump {
            next,
            operands: vec![],
        }
    }

    /// Attaches a memory operand to a `Jump` op.
    pub fn with_operand(self, operand: EffectiveAddress<AstRef>) -> Self {
        match self {
            Self::Jump { next, mut operands } => {
                operands.push(operand);
                Self::Jump { next, operands }
            }
            other => other,
        }
    }
}

/// The canned solver behind the scripted context.
///
/// Responses are consumed in query order; once the script runs dry every
/// further query is unsatisfiable.
#[derive(Debug, Default)]
pub struct SolverScript {
    responses: VecDeque<Solution>,
    calls: usize,
}

/// A scripted back-end context.
///
/// The transition table, solver script and journal are shared between a
/// context and its mirrors, so observations survive the engine's
/// per-trace snapshot restores and remain readable through
/// [`concolic_explorer::Explorer::context`] after a run.
#[derive(Debug)]
pub struct ScriptedContext {
    arch: Arch,
    registers: BTreeMap<String, u64>,
    memory: BTreeMap<u64, u8>,
    variables: Vec<u8>,
    sym_registers: Vec<(String, AstRef)>,
    sym_memory: Vec<(u64, AstRef)>,
    path: Vec<PathConstraint<AstRef>>,
    program: Rc<RefCell<BTreeMap<u64, ScriptedOp>>>,
    solver: Rc<RefCell<SolverScript>>,
    journal: Rc<RefCell<Vec<u64>>>,
    return_target: Option<u64>,
}

impl ScriptedContext {
    /// Creates an empty scripted context for the given architecture.
    pub fn new(arch: Arch) -> Self {
        Self {
            arch,
            registers: BTreeMap::new(),
            memory: BTreeMap::new(),
            variables: Vec::new(),
            sym_registers: Vec::new(),
            sym_memory: Vec::new(),
            path: Vec::new(),
            program: Rc::new(RefCell::new(BTreeMap::new())),
            solver: Rc::new(RefCell::new(SolverScript::default())),
            journal: Rc::new(RefCell::new(Vec::new())),
            return_target: None,
        }
    }

    /// Programs `op` at `pc` and defines one byte of memory there so the
    /// trace runner's fetch succeeds.
    pub fn define_instruction(&mut self, pc: u64, op: ScriptedOp) {
        self.memory.entry(pc).or_insert(0x90);
        self.program.borrow_mut().insert(pc, op);
    }

    /// Queues the next solver response.
    pub fn script_solution(&mut self, solution: Solution) {
        self.solver.borrow_mut().responses.push_back(solution);
    }

    /// Gets the number of solver queries issued so far.
    pub fn solver_calls(&self) -> usize {
        self.solver.borrow().calls
    }

    /// Gets a handle on the journal of processed instruction addresses.
    pub fn journal(&self) -> Rc<RefCell<Vec<u64>>> {
        self.journal.clone()
    }

    /// Sets the address a synthetic return transfers control to.
    pub fn set_return_target(&mut self, target: u64) {
        self.return_target = Some(target);
    }

    /// Sets the program counter.
    pub fn set_program_counter(&mut self, value: u64) {
        let register = self.arch.program_counter().to_string();
        self.registers.insert(register, value);
    }

    fn pop_solution(&self) -> Solution {
        let mut solver = self.solver.borrow_mut();
        solver.calls += 1;
        solver.responses.pop_front().unwrap_or(Solution::Unsat)
    }
}

impl Context for ScriptedContext {
    type Expr = AstRef;

    fn architecture(&self) -> Arch {
        self.arch
    }

    fn program_counter(&self) -> u64 {
        self.registers
            .get(self.arch.program_counter())
            .copied()
            .unwrap_or(0)
    }

    fn read_register(&self, name: &str) -> Option<u64> {
        self.registers.get(name).copied()
    }

    fn write_register(&mut self, name: &str, value: u64) {
        self.registers.insert(name.to_string(), value);
    }

    fn read_memory(&self, address: u64, len: usize) -> Vec<u8> {
        (0..len as u64)
            .map(|offset| self.memory.get(&(address + offset)).copied().unwrap_or(0))
            .collect()
    }

    fn write_memory(&mut self, address: u64, bytes: &[u8]) {
        for (offset, &byte) in bytes.iter().enumerate() {
            self.memory.insert(address + offset as u64, byte);
        }
    }

    fn is_memory_defined(&self, address: u64, len: usize) -> bool {
        (0..len as u64).all(|offset| self.memory.contains_key(&(address + offset)))
    }

    fn symbolize_memory(&mut self, address: u64, len: usize) -> Vec<VariableId> {
        let mut variables = Vec::with_capacity(len);
        for offset in 0..len as u64 {
            let id = self.variables.len();
            let value = self.memory.get(&(address + offset)).copied().unwrap_or(0);
            self.variables.push(value);
            self.sym_memory.push((address + offset, Rc::new(Ast::Var(id))));
            variables.push(id);
        }

        variables
    }

    fn variable_count(&self) -> usize {
        self.variables.len()
    }

    fn variable_value(&self, variable: VariableId) -> u8 {
        self.variables.get(variable).copied().unwrap_or(0)
    }

    fn set_variable_value(&mut self, variable: VariableId, value: u8) {
        if let Some(slot) = self.variables.get_mut(variable) {
            *slot = value;
        }
    }

    fn path_predicate(&self) -> AstRef {
        self.path
            .iter()
            .map(|constraint| constraint.taken_predicate.clone())
            .reduce(|lhs, rhs| Rc::new(Ast::And(lhs, rhs)))
            .unwrap_or_else(|| Rc::new(Ast::True))
    }

    fn path_constraints(&self) -> Vec<PathConstraint<AstRef>> {
        self.path.clone()
    }

    fn push_path_constraint(&mut self, constraint: PathConstraint<AstRef>) {
        self.path.push(constraint);
    }

    fn push_path_predicate(&mut self, expression: AstRef) {
        // An expression pushed bare becomes an always-taken constraint, the
        // way the back-end wraps effective-address freezes.
        self.path.push(PathConstraint {
            source_address: 0,
            multiple_branches: true,
            branches: vec![Branch {
                taken: true,
                target_address: 0,
                predicate: expression.clone(),
            }],
            taken_predicate: expression,
        });
    }

    fn clear_path_constraints(&mut self) {
        self.path.clear();
    }

    fn process(
        &mut self,
        instruction: &Instruction,
    ) -> Result<ProcessedInstruction<AstRef>, Fault> {
        // Synthetic returns arrive as exactly the one-byte opcode; fetched
        // instructions always carry the full fetch window.
        if instruction.bytes() == [0xc3].as_slice() {
            if let Some(target) = self.return_target {
                self.set_program_counter(target);
            }
            return Ok(ProcessedInstruction {
                address: instruction.address(),
                memory_operands: vec![],
            });
        }

        let op = self
            .program
            .borrow()
            .get(&instruction.address())
            .cloned()
            .ok_or(Fault::Decode)?;

        let processed = match op {
            ScriptedOp::Jump { next, operands } => {
                self.set_program_counter(next);
                ProcessedInstruction {
                    address: instruction.address(),
                    memory_operands: operands,
                }
            }
            ScriptedOp::BranchIfVar {
                variable,
                equals,
                then_target,
                else_target,
            } => {
                let cond = Rc::new(Ast::Equal(
                    Rc::new(Ast::Var(variable)),
                    Rc::new(Ast::Bv {
                        value: u64::from(equals),
                        bits: 8,
                    }),
                ));
                let not_cond = Rc::new(Ast::Not(cond.clone()));
                let matches = self.variable_value(variable) == equals;
                let (next, taken_predicate) = if matches {
                    (then_target, cond.clone())
                } else {
                    (else_target, not_cond.clone())
                };

                self.path.push(PathConstraint {
                    source_address: instruction.address(),
                    multiple_branches: true,
                    branches: vec![
                        Branch {
                            taken: matches,
                            target_address: then_target,
                            predicate: cond,
                        },
                        Branch {
                            taken: !matches,
                            target_address: else_target,
                            predicate: not_cond,
                        },
                    ],
                    taken_predicate,
                });
                self.set_program_counter(next);
                ProcessedInstruction {
                    address: instruction.address(),
                    memory_operands: vec![],
                }
            }
            ScriptedOp::ComputedJump { next } => {
                let target = Rc::new(Ast::Bv {
                    value: next,
                    bits: 64,
                });
                self.path.push(PathConstraint {
                    source_address: instruction.address(),
                    multiple_branches: false,
                    branches: vec![Branch {
                        taken: true,
                        target_address: next,
                        predicate: target.clone(),
                    }],
                    taken_predicate: target,
                });
                self.set_program_counter(next);
                ProcessedInstruction {
                    address: instruction.address(),
                    memory_operands: vec![],
                }
            }
            ScriptedOp::Fault(fault) => return Err(fault),
        };

        self.journal.borrow_mut().push(instruction.address());
        Ok(processed)
    }

    fn solve(&self, _formula: &AstRef, _timeout: std::time::Duration) -> Solution {
        self.pop_solution()
    }

    fn solve_many(
        &self,
        _formula: &AstRef,
        limit: usize,
        _timeout: std::time::Duration,
    ) -> Solution {
        match self.pop_solution() {
            Solution::Sat(mut models) => {
                models.truncate(limit);
                Solution::Sat(models)
            }
            other => other,
        }
    }

    fn and(&mut self, lhs: &AstRef, rhs: &AstRef) -> AstRef {
        Rc::new(Ast::And(lhs.clone(), rhs.clone()))
    }

    fn not(&mut self, expr: &AstRef) -> AstRef {
        Rc::new(Ast::Not(expr.clone()))
    }

    fn distinct(&mut self, lhs: &AstRef, rhs: &AstRef) -> AstRef {
        Rc::new(Ast::Distinct(lhs.clone(), rhs.clone()))
    }

    fn equal(&mut self, lhs: &AstRef, rhs: &AstRef) -> AstRef {
        Rc::new(Ast::Equal(lhs.clone(), rhs.clone()))
    }

    fn bitvector(&mut self, value: u64, bits: u32) -> AstRef {
        Rc::new(Ast::Bv { value, bits })
    }

    fn truth(&mut self) -> AstRef {
        Rc::new(Ast::True)
    }

    fn mirror(&self) -> Self {
        Self {
            arch: self.arch,
            registers: BTreeMap::new(),
            memory: BTreeMap::new(),
            variables: vec![0; self.variables.len()],
            sym_registers: Vec::new(),
            sym_memory: Vec::new(),
            path: Vec::new(),
            program: self.program.clone(),
            solver: self.solver.clone(),
            journal: self.journal.clone(),
            return_target: self.return_target,
        }
    }

    fn clone_cpu_into(&self, destination: &mut Self) {
        destination.registers = self.registers.clone();
        destination.memory = self.memory.clone();
    }

    fn symbolic_registers(&self) -> Vec<(String, AstRef)> {
        self.sym_registers.clone()
    }

    fn assign_register_expression(&mut self, register: &str, expression: AstRef) {
        self.sym_registers.push((register.to_string(), expression));
    }

    fn concretize_registers(&mut self) {
        self.sym_registers.clear();
    }

    fn symbolic_memory(&self) -> Vec<(u64, AstRef)> {
        self.sym_memory.clone()
    }

    fn assign_memory_expression(&mut self, address: u64, expression: AstRef) {
        self.sym_memory.push((address, expression));
    }

    fn concretize_memory(&mut self) {
        self.sym_memory.clear();
    }
}

/// Builds a seed binding the given `(variable, value)` pairs.
pub fn seed_of(bindings: &[(VariableId, u8)]) -> Seed {
    bindings.iter().copied().collect()
}
