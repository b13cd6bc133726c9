//! This module contains the trace runner: the loop that executes one seed
//! to termination, dispatching hooks, detecting invalid control flow, and
//! persisting the seed when the trace ends.

use crate::{
    artifacts::Workspace,
    backend::{Context, Instruction},
    constant::INSTRUCTION_FETCH_BYTES,
    error::{self, container::Locatable, exploration},
    explorer::Explorer,
    hooks::HookAction,
    seed::Seed,
};

/// The outcome of one iteration of the trace loop.
enum Step {
    /// A hook consumed the iteration; no instruction was executed.
    Continue,

    /// One instruction was fetched, processed and counted.
    Executed,

    /// A hook requested normal termination of the trace.
    Done,

    /// The trace terminated on an invalid fetch or a processor fault.
    Crashed(exploration::Error),
}

impl<C: Context> Explorer<C> {
    /// Executes one trace of the target under the currently-injected
    /// `seed`, starting from the context's program counter.
    ///
    /// The loop terminates on, in priority order: the instruction limit; a
    /// hook returning [`HookAction::Break`]; invalid control flow; a
    /// back-end fault; or the program counter reaching the configured
    /// endpoint. Crashed traces persist their seed under `crashes/` and
    /// record a fault, then terminate like any other trace: the execution
    /// counter is bumped and the seed is persisted under `corpus/`.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if a seed cannot be persisted, if a hook requests
    /// return synthesis on an architecture without one, or if the watchdog
    /// stops the run. Trace faults are not errors here.
    pub(super) fn run(&mut self, seed: &Seed, workspace: &Workspace) -> error::Result<()> {
        let mut executed = 0_usize;
        let mut iterations = 0_usize;
        let poll_every = self.watchdog.poll_every().max(1);

        let crash = loop {
            if self.config.instruction_limit != 0 && executed >= self.config.instruction_limit {
                break None;
            }
            if iterations != 0 && iterations % poll_every == 0 && self.watchdog.should_stop() {
                return Err(exploration::Error::StoppedByWatchdog.into());
            }
            iterations += 1;

            let pc = self.context.program_counter();
            match self.step(pc)? {
                Step::Continue => {}
                Step::Executed => executed += 1,
                Step::Done => break None,
                Step::Crashed(error) => break Some(error.locate(pc)),
            }

            // The comparison uses the pc fetched at the top of the
            // iteration, so the endpoint instruction itself executes and a
            // hook at the endpoint still ends the trace. With no endpoint
            // configured, a trace whose pc reaches zero on defined memory
            // also terminates here.
            if pc == self.config.end_point {
                break None;
            }
        };

        if let Some(fault) = crash {
            log::warn!(
                "{}, pc = {:#x} (writing seed on disk)",
                fault.payload,
                fault.location
            );
            let bytes = seed.to_dense_bytes(self.context.variable_count());
            workspace.write_crash_seed(self.stats.executions(), &bytes)?;
            self.faults.add(fault);
        }

        self.stats.record_execution();
        let bytes = seed.to_dense_bytes(self.context.variable_count());
        workspace.write_corpus_seed(self.stats.executions(), &bytes)?;

        Ok(())
    }

    /// Performs one iteration of the trace loop at `pc`.
    fn step(&mut self, pc: u64) -> error::Result<Step> {
        if let Some(hook) = self.hooks.lookup(pc).cloned() {
            return match hook.invoke(&mut self.context) {
                HookAction::Continue => Ok(Step::Continue),
                HookAction::Break => Ok(Step::Done),
                HookAction::PltContinue => {
                    self.process_return()?;
                    Ok(Step::Continue)
                }
            };
        }

        // A zero pc only counts as invalid control flow when an endpoint is
        // configured; without one, address zero is caught by the
        // undefined-memory arm alone.
        if (self.config.end_point != 0 && pc == 0) || !self.context.is_memory_defined(pc, 1) {
            return Ok(Step::Crashed(exploration::Error::InvalidControlFlow));
        }

        let bytes = self.context.read_memory(pc, INSTRUCTION_FETCH_BYTES);
        let instruction = Instruction::new(pc, bytes);
        match self.context.process(&instruction) {
            Ok(processed) => {
                self.symbolize_effective_address(&processed);
                self.coverage.record(pc);
                Ok(Step::Executed)
            }
            Err(fault) => Ok(Step::Crashed(exploration::Error::BackendFault { fault })),
        }
    }

    /// Synthesises and processes a return instruction, unwinding the frame
    /// a hooked library function would have returned from.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if the architecture has no synthesisable return
    /// instruction.
    fn process_return(&mut self) -> error::Result<()> {
        let architecture = self.context.architecture();
        let Some(opcode) = architecture.return_instruction() else {
            return Err(exploration::Error::NoReturnInstruction { architecture }.into());
        };

        let pc = self.context.program_counter();
        let instruction = Instruction::new(pc, opcode.to_vec());
        // A fault in the synthetic return is ignored; the next iteration's
        // fetch will surface any resulting invalid state.
        let _ = self.context.process(&instruction);

        Ok(())
    }
}
