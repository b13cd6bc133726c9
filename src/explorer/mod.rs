//! This module contains the exploration engine itself: the worklist-driven
//! loop that executes the target under concrete seeds, negates the branches
//! each trace commits to, and feeds the resulting models back in as new
//! seeds.

pub mod snapshot;

mod ea;
mod inputs;
mod trace;

use std::{
    collections::{HashSet, VecDeque},
    path::PathBuf,
    time::Duration,
};

use crate::{
    artifacts::Workspace,
    backend::{Context, Solution},
    constant::{
        DEFAULT_EA_MODEL_LIMIT,
        DEFAULT_JMP_MODEL_LIMIT,
        DEFAULT_SOLVER_TIMEOUT,
        DEFAULT_STATS_ENABLED,
        DEFAULT_WORKSPACE,
    },
    coverage::Coverage,
    error::{self, exploration},
    hooks::{Hook, HookRegistry},
    seed::Seed,
    stats::Statistics,
    watchdog::DynWatchdog,
};

/// The symbolic exploration engine.
///
/// The explorer owns the back-end context it was constructed over. Each
/// call to [`Self::explore`] snapshots that context, then repeatedly picks
/// a seed off the worklist, injects it, executes one trace to termination,
/// asks the solver for inputs that negate the branches the trace took, and
/// restores the context for the next trace.
///
/// The engine is single-threaded and cooperative: every state mutation
/// (worklist, donelist, coverage, counters, contexts) happens on the
/// caller's thread, and the only long-running operations are solver
/// queries, bounded by [`Config::solver_timeout`].
pub struct Explorer<C: Context> {
    /// The working context, mutated during each trace.
    context: C,

    /// The configuration of the exploration.
    config: Config,

    /// The hooks consulted before each fetch.
    hooks: HookRegistry<C>,

    /// The frontier of seeds to run. The bootstrap seed sits at the tail;
    /// seeds derived during and after a trace are pushed at the head, so
    /// exploration is depth-first after a breadth-first bootstrap.
    worklist: VecDeque<Seed>,

    /// The path-prefix encodings already submitted to the solver. Grows
    /// monotonically for the lifetime of the explorer.
    donelist: HashSet<Vec<u64>>,

    /// The instruction coverage accumulated across all traces.
    coverage: Coverage,

    /// The execution and solver counters.
    stats: Statistics,

    /// The faults observed across traces, in chronological order. These
    /// terminate their trace but are not fatal to the exploration.
    faults: exploration::Errors,

    /// A watchdog polled between traces and inside the trace loop to check
    /// whether the exploration needs to exit early.
    watchdog: DynWatchdog,
}

impl<C: Context> Explorer<C> {
    /// Constructs a new explorer over the provided back-end `context`.
    pub fn new(context: C, config: Config, watchdog: DynWatchdog) -> Self {
        Self {
            context,
            config,
            hooks: HookRegistry::new(),
            worklist: VecDeque::new(),
            donelist: HashSet::new(),
            coverage: Coverage::new(),
            stats: Statistics::new(),
            faults: exploration::Errors::new(),
            watchdog,
        }
    }

    /// Registers `hook` to run in place of the instruction at `address`.
    /// The last registration at an address wins.
    pub fn hook_instruction(&mut self, address: u64, hook: Hook<C>) {
        self.hooks.register(address, hook);
    }

    /// Explores the target program until the worklist drains.
    ///
    /// On return the workspace contains one `corpus/` entry per executed
    /// trace, one `crashes/` entry per trace that terminated on an invalid
    /// fetch or decode, and the statistics are final.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if the context has no symbolic variables to explore
    /// over, if the workspace cannot be written, if a hook requests return
    /// synthesis on an architecture without one, or if the watchdog stops
    /// the run.
    pub fn explore(&mut self) -> error::Result<()> {
        if self.context.variable_count() == 0 {
            return Err(exploration::Error::NoSymbolicVariables.into());
        }

        let workspace = Workspace::create(&self.config.workspace)?;

        // The backup is the pristine state every trace starts from; the
        // working context diverges from it only through injected seeds.
        let mut backup = self.context.mirror();
        snapshot::copy_context(&self.context, &mut backup);

        self.init_worklist();

        loop {
            if self.worklist.is_empty() {
                break;
            }
            if self.watchdog.should_stop() {
                return Err(exploration::Error::StoppedByWatchdog.into());
            }
            if self.config.stats {
                self.print_statistics();
            }

            let Some(seed) = self.worklist.pop_front() else {
                break;
            };

            self.inject_seed(&seed);
            self.run(&seed, &workspace)?;
            self.find_new_inputs();

            snapshot::copy_context(&backup, &mut self.context);
        }

        if self.config.stats {
            self.print_statistics();
        }

        Ok(())
    }

    /// Writes the IDA colouring script for the coverage accumulated so far
    /// and returns its path.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if the workspace or the script cannot be written.
    pub fn dump_coverage(&self) -> error::Result<PathBuf> {
        let workspace = Workspace::create(&self.config.workspace)?;
        let path = workspace.write_coverage_script(&self.coverage.ida_script())?;
        log::info!("IDA coverage script written to {}", path.display());

        Ok(path)
    }

    /// Solves the initial path predicate and enqueues the first seed at the
    /// tail of the worklist.
    ///
    /// A satisfiable outcome with an empty assignment means any input
    /// satisfies the predicate, so the all-zero model over every symbolic
    /// variable is synthesised in its place. On an unsatisfiable or
    /// timed-out outcome the worklist stays empty and the exploration
    /// terminates immediately.
    fn init_worklist(&mut self) {
        let predicate = self.context.path_predicate();
        let solution = self.context.solve(&predicate, self.config.solver_timeout);
        self.stats.record(&solution);

        if let Solution::Sat(models) = solution {
            for model in models {
                let model = if model.is_empty() {
                    Seed::zeroed(self.context.variable_count())
                } else {
                    model
                };
                self.worklist.push_back(model);
            }
        }
    }

    /// Writes the seed's values into the context's symbolic variables.
    /// Variables the seed leaves unbound are set to `0x00`.
    fn inject_seed(&mut self, seed: &Seed) {
        log::debug!("injecting seed {seed}");
        for variable in 0..self.context.variable_count() {
            let value = seed.value(variable).unwrap_or(0x00);
            self.context.set_variable_value(variable, value);
        }
    }

    /// Emits the per-trace statistics line.
    fn print_statistics(&self) {
        log::info!(
            "exec: {}, icov: {}, sat: {}, unsat: {}, timeout: {}, worklist: {}",
            self.stats.executions(),
            self.coverage.address_count(),
            self.stats.sat(),
            self.stats.unsat(),
            self.stats.timeout(),
            self.worklist.len()
        );
    }

    /// Gets the back-end context the explorer drives.
    #[must_use]
    pub fn context(&self) -> &C {
        &self.context
    }

    /// Gets the back-end context the explorer drives, for mutation between
    /// runs.
    pub fn context_mut(&mut self) -> &mut C {
        &mut self.context
    }

    /// Gets the configuration of the exploration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Gets the instruction coverage accumulated so far.
    #[must_use]
    pub fn coverage(&self) -> &Coverage {
        &self.coverage
    }

    /// Gets the execution and solver counters.
    #[must_use]
    pub fn statistics(&self) -> &Statistics {
        &self.stats
    }

    /// Gets the faults observed across traces, in chronological order.
    #[must_use]
    pub fn faults(&self) -> &exploration::Errors {
        &self.faults
    }

    /// Gets the number of seeds currently awaiting execution.
    #[must_use]
    pub fn worklist_len(&self) -> usize {
        self.worklist.len()
    }

    /// Gets the number of path-prefix encodings already submitted to the
    /// solver.
    #[must_use]
    pub fn donelist_len(&self) -> usize {
        self.donelist.len()
    }
}

/// The configuration for an exploration run.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Config {
    /// Whether to emit the statistics line before each trace and once at
    /// the end of the run.
    ///
    /// Defaults to [`DEFAULT_STATS_ENABLED`].
    pub stats: bool,

    /// The directory the `corpus/`, `crashes/` and `coverage/` artifacts
    /// are written under. Assumed to be exclusively owned by this explorer
    /// for the duration of a run.
    ///
    /// Defaults to [`DEFAULT_WORKSPACE`].
    pub workspace: PathBuf,

    /// The address at which a trace terminates, with zero meaning no
    /// endpoint is set. The endpoint instruction itself is executed before
    /// the trace terminates.
    pub end_point: u64,

    /// The maximum number of models requested when expanding a symbolic
    /// effective address.
    ///
    /// Defaults to [`DEFAULT_EA_MODEL_LIMIT`].
    pub ea_model_limit: usize,

    /// The maximum number of models requested when negating the target of
    /// an indirect jump.
    ///
    /// Defaults to [`DEFAULT_JMP_MODEL_LIMIT`].
    pub jmp_model_limit: usize,

    /// The maximum number of instructions a single trace may execute, with
    /// zero meaning unlimited.
    pub instruction_limit: usize,

    /// The wall-clock budget for a single solver query.
    ///
    /// Defaults to [`DEFAULT_SOLVER_TIMEOUT`].
    pub solver_timeout: Duration,
}

impl Config {
    /// Sets the `stats` config parameter to `value`.
    #[must_use]
    pub fn with_stats(mut self, value: bool) -> Self {
        self.stats = value;
        self
    }

    /// Sets the `workspace` config parameter to `value`.
    #[must_use]
    pub fn with_workspace(mut self, value: impl Into<PathBuf>) -> Self {
        self.workspace = value.into();
        self
    }

    /// Sets the `end_point` config parameter to `value`.
    #[must_use]
    pub fn with_end_point(mut self, value: u64) -> Self {
        self.end_point = value;
        self
    }

    /// Sets the `ea_model_limit` config parameter to `value`.
    #[must_use]
    pub fn with_ea_model_limit(mut self, value: usize) -> Self {
        self.ea_model_limit = value;
        self
    }

    /// Sets the `jmp_model_limit` config parameter to `value`.
    #[must_use]
    pub fn with_jmp_model_limit(mut self, value: usize) -> Self {
        self.jmp_model_limit = value;
        self
    }

    /// Sets the `instruction_limit` config parameter to `value`.
    #[must_use]
    pub fn with_instruction_limit(mut self, value: usize) -> Self {
        self.instruction_limit = value;
        self
    }

    /// Sets the `solver_timeout` config parameter to `value`.
    #[must_use]
    pub fn with_solver_timeout(mut self, value: Duration) -> Self {
        self.solver_timeout = value;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        let stats = DEFAULT_STATS_ENABLED;
        let workspace = PathBuf::from(DEFAULT_WORKSPACE);
        let end_point = 0;
        let ea_model_limit = DEFAULT_EA_MODEL_LIMIT;
        let jmp_model_limit = DEFAULT_JMP_MODEL_LIMIT;
        let instruction_limit = 0;
        let solver_timeout = DEFAULT_SOLVER_TIMEOUT;
        Self {
            stats,
            workspace,
            end_point,
            ea_model_limit,
            jmp_model_limit,
            instruction_limit,
            solver_timeout,
        }
    }
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use crate::explorer::Config;

    #[test]
    fn config_defaults_match_the_constants() {
        let config = Config::default();

        assert!(config.stats);
        assert_eq!(config.workspace, std::path::PathBuf::from("workspace"));
        assert_eq!(config.end_point, 0);
        assert_eq!(config.ea_model_limit, 1000);
        assert_eq!(config.jmp_model_limit, 1000);
        assert_eq!(config.instruction_limit, 0);
        assert_eq!(config.solver_timeout, Duration::from_secs(60));
    }

    #[test]
    fn config_builders_set_each_parameter() {
        let config = Config::default()
            .with_stats(false)
            .with_workspace("/tmp/exploration")
            .with_end_point(0x1181)
            .with_ea_model_limit(5)
            .with_jmp_model_limit(7)
            .with_instruction_limit(10_000)
            .with_solver_timeout(Duration::from_secs(5));

        assert!(!config.stats);
        assert_eq!(config.workspace, std::path::PathBuf::from("/tmp/exploration"));
        assert_eq!(config.end_point, 0x1181);
        assert_eq!(config.ea_model_limit, 5);
        assert_eq!(config.jmp_model_limit, 7);
        assert_eq!(config.instruction_limit, 10_000);
        assert_eq!(config.solver_timeout, Duration::from_secs(5));
    }
}
