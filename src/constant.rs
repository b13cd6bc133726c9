//! This module contains constants that are needed throughout the codebase.

use std::time::Duration;

/// The default maximum number of models requested from the solver when
/// expanding a symbolic effective address.
pub const DEFAULT_EA_MODEL_LIMIT: usize = 1000;

/// The default maximum number of models requested from the solver when
/// negating the target of an indirect jump.
pub const DEFAULT_JMP_MODEL_LIMIT: usize = 1000;

/// The default wall-clock budget for a single solver query.
pub const DEFAULT_SOLVER_TIMEOUT: Duration = Duration::from_secs(60);

/// The default directory under which the exploration artifacts are written.
pub const DEFAULT_WORKSPACE: &str = "workspace";

/// Whether the per-trace statistics line is emitted by default.
pub const DEFAULT_STATS_ENABLED: bool = true;

/// The number of bytes fetched at the program counter when asking the
/// back-end to process an instruction.
///
/// This is an upper bound on the encoded length of a single instruction on
/// the supported architectures; the back-end consumes only as many bytes as
/// the instruction actually occupies.
pub const INSTRUCTION_FETCH_BYTES: usize = 16;

/// The colour applied to each covered instruction by the generated IDA
/// colouring script.
pub const IDA_COVERAGE_COLOUR: u32 = 0x02_4701;

/// The name of the coverage script file written under `coverage/`.
pub const COVERAGE_SCRIPT_NAME: &str = "ida_cov.py";

/// The default number of trace-loop iterations between watchdog polls.
pub const DEFAULT_WATCHDOG_POLL_LOOP_ITERATIONS: usize = 100;
