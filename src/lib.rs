//! This library implements the core of a symbolic-execution exploration
//! engine: it drives a concrete+symbolic CPU emulator to systematically
//! discover new program inputs. The emulator, its expression arena and the
//! constraint solver are an external collaborator consumed through the
//! [`backend::Context`] trait; this library neither parses binaries nor
//! solves formulas itself.
//!
//! # How it Works
//!
//! From a very high level, the exploration proceeds as follows:
//!
//! 1. The host loads the target into a back-end context, marks some bytes
//!    of memory as symbolic input, and hands the context to an
//!    [`explorer::Explorer`].
//! 2. The explorer snapshots the context and bootstraps its worklist by
//!    solving the (initially empty) path predicate for a first seed.
//! 3. Each seed popped off the worklist is injected into the context's
//!    symbolic variables and executed to termination by the trace runner,
//!    which dispatches instruction hooks, tracks per-address coverage, and
//!    expands symbolic effective addresses as it goes.
//! 4. After the trace, the new-input generator walks the accumulated path
//!    constraints, negates each branch the trace did not take (guarded by
//!    the donelist so no path prefix is solved twice), and pushes every
//!    model the solver returns at the head of the worklist.
//! 5. The context is restored from the snapshot and the loop continues
//!    until the worklist drains. Every executed seed lands in the
//!    workspace's `corpus/`, every crashing seed in `crashes/`, and the
//!    accumulated coverage can be rendered as an IDA colouring script.
//!
//! The net exploration policy is depth-first with a breadth-first
//! bootstrap: trace-derived seeds are consumed before the initial one's
//! siblings.

#![warn(clippy::all, clippy::cargo, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)] // Allows for better API naming

pub mod artifacts;
pub mod backend;
pub mod constant;
pub mod coverage;
pub mod error;
pub mod explorer;
pub mod hooks;
pub mod seed;
pub mod stats;
pub mod watchdog;

// Re-exports to provide the library interface.
pub use explorer::{Config, Explorer};
pub use seed::Seed;
