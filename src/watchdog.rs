//! This module contains the type definitions necessary to support the
//! monitoring functionality for the exploration engine.
//!
//! # Best-Effort Monitoring
//!
//! The monitoring provided by the watchdog is a best-effort approach. The
//! engine polls it between traces and on an iteration cadence inside the
//! trace loop, but a solver query that is already in flight can only be
//! bounded by its own timeout. If a hard stop is required, the embedding
//! host should combine a watchdog with a short
//! [`crate::explorer::Config::solver_timeout`].

use std::{
    fmt::Debug,
    rc::Rc,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Instant,
};

use crate::constant::DEFAULT_WATCHDOG_POLL_LOOP_ITERATIONS;

/// A dynamically dispatched [`Watchdog`] instance.
pub type DynWatchdog = Rc<dyn Watchdog>;

/// The interface to an object that can be polled to see if the exploration
/// needs to abort.
///
/// The interface is simple, but it can encapsulate arbitrary logic as far
/// as the engine is concerned, allowing the host to implement complex stop
/// conditions.
pub trait Watchdog
where
    Self: Debug,
{
    /// Checks if the engine should halt exploration and return an error.
    #[must_use]
    fn should_stop(&self) -> bool;

    /// Gets the number of trace-loop iterations the engine should wait
    /// between polls.
    #[must_use]
    fn poll_every(&self) -> usize;
}

/// The budget an exploration run operates under: an optional wall-clock
/// deadline and an optional externally-set stop signal, either of which
/// ends the run.
///
/// A run whose cost is dominated by solver queries of unpredictable
/// duration is most naturally bounded by time, so the deadline is the
/// condition hosts reach for first; the signal exists for cooperative
/// shutdown from another thread or a signal handler. With neither
/// condition attached the budget is unbounded and the run only ends when
/// the worklist drains, which is the engine's default.
#[derive(Clone, Debug)]
pub struct RunBudget {
    /// The instant after which the run should stop, if any.
    deadline: Option<Instant>,

    /// The flag that ends the run when set externally, if any.
    signal: Option<Arc<AtomicBool>>,

    /// The number of trace-loop iterations between polls.
    poll_loop_iterations: usize,
}

impl RunBudget {
    /// Creates a budget with no stop conditions attached.
    #[must_use]
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Attaches a wall-clock deadline after which the run stops.
    #[must_use]
    pub fn expiring_at(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Attaches a stop signal; setting the flag externally ends the run.
    #[must_use]
    pub fn stopped_by(mut self, signal: Arc<AtomicBool>) -> Self {
        self.signal = Some(signal);
        self
    }

    /// Specifies the number of trace-loop iterations that the engine should
    /// wait between polls.
    #[must_use]
    pub fn polling_every(mut self, iterations: usize) -> Self {
        self.poll_loop_iterations = iterations;
        self
    }

    /// Wraps the budget into an [`Rc`].
    #[must_use]
    pub fn in_rc(self) -> Rc<dyn Watchdog> {
        Rc::new(self)
    }

    /// Checks whether any stop condition is attached at all.
    fn is_unbounded(&self) -> bool {
        self.deadline.is_none() && self.signal.is_none()
    }
}

/// The default budget is unbounded.
impl Default for RunBudget {
    fn default() -> Self {
        let deadline = None;
        let signal = None;
        let poll_loop_iterations = DEFAULT_WATCHDOG_POLL_LOOP_ITERATIONS;
        Self {
            deadline,
            signal,
            poll_loop_iterations,
        }
    }
}

impl Watchdog for RunBudget {
    fn should_stop(&self) -> bool {
        let expired = self
            .deadline
            .is_some_and(|deadline| Instant::now() >= deadline);
        let signalled = self
            .signal
            .as_ref()
            .is_some_and(|signal| signal.load(Ordering::Relaxed));

        expired || signalled
    }

    fn poll_every(&self) -> usize {
        if self.is_unbounded() {
            // Nothing can ever trip, so the trace loop need not pay for
            // the poll.
            usize::MAX
        } else {
            self.poll_loop_iterations
        }
    }
}

#[cfg(test)]
mod test {
    use std::{
        sync::{
            atomic::{AtomicBool, Ordering},
            Arc,
        },
        time::{Duration, Instant},
    };

    use crate::watchdog::{RunBudget, Watchdog};

    #[test]
    fn an_unbounded_budget_never_stops() {
        let budget = RunBudget::unbounded();

        assert!(!budget.should_stop());
        assert_eq!(budget.poll_every(), usize::MAX);
    }

    #[test]
    fn the_stop_signal_ends_the_run_when_set() {
        let flag = Arc::new(AtomicBool::new(false));
        let budget = RunBudget::unbounded().stopped_by(flag.clone()).polling_every(1);

        assert!(!budget.should_stop());
        flag.store(true, Ordering::Relaxed);
        assert!(budget.should_stop());
        assert_eq!(budget.poll_every(), 1);
    }

    #[test]
    fn the_deadline_ends_the_run_once_passed() {
        let expired = RunBudget::unbounded().expiring_at(Instant::now() - Duration::from_secs(1));
        let pending =
            RunBudget::unbounded().expiring_at(Instant::now() + Duration::from_secs(3600));

        assert!(expired.should_stop());
        assert!(!pending.should_stop());
    }

    #[test]
    fn either_condition_is_sufficient() {
        let flag = Arc::new(AtomicBool::new(false));
        let budget = RunBudget::unbounded()
            .expiring_at(Instant::now() - Duration::from_secs(1))
            .stopped_by(flag);

        assert!(budget.should_stop());
    }
}
