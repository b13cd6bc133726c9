//! This module contains the instruction-hook machinery: host-supplied
//! routines that stand in for the instruction at a given address, or for
//! the whole library function starting there.
//!
//! Hooks are consulted before fetch, so a hook entirely replaces the hooked
//! instruction when it returns [`HookAction::Continue`], and stands in for
//! a full function when it returns [`HookAction::PltContinue`] (after which
//! the engine synthesises a return to unwind one frame).

use std::{collections::BTreeMap, rc::Rc};

use derivative::Derivative;

/// What the trace runner should do after a hook has run.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum HookAction {
    /// Skip fetch/execute for the hooked address and continue the trace.
    Continue,

    /// Terminate the trace normally.
    Break,

    /// The hook stood in for a full library function; synthesise and
    /// process a return instruction, then continue the trace.
    PltContinue,
}

/// The callable part of a hook.
///
/// The hook may read and write any back-end state through the context it
/// is given, but must not retain the borrow beyond the call.
pub type HookFn<C> = dyn Fn(&mut C) -> HookAction;

/// A named, first-class hook routine.
///
/// Hooks compare equal by name, which is what makes deduplication and
/// last-registration-wins behaviour observable to the host.
#[derive(Derivative)]
#[derivative(Clone(bound = ""), Debug(bound = ""), PartialEq(bound = ""))]
pub struct Hook<C> {
    /// The name the hook registered under, used for equality and display.
    name: String,

    /// The hook routine itself.
    #[derivative(Debug = "ignore", PartialEq = "ignore")]
    callback: Rc<HookFn<C>>,
}

impl<C> Hook<C> {
    /// Constructs a new hook called `name` wrapping `callback`.
    pub fn new(name: impl Into<String>, callback: impl Fn(&mut C) -> HookAction + 'static) -> Self {
        let name = name.into();
        let callback = Rc::new(callback);
        Self { name, callback }
    }

    /// Gets the name of the hook.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Runs the hook against the provided context.
    pub fn invoke(&self, context: &mut C) -> HookAction {
        (self.callback)(context)
    }
}

/// The mapping from instruction address to the hook that replaces it.
#[derive(Derivative)]
#[derivative(Clone(bound = ""), Debug(bound = ""), Default(bound = ""))]
pub struct HookRegistry<C> {
    hooks: BTreeMap<u64, Hook<C>>,
}

impl<C> HookRegistry<C> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            hooks: BTreeMap::new(),
        }
    }

    /// Registers `hook` at `address`. Registration is additive across
    /// addresses; at a single address the last registration wins.
    pub fn register(&mut self, address: u64, hook: Hook<C>) {
        self.hooks.insert(address, hook);
    }

    /// Gets the hook registered at `address`, if any.
    #[must_use]
    pub fn lookup(&self, address: u64) -> Option<&Hook<C>> {
        self.hooks.get(&address)
    }

    /// Gets the number of hooked addresses.
    #[must_use]
    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    /// Checks whether no hooks are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}
