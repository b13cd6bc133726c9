//! This module contains the definition of the [`Seed`] type: a concrete
//! byte assignment to symbolic variables that drives one trace.
//!
//! A seed is also the shape of a solver model, so models returned by the
//! back-end's solver are enqueued on the worklist directly.

use std::{
    collections::{btree_map, BTreeMap},
    fmt::{Display, Formatter},
};

use crate::backend::VariableId;

/// A concrete byte assignment to symbolic variables.
///
/// A seed is *complete* when it binds every symbolic variable of the
/// context it is injected into; variables a partial model leaves unbound
/// take the value `0x00` at injection time.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Seed {
    /// The bound values, keyed by variable identifier.
    bindings: BTreeMap<VariableId, u8>,
}

impl Seed {
    /// Creates a seed with no bindings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a seed binding each of the `variable_count` variables to
    /// zero.
    ///
    /// This is the bootstrap model synthesised when the solver reports that
    /// any assignment satisfies the initial path predicate.
    #[must_use]
    pub fn zeroed(variable_count: usize) -> Self {
        let bindings = (0..variable_count).map(|variable| (variable, 0x00)).collect();
        Self { bindings }
    }

    /// Binds `variable` to `value`, replacing any previous binding.
    pub fn bind(&mut self, variable: VariableId, value: u8) {
        self.bindings.insert(variable, value);
    }

    /// Gets the value bound to `variable`, if any.
    #[must_use]
    pub fn value(&self, variable: VariableId) -> Option<u8> {
        self.bindings.get(&variable).copied()
    }

    /// Gets the number of bound variables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Checks whether the seed binds no variables at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Iterates over the bindings in ascending variable order.
    pub fn bindings(&self) -> impl Iterator<Item = (VariableId, u8)> + '_ {
        self.bindings.iter().map(|(&variable, &value)| (variable, value))
    }

    /// Converts the seed to a dense byte vector indexed by variable
    /// identifier, with unbound entries as `0x00`.
    ///
    /// The vector is sized by `variable_count`, extended if the seed binds
    /// an identifier at or beyond it, so sparse identifiers from a back-end
    /// widen the buffer rather than being truncated.
    #[must_use]
    pub fn to_dense_bytes(&self, variable_count: usize) -> Vec<u8> {
        let bound = self
            .bindings
            .keys()
            .next_back()
            .map_or(variable_count, |&max_id| variable_count.max(max_id + 1));
        let mut bytes = vec![0x00; bound];
        for (&variable, &value) in &self.bindings {
            bytes[variable] = value;
        }

        bytes
    }
}

/// Displays the seed as the contiguous hex encoding of its dense bytes.
impl Display for Seed {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", hex::encode(self.to_dense_bytes(0)))
    }
}

/// Allow building a seed directly from binding pairs, the shape in which
/// solver models arrive.
impl FromIterator<(VariableId, u8)> for Seed {
    fn from_iter<I: IntoIterator<Item = (VariableId, u8)>>(iter: I) -> Self {
        let bindings = iter.into_iter().collect();
        Self { bindings }
    }
}

impl IntoIterator for Seed {
    type IntoIter = btree_map::IntoIter<VariableId, u8>;
    type Item = (VariableId, u8);

    fn into_iter(self) -> Self::IntoIter {
        self.bindings.into_iter()
    }
}
