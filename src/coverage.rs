//! This module contains the instruction-coverage map accumulated across
//! every trace of an exploration run.

use std::collections::HashMap;

use itertools::Itertools;

use crate::constant::IDA_COVERAGE_COLOUR;

/// Per-address execution hit counts.
///
/// The map is monotonically non-decreasing: addresses are only ever added,
/// and counts only ever grow. The count of an address equals the number of
/// times it was fetched and processed across all traces.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Coverage {
    hits: HashMap<u64, usize>,
}

impl Coverage {
    /// Creates an empty coverage map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one execution of the instruction at `address`.
    pub fn record(&mut self, address: u64) {
        *self.hits.entry(address).or_insert(0) += 1;
    }

    /// Gets the number of times the instruction at `address` was executed.
    #[must_use]
    pub fn hit_count(&self, address: u64) -> usize {
        self.hits.get(&address).copied().unwrap_or(0)
    }

    /// Gets the number of distinct covered addresses.
    #[must_use]
    pub fn address_count(&self) -> usize {
        self.hits.len()
    }

    /// Gets the total number of instructions processed across all traces.
    #[must_use]
    pub fn total_hits(&self) -> usize {
        self.hits.values().sum()
    }

    /// Iterates over the covered addresses in ascending order.
    pub fn addresses(&self) -> impl Iterator<Item = u64> + '_ {
        self.hits.keys().copied().sorted()
    }

    /// Renders the coverage map as an IDA colouring script, one
    /// `idc.set_color` line per covered address in ascending order.
    #[must_use]
    pub fn ida_script(&self) -> String {
        let mut script = String::new();
        for address in self.addresses() {
            script.push_str(&format!(
                "idc.set_color({address:#x}, idc.CIC_ITEM, {IDA_COVERAGE_COLOUR:#08x})\n"
            ));
        }

        script
    }
}
