//! Reconstruction of counters transmitted with fewer bits than their range.

use alloc::collections::BTreeMap;

use super::data::mask;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Counter {
    last: u64,
    base: u64,
}

/// Rollover state keyed by local message number and field number.
#[derive(Debug, Clone, Default)]
pub struct Accumulators {
    counters: BTreeMap<(u8, u8), Counter>,
}

impl Accumulators {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a truncated value of `bits` width into its running total.
    ///
    /// A value lower than the previous one for the same key counts as one
    /// rollover of the `bits`-wide counter.
    pub fn accumulate(&mut self, local: u8, field: u8, value: u64, bits: u32) -> u64 {
        if bits >= 64 {
            return value;
        }

        let value = value & mask(bits);

        let counter = self
            .counters
            .entry((local, field))
            .or_insert(Counter { last: value, base: 0 });

        if value < counter.last {
            counter.base += 1 << bits;
        }
        counter.last = value;

        counter.base + value
    }

    /// Forget all counters of a local message number.
    pub fn invalidate(&mut self, local: u8) {
        self.counters.retain(|(l, _), _| *l != local);
    }

    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }
}
