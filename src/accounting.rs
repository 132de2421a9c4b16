use serde::Serialize;

pub use crate::common::format::humanize;

/// Running total of space freed by independent cleanup steps.
///
/// Deltas are `before - after` directory sizes. Another process can grow a
/// cache between the two reads, so non-positive deltas are ignored rather
/// than subtracted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ByteAccounting {
    total: u64,
}

impl ByteAccounting {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a measured delta; returns the amount actually counted
    pub fn add(&mut self, delta: i64) -> u64 {
        if delta <= 0 {
            if delta < 0 {
                tracing::debug!(delta, "ignoring negative freed-space delta");
            }
            return 0;
        }
        let counted = delta as u64;
        self.total = self.total.saturating_add(counted);
        counted
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn humanized(&self) -> String {
        humanize(self.total)
    }
}

/// Freed bytes between two size readings, positive when space was reclaimed
pub fn freed_between(before: u64, after: u64) -> i64 {
    let before = i128::from(before);
    let after = i128::from(after);
    (before - after).clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64
}
