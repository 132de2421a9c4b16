//! Point-in-time captures of external sets and their differences.
//!
//! The update plan captures the installed kernel packages before and after
//! upgrading; a changed set means the running kernel no longer matches what
//! is on disk and a reboot is worth offering.

use serde::Serialize;
use std::collections::BTreeSet;

use crate::common::errors::MaintenanceError;
use crate::system::System;

/// An identifier plus the sorted, distinct elements captured for it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedSet {
    id: String,
    elements: Vec<String>,
}

impl NamedSet {
    /// Build a set from raw elements, dropping duplicates and sorting
    pub fn new<I, S>(id: impl Into<String>, elements: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let unique: BTreeSet<String> = elements.into_iter().map(Into::into).collect();
        Self {
            id: id.into(),
            elements: unique.into_iter().collect(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn elements(&self) -> &[String] {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn contains(&self, element: &str) -> bool {
        self.elements
            .binary_search_by(|e| e.as_str().cmp(element))
            .is_ok()
    }
}

/// Membership difference between two captures
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiffResult {
    pub changed: bool,
    pub added: BTreeSet<String>,
    pub removed: BTreeSet<String>,
}

/// Compare two captures by membership only
pub fn diff(before: &NamedSet, after: &NamedSet) -> DiffResult {
    let before_set: BTreeSet<&String> = before.elements.iter().collect();
    let after_set: BTreeSet<&String> = after.elements.iter().collect();

    let added: BTreeSet<String> = after_set
        .difference(&before_set)
        .map(|s| (*s).clone())
        .collect();
    let removed: BTreeSet<String> = before_set
        .difference(&after_set)
        .map(|s| (*s).clone())
        .collect();

    DiffResult {
        changed: !added.is_empty() || !removed.is_empty(),
        added,
        removed,
    }
}

/// Captures named sets from a [`System`] and compares them
pub struct SnapshotDiffer<'a> {
    system: &'a dyn System,
}

impl std::fmt::Debug for SnapshotDiffer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotDiffer").finish_non_exhaustive()
    }
}

impl<'a> SnapshotDiffer<'a> {
    pub fn new(system: &'a dyn System) -> Self {
        Self { system }
    }

    /// Read the current state behind `id`. A failed query is an error,
    /// never an empty set.
    pub fn capture(&self, id: &str) -> Result<NamedSet, MaintenanceError> {
        let elements = self.system.query_named_set(id)?;
        let set = NamedSet::new(id, elements);
        tracing::debug!(id, count = set.len(), "captured snapshot");
        Ok(set)
    }

    pub fn diff(&self, before: &NamedSet, after: &NamedSet) -> DiffResult {
        diff(before, after)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_sorts_and_dedups() {
        let set = NamedSet::new("kernels", ["linux-lts", "linux", "linux-lts"]);
        assert_eq!(set.elements(), ["linux", "linux-lts"]);
        assert!(set.contains("linux"));
        assert!(!set.contains("linux-zen"));
    }

    #[test]
    fn test_same_elements_any_order_unchanged() {
        let a = NamedSet::new("kernels", ["linux", "linux-headers"]);
        let b = NamedSet::new("kernels", ["linux-headers", "linux"]);
        let result = diff(&a, &b);
        assert!(!result.changed);
        assert!(result.added.is_empty());
        assert!(result.removed.is_empty());
    }

    #[test]
    fn test_added_and_removed() {
        let before = NamedSet::new("kernels", ["linux", "linux-headers"]);
        let after = NamedSet::new("kernels", ["linux", "linux-headers", "linux-lts"]);

        let up = diff(&before, &after);
        assert!(up.changed);
        assert_eq!(up.added.iter().collect::<Vec<_>>(), ["linux-lts"]);
        assert!(up.removed.is_empty());

        let down = diff(&after, &before);
        assert!(down.changed);
        assert!(down.added.is_empty());
        assert_eq!(down.removed.iter().collect::<Vec<_>>(), ["linux-lts"]);
    }

    #[test]
    fn test_element_never_in_both() {
        let before = NamedSet::new("k", ["a", "b", "c"]);
        let after = NamedSet::new("k", ["b", "c", "d"]);
        let result = diff(&before, &after);
        assert!(result.added.is_disjoint(&result.removed));
        assert!(result.added.contains("d"));
        assert!(result.removed.contains("a"));
    }

    #[test]
    fn test_empty_sets_unchanged() {
        let a = NamedSet::new("k", Vec::<String>::new());
        assert!(!diff(&a, &a.clone()).changed);
    }
}
