//! Change set between a source and a target snapshot

use serde::{Deserialize, Serialize};

use dirsync_fs::SyncPath;

use crate::snapshot::Snapshot;

/// Classification of every path in two snapshots.
///
/// The three lists are disjoint and sorted. A path present on both sides
/// with an equal or newer target timestamp is unchanged and appears in none
/// of them: the target is never downgraded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    /// In source, not in target
    pub added: Vec<SyncPath>,
    /// In both, source strictly newer
    pub updated: Vec<SyncPath>,
    /// In target, not in source
    pub removed: Vec<SyncPath>,
}

/// Sizes of the three change lists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeCounts {
    pub added: usize,
    pub updated: usize,
    pub removed: usize,
}

impl ChangeSet {
    /// Diff `source` against `target`.
    pub fn between(source: &Snapshot, target: &Snapshot) -> Self {
        if source == target {
            return Self::default();
        }

        let mut added = Vec::new();
        let mut updated = Vec::new();
        for (path, modified) in source.iter() {
            match target.get(path) {
                None => added.push(path.clone()),
                Some(existing) if modified > existing => updated.push(path.clone()),
                Some(_) => {}
            }
        }

        let removed = target
            .paths()
            .filter(|path| !source.contains(path))
            .cloned()
            .collect();

        Self {
            added,
            updated,
            removed,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }

    /// Total number of changed paths.
    pub fn len(&self) -> usize {
        self.added.len() + self.updated.len() + self.removed.len()
    }

    /// Added and updated paths as the single list the copy phase consumes.
    pub fn to_copy(&self) -> Vec<SyncPath> {
        self.added.iter().chain(&self.updated).cloned().collect()
    }

    pub fn counts(&self) -> ChangeCounts {
        ChangeCounts {
            added: self.added.len(),
            updated: self.updated.len(),
            removed: self.removed.len(),
        }
    }
}

impl std::ops::AddAssign for ChangeCounts {
    fn add_assign(&mut self, other: Self) {
        self.added += other.added;
        self.updated += other.updated;
        self.removed += other.removed;
    }
}
