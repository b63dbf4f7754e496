//! Full-replace-by-diff reconciliation of a parent's child collection.
//!
//! The caller submits the complete desired list of children. Every entry is
//! classified against the ids currently stored for the parent:
//!
//! * entry with a known `id` → update, or delete when flagged `deleted` or blank
//! * entry without an `id` → create, or skip when flagged `deleted` or blank
//! * stored id missing from the submission → delete
//!
//! Planning is pure; the caller applies the plan inside its own transaction.

use std::collections::{BTreeSet, HashSet};

/// A submitted child row.
pub trait ChildEntry {
    /// Id of an existing child, `None` for a new one.
    fn id(&self) -> Option<i32>;

    /// Explicit removal flag.
    fn is_deleted(&self) -> bool {
        false
    }

    /// `true` when the entry carries no meaningful data (an empty form row).
    fn is_blank(&self) -> bool;
}

#[derive(Debug, PartialEq, Eq)]
pub struct SyncPlan<'a, T> {
    pub create: Vec<&'a T>,
    pub update: Vec<(i32, &'a T)>,
    /// Ascending.
    pub delete: Vec<i32>,
}

impl<T> SyncPlan<'_, T> {
    pub fn is_noop(&self) -> bool {
        self.create.is_empty() && self.update.is_empty() && self.delete.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ReconcileError {
    #[error("id {0} does not belong to this record")]
    UnknownId(i32),
    #[error("id {0} is listed more than once")]
    DuplicateId(i32),
}

/// Classify `submitted` against the `existing` child ids.
pub fn plan<'a, T: ChildEntry>(
    existing: &[i32],
    submitted: &'a [T],
) -> Result<SyncPlan<'a, T>, ReconcileError> {
    let existing_set: HashSet<i32> = existing.iter().copied().collect();
    let mut seen = HashSet::new();
    let mut delete = BTreeSet::new();
    let mut create = Vec::new();
    let mut update = Vec::new();

    for entry in submitted {
        let drop_entry = entry.is_deleted() || entry.is_blank();
        match entry.id() {
            Some(id) => {
                if !existing_set.contains(&id) {
                    return Err(ReconcileError::UnknownId(id));
                }
                if !seen.insert(id) {
                    return Err(ReconcileError::DuplicateId(id));
                }
                if drop_entry {
                    delete.insert(id);
                } else {
                    update.push((id, entry));
                }
            }
            None if drop_entry => {}
            None => create.push(entry),
        }
    }

    delete.extend(existing.iter().copied().filter(|id| !seen.contains(id)));

    Ok(SyncPlan {
        create,
        update,
        delete: delete.into_iter().collect(),
    })
}
