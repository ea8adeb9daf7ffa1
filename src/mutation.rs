//! Cross-store mutation protocol.
//!
//! There is no transaction primitive spanning the content store and the
//! index, so every mutating operation runs as a fixed sequence of forward
//! steps with a compensating step registered for each one that succeeds.
//! When a later step fails, the registered compensations run in reverse
//! order. A compensation that itself fails is reported on stderr and chained
//! onto the original error — it never masks it, and the `check` command is
//! the escape hatch for the inconsistency it leaves behind.

use std::collections::BTreeSet;

use crate::error::{Result, TrellisError};
use crate::model::{ContentRecord, IndexEntry};
use crate::store::index::Index;
use crate::store::repo::Repo;
use crate::task_id::{self, TaskId};

/// Ordered list of compensations for the forward steps that have succeeded
/// so far. Dropping a saga after all steps succeed discards them.
pub(crate) struct Saga<'a> {
    undo: Vec<Box<dyn FnOnce() -> Result<()> + 'a>>,
}

impl<'a> Saga<'a> {
    pub fn new() -> Self {
        Self { undo: Vec::new() }
    }

    /// Run a forward step; its compensation is registered only on success.
    /// On failure, every previously registered compensation runs in reverse.
    pub fn step<T>(
        &mut self,
        forward: impl FnOnce() -> Result<T>,
        compensate: impl FnOnce() -> Result<()> + 'a,
    ) -> Result<T> {
        match forward() {
            Ok(value) => {
                self.undo.push(Box::new(compensate));
                Ok(value)
            }
            Err(original) => Err(self.unwind(original)),
        }
    }

    /// Run the last forward step; no compensation of its own, but a failure
    /// still unwinds everything before it.
    pub fn finish<T>(mut self, forward: impl FnOnce() -> Result<T>) -> Result<T> {
        match forward() {
            Ok(value) => Ok(value),
            Err(original) => Err(self.unwind(original)),
        }
    }

    fn unwind(&mut self, original: TrellisError) -> TrellisError {
        let mut rollback_failure: Option<TrellisError> = None;
        for compensate in self.undo.drain(..).rev() {
            if let Err(e) = compensate() {
                eprintln!("warning: rollback step failed: {e}");
                rollback_failure.get_or_insert(e);
            }
        }
        match rollback_failure {
            None => original,
            Some(rollback) => TrellisError::RollbackFailed {
                original: Box::new(original),
                rollback: Box::new(rollback),
            },
        }
    }
}

fn current_entry(repo: &Repo, id: &TaskId) -> Result<IndexEntry> {
    Ok(repo
        .index()?
        .get(id)
        .cloned()
        .unwrap_or_else(|| IndexEntry::new(repo.config.default_status.clone())))
}

fn require_exists(repo: &Repo, id: &TaskId) -> Result<()> {
    if repo.store.exists(id) {
        Ok(())
    } else {
        Err(TrellisError::TaskNotFound(id.clone()))
    }
}

fn join_ids(ids: &[TaskId]) -> String {
    ids.iter()
        .map(TaskId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Create: mint an ID, write the content record, then the index entry.
/// If the index write fails, the just-created record is deleted again.
pub fn create_task(
    repo: &Repo,
    parent: Option<&TaskId>,
    record: ContentRecord,
    status: Option<String>,
    dependencies: BTreeSet<TaskId>,
) -> Result<TaskId> {
    record.validate()?;
    for dep in &dependencies {
        require_exists(repo, dep)?;
    }

    let ids = repo.store.list_ids()?;
    let id = match parent {
        Some(p) => {
            require_exists(repo, p)?;
            task_id::next_child(p, &ids)?
        }
        None => task_id::next_root(&ids)?,
    };

    let entry = IndexEntry {
        status: status.unwrap_or_else(|| repo.config.default_status.clone()),
        dependencies,
    };

    let store = &repo.store;
    let undo_id = id.clone();
    let mut saga = Saga::new();
    saga.step(|| store.create(&id, &record), move || store.delete(&undo_id))?;
    saga.finish(|| {
        let mut index = repo.index()?;
        index.update(&id, entry, &repo.config)
    })?;
    Ok(id)
}

/// Shared update path: replace the content record, then rewrite the index
/// entry. Rolling back restores the previous content byte-for-byte.
fn replace(repo: &Repo, id: &TaskId, record: &ContentRecord, entry: IndexEntry) -> Result<()> {
    record.validate()?;
    let previous = repo.store.read(id)?;

    let store = &repo.store;
    let mut saga = Saga::new();
    saga.step(
        || store.update(id, record),
        move || store.update(id, &previous),
    )?;
    saga.finish(|| {
        let mut index = repo.index()?;
        index.update(id, entry, &repo.config)
    })
}

/// Edit content fields through `apply`, keeping the index entry unchanged.
pub fn update_task(
    repo: &Repo,
    id: &TaskId,
    apply: impl FnOnce(&mut ContentRecord) -> Result<()>,
) -> Result<ContentRecord> {
    let mut record = repo.store.read(id)?;
    apply(&mut record)?;
    record.touch();
    let entry = current_entry(repo, id)?;
    replace(repo, id, &record, entry)?;
    Ok(record)
}

pub fn append_description(repo: &Repo, id: &TaskId, text: &str) -> Result<ContentRecord> {
    update_task(repo, id, |record| {
        record.append_description(text);
        Ok(())
    })
}

pub fn set_status(repo: &Repo, id: &TaskId, status: String) -> Result<IndexEntry> {
    let mut record = repo.store.read(id)?;
    record.touch();
    let mut entry = current_entry(repo, id)?;
    entry.status = status;
    replace(repo, id, &record, entry.clone())?;
    Ok(entry)
}

pub fn add_dependencies(repo: &Repo, id: &TaskId, deps: Vec<TaskId>) -> Result<IndexEntry> {
    for dep in &deps {
        require_exists(repo, dep)?;
    }
    let mut record = repo.store.read(id)?;
    record.touch();
    let mut entry = current_entry(repo, id)?;
    entry.dependencies.extend(deps);
    replace(repo, id, &record, entry.clone())?;
    Ok(entry)
}

pub fn remove_dependencies(repo: &Repo, id: &TaskId, deps: &[TaskId]) -> Result<IndexEntry> {
    let mut record = repo.store.read(id)?;
    record.touch();
    let mut entry = current_entry(repo, id)?;
    for dep in deps {
        entry.dependencies.remove(dep);
    }
    replace(repo, id, &record, entry.clone())?;
    Ok(entry)
}

/// Delete: content first, index second; the saved content is restored if the
/// index removal fails. Tasks with direct children are refused unless
/// `recursive`, in which case each child subtree goes first — child
/// deletions are independent of each other, not one transaction.
pub fn delete_task(repo: &Repo, id: &TaskId, recursive: bool) -> Result<Vec<TaskId>> {
    require_exists(repo, id)?;

    let ids = repo.store.list_ids()?;
    let children = task_id::direct_children_of(id, &ids);
    if !children.is_empty() && !recursive {
        return Err(TrellisError::HasChildren(id.clone(), join_ids(&children)));
    }

    let mut deleted = Vec::new();
    for child in &children {
        deleted.extend(delete_task(repo, child, true)?);
    }

    let saved = repo.store.read(id)?;
    let store = &repo.store;
    let mut saga = Saga::new();
    saga.step(|| store.delete(id), move || store.create(id, &saved))?;
    saga.finish(|| {
        let mut index = repo.index()?;
        index.remove(id)
    })?;

    deleted.push(id.clone());
    Ok(deleted)
}

/// Re-parent a task under a top-level target by minting a new ID and
/// retiring the old one. Moving to the current parent is a no-op reported as
/// success; neither store is touched.
pub fn move_task(repo: &Repo, id: &TaskId, target: &TaskId) -> Result<TaskId> {
    require_exists(repo, id)?;
    require_exists(repo, target)?;
    if id == target {
        return Err(TrellisError::SelfParent(id.clone()));
    }
    if target.depth() != 1 {
        return Err(TrellisError::NotTopLevel(target.clone()));
    }

    let ids = repo.store.list_ids()?;
    let children = task_id::direct_children_of(id, &ids);
    if !children.is_empty() {
        return Err(TrellisError::MoveSubtree(id.clone(), join_ids(&children)));
    }

    if id.parent().as_ref() == Some(target) {
        return Ok(id.clone());
    }

    let new_id = task_id::next_child(target, &ids)?;
    let content = repo.store.read(id)?;
    let entry = current_entry(repo, id)?;

    let store = &repo.store;
    let index_path = repo.store.index_path();
    let mut saga = Saga::new();

    // New identity first: content, then index entry.
    let undo_new = new_id.clone();
    saga.step(
        || store.create(&new_id, &content),
        move || store.delete(&undo_new),
    )?;

    let undo_new = new_id.clone();
    let undo_path = index_path.clone();
    saga.step(
        || {
            let mut index = Index::load(&index_path)?;
            index.update(&new_id, entry, &repo.config)
        },
        move || {
            let mut index = Index::load(&undo_path)?;
            index.remove(&undo_new)
        },
    )?;

    // Retire the old identity: content, then index entry. If the final index
    // removal fails, the compensations above restore the old content and
    // clear the half-minted new identity.
    let restore = content.clone();
    saga.step(|| store.delete(id), move || store.create(id, &restore))?;

    saga.finish(|| {
        let mut index = Index::load(&repo.store.index_path())?;
        index.remove(id)
    })?;

    Ok(new_id)
}
