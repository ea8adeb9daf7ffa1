use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::config::Config;
use crate::error::{Result, TrellisError};
use crate::model::IndexEntry;
use crate::task_id::TaskId;

/// The status/dependency side-index: one whole-snapshot JSON file mapping
/// TaskId to entry. The snapshot is a value type — load it fresh per logical
/// transaction rather than holding a long-lived copy, so compensations never
/// act on stale reads. Every mutation persists the full snapshot atomically.
pub struct Index {
    path: PathBuf,
    entries: BTreeMap<TaskId, IndexEntry>,
}

impl Index {
    /// Load the full snapshot; never partial. A missing file (pre-init or
    /// externally removed) reads as an empty snapshot.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self {
                path: path.to_path_buf(),
                entries: BTreeMap::new(),
            });
        }
        let data = fs::read_to_string(path)?;
        let entries = serde_json::from_str(&data)
            .map_err(|e| TrellisError::MalformedContent("index".to_string(), e.to_string()))?;
        Ok(Self {
            path: path.to_path_buf(),
            entries,
        })
    }

    pub fn get(&self, id: &TaskId) -> Option<&IndexEntry> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &TaskId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn entries(&self) -> &BTreeMap<TaskId, IndexEntry> {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert or replace the entry for `id` and persist the snapshot.
    ///
    /// Rejected with a validation error when the status is outside the
    /// configured vocabulary, the entry depends on itself, or any new
    /// dependency can already reach `id` through the existing graph
    /// (depth-first reachability).
    pub fn update(&mut self, id: &TaskId, entry: IndexEntry, config: &Config) -> Result<()> {
        if !config.is_known_status(&entry.status) {
            return Err(TrellisError::UnknownStatus(
                entry.status.clone(),
                config.statuses_csv(),
            ));
        }
        if entry.dependencies.contains(id) {
            return Err(TrellisError::SelfDependency(id.clone()));
        }
        for dep in &entry.dependencies {
            let mut visited = HashSet::new();
            if self.reaches(dep, id, &mut visited) {
                return Err(TrellisError::CycleDetected(id.clone()));
            }
        }

        self.entries.insert(id.clone(), entry);
        self.save()
    }

    /// Remove the entry if present. Removing a missing entry is not an error;
    /// rollback paths call this defensively.
    pub fn remove(&mut self, id: &TaskId) -> Result<()> {
        if self.entries.remove(id).is_some() {
            self.save()?;
        }
        Ok(())
    }

    /// Every ready task, in comparator order. Ready: status not in
    /// `done`, and every dependency's status in `done`. A dependency on an
    /// unknown ID counts as unmet.
    pub fn next_tasks(&self, done: &BTreeSet<String>) -> Vec<TaskId> {
        self.entries
            .iter()
            .filter(|(_, entry)| !done.contains(&entry.status))
            .filter(|(_, entry)| {
                entry.dependencies.iter().all(|dep| {
                    self.entries
                        .get(dep)
                        .is_some_and(|dep_entry| done.contains(&dep_entry.status))
                })
            })
            .map(|(id, _)| id.clone())
            .collect()
    }

    fn reaches(&self, from: &TaskId, target: &TaskId, visited: &mut HashSet<TaskId>) -> bool {
        if from == target {
            return true;
        }
        if !visited.insert(from.clone()) {
            return false;
        }
        self.entries.get(from).is_some_and(|entry| {
            entry
                .dependencies
                .iter()
                .any(|next| self.reaches(next, target, visited))
        })
    }

    /// Persist the whole snapshot via temp-file-then-rename; a crash leaves
    /// either the old or the new snapshot, never a mix.
    fn save(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.entries)?;
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(json.as_bytes())?;
        tmp.persist(&self.path)
            .map_err(|e| TrellisError::Io(e.error))?;
        Ok(())
    }
}
