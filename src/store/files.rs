use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tempfile::NamedTempFile;

use crate::config::Config;
use crate::error::{Result, TrellisError};
use crate::model::ContentRecord;
use crate::task_id::TaskId;

pub const DIR_NAME: &str = ".trellis";

/// Content side of the dual store: one JSON record per task under
/// `.trellis/tasks/<id>.json`. Never holds status or dependency data.
#[derive(Debug)]
pub struct ContentStore {
    root: PathBuf,
}

impl ContentStore {
    /// Open an existing .trellis directory.
    pub fn open(repo_root: &Path) -> Result<Self> {
        let root = repo_root.join(DIR_NAME);
        if !root.join("config.json").exists() {
            return Err(TrellisError::NotInitialized);
        }
        Ok(Self { root })
    }

    /// Initialize a new .trellis directory with a default config and an
    /// empty index snapshot.
    pub fn init(repo_root: &Path) -> Result<Self> {
        let root = repo_root.join(DIR_NAME);
        if root.join("config.json").exists() {
            return Err(TrellisError::AlreadyInitialized);
        }

        fs::create_dir_all(root.join("tasks"))?;
        let config = serde_json::to_string_pretty(&Config::default())?;
        fs::write(root.join("config.json"), config)?;
        fs::write(root.join("index.json"), "{}")?;

        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn index_path(&self) -> PathBuf {
        self.root.join("index.json")
    }

    fn tasks_dir(&self) -> PathBuf {
        self.root.join("tasks")
    }

    fn task_path(&self, id: &TaskId) -> PathBuf {
        self.tasks_dir().join(format!("{id}.json"))
    }

    pub fn exists(&self, id: &TaskId) -> bool {
        self.task_path(id).exists()
    }

    pub fn read(&self, id: &TaskId) -> Result<ContentRecord> {
        let path = self.task_path(id);
        if !path.exists() {
            return Err(TrellisError::TaskNotFound(id.clone()));
        }
        let data = fs::read_to_string(path)?;
        let value: Value = serde_json::from_str(&data)
            .map_err(|e| TrellisError::MalformedContent(id.to_string(), e.to_string()))?;
        ContentRecord::from_value(id, value)
    }

    pub fn create(&self, id: &TaskId, record: &ContentRecord) -> Result<()> {
        if self.exists(id) {
            return Err(TrellisError::TaskExists(id.clone()));
        }
        record.validate()?;
        self.write_atomic(id, record)
    }

    /// Replace the record. The write goes to a temp file in the same
    /// directory and is renamed into place, so a crash mid-write leaves
    /// either the old or the new record, never a truncated one.
    pub fn update(&self, id: &TaskId, record: &ContentRecord) -> Result<()> {
        if !self.exists(id) {
            return Err(TrellisError::TaskNotFound(id.clone()));
        }
        record.validate()?;
        self.write_atomic(id, record)
    }

    pub fn delete(&self, id: &TaskId) -> Result<()> {
        let path = self.task_path(id);
        if !path.exists() {
            return Err(TrellisError::TaskNotFound(id.clone()));
        }
        fs::remove_file(path)?;
        Ok(())
    }

    fn write_atomic(&self, id: &TaskId, record: &ContentRecord) -> Result<()> {
        let json = serde_json::to_string_pretty(&record.to_value())?;
        let mut tmp = NamedTempFile::new_in(self.tasks_dir())?;
        tmp.write_all(json.as_bytes())?;
        tmp.persist(self.task_path(id))
            .map_err(|e| TrellisError::Io(e.error))?;
        Ok(())
    }

    /// All task IDs with a content record, in comparator order. An unreadable
    /// tasks directory is reported, not swallowed.
    pub fn list_ids(&self) -> Result<Vec<TaskId>> {
        let dir = self.tasks_dir();
        let entries = fs::read_dir(&dir)
            .map_err(|e| TrellisError::StorageAccess(dir.display().to_string(), e.to_string()))?;

        let mut ids = Vec::new();
        for entry in entries {
            let entry = entry
                .map_err(|e| TrellisError::StorageAccess(dir.display().to_string(), e.to_string()))?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if let Some(stem) = name.strip_suffix(".json")
                && let Ok(id) = stem.parse::<TaskId>()
            {
                ids.push(id);
            }
        }
        ids.sort();
        Ok(ids)
    }

    pub fn list(&self) -> Result<Vec<(TaskId, ContentRecord)>> {
        self.list_ids()?
            .into_iter()
            .map(|id| self.read(&id).map(|record| (id, record)))
            .collect()
    }
}
