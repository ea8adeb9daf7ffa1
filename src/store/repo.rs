use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::{Result, TrellisError};
use crate::store::files::{ContentStore, DIR_NAME};
use crate::store::index::Index;

/// An opened workspace: content store plus the config loaded once per
/// command. The index is deliberately not held here — callers load a fresh
/// snapshot per logical transaction via [`Repo::index`].
#[derive(Debug)]
pub struct Repo {
    pub store: ContentStore,
    pub config: Config,
}

impl Repo {
    pub fn open(repo_root: &Path) -> Result<Self> {
        let store = ContentStore::open(repo_root)?;
        let config = Config::load(store.root())?;
        Ok(Self { store, config })
    }

    pub fn index(&self) -> Result<Index> {
        Index::load(&self.store.index_path())
    }
}

/// Walk up from the current directory to find the .trellis root.
pub fn find_repo_root() -> Result<PathBuf> {
    let mut dir = std::env::current_dir().map_err(TrellisError::Io)?;
    loop {
        if dir.join(DIR_NAME).exists() {
            return Ok(dir);
        }
        if !dir.pop() {
            return Err(TrellisError::NotInitialized);
        }
    }
}
