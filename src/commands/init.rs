use std::path::Path;

use crate::error::Result;
use crate::store::files::ContentStore;

pub fn run(repo_root: &Path) -> Result<()> {
    ContentStore::init(repo_root)?;
    eprintln!("Initialized .trellis/ in {}", repo_root.display());
    Ok(())
}
