use std::path::Path;

use crate::error::Result;
use crate::mutation;
use crate::output::{self, Format, TaskView};
use crate::store::repo::Repo;
use crate::task_id::TaskId;

pub fn run(repo_root: &Path, id: &TaskId, to: &TaskId, format: Format) -> Result<()> {
    let repo = Repo::open(repo_root)?;
    let new_id = mutation::move_task(&repo, id, to)?;

    let record = repo.store.read(&new_id)?;
    let index = repo.index()?;
    let view = TaskView::new(new_id.clone(), record, index.get(&new_id));
    output::print_task(&view, format)
}
