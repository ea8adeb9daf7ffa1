use std::path::Path;

use crate::error::Result;
use crate::mutation;
use crate::output::{self, Format, TaskView};
use crate::store::repo::Repo;
use crate::task_id::TaskId;

pub fn depend(repo_root: &Path, id: &TaskId, on: Vec<TaskId>, format: Format) -> Result<()> {
    let repo = Repo::open(repo_root)?;
    let entry = mutation::add_dependencies(&repo, id, on)?;
    let record = repo.store.read(id)?;
    let view = TaskView::new(id.clone(), record, Some(&entry));
    output::print_task(&view, format)
}

pub fn undepend(repo_root: &Path, id: &TaskId, on: Vec<TaskId>, format: Format) -> Result<()> {
    let repo = Repo::open(repo_root)?;
    let entry = mutation::remove_dependencies(&repo, id, &on)?;
    let record = repo.store.read(id)?;
    let view = TaskView::new(id.clone(), record, Some(&entry));
    output::print_task(&view, format)
}
