use std::path::Path;

use crate::error::Result;
use crate::mutation;
use crate::output::{self, Format, TaskView};
use crate::store::repo::Repo;
use crate::task_id::TaskId;

pub fn run(repo_root: &Path, id: &TaskId, status: String, format: Format) -> Result<()> {
    let repo = Repo::open(repo_root)?;
    let entry = mutation::set_status(&repo, id, status)?;
    let record = repo.store.read(id)?;
    let view = TaskView::new(id.clone(), record, Some(&entry));
    output::print_task(&view, format)
}
