use std::path::Path;

use crate::error::Result;
use crate::mutation;
use crate::output::{self, Format, TaskView};
use crate::store::repo::Repo;
use crate::task_id::TaskId;

pub fn run(repo_root: &Path, id: &TaskId, text: &str, format: Format) -> Result<()> {
    let repo = Repo::open(repo_root)?;
    let record = mutation::append_description(&repo, id, text)?;
    let index = repo.index()?;
    let view = TaskView::new(id.clone(), record, index.get(id));
    output::print_task(&view, format)
}
