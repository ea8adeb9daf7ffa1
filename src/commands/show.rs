use std::path::Path;

use crate::error::Result;
use crate::output::{self, Format, TaskView};
use crate::store::repo::Repo;
use crate::task_id::TaskId;

pub fn run(repo_root: &Path, id: &TaskId, format: Format) -> Result<()> {
    let repo = Repo::open(repo_root)?;
    let record = repo.store.read(id)?;
    let index = repo.index()?;
    if index.get(id).is_none() {
        eprintln!("warning: task {id} has no index entry; status unknown (run `trellis check`)");
    }
    let view = TaskView::new(id.clone(), record, index.get(id));
    output::print_task(&view, format)
}
