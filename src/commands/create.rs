use std::collections::BTreeSet;
use std::path::Path;

use crate::error::{Result, TrellisError};
use crate::model::ContentRecord;
use crate::mutation;
use crate::output::{self, Format, TaskView};
use crate::store::repo::Repo;
use crate::task_id::TaskId;

/// Split a `key=value` argument; a missing `=` is a validation error.
pub fn parse_field(raw: &str) -> Result<(String, String)> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(TrellisError::InvalidField(raw.to_string())),
    }
}

#[allow(clippy::too_many_arguments)]
pub fn run(
    repo_root: &Path,
    title: String,
    description: Option<String>,
    parent: Option<TaskId>,
    depends_on: Vec<TaskId>,
    fields: Vec<String>,
    status: Option<String>,
    format: Format,
) -> Result<()> {
    let repo = Repo::open(repo_root)?;

    let mut record = ContentRecord::new(title, description);
    for raw in &fields {
        let (key, value) = parse_field(raw)?;
        record.set_field(&key, value)?;
    }

    let dependencies: BTreeSet<TaskId> = depends_on.into_iter().collect();
    let id = mutation::create_task(&repo, parent.as_ref(), record, status, dependencies)?;

    let record = repo.store.read(&id)?;
    let index = repo.index()?;
    let view = TaskView::new(id.clone(), record, index.get(&id));
    output::print_task(&view, format)
}
