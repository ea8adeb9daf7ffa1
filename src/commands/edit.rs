use std::path::Path;

use crate::commands::create::parse_field;
use crate::error::Result;
use crate::mutation;
use crate::output::{self, Format, TaskView};
use crate::store::repo::Repo;
use crate::task_id::TaskId;

pub fn run(
    repo_root: &Path,
    id: &TaskId,
    title: Option<String>,
    description: Option<String>,
    fields: Vec<String>,
    format: Format,
) -> Result<()> {
    let repo = Repo::open(repo_root)?;

    let record = mutation::update_task(&repo, id, |record| {
        if let Some(title) = title {
            record.title = title;
        }
        if let Some(description) = description {
            record.description = Some(description);
        }
        for raw in &fields {
            let (key, value) = parse_field(raw)?;
            record.set_field(&key, value)?;
        }
        Ok(())
    })?;

    let index = repo.index()?;
    let view = TaskView::new(id.clone(), record, index.get(id));
    output::print_task(&view, format)
}
