use std::path::Path;

use crate::error::Result;
use crate::output::{self, Format, TaskView};
use crate::resolver;
use crate::store::repo::Repo;

pub fn run(repo_root: &Path, all: bool, format: Format) -> Result<()> {
    let repo = Repo::open(repo_root)?;
    let resolved = resolver::next_ready(&repo)?;
    output::print_warnings(&resolved.warnings);

    let index = repo.index()?;
    let mut views = Vec::new();
    for id in resolved.ready {
        let record = repo.store.read(&id)?;
        views.push(TaskView::new(id.clone(), record, index.get(&id)));
        if !all {
            break;
        }
    }

    if views.is_empty() {
        match format {
            Format::Json => println!("null"),
            _ => println!("No ready tasks"),
        }
        return Ok(());
    }

    if all {
        output::print_tasks(&views, format)
    } else {
        output::print_task(&views[0], format)
    }
}
