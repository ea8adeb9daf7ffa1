use std::path::Path;

use crate::error::{Result, TrellisError};
use crate::output::{self, Format, TaskView};
use crate::resolver;
use crate::store::repo::Repo;

pub fn run(
    repo_root: &Path,
    status: Option<String>,
    ready: bool,
    format: Format,
) -> Result<()> {
    let repo = Repo::open(repo_root)?;
    if let Some(filter) = &status
        && !repo.config.is_known_status(filter)
    {
        return Err(TrellisError::UnknownStatus(
            filter.clone(),
            repo.config.statuses_csv(),
        ));
    }

    let index = repo.index()?;
    let ready_set = if ready {
        let resolved = resolver::next_ready(&repo)?;
        output::print_warnings(&resolved.warnings);
        Some(resolved.ready)
    } else {
        None
    };

    let views: Vec<TaskView> = repo
        .store
        .list()?
        .into_iter()
        .filter(|(id, _)| ready_set.as_ref().is_none_or(|set| set.contains(id)))
        .filter(|(id, _)| {
            status.as_deref().is_none_or(|filter| {
                index.get(id).is_some_and(|entry| entry.status == filter)
            })
        })
        .map(|(id, record)| {
            let entry = index.get(&id);
            TaskView::new(id.clone(), record, entry)
        })
        .collect();

    output::print_tasks(&views, format)
}
