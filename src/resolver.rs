use crate::error::Result;
use crate::store::repo::Repo;
use crate::task_id::TaskId;

/// Ready tasks plus any non-fatal observations made while resolving.
pub struct ReadySet {
    pub ready: Vec<TaskId>,
    pub warnings: Vec<String>,
}

/// Resolve the ready set: every task whose status is not done and whose
/// dependencies are all done, in comparator order. Index entries without a
/// content record are excluded with a warning — a degraded state for the
/// `check` command, never a failure here.
pub fn next_ready(repo: &Repo) -> Result<ReadySet> {
    let index = repo.index()?;
    let done = repo.config.done_set();

    let mut ready = Vec::new();
    let mut warnings = Vec::new();
    for id in index.next_tasks(&done) {
        if repo.store.exists(&id) {
            ready.push(id);
        } else {
            warnings.push(format!(
                "index entry {id} has no content record; excluded (run `trellis check`)"
            ));
        }
    }

    Ok(ReadySet { ready, warnings })
}
