use std::path::Path;

use crate::error::{Result, TrellisError};
use crate::output::{self, Format};
use crate::store::repo::Repo;
use crate::task_id::TaskId;
use crate::tree;

pub fn run(repo_root: &Path, id: Option<TaskId>, format: Format) -> Result<()> {
    let repo = Repo::open(repo_root)?;
    let tasks = repo.store.list()?;
    let index = repo.index()?;

    if let Some(root_id) = id {
        let (node, warnings) = tree::build_subtree(&root_id, &tasks, &index)
            .ok_or(TrellisError::TaskNotFound(root_id))?;
        output::print_warnings(&warnings);
        match format {
            Format::Json => println!("{}", serde_json::to_string(&node)?),
            _ => output::print_tree_pretty(&node, "", true, true),
        }
    } else {
        let forest = tree::build_forest(&tasks, &index);
        output::print_warnings(&forest.warnings);
        match format {
            Format::Json => println!("{}", serde_json::to_string(&forest.roots)?),
            _ => {
                for node in &forest.roots {
                    output::print_tree_pretty(node, "", true, true);
                }
            }
        }
    }
    Ok(())
}
