use std::path::Path;

use serde_json::json;

use crate::error::Result;
use crate::mutation;
use crate::output::Format;
use crate::store::repo::Repo;
use crate::task_id::TaskId;

pub fn run(repo_root: &Path, id: &TaskId, recursive: bool, format: Format) -> Result<()> {
    let repo = Repo::open(repo_root)?;
    let deleted = mutation::delete_task(&repo, id, recursive)?;

    match format {
        Format::Json => println!("{}", json!({ "deleted": deleted })),
        _ => {
            for removed in &deleted {
                println!("deleted {removed}");
            }
        }
    }
    Ok(())
}
