use std::collections::BTreeSet;
use std::path::Path;

use serde::Serialize;

use crate::error::Result;
use crate::model::IndexEntry;
use crate::output::Format;
use crate::store::repo::Repo;
use crate::task_id::TaskId;

/// Reconciliation report for the two stores. Findings are observations, not
/// errors; `check` exits successfully whether or not it found anything.
#[derive(Debug, Default, Serialize)]
pub struct Report {
    /// Content records with no index entry.
    pub missing_entries: Vec<TaskId>,
    /// Index entries whose content record is gone.
    pub dangling_entries: Vec<TaskId>,
    /// (task, dependency) pairs where the dependency has no index entry.
    pub dangling_dependencies: Vec<(TaskId, TaskId)>,
    pub fixed: bool,
}

impl Report {
    pub fn is_clean(&self) -> bool {
        self.missing_entries.is_empty()
            && self.dangling_entries.is_empty()
            && self.dangling_dependencies.is_empty()
    }
}

/// Compare the content store against the index and report every disagreement.
/// With `fix`, missing entries are inserted with the default status and
/// dangling entries are dropped; dangling dependencies are only reported,
/// since removing them silently would change readiness.
pub fn reconcile(repo: &Repo, fix: bool) -> Result<Report> {
    let ids: BTreeSet<TaskId> = repo.store.list_ids()?.into_iter().collect();
    let mut index = repo.index()?;

    let mut report = Report::default();
    for id in &ids {
        if !index.contains(id) {
            report.missing_entries.push(id.clone());
        }
    }
    for (id, entry) in index.entries() {
        if !ids.contains(id) {
            report.dangling_entries.push(id.clone());
        }
        for dep in &entry.dependencies {
            if !index.contains(dep) {
                report.dangling_dependencies.push((id.clone(), dep.clone()));
            }
        }
    }

    if fix {
        for id in &report.missing_entries {
            let entry = IndexEntry::new(repo.config.default_status.clone());
            index.update(id, entry, &repo.config)?;
        }
        for id in &report.dangling_entries {
            index.remove(id)?;
        }
        report.fixed = true;
    }

    Ok(report)
}

pub fn run(repo_root: &Path, fix: bool, format: Format) -> Result<()> {
    let repo = Repo::open(repo_root)?;
    let report = reconcile(&repo, fix)?;

    match format {
        Format::Json => println!("{}", serde_json::to_string(&report)?),
        _ => {
            for id in &report.missing_entries {
                println!("task {id} has content but no index entry");
            }
            for id in &report.dangling_entries {
                println!("index entry {id} has no content record");
            }
            for (id, dep) in &report.dangling_dependencies {
                println!("task {id} depends on {dep}, which does not exist");
            }
            if report.is_clean() {
                println!("stores agree");
            } else if report.fixed {
                println!("fixed (dangling dependencies left for review)");
            } else {
                println!("run `trellis check --fix` to reconcile");
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet as Deps;
    use tempfile::tempdir;

    use crate::model::ContentRecord;
    use crate::mutation;
    use crate::store::files::ContentStore;

    fn id(s: &str) -> TaskId {
        s.parse().unwrap()
    }

    fn open_repo(dir: &tempfile::TempDir) -> Repo {
        ContentStore::init(dir.path()).unwrap();
        Repo::open(dir.path()).unwrap()
    }

    fn create(repo: &Repo, title: &str) -> TaskId {
        let record = ContentRecord::new(title.to_string(), None);
        mutation::create_task(repo, None, record, None, Deps::new()).unwrap()
    }

    #[test]
    fn consistent_stores_produce_clean_report() {
        let dir = tempdir().unwrap();
        let repo = open_repo(&dir);
        create(&repo, "a");
        create(&repo, "b");

        let report = reconcile(&repo, false).unwrap();
        assert!(report.is_clean());
    }

    #[test]
    fn content_without_entry_is_reported_and_fixable() {
        let dir = tempdir().unwrap();
        let repo = open_repo(&dir);
        let orphan = id("5");
        repo.store
            .create(&orphan, &ContentRecord::new("stray".into(), None))
            .unwrap();

        let report = reconcile(&repo, false).unwrap();
        assert_eq!(report.missing_entries, vec![orphan.clone()]);

        reconcile(&repo, true).unwrap();
        let index = repo.index().unwrap();
        assert_eq!(index.get(&orphan).unwrap().status, "pending");
        assert!(reconcile(&repo, false).unwrap().is_clean());
    }

    #[test]
    fn entry_without_content_is_reported_and_fixable() {
        let dir = tempdir().unwrap();
        let repo = open_repo(&dir);
        let one = create(&repo, "a");
        repo.store.delete(&one).unwrap();

        let report = reconcile(&repo, false).unwrap();
        assert_eq!(report.dangling_entries, vec![one.clone()]);

        reconcile(&repo, true).unwrap();
        assert!(repo.index().unwrap().is_empty());
    }

    #[test]
    fn dangling_dependency_is_reported_but_never_fixed() {
        let dir = tempdir().unwrap();
        let repo = open_repo(&dir);
        let a = create(&repo, "a");
        let b = create(&repo, "b");
        mutation::add_dependencies(&repo, &b, vec![a.clone()]).unwrap();
        mutation::delete_task(&repo, &a, false).unwrap();

        let report = reconcile(&repo, true).unwrap();
        assert_eq!(report.dangling_dependencies, vec![(b.clone(), a.clone())]);

        // Still there after --fix; readiness decisions stay with the user.
        let index = repo.index().unwrap();
        assert!(index.get(&b).unwrap().dependencies.contains(&a));
    }
}
