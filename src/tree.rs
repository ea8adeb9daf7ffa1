use std::collections::BTreeSet;

use serde::Serialize;

use crate::model::ContentRecord;
use crate::store::index::Index;
use crate::task_id::{self, TaskId};

#[derive(Debug, Serialize)]
pub struct TreeNode {
    pub id: TaskId,
    pub title: String,
    pub status: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub orphan: bool,
    pub children: Vec<TreeNode>,
}

/// A full forest derived from the flat ID set, plus non-fatal observations.
/// Building never fails; malformed subsets degrade with warnings.
#[derive(Debug)]
pub struct Forest {
    pub roots: Vec<TreeNode>,
    pub warnings: Vec<String>,
}

/// Derive the parent/child forest from content-store tasks and the index
/// snapshot. Roots are depth-1 IDs plus orphans — tasks whose parent prefix
/// matches no existing ID; orphans are included but flagged.
pub fn build_forest(tasks: &[(TaskId, ContentRecord)], index: &Index) -> Forest {
    let mut ids: Vec<TaskId> = tasks.iter().map(|(id, _)| id.clone()).collect();
    ids.sort();
    let id_set: BTreeSet<&TaskId> = ids.iter().collect();

    let mut warnings = Vec::new();
    let mut roots = Vec::new();
    for id in &ids {
        let orphan = match id.parent() {
            None => false,
            Some(parent) if id_set.contains(&parent) => continue,
            Some(parent) => {
                warnings.push(format!("task {id} has no parent {parent}; showing as orphan"));
                true
            }
        };
        roots.push(build_node(id, &ids, tasks, index, orphan, &mut warnings));
    }

    Forest { roots, warnings }
}

/// Build the subtree rooted at `id`. Used by `tree <id>`; `None` when the ID
/// has no content record.
pub fn build_subtree(
    root: &TaskId,
    tasks: &[(TaskId, ContentRecord)],
    index: &Index,
) -> Option<(TreeNode, Vec<String>)> {
    let mut ids: Vec<TaskId> = tasks.iter().map(|(id, _)| id.clone()).collect();
    ids.sort();
    if !ids.contains(root) {
        return None;
    }
    let mut warnings = Vec::new();
    let node = build_node(root, &ids, tasks, index, false, &mut warnings);
    Some((node, warnings))
}

fn build_node(
    id: &TaskId,
    ids: &[TaskId],
    tasks: &[(TaskId, ContentRecord)],
    index: &Index,
    orphan: bool,
    warnings: &mut Vec<String>,
) -> TreeNode {
    let title = tasks
        .iter()
        .find(|(task_id, _)| task_id == id)
        .map(|(_, record)| record.title.clone())
        .unwrap_or_default();
    let status = match index.get(id) {
        Some(entry) => entry.status.clone(),
        None => {
            warnings.push(format!("task {id} has no index entry; status unknown"));
            "unknown".to_string()
        }
    };

    let children = task_id::direct_children_of(id, ids)
        .iter()
        .map(|child| build_node(child, ids, tasks, index, false, warnings))
        .collect();

    TreeNode {
        id: id.clone(),
        title,
        status,
        orphan,
        children,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    use crate::config::Config;
    use crate::model::IndexEntry;

    fn id(s: &str) -> TaskId {
        s.parse().unwrap()
    }

    fn task(s: &str, title: &str) -> (TaskId, ContentRecord) {
        (id(s), ContentRecord::new(title.to_string(), None))
    }

    fn index_with(dir: &tempfile::TempDir, entries: &[(&str, &str)]) -> Index {
        let config = Config::default();
        let mut index = Index::load(&dir.path().join("index.json")).unwrap();
        for (raw, status) in entries {
            index
                .update(&id(raw), IndexEntry::new((*status).to_string()), &config)
                .unwrap();
        }
        index
    }

    #[test]
    fn forest_nests_children_in_comparator_order() {
        let dir = tempdir().unwrap();
        let tasks = vec![
            task("1", "root"),
            task("1.10", "late child"),
            task("1.2", "early child"),
            task("2", "other root"),
        ];
        let index = index_with(
            &dir,
            &[("1", "pending"), ("1.2", "done"), ("1.10", "pending"), ("2", "pending")],
        );

        let forest = build_forest(&tasks, &index);
        assert_eq!(forest.roots.len(), 2);
        assert_eq!(forest.roots[0].id, id("1"));
        let child_ids: Vec<&TaskId> = forest.roots[0].children.iter().map(|n| &n.id).collect();
        assert_eq!(child_ids, vec![&id("1.2"), &id("1.10")]);
        assert_eq!(forest.roots[0].children[0].status, "done");
        assert!(forest.warnings.is_empty());
    }

    #[test]
    fn orphan_is_included_and_flagged() {
        let dir = tempdir().unwrap();
        let tasks = vec![task("1", "root"), task("2.1", "stray")];
        let index = index_with(&dir, &[("1", "pending"), ("2.1", "pending")]);

        let forest = build_forest(&tasks, &index);
        assert_eq!(forest.roots.len(), 2);
        let stray = forest.roots.iter().find(|n| n.id == id("2.1")).unwrap();
        assert!(stray.orphan);
        assert!(forest.warnings.iter().any(|w| w.contains("2.1")));
    }

    #[test]
    fn missing_index_entry_degrades_to_unknown_status() {
        let dir = tempdir().unwrap();
        let tasks = vec![task("1", "root")];
        let index = index_with(&dir, &[]);

        let forest = build_forest(&tasks, &index);
        assert_eq!(forest.roots[0].status, "unknown");
        assert!(forest.warnings.iter().any(|w| w.contains("no index entry")));
    }

    #[test]
    fn subtree_builds_from_requested_root_only() {
        let dir = tempdir().unwrap();
        let tasks = vec![task("1", "a"), task("1.1", "b"), task("2", "c")];
        let index = index_with(&dir, &[("1", "pending"), ("1.1", "pending"), ("2", "pending")]);

        let (node, warnings) = build_subtree(&id("1"), &tasks, &index).unwrap();
        assert_eq!(node.id, id("1"));
        assert_eq!(node.children.len(), 1);
        assert!(warnings.is_empty());

        assert!(build_subtree(&id("9"), &tasks, &index).is_none());
    }

    #[test]
    fn empty_input_builds_empty_forest() {
        let dir = tempdir().unwrap();
        let index = index_with(&dir, &[]);
        let forest = build_forest(&[], &index);
        assert!(forest.roots.is_empty());
        assert!(forest.warnings.is_empty());
    }
}
