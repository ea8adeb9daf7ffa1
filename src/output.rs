use std::collections::BTreeMap;

use clap::ValueEnum;
use serde::Serialize;

use crate::error::Result;
use crate::model::{ContentRecord, IndexEntry};
use crate::task_id::TaskId;
use crate::tree::TreeNode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Json,
    Pretty,
    Minimal,
}

/// One task flattened for display: id + content + index entry.
#[derive(Debug, Serialize)]
pub struct TaskView {
    pub id: TaskId,
    pub title: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<TaskId>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub custom: BTreeMap<String, String>,
    pub created_at: String,
    pub updated_at: String,
}

impl TaskView {
    pub fn new(id: TaskId, record: ContentRecord, entry: Option<&IndexEntry>) -> Self {
        let status = entry
            .map(|e| e.status.clone())
            .unwrap_or_else(|| "unknown".to_string());
        let dependencies = entry
            .map(|e| e.dependencies.iter().cloned().collect())
            .unwrap_or_default();
        Self {
            id,
            title: record.title,
            status,
            description: record.description,
            dependencies,
            custom: record.custom,
            created_at: record.created_at.to_rfc3339(),
            updated_at: record.updated_at.to_rfc3339(),
        }
    }
}

pub fn print_task(view: &TaskView, format: Format) -> Result<()> {
    match format {
        Format::Json => println!("{}", serde_json::to_string(view)?),
        Format::Pretty => {
            println!("[{}] {} ({})", view.id, view.title, view.status);
            if let Some(ref description) = view.description {
                println!("  {description}");
            }
            if !view.dependencies.is_empty() {
                let deps: Vec<&str> = view.dependencies.iter().map(TaskId::as_str).collect();
                println!("  depends on: {}", deps.join(", "));
            }
            for (key, value) in &view.custom {
                println!("  {key}: {value}");
            }
        }
        Format::Minimal => {
            let title = truncate_title(&view.title, 24);
            println!("{:>8} {:24} {}", view.id.to_string(), title, view.status);
        }
    }
    Ok(())
}

pub fn print_tasks(views: &[TaskView], format: Format) -> Result<()> {
    match format {
        Format::Json => println!("{}", serde_json::to_string(views)?),
        Format::Pretty => {
            for view in views {
                print_task(view, Format::Pretty)?;
                println!();
            }
        }
        Format::Minimal => {
            println!("{:>8} {:24} STATUS", "ID", "TITLE");
            println!("{}", "-".repeat(42));
            for view in views {
                print_task(view, Format::Minimal)?;
            }
        }
    }
    Ok(())
}

pub fn truncate_title(title: &str, max_len: usize) -> String {
    if title.chars().count() > max_len {
        let truncated: String = title.chars().take(max_len.saturating_sub(3)).collect();
        format!("{truncated}...")
    } else {
        title.to_string()
    }
}

pub fn print_tree_pretty(node: &TreeNode, prefix: &str, is_last: bool, is_root: bool) {
    let connector = if is_root {
        ""
    } else if is_last {
        "\u{2514}\u{2500}\u{2500} "
    } else {
        "\u{251c}\u{2500}\u{2500} "
    };

    let orphan_marker = if node.orphan { " [ORPHAN]" } else { "" };
    println!(
        "{}{}[{}] {} ({}){}",
        prefix, connector, node.id, node.title, node.status, orphan_marker
    );

    let child_prefix = if is_root {
        prefix.to_string()
    } else if is_last {
        format!("{prefix}    ")
    } else {
        format!("{prefix}\u{2502}   ")
    };

    for (i, child) in node.children.iter().enumerate() {
        let last = i == node.children.len() - 1;
        print_tree_pretty(child, &child_prefix, last, false);
    }
}

/// Warnings go to stderr and never change the command outcome.
pub fn print_warnings(warnings: &[String]) {
    for warning in warnings {
        eprintln!("warning: {warning}");
    }
}
