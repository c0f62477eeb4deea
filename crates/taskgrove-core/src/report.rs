//! Deterministic markdown tables derived from a tree snapshot. Tests assert
//! on the exact rendered shape, so the column set and glyphs are fixed.

use std::collections::HashSet;

use crate::navigator::{find_parent, flatten};
use crate::task::{Task, TaskStatus, TaskTree};

const TABLE_HEADER: &str = "| Task | Parent | Status | Changed | Subtasks | Progress |\n|------|--------|--------|---------|----------|----------|\n";

/// Aggregate completion statistics plus one row per task, in flattened
/// (pre-order) tree order. Rendered after `complete`.
pub fn progress_summary(tree: &TaskTree, changed: &HashSet<String>) -> String {
    let tasks = flatten(tree);
    let total = tasks.len();
    let completed = count_status(&tasks, TaskStatus::Done);
    let in_progress = count_status(&tasks, TaskStatus::InProgress);
    let todo = count_status(&tasks, TaskStatus::Todo);
    let percent = percentage(completed, total);

    let mut out = String::from("## Progress Summary\n\n");
    out.push_str(&format!(
        "**Total:** {} | **Completed:** {} | **In Progress:** {} | **Todo:** {} | **{}% complete**\n\n",
        total, completed, in_progress, todo, percent
    ));
    out.push_str(&render_table(tree, changed));
    out
}

/// Full execution-order tree state, one row per task in strict pre-order.
/// Rendered after `start`.
pub fn hierarchy_summary(tree: &TaskTree, changed: &HashSet<String>) -> String {
    let mut out = String::from("## Task Hierarchy\n\n");
    out.push_str(&render_table(tree, changed));
    out
}

fn render_table(tree: &TaskTree, changed: &HashSet<String>) -> String {
    let mut out = String::from(TABLE_HEADER);
    for task in flatten(tree) {
        let parent = find_parent(tree, &task.id)
            .map(|p| p.name.clone())
            .unwrap_or_else(|| "-".to_string());
        let flag = if changed.contains(&task.id) { "◀" } else { "" };
        let done_children = task
            .children
            .iter()
            .filter(|child| child.status == TaskStatus::Done)
            .count();
        out.push_str(&format!(
            "| {} | {} | {} | {} | {}/{} | {}% |\n",
            task.name,
            parent,
            task.status.glyph(),
            flag,
            done_children,
            task.children.len(),
            task_percent(task)
        ));
    }
    out
}

fn task_percent(task: &Task) -> u32 {
    if task.is_leaf() {
        // Childless tasks report all-or-nothing.
        if task.status == TaskStatus::Done {
            100
        } else {
            0
        }
    } else {
        let done = task
            .children
            .iter()
            .filter(|child| child.status == TaskStatus::Done)
            .count();
        percentage(done, task.children.len())
    }
}

fn count_status(tasks: &[&Task], status: TaskStatus) -> usize {
    tasks.iter().filter(|task| task.status == status).count()
}

fn percentage(part: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (part as f64 / total as f64 * 100.0).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::Task;

    fn named(name: &str) -> Task {
        let mut task = Task::new(name, "");
        task.id = name.to_string();
        task
    }

    #[test]
    fn percentage_rounds_half_up() {
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(1, 2), 50);
        assert_eq!(percentage(0, 0), 0);
    }

    #[test]
    fn progress_summary_counts_and_rows() {
        let mut parent = named("parent");
        let mut done_child = named("done-child");
        done_child.status = TaskStatus::Done;
        done_child.resolution = Some("ok".to_string());
        parent.children.push(done_child);
        parent.children.push(named("todo-child"));
        let tree = TaskTree {
            tasks: vec![parent],
        };

        let changed: HashSet<String> = ["done-child".to_string()].into_iter().collect();
        let summary = progress_summary(&tree, &changed);
        assert!(summary.starts_with("## Progress Summary\n"));
        assert!(summary.contains(
            "**Total:** 3 | **Completed:** 1 | **In Progress:** 0 | **Todo:** 2 | **33% complete**"
        ));
        assert!(summary.contains("| parent | - | ⬜ |  | 1/2 | 50% |"));
        assert!(summary.contains("| done-child | parent | ✅ | ◀ | 0/0 | 100% |"));
        assert!(summary.contains("| todo-child | parent | ⬜ |  | 0/0 | 0% |"));
    }

    #[test]
    fn hierarchy_summary_is_preorder() {
        let mut root = named("root");
        let mut first = named("first");
        first.children.push(named("first-leaf"));
        root.children.push(first);
        root.children.push(named("second"));
        let tree = TaskTree { tasks: vec![root] };

        let summary = hierarchy_summary(&tree, &HashSet::new());
        let root_at = summary.find("| root |").unwrap();
        let first_at = summary.find("| first |").unwrap();
        let leaf_at = summary.find("| first-leaf |").unwrap();
        let second_at = summary.find("| second |").unwrap();
        assert!(root_at < first_at && first_at < leaf_at && leaf_at < second_at);
    }
}
