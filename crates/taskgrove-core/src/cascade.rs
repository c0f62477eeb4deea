//! Cascade propagation: downward auto-start descent, upward auto-completion,
//! and the next-workable-task search.

use crate::navigator::{find_by_id_mut, find_parent};
use crate::task::{Task, TaskStatus, TaskTree};

/// Resolution note applied to ancestors completed by the upward cascade.
pub const AUTO_RESOLUTION: &str = "All subtasks completed automatically";

/// Ids along the first-incomplete-child descent from `task`, top to bottom.
/// Empty when the task has no `todo` child.
pub fn deepest_incomplete_path(task: &Task) -> Vec<String> {
    let mut path = Vec::new();
    let mut current = task;
    loop {
        let next = current
            .children
            .iter()
            .find(|child| child.status == TaskStatus::Todo);
        match next {
            Some(child) => {
                path.push(child.id.clone());
                current = child;
            }
            None => break,
        }
    }
    path
}

/// Walks the parent chain of a just-completed task, marking each ancestor
/// done while all of its children are done. Returns the auto-completed ids
/// bottom-up.
pub fn auto_complete_ancestors(tree: &mut TaskTree, id: &str) -> Vec<String> {
    let mut completed = Vec::new();
    let mut current = id.to_string();
    loop {
        let parent_id = match find_parent(tree, &current) {
            Some(parent) if parent.all_children_done() => parent.id.clone(),
            _ => break,
        };
        if let Some(parent) = find_by_id_mut(tree, &parent_id) {
            if parent.status != TaskStatus::Done {
                parent.status = TaskStatus::Done;
                parent.resolution = Some(AUTO_RESOLUTION.to_string());
                parent.touch();
                completed.push(parent_id.clone());
            }
        }
        current = parent_id;
    }
    completed
}

/// Pre-order, left-to-right search for the next workable task after `id`
/// has reached done. Climbs through fully-done parents and falls back to
/// the first `todo` top-level entry.
pub fn next_task_after<'a>(tree: &'a TaskTree, id: &str) -> Option<&'a Task> {
    let mut current = id.to_string();
    loop {
        match find_parent(tree, &current) {
            Some(parent) => {
                let index = parent
                    .children
                    .iter()
                    .position(|child| child.id == current)?;
                if let Some(next) = parent.children[index + 1..]
                    .iter()
                    .find(|child| child.status == TaskStatus::Todo)
                {
                    return Some(next);
                }
                if parent.all_children_done() {
                    // Treat the parent as just-finished for search purposes.
                    current = parent.id.clone();
                    continue;
                }
                return None;
            }
            None => {
                return tree
                    .tasks
                    .iter()
                    .find(|task| task.status == TaskStatus::Todo);
            }
        }
    }
}
