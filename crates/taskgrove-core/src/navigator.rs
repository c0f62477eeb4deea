//! Read-only traversal helpers over a task tree snapshot.

use crate::task::{Task, TaskTree};

/// Pre-order depth-first lookup by id.
pub fn find_by_id<'a>(tree: &'a TaskTree, id: &str) -> Option<&'a Task> {
    let mut stack: Vec<&Task> = tree.tasks.iter().rev().collect();
    while let Some(task) = stack.pop() {
        if task.id == id {
            return Some(task);
        }
        stack.extend(task.children.iter().rev());
    }
    None
}

pub fn find_by_id_mut<'a>(tree: &'a mut TaskTree, id: &str) -> Option<&'a mut Task> {
    find_in_mut(&mut tree.tasks, id)
}

fn find_in_mut<'a>(tasks: &'a mut [Task], id: &str) -> Option<&'a mut Task> {
    for task in tasks {
        if task.id == id {
            return Some(task);
        }
        if let Some(found) = find_in_mut(&mut task.children, id) {
            return Some(found);
        }
    }
    None
}

/// The owning node of `id`, or `None` for top-level and unknown ids.
pub fn find_parent<'a>(tree: &'a TaskTree, id: &str) -> Option<&'a Task> {
    let mut stack: Vec<&Task> = tree.tasks.iter().rev().collect();
    while let Some(task) = stack.pop() {
        if task.children.iter().any(|child| child.id == id) {
            return Some(task);
        }
        stack.extend(task.children.iter().rev());
    }
    None
}

/// Pre-order depth-first listing of every task in the tree.
pub fn flatten(tree: &TaskTree) -> Vec<&Task> {
    let mut result = Vec::new();
    let mut stack: Vec<&Task> = tree.tasks.iter().rev().collect();
    while let Some(task) = stack.pop() {
        result.push(task);
        stack.extend(task.children.iter().rev());
    }
    result
}

/// Root-to-target name chain, or `None` when the id is unknown.
pub fn path_names(tree: &TaskTree, id: &str) -> Option<Vec<String>> {
    let mut path = Vec::new();
    if path_in(&tree.tasks, id, &mut path) {
        Some(path)
    } else {
        None
    }
}

fn path_in(tasks: &[Task], id: &str, path: &mut Vec<String>) -> bool {
    for task in tasks {
        path.push(task.name.clone());
        if task.id == id || path_in(&task.children, id, path) {
            return true;
        }
        path.pop();
    }
    false
}

/// The child sequence `id` belongs to (its parent's children, or the root
/// forest) together with the task's index in it.
pub fn sibling_slot<'a>(tree: &'a TaskTree, id: &str) -> Option<(&'a [Task], usize)> {
    if let Some(parent) = find_parent(tree, id) {
        let index = parent.children.iter().position(|child| child.id == id)?;
        return Some((&parent.children, index));
    }
    let index = tree.tasks.iter().position(|task| task.id == id)?;
    Some((&tree.tasks, index))
}
