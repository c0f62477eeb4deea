//! Lifecycle orchestration over a tree snapshot: create, start, complete,
//! update, delete, and the read operations, with cascade propagation.

use std::collections::HashSet;

use crate::cascade::{auto_complete_ancestors, deepest_incomplete_path, next_task_after};
use crate::error::EngineError;
use crate::navigator::{find_by_id, find_by_id_mut, find_parent};
use crate::order::validate_start;
use crate::report::{hierarchy_summary, progress_summary};
use crate::task::{Task, TaskStatus, TaskTree};

/// Resolution note applied when an update marks a task done without one.
pub const UPDATE_RESOLUTION: &str = "Marked done via update";

#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub name: String,
    pub description: String,
    pub parent_id: Option<String>,
    pub position: Option<usize>,
    pub completion_criteria: Vec<String>,
    pub constraints: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateTask {
    pub name: Option<String>,
    pub description: Option<String>,
    /// Direct status override; the escape hatch out of `done`, unlike
    /// start/complete which treat done as terminal.
    pub status: Option<TaskStatus>,
    pub resolution: Option<String>,
    pub completion_criteria: Option<Vec<String>>,
    pub constraints: Option<Vec<String>>,
}

#[derive(Debug)]
pub struct StartOutcome {
    pub task: Task,
    /// Every task set to in_progress by this call, in the order it happened:
    /// the primary task, then promoted ancestors, then the auto-start descent.
    pub started: Vec<Task>,
    pub message: String,
    pub hierarchy: String,
}

#[derive(Debug)]
pub struct CompleteOutcome {
    pub task: Task,
    pub auto_completed: Vec<String>,
    pub next_task_id: Option<String>,
    pub message: String,
    pub progress: String,
}

pub fn create(tree: &mut TaskTree, new: NewTask) -> Result<Task, EngineError> {
    if new.name.trim().is_empty() {
        return Err(EngineError::Validation(
            "Task name must not be empty".to_string(),
        ));
    }
    let mut task = Task::new(&new.name, &new.description);
    task.completion_criteria = new.completion_criteria;
    task.constraints = new.constraints;
    let created = task.clone();

    let siblings = match &new.parent_id {
        Some(parent_id) => {
            let parent = find_by_id_mut(tree, parent_id)
                .ok_or_else(|| EngineError::NotFound(format!("Parent task not found: {}", parent_id)))?;
            &mut parent.children
        }
        None => &mut tree.tasks,
    };
    let position = new.position.unwrap_or(siblings.len()).min(siblings.len());
    siblings.insert(position, task);
    Ok(created)
}

pub fn get(tree: &TaskTree, id: &str) -> Result<Task, EngineError> {
    find_by_id(tree, id)
        .cloned()
        .ok_or_else(|| EngineError::task_not_found(id))
}

/// Children of `parent_id`, or the top-level forest when no filter is given.
pub fn list(tree: &TaskTree, parent_id: Option<&str>) -> Result<Vec<Task>, EngineError> {
    match parent_id {
        Some(parent_id) => {
            let parent = find_by_id(tree, parent_id)
                .ok_or_else(|| EngineError::NotFound(format!("Parent task not found: {}", parent_id)))?;
            Ok(parent.children.clone())
        }
        None => Ok(tree.tasks.clone()),
    }
}

pub fn update(tree: &mut TaskTree, id: &str, fields: UpdateTask) -> Result<Task, EngineError> {
    if let Some(name) = &fields.name {
        if name.trim().is_empty() {
            return Err(EngineError::Validation(
                "Task name must not be empty".to_string(),
            ));
        }
    }
    let task = find_by_id_mut(tree, id).ok_or_else(|| EngineError::task_not_found(id))?;
    if let Some(name) = fields.name {
        task.name = name.trim().to_string();
    }
    if let Some(description) = fields.description {
        task.description = description;
    }
    if let Some(criteria) = fields.completion_criteria {
        task.completion_criteria = criteria;
    }
    if let Some(constraints) = fields.constraints {
        task.constraints = constraints;
    }
    if let Some(status) = fields.status {
        task.status = status;
    }
    if let Some(resolution) = fields.resolution {
        task.resolution = Some(resolution);
    }
    // resolution is set iff the task is done
    match task.status {
        TaskStatus::Done => {
            if task.resolution.is_none() {
                task.resolution = Some(UPDATE_RESOLUTION.to_string());
            }
        }
        _ => task.resolution = None,
    }
    task.touch();
    Ok(task.clone())
}

pub fn delete(tree: &mut TaskTree, id: &str) -> Result<Task, EngineError> {
    let task = find_by_id(tree, id).ok_or_else(|| EngineError::task_not_found(id))?;
    if !task.children.is_empty() {
        return Err(EngineError::StateConflict(format!(
            "Cannot delete task '{}': it still has {} subtask(s)",
            task.name,
            task.children.len()
        )));
    }
    remove_in(&mut tree.tasks, id).ok_or_else(|| EngineError::task_not_found(id))
}

fn remove_in(tasks: &mut Vec<Task>, id: &str) -> Option<Task> {
    if let Some(index) = tasks.iter().position(|task| task.id == id) {
        return Some(tasks.remove(index));
    }
    for task in tasks {
        if let Some(removed) = remove_in(&mut task.children, id) {
            return Some(removed);
        }
    }
    None
}

pub fn start(tree: &mut TaskTree, id: &str) -> Result<StartOutcome, EngineError> {
    let task = find_by_id(tree, id).ok_or_else(|| EngineError::task_not_found(id))?;
    match task.status {
        TaskStatus::Done => {
            return Err(EngineError::StateConflict(format!(
                "Task '{}' is already completed",
                task.name
            )));
        }
        TaskStatus::InProgress => {
            return Err(EngineError::StateConflict(format!(
                "Task '{}' is already in progress",
                task.name
            )));
        }
        TaskStatus::Todo => {}
    }
    let is_leaf = task.is_leaf();
    let task_name = task.name.clone();

    validate_start(tree, id)?;

    let mut changed: HashSet<String> = HashSet::new();
    let mut started_ids: Vec<String> = Vec::new();

    // Downward cascade target, computed before any mutation.
    let descent = find_by_id(tree, id)
        .map(deepest_incomplete_path)
        .unwrap_or_default();

    // Single-active-leaf rule: when this start activates a leaf (the task
    // itself, or the end of the descent), demote any other running leaf and
    // re-derive that leaf's ancestor chain.
    if is_leaf || !descent.is_empty() {
        if let Some(active_id) = active_leaf_id(tree, id) {
            if let Some(active) = find_by_id_mut(tree, &active_id) {
                active.status = TaskStatus::Todo;
                active.touch();
                changed.insert(active_id.clone());
            }
            rederive_ancestors(tree, &active_id, &mut changed);
        }
    }

    mark_started(tree, id, &mut started_ids, &mut changed);
    promote_ancestors(tree, id, &mut started_ids, &mut changed);
    for descendant_id in &descent {
        mark_started(tree, descendant_id, &mut started_ids, &mut changed);
        promote_ancestors(tree, descendant_id, &mut started_ids, &mut changed);
    }

    let message = if descent.is_empty() {
        format!("Started task '{}' (no nested tasks to auto-start)", task_name)
    } else {
        format!(
            "Started task '{}' and auto-started {} nested task(s)",
            task_name,
            descent.len()
        )
    };

    let started: Vec<Task> = started_ids
        .iter()
        .filter_map(|started_id| find_by_id(tree, started_id).cloned())
        .collect();
    let hierarchy = hierarchy_summary(tree, &changed);
    let task = get(tree, id)?;
    Ok(StartOutcome {
        task,
        started,
        message,
        hierarchy,
    })
}

pub fn complete(
    tree: &mut TaskTree,
    id: &str,
    resolution: &str,
) -> Result<CompleteOutcome, EngineError> {
    let task = find_by_id(tree, id).ok_or_else(|| EngineError::task_not_found(id))?;
    if task.status == TaskStatus::Done {
        return Err(EngineError::StateConflict(format!(
            "Task '{}' is already completed",
            task.name
        )));
    }
    let incomplete: Vec<String> = task
        .children
        .iter()
        .filter(|child| child.status != TaskStatus::Done)
        .map(|child| format!("'{}'", child.name))
        .collect();
    if !incomplete.is_empty() {
        return Err(EngineError::StateConflict(format!(
            "Cannot complete task '{}': {} subtask(s) not yet done: {}",
            task.name,
            incomplete.len(),
            incomplete.join(", ")
        )));
    }
    let task_name = task.name.clone();

    let mut changed: HashSet<String> = HashSet::new();
    if let Some(task) = find_by_id_mut(tree, id) {
        task.status = TaskStatus::Done;
        task.resolution = Some(resolution.to_string());
        task.touch();
    }
    changed.insert(id.to_string());

    let auto_completed = auto_complete_ancestors(tree, id);
    changed.extend(auto_completed.iter().cloned());

    let next = next_task_after(tree, id).map(|task| (task.id.clone(), task.name.clone()));

    let mut message = format!("Task '{}' completed", task_name);
    if !auto_completed.is_empty() {
        let names: Vec<String> = auto_completed
            .iter()
            .filter_map(|auto_id| find_by_id(tree, auto_id))
            .map(|task| format!("'{}'", task.name))
            .collect();
        message.push_str(&format!(
            ". Auto-completed ancestor task(s): {}",
            names.join(", ")
        ));
    }
    match &next {
        Some((_, name)) => message.push_str(&format!(". Next task: '{}'", name)),
        None => message.push_str(". All tasks are complete"),
    }

    let progress = progress_summary(tree, &changed);
    let task = get(tree, id)?;
    Ok(CompleteOutcome {
        task,
        auto_completed,
        next_task_id: next.map(|(next_id, _)| next_id),
        message,
        progress,
    })
}

/// The in_progress leaf other than `exclude`, if any. The single-active-leaf
/// invariant guarantees at most one exists.
fn active_leaf_id(tree: &TaskTree, exclude: &str) -> Option<String> {
    crate::navigator::flatten(tree)
        .into_iter()
        .find(|task| {
            task.is_leaf() && task.status == TaskStatus::InProgress && task.id != exclude
        })
        .map(|task| task.id.clone())
}

fn mark_started(
    tree: &mut TaskTree,
    id: &str,
    started: &mut Vec<String>,
    changed: &mut HashSet<String>,
) {
    if let Some(task) = find_by_id_mut(tree, id) {
        if task.status != TaskStatus::InProgress {
            task.status = TaskStatus::InProgress;
            task.touch();
            started.push(id.to_string());
            changed.insert(id.to_string());
        }
    }
}

/// Climbs from `id` to the root, promoting every todo ancestor to
/// in_progress. Each level is re-derived independently, so the walk never
/// short-circuits partway up the chain.
fn promote_ancestors(
    tree: &mut TaskTree,
    id: &str,
    started: &mut Vec<String>,
    changed: &mut HashSet<String>,
) {
    let mut current = id.to_string();
    while let Some(parent) = find_parent(tree, &current) {
        let parent_id = parent.id.clone();
        if parent.status == TaskStatus::Todo {
            mark_started(tree, &parent_id, started, changed);
        }
        current = parent_id;
    }
}

/// Reverts in_progress ancestors of a demoted leaf back to todo, level by
/// level; an ancestor keeps in_progress while any of its children still runs.
fn rederive_ancestors(tree: &mut TaskTree, id: &str, changed: &mut HashSet<String>) {
    let mut current = id.to_string();
    while let Some(parent) = find_parent(tree, &current) {
        let parent_id = parent.id.clone();
        let reverts = parent.status == TaskStatus::InProgress && !parent.has_in_progress_child();
        if reverts {
            if let Some(parent) = find_by_id_mut(tree, &parent_id) {
                parent.status = TaskStatus::Todo;
                parent.touch();
                changed.insert(parent_id.clone());
            }
        }
        current = parent_id;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_rejects_blank_name() {
        let mut tree = TaskTree::default();
        let err = create(
            &mut tree,
            NewTask {
                name: "   ".to_string(),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
        assert!(tree.tasks.is_empty());
    }

    #[test]
    fn create_clamps_position() {
        let mut tree = TaskTree::default();
        create(
            &mut tree,
            NewTask {
                name: "first".to_string(),
                ..Default::default()
            },
        )
        .unwrap();
        let second = create(
            &mut tree,
            NewTask {
                name: "second".to_string(),
                position: Some(99),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(tree.tasks[1].id, second.id);
    }

    #[test]
    fn create_inserts_at_position() {
        let mut tree = TaskTree::default();
        create(
            &mut tree,
            NewTask {
                name: "b".to_string(),
                ..Default::default()
            },
        )
        .unwrap();
        let first = create(
            &mut tree,
            NewTask {
                name: "a".to_string(),
                position: Some(0),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(tree.tasks[0].id, first.id);
        assert_eq!(tree.tasks[1].name, "b");
    }

    #[test]
    fn update_touches_fields() {
        let mut tree = TaskTree::default();
        let task = create(
            &mut tree,
            NewTask {
                name: "before".to_string(),
                ..Default::default()
            },
        )
        .unwrap();
        let updated = update(
            &mut tree,
            &task.id,
            UpdateTask {
                name: Some("after".to_string()),
                description: Some("details".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(updated.name, "after");
        assert_eq!(updated.description, "details");
    }

    #[test]
    fn delete_refuses_tasks_with_children() {
        let mut tree = TaskTree::default();
        let parent = create(
            &mut tree,
            NewTask {
                name: "parent".to_string(),
                ..Default::default()
            },
        )
        .unwrap();
        create(
            &mut tree,
            NewTask {
                name: "child".to_string(),
                parent_id: Some(parent.id.clone()),
                ..Default::default()
            },
        )
        .unwrap();
        let err = delete(&mut tree, &parent.id).unwrap_err();
        assert_eq!(err.code(), "STATE_CONFLICT");
        assert_eq!(tree.tasks.len(), 1);
    }

    #[test]
    fn start_rejects_running_and_done_tasks() {
        let mut tree = TaskTree::default();
        let task = create(
            &mut tree,
            NewTask {
                name: "only".to_string(),
                ..Default::default()
            },
        )
        .unwrap();
        start(&mut tree, &task.id).unwrap();
        let err = start(&mut tree, &task.id).unwrap_err();
        assert!(err.to_string().contains("already in progress"));

        complete(&mut tree, &task.id, "done").unwrap();
        let err = start(&mut tree, &task.id).unwrap_err();
        assert!(err.to_string().contains("already completed"));
    }
}
