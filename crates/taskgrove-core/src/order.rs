//! Frontier-rule enforcement: a task may start only once every earlier
//! sibling, at its own level and at every ancestor level, has been worked.

use crate::error::{BlockingTask, EngineError};
use crate::navigator::{find_parent, sibling_slot};
use crate::task::{TaskStatus, TaskTree};

/// Validates that `id` is on the execution frontier. An earlier sibling in
/// `todo` blocks the start; an `in_progress` sibling does not, since the
/// single-active-leaf reset handles switching between started subtrees.
pub fn validate_start(tree: &TaskTree, id: &str) -> Result<(), EngineError> {
    let task = crate::navigator::find_by_id(tree, id)
        .ok_or_else(|| EngineError::task_not_found(id))?;

    if let Some(blockers) = blockers_at_level(tree, id) {
        return Err(EngineError::OrderViolation {
            message: format!(
                "Cannot start task '{}': {} earlier sibling task(s) not yet worked: {}",
                task.name,
                blockers.len(),
                blocker_names(&blockers)
            ),
            blockers,
        });
    }

    let mut current = id.to_string();
    while let Some(parent) = find_parent(tree, &current) {
        if let Some(blockers) = blockers_at_level(tree, &parent.id) {
            return Err(EngineError::OrderViolation {
                message: format!(
                    "Cannot start task '{}': ancestor '{}' is blocked by {} earlier sibling task(s): {}",
                    task.name,
                    parent.name,
                    blockers.len(),
                    blocker_names(&blockers)
                ),
                blockers,
            });
        }
        current = parent.id.clone();
    }

    Ok(())
}

fn blockers_at_level(tree: &TaskTree, id: &str) -> Option<Vec<BlockingTask>> {
    let (siblings, index) = sibling_slot(tree, id)?;
    let blockers: Vec<BlockingTask> = siblings[..index]
        .iter()
        .enumerate()
        .filter(|(_, sibling)| sibling.status == TaskStatus::Todo)
        .map(|(position, sibling)| BlockingTask {
            position: position + 1,
            name: sibling.name.clone(),
            status: sibling.status,
            description: sibling.description.clone(),
        })
        .collect();
    if blockers.is_empty() {
        None
    } else {
        Some(blockers)
    }
}

fn blocker_names(blockers: &[BlockingTask]) -> String {
    blockers
        .iter()
        .map(|blocker| format!("'{}'", blocker.name))
        .collect::<Vec<_>>()
        .join(", ")
}
