use taskgrove_core::engine::{self, NewTask};
use taskgrove_core::navigator::find_by_id;
use taskgrove_core::task::{TaskStatus, TaskTree};

fn add(tree: &mut TaskTree, name: &str, parent: Option<&str>) -> String {
    engine::create(
        tree,
        NewTask {
            name: name.to_string(),
            parent_id: parent.map(|p| p.to_string()),
            ..Default::default()
        },
    )
    .expect("create")
    .id
}

#[test]
fn start_descends_three_levels() {
    let mut tree = TaskTree::default();
    let root = add(&mut tree, "Root", None);
    let mid = add(&mut tree, "Mid", Some(&root));
    let leaf = add(&mut tree, "Leaf", Some(&mid));

    let outcome = engine::start(&mut tree, &root).expect("start");
    let started: Vec<&str> = outcome.started.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(started, vec!["Root", "Mid", "Leaf"]);
    for id in [&root, &mid, &leaf] {
        assert_eq!(find_by_id(&tree, id).unwrap().status, TaskStatus::InProgress);
    }
    assert!(outcome.message.contains("auto-started 2 nested task(s)"));
}

#[test]
fn descent_skips_done_children() {
    let mut tree = TaskTree::default();
    let root = add(&mut tree, "Root", None);
    let first = add(&mut tree, "First", Some(&root));
    let second = add(&mut tree, "Second", Some(&root));

    engine::start(&mut tree, &first).expect("start first");
    engine::complete(&mut tree, &first, "done").expect("complete first");
    let outcome = engine::start(&mut tree, &second).expect("start second");
    assert_eq!(outcome.task.status, TaskStatus::InProgress);
    assert_eq!(find_by_id(&tree, &first).unwrap().status, TaskStatus::Done);
}

#[test]
fn chained_auto_completion_walks_multiple_levels() {
    let mut tree = TaskTree::default();
    let root = add(&mut tree, "Root", None);
    let mid = add(&mut tree, "Mid", Some(&root));
    let leaf = add(&mut tree, "Leaf", Some(&mid));

    engine::start(&mut tree, &root).expect("start");
    let outcome = engine::complete(&mut tree, &leaf, "done").expect("complete");

    assert_eq!(outcome.auto_completed, vec![mid.clone(), root.clone()]);
    for id in [&mid, &root] {
        let task = find_by_id(&tree, id).unwrap();
        assert_eq!(task.status, TaskStatus::Done);
        assert_eq!(
            task.resolution.as_deref(),
            Some("All subtasks completed automatically")
        );
    }
    assert!(outcome.next_task_id.is_none());
}

#[test]
fn auto_completion_stops_at_unsatisfied_ancestor() {
    let mut tree = TaskTree::default();
    let root = add(&mut tree, "Root", None);
    let mid = add(&mut tree, "Mid", Some(&root));
    add(&mut tree, "Leaf", Some(&mid));
    let pending = add(&mut tree, "Pending", Some(&root));

    engine::start(&mut tree, &root).expect("start");
    let leaf_id = find_by_id(&tree, &mid).unwrap().children[0].id.clone();
    let outcome = engine::complete(&mut tree, &leaf_id, "done").expect("complete");

    assert_eq!(outcome.auto_completed, vec![mid.clone()]);
    assert_ne!(find_by_id(&tree, &root).unwrap().status, TaskStatus::Done);
    assert_eq!(outcome.next_task_id.as_deref(), Some(pending.as_str()));
}

#[test]
fn next_task_crosses_subtree_boundary() {
    let mut tree = TaskTree::default();
    let first = add(&mut tree, "First epic", None);
    let first_leaf = add(&mut tree, "First leaf", Some(&first));
    let second = add(&mut tree, "Second epic", None);
    add(&mut tree, "Second leaf", Some(&second));

    engine::start(&mut tree, &first_leaf).expect("start");
    let outcome = engine::complete(&mut tree, &first_leaf, "done").expect("complete");

    // First epic auto-completes, so the search climbs to the top level and
    // lands on the next todo root.
    assert_eq!(outcome.auto_completed, vec![first.clone()]);
    assert_eq!(outcome.next_task_id.as_deref(), Some(second.as_str()));
}
