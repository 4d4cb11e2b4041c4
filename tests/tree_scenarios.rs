//! End-to-end scenarios for the tree engine against the SQLite backend.

use canopy::{
    NodeEntity, NodeId, SqliteStore, Steps, TreeConfig, TreeEngine, TreeError, TreeStore,
};

fn engine(config: TreeConfig) -> TreeEngine<SqliteStore> {
    let store = SqliteStore::open_in_memory(config).expect("open in-memory store");
    TreeEngine::new(store)
}

fn insert(tree: &mut TreeEngine<SqliteStore>, parent: Option<NodeId>, label: &str) -> NodeId {
    let mut entity = match parent {
        Some(parent) => NodeEntity::child_of(parent, label),
        None => NodeEntity::new(label),
    };
    tree.save(&mut entity).expect("save node");
    entity.id().expect("saved node has an id")
}

fn interval(tree: &mut TreeEngine<SqliteStore>, id: NodeId) -> (i64, i64) {
    let node = tree.node(id).expect("load node");
    (
        node.left().expect("left boundary"),
        node.right().expect("right boundary"),
    )
}

fn assert_valid(tree: &mut TreeEngine<SqliteStore>) {
    let report = tree.verify().expect("verify");
    assert!(report.success, "invariant findings: {:?}", report.findings);
}

#[test]
fn inserts_open_gaps_at_the_parent_edge() {
    let mut tree = engine(TreeConfig::default());
    let a = insert(&mut tree, None, "a");
    assert_eq!(interval(&mut tree, a), (1, 2));

    let b = insert(&mut tree, Some(a), "b");
    assert_eq!(interval(&mut tree, b), (2, 3));
    assert_eq!(interval(&mut tree, a), (1, 4));

    let c = insert(&mut tree, Some(a), "c");
    assert_eq!(interval(&mut tree, c), (4, 5));
    assert_eq!(interval(&mut tree, a), (1, 6));

    let mut root = tree.node(a).expect("load root");
    assert_eq!(tree.child_count(&mut root, false).expect("count"), 2);
    assert_eq!(tree.child_count(&mut root, true).expect("count"), 2);
    assert_valid(&mut tree);
}

#[test]
fn second_root_appends_after_the_scope_maximum() {
    let mut tree = engine(TreeConfig::default());
    let a = insert(&mut tree, None, "a");
    insert(&mut tree, Some(a), "b");
    insert(&mut tree, Some(a), "c");

    let d = insert(&mut tree, None, "d");
    assert_eq!(interval(&mut tree, d), (7, 8));
    assert_valid(&mut tree);
}

#[test]
fn find_path_walks_root_to_node() {
    let mut tree = engine(TreeConfig::default());
    let a = insert(&mut tree, None, "a");
    let b = insert(&mut tree, Some(a), "b");
    let b1 = insert(&mut tree, Some(b), "b1");

    let path = tree.find_path(b1).expect("path");
    let labels: Vec<&str> = path.iter().map(|row| row.label.as_str()).collect();
    assert_eq!(labels, ["a", "b", "b1"]);
}

#[test]
fn missing_node_reports_not_found() {
    let mut tree = engine(TreeConfig::default());
    insert(&mut tree, None, "a");
    let err = tree.node(99).expect_err("no row 99");
    assert!(matches!(err, TreeError::NotFound(99)));
}

#[test]
fn move_down_swaps_with_the_next_sibling() {
    let mut tree = engine(TreeConfig::default());
    let p = insert(&mut tree, None, "p");
    let x = insert(&mut tree, Some(p), "x");
    insert(&mut tree, Some(p), "y");
    insert(&mut tree, Some(p), "z");

    let mut node = tree.node(x).expect("load x");
    let moved = tree.move_down(&mut node, Steps::Exact(1)).expect("move");
    assert!(moved);

    let children = tree.find_children(p, true).expect("children");
    let labels: Vec<&str> = children.iter().map(|row| row.label.as_str()).collect();
    assert_eq!(labels, ["y", "x", "z"]);
    assert_valid(&mut tree);
}

#[test]
fn moving_a_subtree_keeps_it_intact() {
    let mut tree = engine(TreeConfig::default());
    let p = insert(&mut tree, None, "p");
    let x = insert(&mut tree, Some(p), "x");
    let x1 = insert(&mut tree, Some(x), "x1");
    insert(&mut tree, Some(p), "y");

    let mut node = tree.node(x).expect("load x");
    assert!(tree.move_down(&mut node, Steps::Exact(1)).expect("move"));

    let children = tree.find_children(p, true).expect("children");
    let labels: Vec<&str> = children.iter().map(|row| row.label.as_str()).collect();
    assert_eq!(labels, ["y", "x"]);
    let path = tree.find_path(x1).expect("path");
    let labels: Vec<&str> = path.iter().map(|row| row.label.as_str()).collect();
    assert_eq!(labels, ["p", "x", "x1"]);
    assert_valid(&mut tree);
}

#[test]
fn move_up_at_the_first_position_does_nothing() {
    let mut tree = engine(TreeConfig::default());
    let p = insert(&mut tree, None, "p");
    let x = insert(&mut tree, Some(p), "x");
    insert(&mut tree, Some(p), "y");

    let before = interval(&mut tree, x);
    let mut node = tree.node(x).expect("load x");
    assert!(!tree.move_up(&mut node, Steps::Exact(1)).expect("move"));
    assert_eq!(interval(&mut tree, x), before);
    assert_valid(&mut tree);
}

#[test]
fn zero_steps_is_a_no_op() {
    let mut tree = engine(TreeConfig::default());
    let p = insert(&mut tree, None, "p");
    insert(&mut tree, Some(p), "x");
    let y = insert(&mut tree, Some(p), "y");

    let before = interval(&mut tree, y);
    let mut node = tree.node(y).expect("load y");
    assert!(!tree.move_up(&mut node, Steps::Exact(0)).expect("move"));
    assert!(!tree.move_down(&mut node, Steps::Exact(0)).expect("move"));
    assert_eq!(interval(&mut tree, y), before);
}

#[test]
fn oversized_step_counts_clamp_to_the_outermost_sibling() {
    let mut tree = engine(TreeConfig::default());
    let p = insert(&mut tree, None, "p");
    let x = insert(&mut tree, Some(p), "x");
    insert(&mut tree, Some(p), "y");
    insert(&mut tree, Some(p), "z");

    let mut node = tree.node(x).expect("load x");
    assert!(tree.move_down(&mut node, Steps::Exact(10)).expect("move"));

    let children = tree.find_children(p, true).expect("children");
    let labels: Vec<&str> = children.iter().map(|row| row.label.as_str()).collect();
    assert_eq!(labels, ["y", "z", "x"]);
    assert_valid(&mut tree);
}

#[test]
fn extreme_moves_to_the_last_position() {
    let mut tree = engine(TreeConfig::default());
    let p = insert(&mut tree, None, "p");
    let x = insert(&mut tree, Some(p), "x");
    insert(&mut tree, Some(p), "y");
    insert(&mut tree, Some(p), "z");

    let mut node = tree.node(x).expect("load x");
    assert!(tree.move_down(&mut node, Steps::Extreme).expect("move"));

    let children = tree.find_children(p, true).expect("children");
    let labels: Vec<&str> = children.iter().map(|row| row.label.as_str()).collect();
    assert_eq!(labels, ["y", "z", "x"]);
    assert_valid(&mut tree);
}

#[test]
fn roots_reorder_among_themselves() {
    let mut tree = engine(TreeConfig::default());
    let x = insert(&mut tree, None, "x");
    insert(&mut tree, None, "y");

    let mut node = tree.node(x).expect("load x");
    assert!(tree.move_down(&mut node, Steps::Exact(1)).expect("move"));
    assert_eq!(interval(&mut tree, x), (3, 4));
    assert_valid(&mut tree);
}

#[test]
fn reparenting_moves_the_whole_subtree() {
    let mut tree = engine(TreeConfig::default());
    let a = insert(&mut tree, None, "a");
    let b = insert(&mut tree, Some(a), "b");
    let b1 = insert(&mut tree, Some(b), "b1");
    let c = insert(&mut tree, Some(a), "c");

    let mut node = tree.node(b).expect("load b");
    node.set_parent(Some(c));
    tree.save(&mut node).expect("reparent");

    let path = tree.find_path(b1).expect("path");
    let labels: Vec<&str> = path.iter().map(|row| row.label.as_str()).collect();
    assert_eq!(labels, ["a", "c", "b", "b1"]);
    assert_valid(&mut tree);

    // Move it back; the subtree shape survives the round trip.
    let mut node = tree.node(b).expect("reload b");
    node.set_parent(Some(a));
    tree.save(&mut node).expect("reparent back");
    let path = tree.find_path(b1).expect("path");
    let labels: Vec<&str> = path.iter().map(|row| row.label.as_str()).collect();
    assert_eq!(labels, ["a", "b", "b1"]);
    assert_valid(&mut tree);
}

#[test]
fn a_node_cannot_become_its_own_parent() {
    let mut tree = engine(TreeConfig::default());
    let a = insert(&mut tree, None, "a");
    let b = insert(&mut tree, Some(a), "b");

    let before = interval(&mut tree, b);
    let mut node = tree.node(b).expect("load b");
    node.set_parent(Some(b));
    let err = tree.save(&mut node).expect_err("self parent");
    assert!(matches!(err, TreeError::InvalidArgument(_)));
    assert_eq!(interval(&mut tree, b), before);
    assert_valid(&mut tree);
}

#[test]
fn a_node_cannot_move_under_its_own_descendant() {
    let mut tree = engine(TreeConfig::default());
    let a = insert(&mut tree, None, "a");
    let b = insert(&mut tree, Some(a), "b");
    let b1 = insert(&mut tree, Some(b), "b1");

    let before = interval(&mut tree, a);
    let mut node = tree.node(a).expect("load a");
    node.set_parent(Some(b1));
    let err = tree.save(&mut node).expect_err("descendant parent");
    assert!(matches!(err, TreeError::InvalidArgument(_)));
    assert_eq!(interval(&mut tree, a), before);
    assert_valid(&mut tree);
}

#[test]
fn deleting_a_subtree_closes_its_gap() {
    let mut tree = engine(TreeConfig::default());
    let a = insert(&mut tree, None, "a");
    let b = insert(&mut tree, Some(a), "b");
    insert(&mut tree, Some(b), "b1");
    let c = insert(&mut tree, Some(a), "c");

    let mut node = tree.node(b).expect("load b");
    tree.delete(&mut node).expect("delete subtree");

    assert!(matches!(
        tree.node(b).expect_err("b gone"),
        TreeError::NotFound(_)
    ));
    assert_eq!(interval(&mut tree, a), (1, 4));
    assert_eq!(interval(&mut tree, c), (2, 3));
    assert_valid(&mut tree);
}

#[test]
fn cascading_delete_matches_the_bulk_path() {
    let mut config = TreeConfig::default();
    config.cascade_callbacks = true;
    let mut tree = engine(config);
    let a = insert(&mut tree, None, "a");
    let b = insert(&mut tree, Some(a), "b");
    insert(&mut tree, Some(b), "b1");
    insert(&mut tree, Some(b), "b2");
    let c = insert(&mut tree, Some(a), "c");

    let mut node = tree.node(b).expect("load b");
    tree.delete(&mut node).expect("delete subtree");

    assert_eq!(interval(&mut tree, a), (1, 4));
    assert_eq!(interval(&mut tree, c), (2, 3));
    assert_valid(&mut tree);
}

#[test]
fn removing_a_leaf_makes_it_the_rightmost_root() {
    let mut tree = engine(TreeConfig::default());
    let a = insert(&mut tree, None, "a");
    let b = insert(&mut tree, Some(a), "b");
    let c = insert(&mut tree, Some(a), "c");

    let mut node = tree.node(b).expect("load b");
    tree.remove_from_tree(&mut node).expect("detach leaf");

    let detached = tree.node(b).expect("reload b");
    assert_eq!(detached.parent(), None);
    assert_eq!(interval(&mut tree, b), (5, 6));
    assert_eq!(interval(&mut tree, a), (1, 4));
    assert_eq!(interval(&mut tree, c), (2, 3));
    assert_valid(&mut tree);
}

#[test]
fn removing_an_inner_node_reattaches_its_children() {
    let mut tree = engine(TreeConfig::with_levels());
    let a = insert(&mut tree, None, "a");
    let b = insert(&mut tree, Some(a), "b");
    let b1 = insert(&mut tree, Some(b), "b1");
    let b2 = insert(&mut tree, Some(b), "b2");
    insert(&mut tree, Some(a), "c");

    let mut node = tree.node(b).expect("load b");
    tree.remove_from_tree(&mut node).expect("detach inner node");

    let children = tree.find_children(a, true).expect("children");
    let labels: Vec<&str> = children.iter().map(|row| row.label.as_str()).collect();
    assert_eq!(labels, ["b1", "b2", "c"]);

    let detached = tree.node(b).expect("reload b");
    assert_eq!(detached.parent(), None);
    assert_eq!(detached.level(), Some(0));
    assert_eq!(interval(&mut tree, b), (9, 10));
    assert_eq!(tree.node(b1).expect("b1").level(), Some(1));
    assert_eq!(tree.node(b2).expect("b2").level(), Some(1));
    assert_valid(&mut tree);
}

#[test]
fn levels_follow_the_node_through_moves() {
    let mut tree = engine(TreeConfig::with_levels());
    let a = insert(&mut tree, None, "a");
    let b = insert(&mut tree, Some(a), "b");
    let c = insert(&mut tree, Some(b), "c");
    let r2 = insert(&mut tree, None, "r2");

    assert_eq!(tree.node(a).expect("a").level(), Some(0));
    assert_eq!(tree.node(c).expect("c").level(), Some(2));
    assert_eq!(tree.get_level(c).expect("level"), 2);

    // Reparent the b subtree under the second root; every contained depth
    // follows.
    let mut node = tree.node(b).expect("load b");
    node.set_parent(Some(r2));
    tree.save(&mut node).expect("reparent");
    assert_eq!(tree.node(b).expect("b").level(), Some(1));
    assert_eq!(tree.node(c).expect("c").level(), Some(2));
    assert_valid(&mut tree);

    let mut node = tree.node(b).expect("reload b");
    node.set_parent(None);
    tree.save(&mut node).expect("promote to root");
    assert_eq!(tree.node(b).expect("b").level(), Some(0));
    assert_eq!(tree.node(c).expect("c").level(), Some(1));
    assert_valid(&mut tree);
}

#[test]
fn tree_list_indents_by_depth() {
    let mut tree = engine(TreeConfig::default());
    let a = insert(&mut tree, None, "a");
    let b = insert(&mut tree, Some(a), "b");
    let b1 = insert(&mut tree, Some(b), "b1");
    let c = insert(&mut tree, Some(a), "c");

    let list = tree.find_tree_list().expect("tree list");
    assert_eq!(
        list,
        vec![
            (a, "a".to_string()),
            (b, "_b".to_string()),
            (b1, "__b1".to_string()),
            (c, "_c".to_string()),
        ]
    );

    let dashed = tree.format_tree_list("--").expect("tree list");
    assert_eq!(dashed[2], (b1, "----b1".to_string()));
}

#[test]
fn recover_rebuilds_boundaries_from_adjacency_alone() {
    let mut store =
        SqliteStore::open_in_memory(TreeConfig::with_levels()).expect("open in-memory store");

    // Seed rows whose interval columns are garbage; only the parent column
    // carries the structure.
    let seed = |store: &mut SqliteStore, parent: Option<NodeId>, label: &str| {
        store
            .insert_node(&canopy::NewNode {
                parent,
                lft: 0,
                rght: 0,
                level: Some(-1),
                label: label.into(),
            })
            .expect("seed row")
    };
    let a = seed(&mut store, None, "a");
    let b = seed(&mut store, Some(a), "b");
    let b1 = seed(&mut store, Some(b), "b1");
    let c = seed(&mut store, Some(a), "c");
    let ids = [a, b, b1, c];

    let mut tree = TreeEngine::new(store);
    assert!(!tree.verify().expect("verify").success);

    tree.recover().expect("recover");
    assert_valid(&mut tree);
    assert_eq!(interval(&mut tree, a), (1, 8));

    // A second pass reproduces the exact same assignment.
    let first: Vec<(i64, i64)> = ids.iter().map(|id| interval(&mut tree, *id)).collect();
    tree.recover().expect("recover again");
    let second: Vec<(i64, i64)> = ids.iter().map(|id| interval(&mut tree, *id)).collect();
    assert_eq!(first, second);
    assert_valid(&mut tree);
}

#[test]
fn scoped_forests_never_interact() {
    let tmp = tempfile::NamedTempFile::new().expect("temp file");
    let forest = |value| TreeConfig::default().scoped_to("forest_id", value);

    let store_one = SqliteStore::open(tmp.path(), forest(1)).expect("store one");
    let store_two = SqliteStore::open(tmp.path(), forest(2)).expect("store two");
    let mut one = TreeEngine::new(store_one);
    let mut two = TreeEngine::new(store_two);

    let a = insert(&mut one, None, "a");
    let b = insert(&mut one, Some(a), "b");
    let x = insert(&mut two, None, "x");
    let y = insert(&mut two, Some(x), "y");

    // Each scope numbers from 1 independently.
    assert_eq!(interval(&mut one, a), (1, 4));
    assert_eq!(interval(&mut two, x), (1, 4));

    // Structural churn in one forest leaves the other untouched.
    let mut node = two.node(y).expect("load y");
    two.delete(&mut node).expect("delete");
    insert(&mut two, Some(x), "z");

    assert_eq!(interval(&mut one, a), (1, 4));
    assert_eq!(interval(&mut one, b), (2, 3));
    assert_valid(&mut one);
    assert_valid(&mut two);
}
