use approx::assert_relative_eq;
use cgmath::{Matrix4, SquareMatrix, Vector3};
use lumen_ngin::{
    data_structures::scene_graph::{Node, NodeKind, SceneGraph},
    math,
};

fn group(graph: &mut SceneGraph, name: &str) -> lumen_ngin::data_structures::scene_graph::NodeId {
    graph.add_group(name)
}

#[test]
fn global_matrix_is_product_of_ancestors_outermost_first() {
    let mut graph = SceneGraph::new();
    let root = group(&mut graph, "root");
    let a = graph.insert_child(root, Node::new(NodeKind::Group)).unwrap();
    let b = graph.insert_child(a, Node::new(NodeKind::Group)).unwrap();

    let root_m = math::translation(1.0, 0.0, 0.0);
    let a_m = math::rotation_y(0.7);
    let b_m = math::scale(3.0) * math::translation(0.0, 2.0, 0.0);
    graph.set_local_matrix(root, root_m);
    graph.set_local_matrix(a, a_m);
    graph.set_local_matrix(b, b_m);

    assert_relative_eq!(graph.global_matrix(b), root_m * a_m * b_m, epsilon = 1e-6);
}

#[test]
fn reparenting_moves_the_node_between_child_lists() {
    let mut graph = SceneGraph::new();
    let first = group(&mut graph, "first");
    let second = group(&mut graph, "second");
    let child = graph.insert_child(first, Node::new(NodeKind::Group)).unwrap();

    graph.attach(second, child).unwrap();

    assert!(graph.children(first).is_empty());
    assert_eq!(graph.children(second), &[child]);
    assert_eq!(graph.parent(child), Some(second));
}

#[test]
fn attaching_under_a_descendant_is_rejected() {
    let mut graph = SceneGraph::new();
    let root = group(&mut graph, "root");
    let child = graph.insert_child(root, Node::new(NodeKind::Group)).unwrap();
    let grandchild = graph.insert_child(child, Node::new(NodeKind::Group)).unwrap();

    assert!(graph.attach(grandchild, root).is_err());
    assert!(graph.attach(root, root).is_err());
    assert_eq!(graph.parent(child), Some(root));
}

#[test]
fn remove_child_checks_the_parent() {
    let mut graph = SceneGraph::new();
    let root = group(&mut graph, "root");
    let other = group(&mut graph, "other");
    let child = graph.insert_child(root, Node::new(NodeKind::Group)).unwrap();

    assert!(graph.remove_child(other, child).is_err());
    graph.remove_child(root, child).unwrap();

    assert_eq!(graph.parent(child), None);
    assert!(graph.children(root).is_empty());
    assert!(graph.contains(child));
}

#[test]
fn descendants_are_listed_in_pre_order() {
    let mut graph = SceneGraph::new();
    let root = group(&mut graph, "root");
    let a = graph.insert_child(root, Node::new(NodeKind::Group)).unwrap();
    let a1 = graph.insert_child(a, Node::new(NodeKind::Group)).unwrap();
    let b = graph.insert_child(root, Node::new(NodeKind::Group)).unwrap();

    assert_eq!(graph.descendants(root), vec![root, a, a1, b]);
}

#[test]
fn despawn_removes_the_subtree() {
    let mut graph = SceneGraph::new();
    let root = group(&mut graph, "root");
    let a = graph.insert_child(root, Node::new(NodeKind::Group)).unwrap();
    let a1 = graph.insert_child(a, Node::new(NodeKind::Group)).unwrap();

    graph.despawn(a);

    assert!(!graph.contains(a));
    assert!(!graph.contains(a1));
    assert_eq!(graph.descendants(root), vec![root]);
    assert!(graph.global_matrix(a1).is_identity());
}

#[test]
fn look_at_is_idempotent_and_keeps_position() {
    let mut graph = SceneGraph::new();
    let root = group(&mut graph, "root");
    graph.set_local_matrix(root, math::translation(0.0, 1.0, 0.0) * math::rotation_y(0.4));
    let node = graph.insert_child(root, Node::new(NodeKind::Group)).unwrap();
    graph.set_position(node, 2.0, 0.0, 3.0);
    let target = Vector3::new(-1.0, 0.5, -2.0);

    let before = graph.global_position(node);
    graph.look_at(node, target);
    let once: Matrix4<f32> = graph.local_matrix(node);
    graph.look_at(node, target);

    assert_relative_eq!(graph.local_matrix(node), once, epsilon = 1e-5);
    assert_relative_eq!(graph.global_position(node), before, epsilon = 1e-5);
    assert_relative_eq!(
        graph.direction(node),
        cgmath::InnerSpace::normalize(target - before),
        epsilon = 1e-5
    );
}

#[test]
fn set_direction_points_forward_axis() {
    let mut graph = SceneGraph::new();
    let node = group(&mut graph, "light");
    graph.set_position(node, 0.0, 5.0, 0.0);

    graph.set_direction(node, Vector3::new(1.0, 0.0, 0.0));

    assert_relative_eq!(graph.direction(node), Vector3::new(1.0, 0.0, 0.0), epsilon = 1e-5);
    assert_relative_eq!(graph.global_position(node), Vector3::new(0.0, 5.0, 0.0));
}

#[test]
fn local_transforms_compose_in_object_or_parent_space() {
    let mut graph = SceneGraph::new();
    let node = group(&mut graph, "node");
    graph.rotate_y(node, std::f32::consts::FRAC_PI_2, true);

    graph.translate(node, 0.0, 0.0, -1.0, true);
    assert_relative_eq!(graph.position(node), Vector3::new(-1.0, 0.0, 0.0), epsilon = 1e-6);

    graph.translate(node, 0.0, 0.0, -1.0, false);
    assert_relative_eq!(graph.position(node), Vector3::new(-1.0, 0.0, -1.0), epsilon = 1e-6);
}
