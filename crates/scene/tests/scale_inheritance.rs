use glam::Vec3;
use scene::{
    effective_scale, set_scale, CacheState, HierarchyProvider, SceneGraph, ScaleWrite, ShapeNode,
    ShapeType, Transform,
};

fn scaled(x: f32, y: f32, z: f32) -> Transform {
    Transform::IDENTITY.with_scale(Vec3::new(x, y, z))
}

fn sphere() -> ShapeNode {
    ShapeNode::new(ShapeType::Sphere)
}

#[test]
fn root_shape_uses_local_scale() {
    let mut graph = SceneGraph::new();
    let node = graph.spawn_shape("root", scaled(1.0, 2.0, 3.0), sphere());
    assert_eq!(effective_scale(&graph, node), Vec3::new(1.0, 2.0, 3.0));
}

#[test]
fn scale_multiplies_down_shape_ancestors() {
    let mut graph = SceneGraph::new();
    let a = graph.spawn_shape("a", scaled(2.0, 1.0, 1.0), sphere());
    let b = graph.spawn_child(a, "b", scaled(1.0, 3.0, 1.0), Some(sphere())).unwrap();
    let c = graph.spawn_child(b, "c", scaled(1.0, 1.0, 4.0), Some(sphere())).unwrap();

    assert_eq!(effective_scale(&graph, b), Vec3::new(2.0, 3.0, 1.0));
    assert_eq!(effective_scale(&graph, c), Vec3::new(2.0, 3.0, 4.0));
}

#[test]
fn plain_ancestors_do_not_contribute() {
    let mut graph = SceneGraph::new();
    let shape_root = graph.spawn_shape("shape", scaled(2.0, 2.0, 2.0), sphere());
    let plain = graph
        .spawn_child(shape_root, "plain", scaled(10.0, 10.0, 10.0), None)
        .unwrap();
    let leaf = graph
        .spawn_child(plain, "leaf", scaled(0.5, 1.0, 1.0), Some(sphere()))
        .unwrap();

    assert_eq!(graph.shape_parent(leaf), Some(shape_root));
    assert_eq!(effective_scale(&graph, leaf), Vec3::new(1.0, 2.0, 2.0));
}

#[test]
fn contribution_is_cached_until_invalidated() {
    let mut graph = SceneGraph::new();
    let parent = graph.spawn_shape("parent", scaled(2.0, 2.0, 2.0), sphere());
    let child = graph.spawn_child(parent, "child", scaled(1.0, 1.0, 1.0), Some(sphere())).unwrap();
    assert_eq!(effective_scale(&graph, child), Vec3::splat(2.0));

    graph.transform_mut(parent).unwrap().scale = Vec3::splat(5.0);
    assert_eq!(effective_scale(&graph, child), Vec3::splat(2.0));
}

#[test]
fn parent_loss_is_noticed_on_write_not_read() {
    let mut graph = SceneGraph::new();
    let parent = graph.spawn_shape("parent", scaled(2.0, 2.0, 2.0), sphere());
    let child = graph.spawn_child(parent, "child", scaled(1.0, 1.0, 1.0), Some(sphere())).unwrap();
    assert_eq!(effective_scale(&graph, child), Vec3::splat(2.0));

    graph.set_parent(child, None).unwrap();
    // Stale until a write notices.
    assert_eq!(effective_scale(&graph, child), Vec3::splat(2.0));
    assert!(graph.shape(child).unwrap().scale_cache().has_parent());

    assert_eq!(set_scale(&mut graph, child, Vec3::splat(3.0)), ScaleWrite::Applied);
    let cache = graph.shape(child).unwrap().scale_cache();
    assert_eq!(cache.state(), CacheState::Dirty);
    assert!(!cache.has_parent());
    assert_eq!(graph.local_transform(child).scale, Vec3::splat(3.0));

    assert_eq!(effective_scale(&graph, child), Vec3::splat(3.0));
    assert_eq!(graph.shape(child).unwrap().scale_cache().state(), CacheState::Clean);
}

#[test]
fn removing_the_parent_shape_counts_as_loss() {
    let mut graph = SceneGraph::new();
    let parent = graph.spawn_shape("parent", scaled(2.0, 2.0, 2.0), sphere());
    let child = graph.spawn_child(parent, "child", scaled(1.0, 1.0, 1.0), Some(sphere())).unwrap();
    assert_eq!(set_scale(&mut graph, child, Vec3::splat(7.0)), ScaleWrite::Ignored);

    graph.remove_shape(parent).unwrap();
    assert_eq!(set_scale(&mut graph, child, Vec3::splat(7.0)), ScaleWrite::Applied);
    assert_eq!(effective_scale(&graph, child), Vec3::splat(7.0));
}

#[test]
fn fresh_root_shape_accepts_writes() {
    let mut graph = SceneGraph::new();
    let node = graph.spawn_shape("root", scaled(1.0, 1.0, 1.0), sphere());
    assert_eq!(set_scale(&mut graph, node, Vec3::new(1.0, 2.0, 1.0)), ScaleWrite::Applied);
    assert_eq!(effective_scale(&graph, node), Vec3::new(1.0, 2.0, 1.0));
}

#[test]
fn adopted_root_ignores_writes_after_a_read() {
    let mut graph = SceneGraph::new();
    let adopter = graph.spawn_shape("adopter", scaled(2.0, 2.0, 2.0), sphere());
    let node = graph.spawn_shape("node", scaled(1.0, 1.0, 1.0), sphere());
    assert_eq!(effective_scale(&graph, node), Vec3::ONE);

    graph.set_parent(node, Some(adopter)).unwrap();
    assert_eq!(set_scale(&mut graph, node, Vec3::splat(9.0)), ScaleWrite::Ignored);
    assert_eq!(graph.local_transform(node).scale, Vec3::ONE);
}

#[test]
fn orphan_adopted_before_any_read_ignores_writes() {
    let mut graph = SceneGraph::new();
    let adopter = graph.spawn_shape("adopter", scaled(2.0, 2.0, 2.0), sphere());
    let node = graph.spawn_shape("node", scaled(1.0, 1.0, 1.0), sphere());
    assert_eq!(set_scale(&mut graph, node, Vec3::splat(3.0)), ScaleWrite::Applied);
    assert!(!graph.shape(node).unwrap().scale_cache().has_parent());

    graph.set_parent(node, Some(adopter)).unwrap();
    assert_eq!(set_scale(&mut graph, node, Vec3::splat(9.0)), ScaleWrite::Ignored);
    assert_eq!(graph.local_transform(node).scale, Vec3::splat(3.0));
}
