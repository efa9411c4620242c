use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use glam::Vec3;
use scene::{effective_scale, flatten, HierarchyProvider, Operation, SceneGraph, ShapeNode, ShapeType, Transform};

/// Balanced tree of shapes, `fanout` children per node, `depth` levels, with
/// `roots` independent trees.
fn build_scene(roots: usize, fanout: usize, depth: usize) -> SceneGraph {
    let mut graph = SceneGraph::new();
    for r in 0..roots {
        let op = Operation::ALL[r % Operation::ALL.len()];
        let root = graph.spawn_shape(
            format!("root{r}"),
            Transform::from_position(Vec3::new(r as f32, 0.0, 0.0)),
            ShapeNode::new(ShapeType::Sphere).with_operation(op),
        );
        let mut frontier = vec![root];
        for level in 0..depth {
            let mut next = Vec::new();
            for parent in frontier {
                for c in 0..fanout {
                    let shape = ShapeNode::new(ShapeType::ALL[(level + c) % ShapeType::ALL.len()])
                        .with_operation(Operation::Blend)
                        .with_blend_strength(0.3);
                    if let Ok(child) = graph.spawn_child(
                        parent,
                        format!("n{level}-{c}"),
                        Transform::IDENTITY.with_scale(Vec3::splat(0.9)),
                        Some(shape),
                    ) {
                        next.push(child);
                    }
                }
            }
            frontier = next;
        }
    }
    graph
}

fn bench_flatten(c: &mut Criterion) {
    let mut group = c.benchmark_group("flatten");
    for (roots, fanout, depth) in [(8, 3, 3), (32, 4, 3), (64, 2, 6)] {
        let graph = build_scene(roots, fanout, depth);
        let id = BenchmarkId::from_parameter(graph.shape_nodes().len());
        group.bench_with_input(id, &graph, |b, graph| b.iter(|| flatten(black_box(graph))));
    }
    group.finish();
}

fn bench_effective_scale(c: &mut Criterion) {
    let graph = build_scene(16, 3, 4);
    let nodes = graph.shape_nodes();
    c.bench_function("effective_scale_all", |b| {
        b.iter(|| {
            nodes
                .iter()
                .map(|&n| effective_scale(&graph, n))
                .fold(Vec3::ZERO, |acc, s| acc + s)
        });
    });
}

criterion_group!(benches, bench_flatten, bench_effective_scale);
criterion_main!(benches);
