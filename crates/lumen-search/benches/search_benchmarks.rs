//! Path search and game-tree benchmarks.
//!
//! Grid searches run on an open grid with a serpentine wall pattern, the
//! shape tower-defense maps tend to have. The connect-four benchmark times a
//! single computer move at a few search depths.
//!
//! Run with: `cargo bench --bench search_benchmarks`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use lumen_search::prelude::*;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Every fourth column is a wall with a gap alternating between the top and
/// bottom rows.
fn serpentine(size: usize) -> (GridLayout, WeightedGraph, Graph) {
    let layout = GridLayout::new(size, size);
    let blocked = |x: usize, y: usize| {
        x % 4 == 2 && if (x / 4) % 2 == 0 { y != size - 1 } else { y != 0 }
    };
    (
        layout,
        WeightedGraph::grid(layout, blocked),
        Graph::grid(layout, blocked),
    )
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

fn bench_grid_searches(c: &mut Criterion) {
    let mut group = c.benchmark_group("grid_search");
    for size in [16usize, 32, 64] {
        let (layout, weighted, graph) = serpentine(size);
        let start = layout.node(0, 0);
        let goal = layout.node(size - 1, size - 1);

        group.bench_with_input(BenchmarkId::new("bfs", size), &size, |b, _| {
            b.iter(|| black_box(bfs(&graph, start, goal).found));
        });
        group.bench_with_input(BenchmarkId::new("astar_manhattan", size), &size, |b, _| {
            b.iter(|| {
                let map = astar(&weighted, start, goal, |a: NodeId, g: NodeId| {
                    layout.manhattan(a, g)
                });
                black_box(map.found)
            });
        });
        group.bench_with_input(BenchmarkId::new("gbfs_manhattan", size), &size, |b, _| {
            b.iter(|| {
                let map = gbfs(&weighted, start, goal, |a: NodeId, g: NodeId| {
                    layout.manhattan(a, g)
                });
                black_box(map.found)
            });
        });
        group.bench_with_input(BenchmarkId::new("dijkstra", size), &size, |b, _| {
            b.iter(|| black_box(dijkstra(&weighted, start).visited()));
        });
    }
    group.finish();
}

fn bench_connect_four(c: &mut Criterion) {
    let mut group = c.benchmark_group("connect_four_cpu_move");
    group.sample_size(10);
    let mut opening = ConnectFour::new();
    opening.try_player_move(3);
    for depth in [2u32, 4, 6] {
        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, &depth| {
            b.iter(|| {
                let mut board = opening;
                black_box(board.cpu_move_with_depth(depth))
            });
        });
    }
    group.finish();
}

// ---------------------------------------------------------------------------
// Criterion groups and main
// ---------------------------------------------------------------------------

criterion_group!(benches, bench_grid_searches, bench_connect_four);
criterion_main!(benches);
