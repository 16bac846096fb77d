use criterion::{criterion_group, criterion_main, Criterion, black_box};

use occugrid::grid::{BufferBuilder, GridConfig, GridInfo, GridMessage, Rgba, ScaledColor};
use occugrid::render::{CpuBackend, OccupancyGridNode};

/// Deterministic mix of free, occupied and unknown cells.
fn create_test_grid(width: u32, height: u32) -> GridMessage {
    let data = (0..width * height)
        .map(|i| match i % 7 {
            0 => -1,
            1 | 2 => 100,
            n => (n as i8) * 15,
        })
        .collect();
    GridMessage::new(GridInfo::new(width, height, 0.05), data)
}

fn bench_build_buffers_256(c: &mut Criterion) {
    let grid = create_test_grid(256, 256);
    let builder = BufferBuilder::new(256, 256, GridConfig::default());
    let style = ScaledColor::new(Rgba::WHITE);

    c.bench_function("build_buffers_256", |b| {
        b.iter(|| builder.build(black_box(&grid.data), &style))
    });
}

fn bench_rewrite_cells_512(c: &mut Criterion) {
    let grid = create_test_grid(512, 512);
    let builder = BufferBuilder::new(512, 512, GridConfig::default());
    let style = ScaledColor::new(Rgba::WHITE);
    let (mut buffers, mut pool, _) = builder
        .build(&grid.data, &style)
        .expect("test grid builds");

    c.bench_function("rewrite_cells_512", |b| {
        b.iter(|| builder.write_cells(black_box(&grid.data), &style, &mut buffers, &mut pool))
    });
}

fn bench_node_update_flush_256(c: &mut Criterion) {
    let grid = create_test_grid(256, 256);
    let mut node = OccupancyGridNode::new(CpuBackend::new(), &grid, GridConfig::default())
        .expect("test grid builds a node");

    c.bench_function("node_update_flush_256", |b| {
        b.iter(|| {
            node.update(black_box(&grid)).expect("same-size update");
            node.flush_uploads().expect("node is live")
        })
    });
}

criterion_group!(
    benches,
    bench_build_buffers_256,
    bench_rewrite_cells_512,
    bench_node_update_flush_256,
);
criterion_main!(benches);
