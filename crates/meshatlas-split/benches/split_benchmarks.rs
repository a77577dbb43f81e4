//! Split Benchmarks
//!
//! Throughput of the partition pipeline on synthetic atlases

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use meshatlas_assets::{FaceCorner, ObjFace, ObjMesh, ObjVertex, PlacedInstance, PlacementPlan};
use meshatlas_core::{AxisConvention, SplitConfig};
use meshatlas_split::{AdjacencyGraph, AtlasSplitter, Clusters};

/// `models` square patches of `side x side` vertices packed into a grid,
/// written with identity axes
fn synthetic_atlas(models: usize, side: usize) -> (ObjMesh, PlacementPlan) {
    let (cols, rows) = meshatlas_assets::grid_dimensions(models);
    let cell_size = side as f64 + 4.0;
    let mut mesh = ObjMesh::default();
    let mut layout = Vec::with_capacity(models);

    for m in 0..models {
        let col = m as u32 % cols;
        let row = m as u32 / cols;
        let origin = (col as f64 * cell_size, row as f64 * cell_size);
        let base = mesh.vertices.len() as u32;

        for j in 0..side {
            for i in 0..side {
                mesh.vertices.push(ObjVertex::new(glam::DVec3::new(
                    origin.0 + 2.0 + i as f64,
                    origin.1 + 2.0 + j as f64,
                    0.0,
                )));
            }
        }
        for j in 0..side - 1 {
            for i in 0..side - 1 {
                let v = base + (j * side + i) as u32;
                let s = side as u32;
                for tri in [[v, v + 1, v + s + 1], [v, v + s + 1, v + s]] {
                    mesh.faces.push(ObjFace {
                        corners: tri.iter().map(|&v| FaceCorner::vertex(v)).collect(),
                        material: None,
                        line: 0,
                    });
                }
            }
        }

        layout.push(PlacedInstance {
            name: format!("model_{}", m),
            index: m,
            col,
            row,
            cell_x: origin.0,
            cell_y: origin.1,
            offset_x: origin.0,
            offset_y: origin.1,
            offset_z: 0.0,
            bounds: None,
        });
    }

    let plan = PlacementPlan {
        cols,
        rows,
        cell_size,
        layout,
    };
    (mesh, plan)
}

fn bench_clusters(c: &mut Criterion) {
    let mut group = c.benchmark_group("cluster_extraction");

    for models in [4, 16, 64].iter() {
        let (mesh, _) = synthetic_atlas(*models, 50);
        group.bench_with_input(BenchmarkId::from_parameter(models), &mesh, |b, mesh| {
            b.iter(|| {
                let graph = AdjacencyGraph::build(mesh.vertex_count(), &mesh.faces);
                black_box(Clusters::extract(&graph))
            });
        });
    }

    group.finish();
}

fn bench_split(c: &mut Criterion) {
    let mut group = c.benchmark_group("split");
    let splitter = AtlasSplitter::new(SplitConfig {
        axes: AxisConvention::Identity,
        ..SplitConfig::default()
    })
    .expect("default config is valid");

    for models in [4, 16, 64].iter() {
        let (mesh, plan) = synthetic_atlas(*models, 50);
        group.bench_with_input(BenchmarkId::from_parameter(models), &(mesh, plan), |b, (mesh, plan)| {
            b.iter(|| black_box(splitter.split(mesh, plan).expect("synthetic atlas splits")));
        });
    }

    group.finish();
}

fn bench_parse(c: &mut Criterion) {
    let (mesh, _) = synthetic_atlas(16, 50);
    let text = mesh.to_string();

    c.bench_function("parse_atlas_16", |b| {
        b.iter(|| black_box(ObjMesh::parse(&text).expect("synthetic atlas parses")))
    });
}

criterion_group!(benches, bench_clusters, bench_split, bench_parse);
criterion_main!(benches);
