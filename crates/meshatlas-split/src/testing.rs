//! Fixtures shared by the unit tests: regular cell grids, flat patch models
//! and an assembler that packs models into a combined mesh the way the atlas
//! builder does.

use glam::{DVec2, DVec3};
use indexmap::IndexSet;
use meshatlas_assets::{Cell, CellId, FaceCorner, ObjFace, ObjMesh, ObjVertex, PlacementPlan, SourceInstance};
use meshatlas_core::{Aabb3, AxisConvention, Rect2};
use smallvec::smallvec;

/// `cols x rows` square cells with zero offsets, named `cell_<col>_<row>`
pub fn grid_cells(cols: u32, rows: u32, cell_size: f64) -> Vec<Cell> {
    let mut cells = Vec::new();
    for row in 0..rows {
        for col in 0..cols {
            let origin = DVec2::new(col as f64 * cell_size, row as f64 * cell_size);
            cells.push(Cell {
                id: CellId(cells.len() as u32),
                name: format!("cell_{}_{}", col, row),
                col,
                row,
                footprint: Rect2::from_origin_size(origin, cell_size),
                offset: DVec3::ZERO,
            });
        }
    }
    cells
}

/// A connected `cols x rows` vertex grid of quads on the source X/Y plane,
/// with one texture coordinate per vertex, one shared normal and a single
/// material.
pub fn patch(cols: usize, rows: usize, spacing: f64, material: &str, axes: AxisConvention) -> ObjMesh {
    let mut mesh = ObjMesh::default();
    mesh.normals.push("vn 0 1 0".to_string());
    mesh.materials.insert(material.to_string());

    for j in 0..rows {
        for i in 0..cols {
            let source = DVec3::new(i as f64 * spacing, j as f64 * spacing, (i + j) as f64 * 0.5);
            mesh.vertices.push(ObjVertex::new(axes.to_mesh(source)));
            mesh.tex_coords
                .push(format!("vt {} {}", i as f64 / cols as f64, j as f64 / rows as f64));
        }
    }

    let index = |i: usize, j: usize| (j * cols + i) as u32;
    for j in 0..rows.saturating_sub(1) {
        for i in 0..cols.saturating_sub(1) {
            let corner = |v: u32| FaceCorner {
                vertex: v,
                tex_coord: Some(v),
                normal: Some(0),
            };
            mesh.faces.push(ObjFace {
                corners: smallvec![
                    corner(index(i, j)),
                    corner(index(i + 1, j)),
                    corner(index(i + 1, j + 1)),
                    corner(index(i, j + 1)),
                ],
                material: Some(0),
                line: 0,
            });
        }
    }

    mesh
}

/// Source-space bounds of a model, as handed to the assembler
pub fn source_instance(name: &str, mesh: &ObjMesh, axes: AxisConvention) -> SourceInstance {
    SourceInstance {
        name: name.to_string(),
        bounds: Aabb3::from_points(mesh.vertices.iter().map(|v| axes.to_source(v.position))),
    }
}

/// Pack models into one combined mesh at the plan's offsets
pub fn assemble(models: &[ObjMesh], plan: &PlacementPlan, axes: AxisConvention) -> ObjMesh {
    let mut combined = ObjMesh::default();
    let mut materials: IndexSet<String> = IndexSet::new();

    for (model, placed) in models.iter().zip(&plan.layout) {
        let offset = axes.to_mesh(placed.offset());
        let vertex_base = combined.vertices.len() as u32;
        let tex_base = combined.tex_coords.len() as u32;
        let normal_base = combined.normals.len() as u32;

        combined.vertices.extend(model.vertices.iter().map(|v| ObjVertex {
            position: v.position + offset,
            extra: v.extra.clone(),
        }));
        combined.tex_coords.extend(model.tex_coords.iter().cloned());
        combined.normals.extend(model.normals.iter().cloned());

        for face in &model.faces {
            let material = model
                .material_name(face)
                .map(|name| materials.insert_full(name.to_string()).0 as u32);
            combined.faces.push(ObjFace {
                corners: face
                    .corners
                    .iter()
                    .map(|c| FaceCorner {
                        vertex: c.vertex + vertex_base,
                        tex_coord: c.tex_coord.map(|t| t + tex_base),
                        normal: c.normal.map(|n| n + normal_base),
                    })
                    .collect(),
                material,
                line: 0,
            });
        }
    }

    if !materials.is_empty() {
        combined.material_lib = Some("combined.mtl".to_string());
    }
    combined.materials = materials;
    combined
}
