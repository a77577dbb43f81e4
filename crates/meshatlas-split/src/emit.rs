//! Mesh Emission
//!
//! Builds one standalone mesh per non-empty cell. Vertices are re-indexed
//! densely and moved back by the cell's placement offset. Texture coordinate
//! and normal records are shared by every cell, so each output carries all of
//! them at their original indices.

use ahash::AHashMap;
use indexmap::IndexSet;
use meshatlas_assets::{Cell, CellId, FaceCorner, ObjFace, ObjMesh, ObjVertex};
use meshatlas_core::SplitConfig;
use smallvec::SmallVec;

use crate::{SplitError, SplitResult};

/// One cell's extracted mesh
#[derive(Debug, Clone, PartialEq)]
pub struct CellMesh {
    /// Cell the mesh came from
    pub cell: CellId,
    /// Output name (cell name, or `<prefix>_<index>`)
    pub name: String,
    /// Name of the cell in the placement plan
    pub original_name: String,
    /// The extracted mesh, in the source model's local coordinates
    pub mesh: ObjMesh,
}

impl CellMesh {
    /// Material library file this mesh refers to, if any
    pub fn material_file_name(&self) -> Option<&str> {
        self.mesh.material_lib.as_deref()
    }
}

/// Extracts per-cell meshes from a fully tagged combined mesh
pub struct MeshEmitter<'a> {
    config: &'a SplitConfig,
    material_library: bool,
}

impl<'a> MeshEmitter<'a> {
    /// Create an emitter using the config's naming rules
    pub fn new(config: &'a SplitConfig) -> Self {
        Self {
            config,
            material_library: true,
        }
    }

    /// Whether outputs reference a `<name>.mtl` library when the source had one
    pub fn with_material_library(mut self, enabled: bool) -> Self {
        self.material_library = enabled;
        self
    }

    /// Emit every non-empty cell, in plan order.
    ///
    /// `cell_of` must tag every vertex and every face must lie in one cell.
    pub fn emit(&self, mesh: &ObjMesh, cells: &[Cell], cell_of: &[CellId]) -> SplitResult<Vec<CellMesh>> {
        mesh.validate()?;

        let mut vertices: Vec<Vec<u32>> = vec![Vec::new(); cells.len()];
        for (vertex, cell) in cell_of.iter().enumerate() {
            vertices[cell.index()].push(vertex as u32);
        }

        let mut faces: Vec<Vec<&ObjFace>> = vec![Vec::new(); cells.len()];
        for face in &mesh.faces {
            let first = face.corners[0].vertex;
            faces[cell_of[first as usize].index()].push(face);
        }

        let mut outputs = Vec::with_capacity(cells.len());
        for cell in cells {
            let members = &vertices[cell.id.index()];
            if members.is_empty() {
                log::warn!("Cell '{}' ({}) received no geometry, skipping", cell.name, cell.id);
                continue;
            }
            outputs.push(self.emit_cell(mesh, cell, members, &faces[cell.id.index()])?);
        }
        Ok(outputs)
    }

    fn emit_cell(&self, mesh: &ObjMesh, cell: &Cell, members: &[u32], faces: &[&ObjFace]) -> SplitResult<CellMesh> {
        let name = self.config.output_name(&cell.name, cell.id.index());

        let mut remap: AHashMap<u32, u32> = AHashMap::with_capacity(members.len());
        let mut out = ObjMesh {
            vertices: Vec::with_capacity(members.len()),
            tex_coords: mesh.tex_coords.clone(),
            normals: mesh.normals.clone(),
            faces: Vec::with_capacity(faces.len()),
            materials: IndexSet::new(),
            material_lib: None,
        };

        for &old in members {
            let source = &mesh.vertices[old as usize];
            remap.insert(old, out.vertices.len() as u32);
            out.vertices.push(ObjVertex {
                position: source.position - cell.offset,
                extra: source.extra.clone(),
            });
        }

        for face in faces {
            let corners = face
                .corners
                .iter()
                .map(|corner| {
                    remap.get(&corner.vertex).map(|&vertex| FaceCorner {
                        vertex,
                        ..*corner
                    })
                })
                .collect::<Option<SmallVec<[FaceCorner; 4]>>>()
                .ok_or(SplitError::ResidualInconsistency {
                    faces: 1,
                    first_line: face.line,
                })?;

            let material = mesh
                .material_name(face)
                .map(|material| out.materials.insert_full(material.to_string()).0 as u32);

            out.faces.push(ObjFace {
                corners,
                material,
                line: face.line,
            });
        }

        if self.material_library && mesh.material_lib.is_some() {
            out.material_lib = Some(format!("{}.mtl", name));
        }

        log::debug!(
            "Emitted '{}': {} vertices, {} faces, {} materials",
            name,
            out.vertex_count(),
            out.face_count(),
            out.materials.len()
        );

        Ok(CellMesh {
            cell: cell.id,
            name,
            original_name: cell.name.clone(),
            mesh: out,
        })
    }
}
