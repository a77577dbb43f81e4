//! Output Writing
//!
//! Writes each cell mesh to `<dir>/<name>.obj` plus a copy of the shared
//! material library as `<dir>/<name>.mtl`. A failed write only loses that
//! cell; the rest of the batch still completes.

use std::path::{Path, PathBuf};

use meshatlas_assets::{ObjMesh, is_file_name};
use rayon::prelude::*;
use serde::Serialize;

use crate::{SplitError, SplitResult};
use crate::emit::CellMesh;

/// One written cell
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitOutput {
    /// Output name
    pub name: String,
    /// Cell name in the placement plan
    pub original_name: String,
    /// Path of the written mesh
    pub mesh_path: PathBuf,
    /// Path of the copied material library, if one was written
    pub material_path: Option<PathBuf>,
    /// Cell index in the placement plan
    pub index: usize,
    /// Vertices written
    pub vertex_count: usize,
    /// Faces written
    pub face_count: usize,
}

/// A cell whose files could not be written
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CellFailure {
    pub name: String,
    pub index: usize,
    pub error: String,
}

/// Result of writing a split to disk
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitReport {
    /// Cells written, in plan order
    pub outputs: Vec<SplitOutput>,
    /// Cells that failed to write
    pub failures: Vec<CellFailure>,
    /// Plan cells that received no geometry
    pub skipped: Vec<String>,
}

impl SplitReport {
    /// True when every non-empty cell was written
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Vertices written across all outputs
    pub fn total_vertices(&self) -> usize {
        self.outputs.iter().map(|o| o.vertex_count).sum()
    }

    /// Faces written across all outputs
    pub fn total_faces(&self) -> usize {
        self.outputs.iter().map(|o| o.face_count).sum()
    }
}

/// Writes cell meshes into one output directory
#[derive(Debug)]
pub struct OutputWriter {
    dir: PathBuf,
    material: Option<Vec<u8>>,
    parallel: bool,
}

impl OutputWriter {
    /// Create the output directory if needed
    pub fn new(dir: impl Into<PathBuf>) -> SplitResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            material: None,
            parallel: true,
        })
    }

    /// Material library contents copied next to every output that references one
    pub fn with_material(mut self, material: Option<Vec<u8>>) -> Self {
        self.material = material;
        self
    }

    /// Write cells on the rayon pool instead of one after another
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Output directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write every cell, collecting per-cell failures instead of stopping
    pub fn write_all(&self, meshes: &[CellMesh]) -> SplitReport {
        let results: Vec<(&CellMesh, SplitResult<SplitOutput>)> = if self.parallel {
            meshes.par_iter().map(|mesh| (mesh, self.write_cell(mesh))).collect()
        } else {
            meshes.iter().map(|mesh| (mesh, self.write_cell(mesh))).collect()
        };

        let mut report = SplitReport::default();
        for (mesh, result) in results {
            match result {
                Ok(output) => report.outputs.push(output),
                Err(e) => {
                    log::error!("Failed to write '{}': {}", mesh.name, e);
                    report.failures.push(CellFailure {
                        name: mesh.name.clone(),
                        index: mesh.cell.index(),
                        error: e.to_string(),
                    });
                }
            }
        }
        report
    }

    /// Write one cell's mesh and material library
    pub fn write_cell(&self, mesh: &CellMesh) -> SplitResult<SplitOutput> {
        if !is_file_name(&mesh.name) {
            return Err(SplitError::InvalidOutputName(mesh.name.clone()));
        }
        let mesh_path = self.dir.join(format!("{}.obj", mesh.name));
        mesh.mesh.write_file(&mesh_path)?;

        let material_path = match (mesh.material_file_name(), &self.material) {
            (Some(file_name), Some(bytes)) => {
                let path = self.dir.join(file_name);
                if let Err(e) = std::fs::write(&path, bytes) {
                    // A mesh without its material library is not a usable output
                    let _ = std::fs::remove_file(&mesh_path);
                    return Err(e.into());
                }
                Some(path)
            }
            _ => None,
        };

        log::info!("Wrote {}", mesh_path.display());
        Ok(SplitOutput {
            name: mesh.name.clone(),
            original_name: mesh.original_name.clone(),
            mesh_path,
            material_path,
            index: mesh.cell.index(),
            vertex_count: mesh.mesh.vertex_count(),
            face_count: mesh.mesh.face_count(),
        })
    }
}

/// Read the material library a mesh names, resolved next to the mesh file.
///
/// Returns `None` (with a warning) when the mesh names no library or the file
/// cannot be read; outputs are then written without one.
pub fn load_material_library(mesh_path: &Path, mesh: &ObjMesh) -> Option<Vec<u8>> {
    let name = mesh.material_lib.as_deref()?;
    let path = mesh_path.parent().unwrap_or(Path::new("")).join(name);
    match std::fs::read(&path) {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            log::warn!(
                "Material library {} could not be read ({}); outputs will have no materials file",
                path.display(),
                e
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshatlas_assets::CellId;

    fn cell_mesh(name: &str, index: u32, with_lib: bool) -> CellMesh {
        let mut mesh = ObjMesh::parse("v 0 0 0\nv 1 0 0\nv 0 1 0\nusemtl red\nf 1 2 3\n").unwrap();
        if with_lib {
            mesh.material_lib = Some(format!("{}.mtl", name));
        }
        CellMesh {
            cell: CellId(index),
            name: name.to_string(),
            original_name: format!("model_{}", index),
            mesh,
        }
    }

    #[test]
    fn test_write_cells_with_material() {
        let dir = std::env::temp_dir().join("meshatlas_output_write_test");
        let _ = std::fs::remove_dir_all(&dir);

        let writer = OutputWriter::new(&dir)
            .unwrap()
            .with_material(Some(b"newmtl red\nKd 1 0 0\n".to_vec()));
        let report = writer.write_all(&[cell_mesh("a", 0, true), cell_mesh("b", 1, false)]);

        assert!(report.is_complete());
        assert_eq!(report.outputs.len(), 2);
        assert_eq!(report.total_vertices(), 6);
        assert_eq!(report.total_faces(), 2);

        let a = &report.outputs[0];
        assert_eq!(a.original_name, "model_0");
        assert_eq!(a.material_path, Some(dir.join("a.mtl")));
        let material = std::fs::read_to_string(dir.join("a.mtl")).unwrap();
        assert!(material.contains("newmtl red"));
        assert!(report.outputs[1].material_path.is_none());

        let written = ObjMesh::from_path(&a.mesh_path).unwrap();
        assert_eq!(written.material_lib.as_deref(), Some("a.mtl"));
        assert_eq!(written.face_count(), 1);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_one_failed_cell_does_not_stop_the_rest() {
        let dir = std::env::temp_dir().join("meshatlas_output_failure_test");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(dir.join("blocked.obj")).unwrap();

        let writer = OutputWriter::new(&dir).unwrap().with_parallel(false);
        let report = writer.write_all(&[cell_mesh("blocked", 0, false), cell_mesh("fine", 1, false)]);

        assert!(!report.is_complete());
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].name, "blocked");
        assert_eq!(report.outputs.len(), 1);
        assert!(dir.join("fine.obj").is_file());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_names_that_leave_the_directory_are_refused() {
        let dir = std::env::temp_dir().join("meshatlas_output_escape_test");
        let _ = std::fs::remove_dir_all(&dir);
        let out = dir.join("out");

        let writer = OutputWriter::new(&out).unwrap().with_parallel(false);
        let report = writer.write_all(&[cell_mesh("../escaped", 0, false), cell_mesh("kept", 1, false)]);

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].name, "../escaped");
        assert!(!dir.join("escaped.obj").exists());
        assert!(out.join("kept.obj").is_file());
        assert!(matches!(
            writer.write_cell(&cell_mesh("..", 2, false)),
            Err(SplitError::InvalidOutputName(_))
        ));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_failed_material_write_removes_the_mesh() {
        let dir = std::env::temp_dir().join("meshatlas_output_material_failure_test");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(dir.join("a.mtl")).unwrap();

        let writer = OutputWriter::new(&dir)
            .unwrap()
            .with_material(Some(b"newmtl red\n".to_vec()));
        let report = writer.write_all(&[cell_mesh("a", 0, true)]);

        assert_eq!(report.failures.len(), 1);
        assert!(report.outputs.is_empty());
        assert!(!dir.join("a.obj").exists());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_report_serializes_output_records() {
        let report = SplitReport {
            outputs: vec![SplitOutput {
                name: "crate_0".to_string(),
                original_name: "crate_small".to_string(),
                mesh_path: PathBuf::from("out/crate_0.obj"),
                material_path: None,
                index: 0,
                vertex_count: 8,
                face_count: 6,
            }],
            failures: Vec::new(),
            skipped: vec!["crate_large".to_string()],
        };

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["outputs"][0]["originalName"], "crate_small");
        assert_eq!(value["outputs"][0]["meshPath"], "out/crate_0.obj");
        assert!(value["outputs"][0]["materialPath"].is_null());
        assert_eq!(value["skipped"][0], "crate_large");
    }

    #[test]
    fn test_load_material_library() {
        let dir = std::env::temp_dir().join("meshatlas_output_material_test");
        let _ = std::fs::create_dir_all(&dir);
        std::fs::write(dir.join("combined.mtl"), "newmtl red\n").unwrap();

        let mut mesh = ObjMesh::default();
        assert!(load_material_library(&dir.join("combined.obj"), &mesh).is_none());

        mesh.material_lib = Some("combined.mtl".to_string());
        assert_eq!(
            load_material_library(&dir.join("combined.obj"), &mesh),
            Some(b"newmtl red\n".to_vec())
        );

        mesh.material_lib = Some("missing.mtl".to_string());
        assert!(load_material_library(&dir.join("combined.obj"), &mesh).is_none());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
