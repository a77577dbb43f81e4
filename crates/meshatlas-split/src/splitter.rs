//! The split pipeline
//!
//! Parse, build connectivity, extract clusters, vote each cluster into a
//! cell, reconcile fragments, heal boundary faces, then emit one mesh per
//! non-empty cell. All state lives in the call, so independent splits can run
//! concurrently.

use std::path::Path;

use ahash::AHashSet;
use glam::DVec2;
use meshatlas_assets::{Cell, CellId, ObjMesh, PlacementPlan};
use meshatlas_core::{CancelToken, SplitConfig};

use crate::classify::CellClassifier;
use crate::cluster::Clusters;
use crate::emit::{CellMesh, MeshEmitter};
use crate::fragment::FragmentReconciler;
use crate::graph::AdjacencyGraph;
use crate::heal::BoundaryHealer;
use crate::output::{OutputWriter, SplitReport, load_material_library};
use crate::{SplitError, SplitResult};

/// Counters gathered while partitioning
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PartitionStats {
    pub vertices: usize,
    pub faces: usize,
    pub edges: usize,
    pub clusters: usize,
    pub fragment_threshold: f64,
    pub fragments: usize,
    pub reassigned: usize,
    pub unvoted: usize,
    pub healed_faces: usize,
}

/// Every vertex tagged with exactly one cell, and every face inside one cell
#[derive(Debug, Clone)]
pub struct Partition {
    /// Cells resolved from the plan, in plan order
    pub cells: Vec<Cell>,
    /// Connected components of the mesh
    pub clusters: Clusters,
    /// Cell of every vertex
    pub cell_of: Vec<CellId>,
    pub stats: PartitionStats,
}

impl Partition {
    /// Number of vertices tagged to each cell
    pub fn vertex_counts(&self) -> Vec<usize> {
        let mut counts = vec![0; self.cells.len()];
        for cell in &self.cell_of {
            counts[cell.index()] += 1;
        }
        counts
    }
}

/// Splits grid-packed combined meshes back into their source meshes
#[derive(Debug, Clone)]
pub struct AtlasSplitter {
    config: SplitConfig,
    cancel: Option<CancelToken>,
}

impl AtlasSplitter {
    /// Create a splitter, rejecting an invalid config
    pub fn new(config: SplitConfig) -> SplitResult<Self> {
        config.validate()?;
        Ok(Self { config, cancel: None })
    }

    /// Abort with [`SplitError::Cancelled`] if the token is cancelled before a call starts
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Active configuration
    pub fn config(&self) -> &SplitConfig {
        &self.config
    }

    fn check_cancelled(&self) -> SplitResult<()> {
        if self.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
            return Err(SplitError::Cancelled);
        }
        Ok(())
    }

    /// Assign every vertex of `mesh` to one cell of `plan`
    pub fn partition(&self, mesh: &ObjMesh, plan: &PlacementPlan) -> SplitResult<Partition> {
        self.check_cancelled()?;
        plan.validate()?;
        mesh.validate()?;

        let axes = self.config.axes;
        let cells = plan.cells(axes);
        let projected: Vec<DVec2> = mesh.vertices.iter().map(|v| axes.project(v.position)).collect();

        let graph = AdjacencyGraph::build(mesh.vertex_count(), &mesh.faces);
        let clusters = Clusters::extract(&graph);
        log::info!(
            "Found {} clusters across {} vertices ({} edges)",
            clusters.len(),
            mesh.vertex_count(),
            graph.edge_count()
        );

        let mut assignments = CellClassifier::new(&cells).classify(&projected, &clusters);
        let reconciled = FragmentReconciler::from_config(&self.config).reconcile(
            &clusters,
            &projected,
            &cells,
            &mut assignments,
        );
        log::info!(
            "Reconciled {} fragments below {:.1} vertices ({} moved, {} clusters outside every cell)",
            reconciled.fragments,
            reconciled.threshold,
            reconciled.reassigned,
            reconciled.unvoted
        );

        let mut cell_of = Vec::with_capacity(mesh.vertex_count());
        for vertex in 0..mesh.vertex_count() as u32 {
            let cluster = clusters.cluster_of(vertex);
            cell_of.push(assignments[cluster.index()].ok_or(SplitError::Unassigned(vertex))?);
        }

        let healed = BoundaryHealer::heal(&mesh.faces, &mut cell_of);
        BoundaryHealer::validate(&mesh.faces, &cell_of)?;

        let stats = PartitionStats {
            vertices: mesh.vertex_count(),
            faces: mesh.face_count(),
            edges: graph.edge_count(),
            clusters: clusters.len(),
            fragment_threshold: reconciled.threshold,
            fragments: reconciled.fragments,
            reassigned: reconciled.reassigned,
            unvoted: reconciled.unvoted,
            healed_faces: healed.healed_faces,
        };

        Ok(Partition {
            cells,
            clusters,
            cell_of,
            stats,
        })
    }

    /// Split an in-memory mesh into one mesh per non-empty cell
    pub fn split(&self, mesh: &ObjMesh, plan: &PlacementPlan) -> SplitResult<Vec<CellMesh>> {
        let partition = self.partition(mesh, plan)?;
        MeshEmitter::new(&self.config).emit(mesh, &partition.cells, &partition.cell_of)
    }

    /// Parse OBJ text and split it
    pub fn split_str(&self, text: &str, plan: &PlacementPlan) -> SplitResult<Vec<CellMesh>> {
        self.check_cancelled()?;
        let mesh = ObjMesh::parse(text)?;
        self.split(&mesh, plan)
    }

    /// Split a combined mesh file into `output_dir`.
    ///
    /// Nothing is written unless the mesh parses and partitions cleanly. After
    /// that, each cell is written independently and failures are collected in
    /// the report.
    pub fn split_file(
        &self,
        mesh_path: impl AsRef<Path>,
        plan: &PlacementPlan,
        output_dir: impl AsRef<Path>,
    ) -> SplitResult<SplitReport> {
        let mesh_path = mesh_path.as_ref();
        self.check_cancelled()?;
        plan.validate()?;
        log::info!("Splitting {} into {} cells", mesh_path.display(), plan.layout.len());

        let mesh = ObjMesh::from_path(mesh_path)?;
        let material = load_material_library(mesh_path, &mesh);
        let partition = self.partition(&mesh, plan)?;
        let meshes = MeshEmitter::new(&self.config)
            .with_material_library(material.is_some())
            .emit(&mesh, &partition.cells, &partition.cell_of)?;
        check_unique_names(&meshes)?;

        let writer = OutputWriter::new(output_dir.as_ref())?
            .with_material(material)
            .with_parallel(self.config.parallel_writes);
        let mut report = writer.write_all(&meshes);

        let emitted: AHashSet<CellId> = meshes.iter().map(|m| m.cell).collect();
        report.skipped = partition
            .cells
            .iter()
            .filter(|cell| !emitted.contains(&cell.id))
            .map(|cell| cell.name.clone())
            .collect();

        log::info!(
            "Split {} into {} meshes ({} failed, {} empty cells)",
            mesh_path.display(),
            report.outputs.len(),
            report.failures.len(),
            report.skipped.len()
        );
        Ok(report)
    }
}

fn check_unique_names(meshes: &[CellMesh]) -> SplitResult<()> {
    let mut seen = AHashSet::with_capacity(meshes.len());
    for mesh in meshes {
        if !seen.insert(mesh.name.as_str()) {
            return Err(SplitError::DuplicateOutputName(mesh.name.clone()));
        }
    }
    Ok(())
}
