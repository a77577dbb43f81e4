//! # Meshatlas Split
//!
//! Splits a combined mesh, assembled by packing source models into a grid,
//! back into one mesh per grid cell.
//!
//! ## Pipeline
//! - **Graph**: vertex adjacency from shared faces
//! - **Clusters**: connected components, the unit of assignment
//! - **Classify**: majority vote of each cluster's vertices over cell footprints
//! - **Fragments**: tiny or unvoted clusters go to the nearest cell center
//! - **Heal**: faces spanning cells are pulled into their local majority
//! - **Emit**: per-cell re-indexing with the placement offset reversed
//! - **Output**: parallel per-cell writes with per-cell failure reporting
//!
//! The combined mesh format carries no per-vertex group identity, so cell
//! membership is inferred geometrically. If the assembler ever writes
//! explicit group tags, cluster extraction and classification become
//! unnecessary.

pub mod classify;
pub mod cluster;
pub mod emit;
pub mod fragment;
pub mod graph;
pub mod heal;
pub mod output;
pub mod splitter;

#[cfg(test)]
mod testing;

pub use classify::{CellClassifier, majority};
pub use cluster::{ClusterId, Clusters};
pub use emit::{CellMesh, MeshEmitter};
pub use fragment::{FragmentReconciler, ReconcileReport, nearest_cell};
pub use graph::AdjacencyGraph;
pub use heal::{BoundaryHealer, HealReport};
pub use output::{CellFailure, OutputWriter, SplitOutput, SplitReport, load_material_library};
pub use splitter::{AtlasSplitter, Partition, PartitionStats};

use meshatlas_assets::AssetError;
use meshatlas_core::ConfigError;
use thiserror::Error;

/// Split errors
#[derive(Error, Debug)]
pub enum SplitError {
    #[error(transparent)]
    Asset(#[from] AssetError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{faces} faces still span more than one cell after healing (first at line {first_line}); the plan's axis convention probably does not match the mesh")]
    ResidualInconsistency { faces: usize, first_line: usize },

    #[error("Vertex {0} could not be assigned to any cell")]
    Unassigned(u32),

    #[error("Two cells would both be written as '{0}'")]
    DuplicateOutputName(String),

    #[error("'{0}' cannot be used as an output file name")]
    InvalidOutputName(String),

    #[error("Split cancelled before it started")]
    Cancelled,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for split operations
pub type SplitResult<T> = Result<T, SplitError>;
