//! # Meshatlas Assets
//!
//! File formats consumed and produced by the atlas splitter.
//!
//! ## Features
//! - Strict Wavefront OBJ parsing (all-or-nothing, line-numbered errors)
//! - OBJ serialization in the same textual grammar
//! - Placement plan sidecars written by the atlas assembler
//! - Grid layout helpers matching the assembler's packing rules

pub mod obj;
pub mod plan;

pub use obj::{FaceCorner, ObjFace, ObjMesh, ObjVertex};
pub use plan::{Cell, CellId, PlacedBounds, PlacedInstance, PlacementPlan, SourceInstance, grid_dimensions, is_file_name};

use thiserror::Error;

/// Asset errors
#[derive(Error, Debug)]
pub enum AssetError {
    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Invalid placement plan: {0}")]
    InvalidPlan(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl AssetError {
    /// Build a parse error for a 1-based line number
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }
}

/// Result type for asset operations
pub type AssetResult<T> = Result<T, AssetError>;
