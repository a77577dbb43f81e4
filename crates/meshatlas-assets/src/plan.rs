//! Atlas Placement Plans
//!
//! The atlas assembler packs source models row-major into a square grid and
//! writes a `<combined>_layout.json` sidecar describing where each model went.
//! This module reads and writes that sidecar and resolves it into [`Cell`]s:
//! footprint rectangles on the plan plane plus mesh-space offsets.

use std::path::{Path, PathBuf};

use glam::{DVec2, DVec3};
use meshatlas_core::{Aabb3, AxisConvention, Rect2};
use serde::{Deserialize, Serialize};

use crate::{AssetError, AssetResult};

/// Index of a cell in plan order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellId(pub u32);

impl CellId {
    /// Position of the cell in the plan
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for CellId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "cell #{}", self.0)
    }
}

/// Source-space bounds of a placed model, after its offset was applied
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedBounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
    pub min_z: f64,
    pub max_z: f64,
}

impl From<Aabb3> for PlacedBounds {
    fn from(aabb: Aabb3) -> Self {
        Self {
            min_x: aabb.min.x,
            max_x: aabb.max.x,
            min_y: aabb.min.y,
            max_y: aabb.max.y,
            min_z: aabb.min.z,
            max_z: aabb.max.z,
        }
    }
}

/// One entry of the sidecar `layout` array
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedInstance {
    /// Stable name of the source model
    pub name: String,
    /// Position in the assembler's input list
    pub index: usize,
    /// Grid column
    pub col: u32,
    /// Grid row
    pub row: u32,
    /// Cell origin on the plan X axis
    pub cell_x: f64,
    /// Cell origin on the plan Y axis
    pub cell_y: f64,
    /// Source-space translation applied to the model
    pub offset_x: f64,
    pub offset_y: f64,
    pub offset_z: f64,
    /// Informational bounds after placement
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<PlacedBounds>,
}

impl PlacedInstance {
    /// Cell origin on the plan plane
    pub fn origin(&self) -> DVec2 {
        DVec2::new(self.cell_x, self.cell_y)
    }

    /// Source-space placement offset
    pub fn offset(&self) -> DVec3 {
        DVec3::new(self.offset_x, self.offset_y, self.offset_z)
    }
}

/// A source model handed to [`PlacementPlan::arrange`]
#[derive(Debug, Clone)]
pub struct SourceInstance {
    /// Stable name
    pub name: String,
    /// Source-space bounds before placement
    pub bounds: Aabb3,
}

/// A plan entry resolved for splitting
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    /// Plan order, used for every tie-break
    pub id: CellId,
    /// Stable name from the plan
    pub name: String,
    /// Grid column
    pub col: u32,
    /// Grid row
    pub row: u32,
    /// Footprint on the plan plane
    pub footprint: Rect2,
    /// Placement offset converted to mesh space
    pub offset: DVec3,
}

/// The sidecar written by the atlas assembler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementPlan {
    /// Grid columns
    pub cols: u32,
    /// Grid rows
    pub rows: u32,
    /// Side length of every (square) cell
    pub cell_size: f64,
    /// Placed models in plan order
    pub layout: Vec<PlacedInstance>,
}

impl PlacementPlan {
    /// Parse and validate a plan from JSON text
    pub fn from_json_str(text: &str) -> AssetResult<Self> {
        let plan: Self = serde_json::from_str(text)?;
        plan.validate()?;
        Ok(plan)
    }

    /// Read and validate a plan file
    pub fn from_json_file(path: impl AsRef<Path>) -> AssetResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let plan = Self::from_json_str(&text)?;
        log::debug!(
            "Loaded placement plan {}: {}x{} grid, {} cells",
            path.as_ref().display(),
            plan.cols,
            plan.rows,
            plan.layout.len()
        );
        Ok(plan)
    }

    /// Serialize as pretty-printed JSON
    pub fn to_json_string(&self) -> AssetResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the plan as a JSON file
    pub fn write_json_file(&self, path: impl AsRef<Path>) -> AssetResult<()> {
        std::fs::write(path, self.to_json_string()?)?;
        Ok(())
    }

    /// Where the assembler puts the sidecar for a combined mesh:
    /// `dir/combined.obj` -> `dir/combined_layout.json`
    pub fn sidecar_path(mesh_path: &Path) -> PathBuf {
        let stem = mesh_path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        mesh_path.with_file_name(format!("{}_layout.json", stem))
    }

    /// Reject plans the splitter cannot classify against
    pub fn validate(&self) -> AssetResult<()> {
        if self.layout.is_empty() {
            return Err(AssetError::InvalidPlan("layout has no cells".to_string()));
        }
        if !self.cell_size.is_finite() || self.cell_size <= 0.0 {
            return Err(AssetError::InvalidPlan(format!(
                "cellSize must be a positive number (got {})",
                self.cell_size
            )));
        }

        for instance in &self.layout {
            if instance.name.trim().is_empty() {
                return Err(AssetError::InvalidPlan(format!(
                    "layout entry {} has an empty name",
                    instance.index
                )));
            }
            if !is_file_name(&instance.name) {
                return Err(AssetError::InvalidPlan(format!(
                    "layout entry name '{}' is not a plain file name",
                    instance.name
                )));
            }
            let finite = instance.origin().is_finite() && instance.offset().is_finite();
            if !finite {
                return Err(AssetError::InvalidPlan(format!(
                    "layout entry '{}' has a non-finite origin or offset",
                    instance.name
                )));
            }
        }

        for (i, a) in self.layout.iter().enumerate() {
            for b in &self.layout[i + 1..] {
                if a.name == b.name {
                    log::warn!("Placement plan names '{}' more than once", a.name);
                }
                if self.footprint(a).overlaps(&self.footprint(b)) {
                    log::warn!(
                        "Footprints of '{}' and '{}' overlap; the earlier cell wins shared vertices",
                        a.name,
                        b.name
                    );
                }
            }
        }

        Ok(())
    }

    /// Footprint rectangle of a placed model: `[cellX, cellX + cellSize) x [cellY, cellY + cellSize)`
    pub fn footprint(&self, instance: &PlacedInstance) -> Rect2 {
        Rect2::from_origin_size(instance.origin(), self.cell_size)
    }

    /// Resolve every layout entry into a cell, converting offsets to mesh space
    pub fn cells(&self, axes: AxisConvention) -> Vec<Cell> {
        self.layout
            .iter()
            .enumerate()
            .map(|(i, instance)| Cell {
                id: CellId(i as u32),
                name: instance.name.clone(),
                col: instance.col,
                row: instance.row,
                footprint: self.footprint(instance),
                offset: axes.to_mesh(instance.offset()),
            })
            .collect()
    }

    /// Lay source models out the way the atlas assembler does.
    ///
    /// Cells are squares whose side is the largest extent over all models
    /// plus `spacing`. Models fill the grid row-major and are centered in their
    /// cell on the plan X/Y axes; their height is left untouched.
    pub fn arrange(instances: &[SourceInstance], spacing: f64) -> Self {
        let (cols, rows) = grid_dimensions(instances.len());
        let largest = instances
            .iter()
            .map(|instance| instance.bounds.size().max_element())
            .fold(0.0_f64, f64::max);
        let cell_size = largest + spacing;

        let layout = instances
            .iter()
            .enumerate()
            .map(|(i, instance)| {
                let col = i as u32 % cols;
                let row = i as u32 / cols;
                let origin = DVec2::new(col as f64 * cell_size, row as f64 * cell_size);
                let cell_center = origin + DVec2::splat(cell_size / 2.0);
                let model_center = instance.bounds.center().truncate();
                let offset = (cell_center - model_center).extend(0.0);

                PlacedInstance {
                    name: instance.name.clone(),
                    index: i,
                    col,
                    row,
                    cell_x: origin.x,
                    cell_y: origin.y,
                    offset_x: offset.x,
                    offset_y: offset.y,
                    offset_z: offset.z,
                    bounds: Some(
                        Aabb3::new(instance.bounds.min + offset, instance.bounds.max + offset).into(),
                    ),
                }
            })
            .collect();

        Self {
            cols,
            rows,
            cell_size,
            layout,
        }
    }
}

/// Check that a name can be used as a file name inside an output directory
pub fn is_file_name(name: &str) -> bool {
    !name.contains(['/', '\\']) && name != "." && name != ".."
}

/// Grid dimensions for `count` models, as close to square as possible
pub fn grid_dimensions(count: usize) -> (u32, u32) {
    if count == 0 {
        return (0, 0);
    }
    let cols = (count as f64).sqrt().ceil() as usize;
    let rows = count.div_ceil(cols);
    (cols as u32, rows as u32)
}
