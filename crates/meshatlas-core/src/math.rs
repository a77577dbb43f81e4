//! Math utilities
//!
//! Re-exports from glam plus the projection contract shared with the atlas
//! assembler: footprint rectangles, bounding boxes and axis conventions.

pub use glam::{DMat3, DVec2, DVec3};

use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in the projection plane.
///
/// Containment is half-open: `min <= p < max` on both axes, so neighbouring
/// grid cells never both claim a point that sits exactly on a shared edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect2 {
    /// Minimum corner
    pub min: DVec2,
    /// Maximum corner (exclusive)
    pub max: DVec2,
}

impl Rect2 {
    /// Create a rectangle from min and max corners
    pub fn new(min: DVec2, max: DVec2) -> Self {
        Self { min, max }
    }

    /// Create a square rectangle from its origin corner and side length
    pub fn from_origin_size(origin: DVec2, size: f64) -> Self {
        Self {
            min: origin,
            max: origin + DVec2::splat(size),
        }
    }

    /// Get the center of the rectangle
    pub fn center(&self) -> DVec2 {
        (self.min + self.max) * 0.5
    }

    /// Get the full size of the rectangle
    pub fn size(&self) -> DVec2 {
        self.max - self.min
    }

    /// Check if a point lies inside the half-open rectangle
    pub fn contains(&self, point: DVec2) -> bool {
        point.x >= self.min.x && point.x < self.max.x &&
        point.y >= self.min.y && point.y < self.max.y
    }

    /// Check if this rectangle overlaps another (touching edges do not count)
    pub fn overlaps(&self, other: &Rect2) -> bool {
        self.min.x < other.max.x && self.max.x > other.min.x &&
        self.min.y < other.max.y && self.max.y > other.min.y
    }
}

/// Axis-aligned bounding box in double precision
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb3 {
    /// Minimum corner
    pub min: DVec3,
    /// Maximum corner
    pub max: DVec3,
}

impl Aabb3 {
    /// An empty box that any point expands
    pub const EMPTY: Self = Self {
        min: DVec3::splat(f64::INFINITY),
        max: DVec3::splat(f64::NEG_INFINITY),
    };

    /// Create a box from min and max corners
    pub fn new(min: DVec3, max: DVec3) -> Self {
        Self { min, max }
    }

    /// Build the tightest box around a set of points
    pub fn from_points(points: impl IntoIterator<Item = DVec3>) -> Self {
        let mut result = Self::EMPTY;
        for point in points {
            result.expand_to_include(point);
        }
        result
    }

    /// Check if the box is empty
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Get the center of the box
    pub fn center(&self) -> DVec3 {
        (self.min + self.max) * 0.5
    }

    /// Get the full size of the box
    pub fn size(&self) -> DVec3 {
        self.max - self.min
    }

    /// Expand the box to include a point
    pub fn expand_to_include(&mut self, point: DVec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }
}

impl Default for Aabb3 {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Relationship between the space the placement plan is authored in
/// ("source" space) and the space the combined mesh is written in.
///
/// The plan's footprint rectangles live on the source X/Y plane. A mismatch
/// between this setting and what the atlas assembler actually did silently
/// misclassifies every cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AxisConvention {
    /// Z-up source, Y-up mesh: source `(x, y, z)` is written as mesh `(x, z, -y)`
    #[default]
    ZUpSource,
    /// Source and mesh share the same axes
    Identity,
}

impl AxisConvention {
    /// Rotation taking source-space vectors to mesh space
    pub fn mesh_from_source(&self) -> DMat3 {
        match self {
            Self::ZUpSource => DMat3::from_cols(
                DVec3::new(1.0, 0.0, 0.0),
                DVec3::new(0.0, 0.0, -1.0),
                DVec3::new(0.0, 1.0, 0.0),
            ),
            Self::Identity => DMat3::IDENTITY,
        }
    }

    /// Convert a source-space vector (e.g. a placement offset) to mesh space
    pub fn to_mesh(&self, source: DVec3) -> DVec3 {
        self.mesh_from_source() * source
    }

    /// Convert a mesh-space position back to source space
    pub fn to_source(&self, mesh: DVec3) -> DVec3 {
        // Signed permutation, so the transpose is the inverse.
        self.mesh_from_source().transpose() * mesh
    }

    /// Project a mesh-space position onto the plan plane
    pub fn project(&self, mesh: DVec3) -> DVec2 {
        self.to_source(mesh).truncate()
    }
}

impl std::str::FromStr for AxisConvention {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "z-up-source" => Ok(Self::ZUpSource),
            "identity" => Ok(Self::Identity),
            other => Err(format!(
                "unknown axis convention '{}' (expected 'z-up-source' or 'identity')",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_half_open() {
        let rect = Rect2::from_origin_size(DVec2::ZERO, 10.0);
        assert!(rect.contains(DVec2::new(0.0, 0.0)));
        assert!(rect.contains(DVec2::new(9.999, 5.0)));
        assert!(!rect.contains(DVec2::new(10.0, 5.0)));
        assert!(!rect.contains(DVec2::new(5.0, -0.001)));
        assert_eq!(rect.center(), DVec2::new(5.0, 5.0));
    }

    #[test]
    fn test_rect_overlap() {
        let a = Rect2::from_origin_size(DVec2::ZERO, 10.0);
        let b = Rect2::from_origin_size(DVec2::new(10.0, 0.0), 10.0);
        let c = Rect2::from_origin_size(DVec2::new(5.0, 5.0), 10.0);
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&c));
    }

    #[test]
    fn test_aabb_from_points() {
        let aabb = Aabb3::from_points([DVec3::new(1.0, -2.0, 3.0), DVec3::new(-1.0, 4.0, 0.0)]);
        assert_eq!(aabb.min, DVec3::new(-1.0, -2.0, 0.0));
        assert_eq!(aabb.max, DVec3::new(1.0, 4.0, 3.0));
        assert!(Aabb3::EMPTY.is_empty());
    }

    #[test]
    fn test_z_up_projection() {
        let axes = AxisConvention::ZUpSource;
        // Source (10, 20, 5) is written to the mesh as (10, 5, -20)
        let mesh = axes.to_mesh(DVec3::new(10.0, 20.0, 5.0));
        assert_eq!(mesh, DVec3::new(10.0, 5.0, -20.0));
        assert_eq!(axes.to_source(mesh), DVec3::new(10.0, 20.0, 5.0));
        assert_eq!(axes.project(mesh), DVec2::new(10.0, 20.0));
    }

    #[test]
    fn test_identity_projection() {
        let axes = AxisConvention::Identity;
        let point = DVec3::new(3.0, 4.0, 5.0);
        assert_eq!(axes.to_mesh(point), point);
        assert_eq!(axes.project(point), DVec2::new(3.0, 4.0));
    }

    #[test]
    fn test_axis_convention_parse() {
        assert_eq!("identity".parse::<AxisConvention>(), Ok(AxisConvention::Identity));
        assert_eq!("z-up-source".parse::<AxisConvention>(), Ok(AxisConvention::ZUpSource));
        assert!("sideways".parse::<AxisConvention>().is_err());
    }
}
