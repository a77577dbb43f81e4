//! Wavefront OBJ
//!
//! Reads and writes the OBJ subset produced by the atlas assembler:
//! `v`, `vt`, `vn`, `f`, `usemtl` and `mtllib`. Other statements (`o`, `g`,
//! `s`, `l`, ...) are skipped.
//!
//! Parsing is all-or-nothing. A malformed number, a face with fewer than three
//! corners or a reference to a record that does not exist rejects the whole
//! file, because every split cell has to be assembled from a complete mesh.
//!
//! Face indices are stored 0-based. Relative (negative) indices are resolved
//! against the records declared so far, so a written mesh only ever contains
//! absolute references.

use std::fmt;
use std::path::Path;

use glam::DVec3;
use indexmap::IndexSet;
use smallvec::SmallVec;

use crate::{AssetError, AssetResult};

/// A `v` record
#[derive(Debug, Clone, PartialEq)]
pub struct ObjVertex {
    /// Position
    pub position: DVec3,
    /// Trailing components after x/y/z (weight or vertex colour), written back verbatim
    pub extra: SmallVec<[f64; 3]>,
}

impl ObjVertex {
    /// Create a vertex with no extra components
    pub fn new(position: DVec3) -> Self {
        Self {
            position,
            extra: SmallVec::new(),
        }
    }
}

/// One corner of a face: `v`, `v/vt`, `v//vn` or `v/vt/vn`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceCorner {
    /// 0-based vertex index
    pub vertex: u32,
    /// 0-based texture coordinate index
    pub tex_coord: Option<u32>,
    /// 0-based normal index
    pub normal: Option<u32>,
}

impl FaceCorner {
    /// Corner referencing only a vertex
    pub fn vertex(vertex: u32) -> Self {
        Self {
            vertex,
            tex_coord: None,
            normal: None,
        }
    }
}

/// An `f` record
#[derive(Debug, Clone, PartialEq)]
pub struct ObjFace {
    /// Corners in winding order (at least three)
    pub corners: SmallVec<[FaceCorner; 4]>,
    /// Index into [`ObjMesh::materials`] active when the face was declared
    pub material: Option<u32>,
    /// 1-based source line, 0 for faces built in memory
    pub line: usize,
}

impl ObjFace {
    /// Vertex indices referenced by this face
    pub fn vertices(&self) -> impl Iterator<Item = u32> + '_ {
        self.corners.iter().map(|corner| corner.vertex)
    }
}

/// In-memory OBJ mesh
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjMesh {
    /// Vertex records
    pub vertices: Vec<ObjVertex>,
    /// Texture coordinate records, kept as their original text
    pub tex_coords: Vec<String>,
    /// Normal records, kept as their original text
    pub normals: Vec<String>,
    /// Faces in declaration order
    pub faces: Vec<ObjFace>,
    /// Distinct material names in first-use order
    pub materials: IndexSet<String>,
    /// Material library named by `mtllib`
    pub material_lib: Option<String>,
}

impl ObjMesh {
    /// Parse OBJ text
    pub fn parse(text: &str) -> AssetResult<Self> {
        let mut mesh = ObjMesh::default();
        let mut current_material: Option<u32> = None;

        for (idx, raw) in text.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw.split('#').next().unwrap_or_default().trim();
            let mut tokens = line.split_whitespace();
            let Some(keyword) = tokens.next() else {
                continue;
            };

            match keyword {
                "v" => {
                    let values = parse_numbers(tokens, line_no)?;
                    if values.len() < 3 {
                        return Err(AssetError::parse(
                            line_no,
                            format!("vertex needs 3 coordinates, found {}", values.len()),
                        ));
                    }
                    mesh.vertices.push(ObjVertex {
                        position: DVec3::new(values[0], values[1], values[2]),
                        extra: values[3..].iter().copied().collect(),
                    });
                }
                "vt" => {
                    let values = parse_numbers(tokens, line_no)?;
                    if values.is_empty() {
                        return Err(AssetError::parse(line_no, "texture coordinate has no components"));
                    }
                    mesh.tex_coords.push(line.to_string());
                }
                "vn" => {
                    let values = parse_numbers(tokens, line_no)?;
                    if values.len() < 3 {
                        return Err(AssetError::parse(
                            line_no,
                            format!("normal needs 3 components, found {}", values.len()),
                        ));
                    }
                    mesh.normals.push(line.to_string());
                }
                "f" => {
                    let declared = Declared {
                        vertices: mesh.vertices.len(),
                        tex_coords: mesh.tex_coords.len(),
                        normals: mesh.normals.len(),
                    };
                    let corners = tokens
                        .map(|token| parse_corner(token, &declared, line_no))
                        .collect::<AssetResult<SmallVec<[FaceCorner; 4]>>>()?;
                    if corners.len() < 3 {
                        return Err(AssetError::parse(
                            line_no,
                            format!("face needs at least 3 corners, found {}", corners.len()),
                        ));
                    }
                    mesh.faces.push(ObjFace {
                        corners,
                        material: current_material,
                        line: line_no,
                    });
                }
                "usemtl" => {
                    let name = line[keyword.len()..].trim();
                    if name.is_empty() {
                        return Err(AssetError::parse(line_no, "usemtl without a material name"));
                    }
                    let (index, _) = mesh.materials.insert_full(name.to_string());
                    current_material = Some(index as u32);
                }
                "mtllib" => {
                    let name = line[keyword.len()..].trim();
                    if name.is_empty() {
                        return Err(AssetError::parse(line_no, "mtllib without a file name"));
                    }
                    if let Some(existing) = &mesh.material_lib {
                        log::warn!(
                            "Line {}: ignoring extra material library '{}' (already using '{}')",
                            line_no,
                            name,
                            existing
                        );
                    } else {
                        mesh.material_lib = Some(name.to_string());
                    }
                }
                _ => {}
            }
        }

        mesh.validate()?;
        Ok(mesh)
    }

    /// Read and parse an OBJ file
    pub fn from_path(path: impl AsRef<Path>) -> AssetResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let mesh = Self::parse(&text)?;
        log::debug!(
            "Parsed {}: {} vertices, {} faces, {} materials",
            path.as_ref().display(),
            mesh.vertices.len(),
            mesh.faces.len(),
            mesh.materials.len()
        );
        Ok(mesh)
    }

    /// Write the mesh as an OBJ file
    pub fn write_file(&self, path: impl AsRef<Path>) -> AssetResult<()> {
        std::fs::write(path, self.to_string())?;
        Ok(())
    }

    /// Number of vertex records
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of faces
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Name of the material a face was declared with
    pub fn material_name(&self, face: &ObjFace) -> Option<&str> {
        face.material
            .and_then(|index| self.materials.get_index(index as usize))
            .map(String::as_str)
    }

    /// Serialize in OBJ syntax
    pub fn write_obj(&self, out: &mut impl fmt::Write) -> fmt::Result {
        if let Some(lib) = &self.material_lib {
            writeln!(out, "mtllib {}", lib)?;
            writeln!(out)?;
        }

        for vertex in &self.vertices {
            let p = vertex.position;
            write!(out, "v {} {} {}", p.x, p.y, p.z)?;
            for component in &vertex.extra {
                write!(out, " {}", component)?;
            }
            writeln!(out)?;
        }

        for records in [&self.tex_coords, &self.normals] {
            if records.is_empty() {
                continue;
            }
            writeln!(out)?;
            for record in records {
                writeln!(out, "{}", record)?;
            }
        }

        if !self.faces.is_empty() {
            writeln!(out)?;
        }

        let mut active: Option<u32> = None;
        for face in &self.faces {
            // OBJ cannot switch back to "no material", so faces without one keep the active material
            if face.material.is_some() && face.material != active {
                if let Some(name) = self.material_name(face) {
                    writeln!(out, "usemtl {}", name)?;
                }
                active = face.material;
            }

            out.write_char('f')?;
            for corner in &face.corners {
                write!(out, " {}", corner.vertex + 1)?;
                match (corner.tex_coord, corner.normal) {
                    (None, None) => {}
                    (Some(t), None) => write!(out, "/{}", t + 1)?,
                    (None, Some(n)) => write!(out, "//{}", n + 1)?,
                    (Some(t), Some(n)) => write!(out, "/{}/{}", t + 1, n + 1)?,
                }
            }
            writeln!(out)?;
        }

        Ok(())
    }

    /// Verify that every face has at least three corners and every corner
    /// points at an existing record. Meshes built in memory should pass this
    /// before they are handed to anything that indexes by corner.
    pub fn validate(&self) -> AssetResult<()> {
        for face in &self.faces {
            if face.corners.len() < 3 {
                return Err(AssetError::parse(
                    face.line,
                    format!("face needs at least 3 corners, found {}", face.corners.len()),
                ));
            }
            for corner in &face.corners {
                check_range(corner.vertex, self.vertices.len(), face.line, "vertex")?;
                if let Some(t) = corner.tex_coord {
                    check_range(t, self.tex_coords.len(), face.line, "texture coordinate")?;
                }
                if let Some(n) = corner.normal {
                    check_range(n, self.normals.len(), face.line, "normal")?;
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for ObjMesh {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_obj(f)
    }
}

/// Record counts at the point a face is declared, for relative indices
struct Declared {
    vertices: usize,
    tex_coords: usize,
    normals: usize,
}

fn parse_number(token: &str, line_no: usize) -> AssetResult<f64> {
    token
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| AssetError::parse(line_no, format!("malformed number '{}'", token)))
}

fn parse_numbers<'a>(
    tokens: impl Iterator<Item = &'a str>,
    line_no: usize,
) -> AssetResult<SmallVec<[f64; 6]>> {
    tokens.map(|token| parse_number(token, line_no)).collect()
}

fn parse_corner(token: &str, declared: &Declared, line_no: usize) -> AssetResult<FaceCorner> {
    let mut parts = token.split('/');

    let vertex = match parts.next() {
        Some(part) if !part.is_empty() => resolve_index(part, declared.vertices, line_no)?,
        _ => {
            return Err(AssetError::parse(
                line_no,
                format!("face corner '{}' has no vertex index", token),
            ));
        }
    };

    let mut optional = |defined: usize| -> AssetResult<Option<u32>> {
        match parts.next() {
            None | Some("") => Ok(None),
            Some(part) => resolve_index(part, defined, line_no).map(Some),
        }
    };
    let tex_coord = optional(declared.tex_coords)?;
    let normal = optional(declared.normals)?;

    if parts.next().is_some() {
        return Err(AssetError::parse(
            line_no,
            format!("face corner '{}' has too many components", token),
        ));
    }

    Ok(FaceCorner {
        vertex,
        tex_coord,
        normal,
    })
}

/// Convert a 1-based or negative OBJ index to a 0-based index
fn resolve_index(token: &str, defined: usize, line_no: usize) -> AssetResult<u32> {
    let raw: i64 = token
        .parse()
        .map_err(|_| AssetError::parse(line_no, format!("malformed index '{}'", token)))?;

    let resolved = match raw {
        0 => return Err(AssetError::parse(line_no, "index 0 is not valid in OBJ")),
        positive if positive > 0 => positive - 1,
        negative => defined as i64 + negative,
    };

    if resolved < 0 {
        return Err(AssetError::parse(
            line_no,
            format!("relative index {} points before the first record", raw),
        ));
    }
    u32::try_from(resolved)
        .map_err(|_| AssetError::parse(line_no, format!("index {} is too large", raw)))
}

fn check_range(index: u32, len: usize, line_no: usize, what: &str) -> AssetResult<()> {
    if (index as usize) < len {
        Ok(())
    } else {
        Err(AssetError::parse(
            line_no,
            format!("{} index {} out of range ({} declared)", what, index + 1, len),
        ))
    }
}
