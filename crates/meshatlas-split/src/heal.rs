//! Boundary Healing
//!
//! A cluster whose vote was split across a grid line can leave faces whose
//! vertices sit in different cells. Each such face is pulled into the cell
//! most of its own vertices already belong to.

use meshatlas_assets::{CellId, ObjFace};
use smallvec::SmallVec;

use crate::{SplitError, SplitResult};

/// Outcome of a healing pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HealReport {
    /// Faces whose vertices were retagged
    pub healed_faces: usize,
}

/// Forces every face's vertices into a single cell
#[derive(Debug, Clone, Copy)]
pub struct BoundaryHealer;

impl BoundaryHealer {
    /// Retag the vertices of every face that spans more than one cell.
    ///
    /// Faces are visited in declaration order, so a vertex shared with a later
    /// face can be retagged again by it. Ties go to the earliest cell.
    pub fn heal(faces: &[ObjFace], cell_of: &mut [CellId]) -> HealReport {
        let mut report = HealReport::default();

        for face in faces {
            let tags: SmallVec<[CellId; 8]> = face.vertices().map(|v| cell_of[v as usize]).collect();
            if is_unanimous(&tags) {
                continue;
            }

            let winner = face_majority(&tags);
            for vertex in face.vertices() {
                cell_of[vertex as usize] = winner;
            }
            report.healed_faces += 1;
        }

        if report.healed_faces > 0 {
            log::debug!("Healed {} boundary faces", report.healed_faces);
        }
        report
    }

    /// Fail if any face still spans more than one cell
    pub fn validate(faces: &[ObjFace], cell_of: &[CellId]) -> SplitResult<()> {
        let mut residual = faces.iter().filter(|face| {
            let tags: SmallVec<[CellId; 8]> = face.vertices().map(|v| cell_of[v as usize]).collect();
            !is_unanimous(&tags)
        });

        let Some(first) = residual.next() else {
            return Ok(());
        };
        Err(SplitError::ResidualInconsistency {
            faces: 1 + residual.count(),
            first_line: first.line,
        })
    }
}

fn is_unanimous(tags: &[CellId]) -> bool {
    tags.windows(2).all(|pair| pair[0] == pair[1])
}

/// Most frequent tag among a face's vertices; ties go to the lowest cell id
fn face_majority(tags: &[CellId]) -> CellId {
    let mut counts: SmallVec<[(CellId, usize); 4]> = SmallVec::new();
    for &tag in tags {
        match counts.iter_mut().find(|(cell, _)| *cell == tag) {
            Some((_, count)) => *count += 1,
            None => counts.push((tag, 1)),
        }
    }

    let mut best = counts[0];
    for &(cell, count) in &counts[1..] {
        if count > best.1 || (count == best.1 && cell < best.0) {
            best = (cell, count);
        }
    }
    best.0
}
