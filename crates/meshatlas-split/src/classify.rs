//! Cell Classification
//!
//! Assigns each cluster to the cell whose footprint holds most of its
//! vertices. Vertices are compared in plan space, so the projection used to
//! produce `projected` must be the one the atlas assembler laid the grid out
//! in.

use glam::DVec2;
use meshatlas_assets::{Cell, CellId};

use crate::cluster::Clusters;

/// Majority-vote classifier over a plan's footprints
pub struct CellClassifier<'a> {
    cells: &'a [Cell],
}

impl<'a> CellClassifier<'a> {
    /// Create a classifier for cells in plan order
    pub fn new(cells: &'a [Cell]) -> Self {
        Self { cells }
    }

    /// First cell (plan order) whose footprint contains a point
    pub fn cell_at(&self, point: DVec2) -> Option<CellId> {
        self.cells
            .iter()
            .find(|cell| cell.footprint.contains(point))
            .map(|cell| cell.id)
    }

    /// One vote per member vertex; vertices outside every footprint abstain
    pub fn tally(&self, projected: &[DVec2], members: &[u32]) -> Vec<usize> {
        let mut votes = vec![0; self.cells.len()];
        for &vertex in members {
            if let Some(cell) = self.cell_at(projected[vertex as usize]) {
                votes[cell.index()] += 1;
            }
        }
        votes
    }

    /// Winning cell for every cluster, `None` where no member voted
    pub fn classify(&self, projected: &[DVec2], clusters: &Clusters) -> Vec<Option<CellId>> {
        clusters
            .iter()
            .map(|(_, members)| majority(&self.tally(projected, members)))
            .collect()
    }
}

/// Cell with the most votes; ties go to the earliest cell, no votes gives `None`
pub fn majority(votes: &[usize]) -> Option<CellId> {
    let mut best: Option<(usize, usize)> = None;
    for (cell, &count) in votes.iter().enumerate() {
        if count == 0 {
            continue;
        }
        if best.is_none_or(|(_, best_count)| count > best_count) {
            best = Some((cell, count));
        }
    }
    best.map(|(cell, _)| CellId(cell as u32))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::grid_cells;
    use crate::graph::AdjacencyGraph;
    use meshatlas_assets::ObjMesh;

    #[test]
    fn test_majority_tie_breaks_on_plan_order() {
        assert_eq!(majority(&[0, 3, 5, 5]), Some(CellId(2)));
        assert_eq!(majority(&[4, 4]), Some(CellId(0)));
        assert_eq!(majority(&[0, 0, 0]), None);
        assert_eq!(majority(&[]), None);
    }

    #[test]
    fn test_cell_at_uses_half_open_footprints() {
        // Two 100-unit cells side by side: [0,100) and [100,200)
        let cells = grid_cells(2, 1, 100.0);
        let classifier = CellClassifier::new(&cells);

        assert_eq!(classifier.cell_at(DVec2::new(99.9, 50.0)), Some(CellId(0)));
        assert_eq!(classifier.cell_at(DVec2::new(100.0, 50.0)), Some(CellId(1)));
        assert_eq!(classifier.cell_at(DVec2::new(250.0, 50.0)), None);
    }

    #[test]
    fn test_cluster_follows_majority_of_vertices() {
        let cells = grid_cells(2, 1, 100.0);
        let classifier = CellClassifier::new(&cells);

        // One triangle pair straddling x = 100, three vertices on the right,
        // one on the left, one outside every footprint.
        let mesh = ObjMesh::parse(
            "v 90 0 0\nv 110 0 0\nv 120 0 0\nv 130 0 0\nv 500 0 0\nf 1 2 3\nf 3 4 5\n",
        )
        .unwrap();
        let projected: Vec<DVec2> = mesh.vertices.iter().map(|v| v.position.truncate()).collect();
        let clusters = Clusters::extract(&AdjacencyGraph::build(mesh.vertex_count(), &mesh.faces));

        assert_eq!(classifier.tally(&projected, clusters.members(crate::ClusterId(0))), vec![1, 3]);
        assert_eq!(classifier.classify(&projected, &clusters), vec![Some(CellId(1))]);
    }

    #[test]
    fn test_cluster_outside_every_cell_is_unassigned() {
        let cells = grid_cells(1, 1, 100.0);
        let classifier = CellClassifier::new(&cells);

        let mesh = ObjMesh::parse("v -5 0 0\nv -6 0 0\nv -5 -1 0\nf 1 2 3\n").unwrap();
        let projected: Vec<DVec2> = mesh.vertices.iter().map(|v| v.position.truncate()).collect();
        let clusters = Clusters::extract(&AdjacencyGraph::build(mesh.vertex_count(), &mesh.faces));

        assert_eq!(classifier.classify(&projected, &clusters), vec![None]);
    }
}
