//! Connectivity Graph
//!
//! Vertex adjacency derived from shared faces, stored as an arena of
//! neighbour lists indexed by vertex.

use meshatlas_assets::ObjFace;
use smallvec::SmallVec;

/// Undirected vertex adjacency
#[derive(Debug, Clone, Default)]
pub struct AdjacencyGraph {
    neighbors: Vec<Vec<u32>>,
}

impl AdjacencyGraph {
    /// Connect every pair of vertices that share a face.
    ///
    /// Cost is the sum of squared face sizes, which stays small for the
    /// triangles and quads an atlas is made of.
    pub fn build(vertex_count: usize, faces: &[ObjFace]) -> Self {
        let mut neighbors = vec![Vec::new(); vertex_count];

        for face in faces {
            let verts: SmallVec<[u32; 8]> = face.vertices().collect();
            for (i, &a) in verts.iter().enumerate() {
                for &b in &verts[i + 1..] {
                    if a != b {
                        neighbors[a as usize].push(b);
                        neighbors[b as usize].push(a);
                    }
                }
            }
        }

        for list in &mut neighbors {
            list.sort_unstable();
            list.dedup();
        }

        Self { neighbors }
    }

    /// Number of vertices in the graph
    pub fn vertex_count(&self) -> usize {
        self.neighbors.len()
    }

    /// Number of distinct undirected edges
    pub fn edge_count(&self) -> usize {
        self.neighbors.iter().map(Vec::len).sum::<usize>() / 2
    }

    /// Sorted neighbours of a vertex
    pub fn neighbors(&self, vertex: u32) -> &[u32] {
        &self.neighbors[vertex as usize]
    }
}
