//! Cluster Extraction
//!
//! Connected components of the adjacency graph. Each cluster is one piece of
//! geometry that was contiguous in some source model, so whole clusters are
//! what gets assigned to cells.

use std::collections::VecDeque;

use crate::graph::AdjacencyGraph;

/// Index of a cluster in extraction order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClusterId(pub u32);

impl ClusterId {
    /// Position of the cluster in [`Clusters`]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Disjoint vertex clusters plus the per-vertex cluster tag
#[derive(Debug, Clone, Default)]
pub struct Clusters {
    members: Vec<Vec<u32>>,
    cluster_of: Vec<ClusterId>,
}

impl Clusters {
    /// Breadth-first search from every unvisited vertex in index order.
    ///
    /// Clusters come out ordered by their smallest vertex index, and vertices
    /// that no face references become singleton clusters.
    pub fn extract(graph: &AdjacencyGraph) -> Self {
        let vertex_count = graph.vertex_count();
        let mut cluster_of = vec![ClusterId(u32::MAX); vertex_count];
        let mut members = Vec::new();
        let mut queue = VecDeque::new();

        for start in 0..vertex_count {
            if cluster_of[start] != ClusterId(u32::MAX) {
                continue;
            }

            let id = ClusterId(members.len() as u32);
            let mut cluster = Vec::new();
            cluster_of[start] = id;
            queue.push_back(start as u32);

            while let Some(vertex) = queue.pop_front() {
                cluster.push(vertex);
                for &neighbor in graph.neighbors(vertex) {
                    if cluster_of[neighbor as usize] == ClusterId(u32::MAX) {
                        cluster_of[neighbor as usize] = id;
                        queue.push_back(neighbor);
                    }
                }
            }

            members.push(cluster);
        }

        Self {
            members,
            cluster_of,
        }
    }

    /// Number of clusters
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Check if there are no clusters (the mesh has no vertices)
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Vertices of one cluster, in discovery order
    pub fn members(&self, id: ClusterId) -> &[u32] {
        &self.members[id.index()]
    }

    /// Cluster a vertex belongs to
    pub fn cluster_of(&self, vertex: u32) -> ClusterId {
        self.cluster_of[vertex as usize]
    }

    /// Iterate over clusters with their ids
    pub fn iter(&self) -> impl Iterator<Item = (ClusterId, &[u32])> + '_ {
        self.members
            .iter()
            .enumerate()
            .map(|(i, members)| (ClusterId(i as u32), members.as_slice()))
    }

    /// Mean cluster size in vertices, 0 when there are no clusters
    pub fn mean_size(&self) -> f64 {
        if self.members.is_empty() {
            return 0.0;
        }
        self.cluster_of.len() as f64 / self.members.len() as f64
    }
}
