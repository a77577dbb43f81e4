//! Fragment Reconciliation
//!
//! Atlas assembly leaves stray micro-clusters (loose faces, detached trim)
//! whose vote is meaningless, and clusters that fall outside every footprint
//! get no vote at all. Both are moved to the cell whose center is nearest to
//! the cluster's projected centroid.

use glam::DVec2;
use meshatlas_assets::{Cell, CellId};
use meshatlas_core::SplitConfig;

use crate::cluster::Clusters;

/// Outcome of a reconciliation pass
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ReconcileReport {
    /// Size below which a cluster counted as a fragment
    pub threshold: f64,
    /// Clusters below the threshold
    pub fragments: usize,
    /// Fragments whose cell changed
    pub reassigned: usize,
    /// Clusters that had no vote and were placed by distance
    pub unvoted: usize,
}

/// Moves undersized or unvoted clusters to the nearest cell center
#[derive(Debug, Clone, Copy)]
pub struct FragmentReconciler {
    floor: usize,
    fraction: f64,
}

impl FragmentReconciler {
    /// Fragments are clusters smaller than `max(floor, fraction * mean size)`
    pub fn new(floor: usize, fraction: f64) -> Self {
        Self { floor, fraction }
    }

    /// Use the thresholds from a split config
    pub fn from_config(config: &SplitConfig) -> Self {
        Self::new(config.fragment_floor, config.fragment_fraction)
    }

    /// Fragment threshold for a set of clusters
    pub fn threshold(&self, clusters: &Clusters) -> f64 {
        (self.floor as f64).max(self.fraction * clusters.mean_size())
    }

    /// Override `assignments` (one per cluster) for fragments and unvoted clusters
    pub fn reconcile(
        &self,
        clusters: &Clusters,
        projected: &[DVec2],
        cells: &[Cell],
        assignments: &mut [Option<CellId>],
    ) -> ReconcileReport {
        let mut report = ReconcileReport {
            threshold: self.threshold(clusters),
            ..ReconcileReport::default()
        };

        for (id, members) in clusters.iter() {
            let current = assignments[id.index()];
            let is_fragment = (members.len() as f64) < report.threshold;
            if !is_fragment && current.is_some() {
                continue;
            }

            let nearest = nearest_cell(cells, centroid(projected, members));
            if is_fragment {
                report.fragments += 1;
                if nearest.is_some() && nearest != current {
                    report.reassigned += 1;
                }
            }
            if current.is_none() {
                report.unvoted += 1;
            }
            if nearest.is_some() {
                assignments[id.index()] = nearest;
            }
        }

        report
    }
}

/// Mean projected position of a set of vertices
pub fn centroid(projected: &[DVec2], members: &[u32]) -> DVec2 {
    if members.is_empty() {
        return DVec2::ZERO;
    }
    let sum: DVec2 = members.iter().map(|&v| projected[v as usize]).sum();
    sum / members.len() as f64
}

/// Cell whose footprint center is nearest to a point; ties go to the earliest cell
pub fn nearest_cell(cells: &[Cell], point: DVec2) -> Option<CellId> {
    let mut best: Option<(CellId, f64)> = None;
    for cell in cells {
        let distance = cell.footprint.center().distance_squared(point);
        if best.is_none_or(|(_, best_distance)| distance < best_distance) {
            best = Some((cell.id, distance));
        }
    }
    best.map(|(id, _)| id)
}
