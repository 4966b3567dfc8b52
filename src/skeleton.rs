//! Branch sources backed by [`symbios_turtle_3d`] skeletons.
//!
//! A finished skeleton can be converted to branches in one go, or replayed a
//! few points per tick through [`SkeletonGrowth`] to animate it growing.

use bevy::prelude::*;
use symbios_turtle_3d::{Skeleton, SkeletonPoint};

use crate::branch::BranchContainer;

#[derive(Debug, Clone, Copy)]
struct StrandSample {
    position: Vec3,
    radius: f32,
    color: Vec4,
}

impl From<&SkeletonPoint> for StrandSample {
    fn from(point: &SkeletonPoint) -> Self {
        Self {
            position: point.position,
            radius: point.radius,
            color: point.color,
        }
    }
}

fn strand_samples(skeleton: &Skeleton) -> Vec<Vec<StrandSample>> {
    skeleton
        .strands
        .iter()
        .map(|strand| strand.iter().map(StrandSample::from).collect())
        .collect()
}

/// Converts every strand of `skeleton` into a fully grown branch.
///
/// Zero-length segments are dropped by [`BranchContainer::push_point`].
pub fn branches_from_skeleton(skeleton: &Skeleton, sides: usize, uv_scale: f32) -> Vec<BranchContainer> {
    strand_samples(skeleton)
        .into_iter()
        .map(|strand| {
            let mut branch = BranchContainer::new(sides, uv_scale);
            for sample in strand {
                branch.push_point(sample.position, sample.radius, sample.color);
            }
            branch
        })
        .collect()
}

/// Replays a finished skeleton into branches, strand by strand in lockstep.
pub struct SkeletonGrowth {
    strands: Vec<Vec<StrandSample>>,
    revealed: Vec<usize>,
    sides: usize,
    uv_scale: f32,
}

impl SkeletonGrowth {
    pub fn new(skeleton: &Skeleton, sides: usize, uv_scale: f32) -> Self {
        let strands = strand_samples(skeleton);
        Self {
            revealed: vec![0; strands.len()],
            strands,
            sides,
            uv_scale,
        }
    }

    pub fn strand_count(&self) -> usize {
        self.strands.len()
    }

    pub fn is_finished(&self) -> bool {
        self.strands
            .iter()
            .zip(&self.revealed)
            .all(|(strand, &revealed)| revealed >= strand.len())
    }

    /// Reveals up to `points_per_strand` more samples of every strand.
    ///
    /// `branches` is extended to one branch per strand on first use; branch
    /// `i` always replays strand `i`. Returns how many samples were consumed.
    pub fn grow(&mut self, branches: &mut Vec<BranchContainer>, points_per_strand: usize) -> usize {
        while branches.len() < self.strands.len() {
            branches.push(BranchContainer::new(self.sides, self.uv_scale));
        }

        let mut consumed = 0;
        for (index, strand) in self.strands.iter().enumerate() {
            let from = self.revealed[index];
            let to = (from + points_per_strand).min(strand.len());
            for sample in &strand[from..to] {
                branches[index].push_point(sample.position, sample.radius, sample.color);
            }
            consumed += to - from;
            self.revealed[index] = to;
        }
        consumed
    }
}
