//! Tunable parameters of the ivy mesh builder.

use bevy::prelude::*;

const MIN_SIDES: usize = 3;
const MAX_SIDES: usize = 64;
const MIN_BACKTRACKING_POINTS: usize = 2;

/// Read-only parameters consumed by [`IncrementalMeshBuilder`](crate::IncrementalMeshBuilder).
///
/// Out-of-range values are clamped by the `with_*` setters instead of being
/// rejected, so any settings value is usable.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct IvyMeshSettings {
    sides: usize,
    tip_influence: f32,
    generate_branches: bool,
    generate_leaves: bool,
    backtracking_points: usize,
    max_branches: usize,
    max_leaves_per_point: usize,
}

impl Default for IvyMeshSettings {
    fn default() -> Self {
        Self {
            sides: 6,
            tip_influence: 0.5,
            generate_branches: true,
            generate_leaves: true,
            backtracking_points: 10,
            max_branches: 64,
            max_leaves_per_point: 4,
        }
    }
}

impl IvyMeshSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of radial segments around a branch ring.
    pub fn with_sides(mut self, sides: usize) -> Self {
        self.sides = sides.clamp(MIN_SIDES, MAX_SIDES);
        self
    }

    /// Distance from the growing end over which geometry tapers to its center.
    pub fn with_tip_influence(mut self, distance: f32) -> Self {
        self.tip_influence = distance.max(0.0);
        self
    }

    pub fn with_generate_branches(mut self, enabled: bool) -> Self {
        self.generate_branches = enabled;
        self
    }

    pub fn with_generate_leaves(mut self, enabled: bool) -> Self {
        self.generate_leaves = enabled;
        self
    }

    /// Size of the rolling window of newest points rebuilt every step.
    ///
    /// The window always holds at least one ring and the tip cap.
    pub fn with_backtracking_points(mut self, points: usize) -> Self {
        self.backtracking_points = points.max(MIN_BACKTRACKING_POINTS);
        self
    }

    pub fn with_max_branches(mut self, branches: usize) -> Self {
        self.max_branches = branches.max(1);
        self
    }

    pub fn with_max_leaves_per_point(mut self, leaves: usize) -> Self {
        self.max_leaves_per_point = leaves;
        self
    }

    pub fn sides(&self) -> usize {
        self.sides
    }

    /// Vertices per ring: one per side plus the duplicated seam vertex.
    pub fn ring_vertex_count(&self) -> usize {
        self.sides + 1
    }

    pub fn tip_influence(&self) -> f32 {
        self.tip_influence
    }

    pub fn generate_branches(&self) -> bool {
        self.generate_branches
    }

    pub fn generate_leaves(&self) -> bool {
        self.generate_leaves
    }

    pub fn backtracking_points(&self) -> usize {
        self.backtracking_points
    }

    pub fn max_branches(&self) -> usize {
        self.max_branches
    }

    pub fn max_leaves_per_point(&self) -> usize {
        self.max_leaves_per_point
    }

    /// Toggles branch generation on an existing builder's settings.
    pub(crate) fn set_generate_branches(&mut self, enabled: bool) {
        self.generate_branches = enabled;
    }

    pub(crate) fn set_generate_leaves(&mut self, enabled: bool) {
        self.generate_leaves = enabled;
    }
}
