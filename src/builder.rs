//! Incremental mesh building for growing ivy.
//!
//! Each branch is split in two regions:
//!
//! - the **baked** region: points already promoted into the permanent buffer.
//!   They are appended once and never touched again.
//! - the **tip window**: the newest `backtracking_points` points, rebuilt from
//!   scratch into the tip buffer every step so the growing end can taper.
//!
//! The first ring of the tip window is also the last baked ring, so the two
//! meshes meet without a gap. Leaves of a point live in the tip buffer while
//! the point is inside the window and are baked once it falls behind.
//!
//! A typical tick is: grow the branches, call
//! [`check_copy_mesh`](IncrementalMeshBuilder::check_copy_mesh) for every
//! branch, push the baked buffer if it changed, then
//! [`step`](IncrementalMeshBuilder::step).

use bevy::prelude::*;

use crate::branch::{BranchContainer, SamplePoint};
use crate::error::{IvyMeshError, IvyMeshResult};
use crate::leaf_cache::{LeafInstance, LeafMeshCache};
use crate::mesh_data::MeshData;
use crate::settings::IvyMeshSettings;
use crate::sink::MeshSink;
use crate::sizing::{self, FinishedMeshCounts, SizingPolicy};

const BRANCH_SUBMESH: usize = 0;

/// Blend factor between a vertex's center (0) and its full position (1).
///
/// Inverse lerp of `point_length` from `total_length` (the tip) to
/// `total_length - tip_influence`, clamped to `[0, 1]`. A non-positive
/// influence distance disables tapering.
pub fn tip_influence_factor(total_length: f32, tip_influence: f32, point_length: f32) -> f32 {
    if tip_influence <= 0.0 {
        return 1.0;
    }
    ((total_length - point_length) / tip_influence).clamp(0.0, 1.0)
}

/// Builds the tip and baked meshes of one ivy from its branches.
///
/// Per-branch counters are kept as parallel arrays indexed by branch id.
pub struct IncrementalMeshBuilder {
    settings: IvyMeshSettings,
    leaf_cache: LeafMeshCache,
    tip: MeshData,
    baked: MeshData,

    tip_vertex_counts: Vec<usize>,
    tip_leaf_vertex_counts: Vec<usize>,
    tip_triangle_counts: Vec<usize>,

    promoted_points: Vec<Option<usize>>,
    baked_leaf_points: Vec<usize>,
    baked_vertex_counts: Vec<usize>,
    baked_last_ring: Vec<Option<u32>>,
    baked_dirty: bool,
}

impl IncrementalMeshBuilder {
    /// Builder replaying toward an already finished mesh.
    pub fn baked(
        settings: IvyMeshSettings,
        leaf_cache: LeafMeshCache,
        finished: FinishedMeshCounts,
    ) -> IvyMeshResult<Self> {
        Self::with_policy(settings, leaf_cache, SizingPolicy::Baked(finished))
    }

    /// Builder for open-ended growth.
    pub fn procedural(
        settings: IvyMeshSettings,
        leaf_cache: LeafMeshCache,
        lifetime: f32,
        growth_speed: f32,
    ) -> IvyMeshResult<Self> {
        Self::with_policy(
            settings,
            leaf_cache,
            SizingPolicy::Procedural {
                lifetime,
                growth_speed,
            },
        )
    }

    pub fn with_policy(
        settings: IvyMeshSettings,
        leaf_cache: LeafMeshCache,
        policy: SizingPolicy,
    ) -> IvyMeshResult<Self> {
        let tip_capacity = sizing::tip_capacity(&settings, &leaf_cache);
        let baked_capacity = sizing::baked_capacity(&policy, &settings, &leaf_cache)?;
        debug!(
            "ivy mesh builder: tip {} vertices {:?} indices, baked {} vertices {:?} indices",
            tip_capacity.vertices,
            tip_capacity.indices,
            baked_capacity.vertices,
            baked_capacity.indices
        );

        let branches = settings.max_branches();
        Ok(Self {
            tip: tip_capacity.allocate("tip"),
            baked: baked_capacity.allocate("baked"),
            tip_vertex_counts: vec![0; branches],
            tip_leaf_vertex_counts: vec![0; branches],
            tip_triangle_counts: vec![0; branches],
            promoted_points: vec![None; branches],
            baked_leaf_points: vec![0; branches],
            baked_vertex_counts: vec![0; branches],
            baked_last_ring: vec![None; branches],
            baked_dirty: false,
            settings,
            leaf_cache,
        })
    }

    pub fn settings(&self) -> &IvyMeshSettings {
        &self.settings
    }

    pub fn leaf_cache(&self) -> &LeafMeshCache {
        &self.leaf_cache
    }

    pub fn set_generate_branches(&mut self, enabled: bool) {
        self.settings.set_generate_branches(enabled);
    }

    pub fn set_generate_leaves(&mut self, enabled: bool) {
        self.settings.set_generate_leaves(enabled);
    }

    pub fn tip(&self) -> &MeshData {
        &self.tip
    }

    pub fn baked_mesh(&self) -> &MeshData {
        &self.baked
    }

    /// Branch vertices (rings and cap) the branch put in the tip buffer this step.
    pub fn tip_vertex_count(&self, branch: usize) -> usize {
        self.tip_vertex_counts.get(branch).copied().unwrap_or(0)
    }

    pub fn tip_leaf_vertex_count(&self, branch: usize) -> usize {
        self.tip_leaf_vertex_counts.get(branch).copied().unwrap_or(0)
    }

    /// Branch triangles the branch put in the tip buffer this step.
    pub fn tip_triangle_count(&self, branch: usize) -> usize {
        self.tip_triangle_counts.get(branch).copied().unwrap_or(0)
    }

    /// Index of the newest point copied into the baked buffer.
    pub fn promotion_cursor(&self, branch: usize) -> Option<usize> {
        self.promoted_points.get(branch).copied().flatten()
    }

    /// True once since the last call if promotion appended anything.
    pub fn take_baked_dirty(&mut self) -> bool {
        std::mem::take(&mut self.baked_dirty)
    }

    /// Rebuilds the tip buffer from every branch's window and pushes it to `sink`.
    pub fn step<S: MeshSink + ?Sized>(
        &mut self,
        branches: &[BranchContainer],
        sink: &mut S,
    ) -> IvyMeshResult<()> {
        self.build_tip(branches)?;
        self.tip.push_to(sink);
        Ok(())
    }

    /// Pushes the baked buffer to `sink`.
    pub fn push_baked<S: MeshSink + ?Sized>(&self, sink: &mut S) {
        self.baked.push_to(sink);
    }

    /// Rebuilds the tip buffer without pushing it anywhere.
    pub fn build_tip(&mut self, branches: &[BranchContainer]) -> IvyMeshResult<()> {
        self.tip.clear();
        self.tip_vertex_counts.fill(0);
        self.tip_leaf_vertex_counts.fill(0);
        self.tip_triangle_counts.fill(0);

        for (index, branch) in branches.iter().enumerate() {
            self.check_branch_index(index)?;
            if branch.point_count() <= 1 {
                continue;
            }
            self.build_branch_tip(index, branch)?;
        }

        trace!(
            "ivy tip rebuilt: {} vertices, {} branch triangles",
            self.tip.vertex_count(),
            self.tip.triangle_count(BRANCH_SUBMESH)
        );
        Ok(())
    }

    fn build_branch_tip(&mut self, index: usize, branch: &BranchContainer) -> IvyMeshResult<()> {
        let points = branch.points();
        let start = points
            .len()
            .saturating_sub(self.settings.backtracking_points());
        let window = &points[start..];
        let total_length = branch.total_length();
        let tip_influence = self.settings.tip_influence();
        let sides = self.settings.sides();
        let ring_len = self.settings.ring_vertex_count() as u32;

        if self.settings.generate_branches() {
            let (rings, tip_point) = window.split_at(window.len() - 1);
            let tip_point = &tip_point[0];
            let first_vertex = self.tip.vertex_count() as u32;

            for point in rings {
                self.check_ring(index, point)?;
                let factor = tip_influence_factor(total_length, tip_influence, point.length);
                for v in &point.ring {
                    let position = point.center.lerp(v.position, factor);
                    self.tip.add_vertex(position, v.normal, v.uv, v.color)?;
                }
            }

            let cap = self.tip.add_vertex(
                tip_point.center,
                branch.tip_direction(),
                branch.last_uv(),
                tip_point.color,
            )?;

            for r in 1..rings.len() as u32 {
                let bottom = first_vertex + (r - 1) * ring_len;
                connect_rings(&mut self.tip, bottom, bottom + ring_len, sides)?;
            }
            let last_ring = first_vertex + (rings.len() as u32 - 1) * ring_len;
            close_cap(&mut self.tip, last_ring, cap, sides)?;

            self.tip_vertex_counts[index] = (cap - first_vertex + 1) as usize;
            self.tip_triangle_counts[index] = (rings.len() - 1) * sides * 2 + sides;
        }

        if self.settings.generate_leaves() {
            for (offset, point) in window.iter().enumerate() {
                let factor = tip_influence_factor(total_length, tip_influence, point.length);
                for leaf in branch.leaves_at(start + offset) {
                    let added = append_leaf(&mut self.tip, &self.leaf_cache, leaf, factor)?;
                    self.tip_leaf_vertex_counts[index] += added;
                }
            }
        }
        Ok(())
    }

    /// Promotes the points that fell behind the tip window into the baked buffer.
    ///
    /// The first promotion of a branch copies every point from the root up to
    /// the first ring of the window; later calls copy whatever the window moved
    /// past since. The batch is validated and its capacity checked before
    /// anything is appended, so an error leaves the baked buffer and cursor as
    /// they were. Returns whether anything was appended.
    pub fn check_copy_mesh(&mut self, index: usize, branch: &BranchContainer) -> IvyMeshResult<bool> {
        self.check_branch_index(index)?;
        if !self.settings.generate_branches() {
            return Ok(false);
        }

        let point_count = branch.point_count();
        let window = self.settings.backtracking_points();
        if point_count <= window {
            return Ok(false);
        }
        let seam = point_count - window;

        let first = match self.promoted_points[index] {
            None => 0,
            Some(last) if last >= point_count => {
                return Err(IvyMeshError::MalformedBranch {
                    branch: index,
                    reason: format!(
                        "promotion cursor {last} is past the branch's {point_count} points"
                    ),
                });
            }
            Some(last) => last + 1,
        };
        if first > seam {
            return Ok(false);
        }

        let rings = &branch.points()[first..=seam];
        let leaf_points = if self.settings.generate_leaves() {
            self.baked_leaf_points[index]..seam
        } else {
            seam..seam
        };
        self.check_promotion_room(index, branch, rings, leaf_points.clone())?;

        if first == 0 {
            debug!(
                "ivy branch {index}: first promotion of {} points at {point_count} points",
                rings.len()
            );
        }
        for point in rings {
            self.bake_ring(index, point)?;
        }
        self.promoted_points[index] = Some(seam);

        if !leaf_points.is_empty() {
            for point in leaf_points {
                for leaf in branch.leaves_at(point) {
                    append_leaf(&mut self.baked, &self.leaf_cache, leaf, 1.0)?;
                }
            }
            self.baked_leaf_points[index] = seam;
        }

        self.baked_dirty = true;
        Ok(true)
    }

    fn check_promotion_room(
        &self,
        index: usize,
        branch: &BranchContainer,
        rings: &[SamplePoint],
        leaf_points: std::ops::Range<usize>,
    ) -> IvyMeshResult<()> {
        for point in rings {
            self.check_ring(index, point)?;
        }

        let connected = if self.baked_last_ring[index].is_some() {
            rings.len()
        } else {
            rings.len().saturating_sub(1)
        };
        let mut vertices = rings.len() * self.settings.ring_vertex_count();
        let mut indices = vec![0; self.baked.submesh_count().max(1)];
        indices[BRANCH_SUBMESH] = connected * self.settings.sides() * 6;

        for point in leaf_points {
            for leaf in branch.leaves_at(point) {
                let plan = plan_leaf(&self.leaf_cache, leaf)?;
                vertices += leaf.vertices().len();
                if indices.len() <= plan.submesh {
                    indices.resize(plan.submesh + 1, 0);
                }
                indices[plan.submesh] += plan.indices.len();
            }
        }
        self.baked.check_room(vertices, &indices)
    }

    fn bake_ring(&mut self, index: usize, point: &SamplePoint) -> IvyMeshResult<()> {
        let ring_len = self.settings.ring_vertex_count();

        let mut start = None;
        for v in &point.ring {
            let vertex = self.baked.add_vertex(v.position, v.normal, v.uv, v.color)?;
            start.get_or_insert(vertex);
        }
        let Some(start) = start else {
            return Ok(());
        };
        self.baked_vertex_counts[index] += ring_len;

        if self.baked_vertex_counts[index] >= 2 * ring_len {
            if let Some(previous) = self.baked_last_ring[index] {
                connect_rings(&mut self.baked, previous, start, self.settings.sides())?;
            }
        }
        self.baked_last_ring[index] = Some(start);
        Ok(())
    }

    fn check_branch_index(&self, index: usize) -> IvyMeshResult<()> {
        if index >= self.settings.max_branches() {
            return Err(IvyMeshError::BranchOutOfRange {
                branch: index,
                max_branches: self.settings.max_branches(),
            });
        }
        Ok(())
    }

    fn check_ring(&self, index: usize, point: &SamplePoint) -> IvyMeshResult<()> {
        let expected = self.settings.ring_vertex_count();
        if point.ring.len() != expected {
            return Err(IvyMeshError::MalformedBranch {
                branch: index,
                reason: format!(
                    "ring has {} vertices, expected {expected}",
                    point.ring.len()
                ),
            });
        }
        Ok(())
    }
}

fn push_triangle(data: &mut MeshData, submesh: usize, [a, b, c]: [u32; 3]) -> IvyMeshResult<()> {
    data.add_triangle(submesh, a)?;
    data.add_triangle(submesh, b)?;
    data.add_triangle(submesh, c)
}

/// Two triangles per side between consecutive rings.
fn connect_rings(data: &mut MeshData, bottom_start: u32, top_start: u32, sides: usize) -> IvyMeshResult<()> {
    for i in 0..sides as u32 {
        let bottom_curr = bottom_start + i;
        let bottom_next = bottom_start + i + 1;
        let top_curr = top_start + i;
        let top_next = top_start + i + 1;

        push_triangle(data, BRANCH_SUBMESH, [bottom_curr, top_curr, bottom_next])?;
        push_triangle(data, BRANCH_SUBMESH, [bottom_next, top_curr, top_next])?;
    }
    Ok(())
}

/// Fan from the newest ring into the single cap vertex.
fn close_cap(data: &mut MeshData, ring_start: u32, cap: u32, sides: usize) -> IvyMeshResult<()> {
    for i in 0..sides as u32 {
        push_triangle(data, BRANCH_SUBMESH, [ring_start + i, cap, ring_start + i + 1])?;
    }
    Ok(())
}

struct LeafPlan<'a> {
    indices: &'a [u32],
    submesh: usize,
}

/// Resolves a leaf's template and submesh, rejecting template indices that
/// point past the leaf's own vertices.
fn plan_leaf<'a>(cache: &'a LeafMeshCache, leaf: &LeafInstance) -> IvyMeshResult<LeafPlan<'a>> {
    let template = cache.template(leaf.leaf_type())?;
    let submesh = cache.submesh_for(leaf.leaf_type())?;
    let vertex_count = leaf.vertices().len();
    if let Some(&index) = template
        .indices
        .iter()
        .find(|&&i| i as usize >= vertex_count)
    {
        return Err(IvyMeshError::DanglingIndex {
            index,
            vertex_count,
        });
    }
    Ok(LeafPlan {
        indices: &template.indices,
        submesh,
    })
}

/// Appends one leaf, shrunk toward its center by `factor`. Returns the
/// number of vertices added. On error nothing is appended.
fn append_leaf(
    data: &mut MeshData,
    cache: &LeafMeshCache,
    leaf: &LeafInstance,
    factor: f32,
) -> IvyMeshResult<usize> {
    let plan = plan_leaf(cache, leaf)?;
    let mut needed = vec![0; plan.submesh + 1];
    needed[plan.submesh] = plan.indices.len();
    data.check_room(leaf.vertices().len(), &needed)?;

    let center = leaf.center();
    let first = data.vertex_count() as u32;
    for v in leaf.vertices() {
        data.add_vertex(center.lerp(v.position, factor), v.normal, v.uv, v.color)?;
    }
    for &i in plan.indices {
        data.add_triangle(plan.submesh, first + i)?;
    }
    Ok(leaf.vertices().len())
}
