//! Buffer capacity estimates for the two growth modes.
//!
//! The tip buffer is sized the same way in both modes, from the backtracking
//! window. The baked buffer is sized either from a finished mesh (bake mode)
//! or from an estimated point count (procedural mode).

use crate::branch::BranchContainer;
use crate::error::{IvyMeshError, IvyMeshResult};
use crate::leaf_cache::LeafMeshCache;
use crate::mesh_data::MeshData;
use crate::settings::IvyMeshSettings;

/// Points estimated per unit of `lifetime / growth_speed` in procedural mode.
pub const PROCEDURAL_POINTS_PER_UNIT: f32 = 200.0;

/// Vertex and per-submesh index counts of an already complete mesh.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FinishedMeshCounts {
    pub vertex_count: usize,
    pub submesh_index_counts: Vec<usize>,
}

impl FinishedMeshCounts {
    pub fn from_mesh_data(data: &MeshData) -> Self {
        Self {
            vertex_count: data.vertex_count(),
            submesh_index_counts: (0..data.submesh_count())
                .map(|s| data.indices(s).len())
                .collect(),
        }
    }

    /// Worst case for fully grown branches: every point baked as a ring and
    /// every leaf baked.
    pub fn for_branches(
        branches: &[BranchContainer],
        settings: &IvyMeshSettings,
        leaf_cache: &LeafMeshCache,
    ) -> IvyMeshResult<Self> {
        let ring = settings.ring_vertex_count();
        let mut counts = Self {
            vertex_count: 0,
            submesh_index_counts: vec![0; leaf_cache.submesh_count()],
        };

        for branch in branches {
            let points = branch.point_count();
            counts.vertex_count += points * ring;
            counts.submesh_index_counts[0] += points.saturating_sub(1) * settings.sides() * 6;

            for point in 0..points {
                for leaf in branch.leaves_at(point) {
                    let template = leaf_cache.template(leaf.leaf_type())?;
                    let submesh = leaf_cache.submesh_for(leaf.leaf_type())?;
                    counts.vertex_count += leaf.vertices().len();
                    counts.submesh_index_counts[submesh] += template.indices.len();
                }
            }
        }
        Ok(counts)
    }
}

/// How the permanent (baked) buffer is sized.
#[derive(Debug, Clone, PartialEq)]
pub enum SizingPolicy {
    /// Replaying toward a known finished mesh.
    Baked(FinishedMeshCounts),
    /// Open-ended growth; capacity comes from an estimated point count.
    Procedural { lifetime: f32, growth_speed: f32 },
}

/// Vertex capacity plus one index capacity per submesh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferCapacity {
    pub vertices: usize,
    pub indices: Vec<usize>,
}

impl BufferCapacity {
    pub fn allocate(&self, label: &'static str) -> MeshData {
        MeshData::with_capacity(label, self.vertices, self.indices.clone())
    }
}

/// Capacity of the tip buffer, rebuilt from the backtracking window each step.
pub fn tip_capacity(settings: &IvyMeshSettings, leaf_cache: &LeafMeshCache) -> BufferCapacity {
    let window = settings.backtracking_points();
    let branches = settings.max_branches();
    let sides = settings.sides();
    let leaves_per_branch = window * settings.max_leaves_per_point();

    let branch_vertices = window * settings.ring_vertex_count() + 1;
    let leaf_vertices = leaves_per_branch * leaf_cache.max_vertices();
    let branch_triangles = (window - 1) * sides * 2 + sides;

    let mut indices = vec![branches * branch_triangles * 3];
    indices.extend(
        (1..leaf_cache.submesh_count())
            .map(|_| branches * leaves_per_branch * leaf_cache.max_indices()),
    );

    BufferCapacity {
        vertices: branches * (branch_vertices + leaf_vertices),
        indices,
    }
}

/// Estimated total point count per branch for procedural growth.
pub fn procedural_max_points(lifetime: f32, growth_speed: f32) -> IvyMeshResult<usize> {
    if growth_speed.is_nan() || growth_speed <= 0.0 {
        return Err(IvyMeshError::InvalidSizing(format!(
            "growth speed must be positive, got {growth_speed}"
        )));
    }
    if !lifetime.is_finite() || lifetime < 0.0 {
        return Err(IvyMeshError::InvalidSizing(format!(
            "lifetime must be finite and non-negative, got {lifetime}"
        )));
    }
    Ok((lifetime / growth_speed * PROCEDURAL_POINTS_PER_UNIT).ceil() as usize)
}

/// Capacity of the baked buffer under `policy`.
pub fn baked_capacity(
    policy: &SizingPolicy,
    settings: &IvyMeshSettings,
    leaf_cache: &LeafMeshCache,
) -> IvyMeshResult<BufferCapacity> {
    let submeshes = leaf_cache.submesh_count();
    match policy {
        SizingPolicy::Baked(finished) => {
            let indices = (0..submeshes)
                .map(|s| finished.submesh_index_counts.get(s).copied().unwrap_or(0))
                .collect();
            Ok(BufferCapacity {
                vertices: finished.vertex_count,
                indices,
            })
        }
        SizingPolicy::Procedural {
            lifetime,
            growth_speed,
        } => {
            let points = procedural_max_points(*lifetime, *growth_speed)?;
            let branches = settings.max_branches();
            let leaves = points * settings.max_leaves_per_point();

            let vertices = branches
                * (points * settings.ring_vertex_count() + leaves * leaf_cache.max_vertices());
            let mut indices = vec![branches * points * settings.sides() * 6];
            indices.extend(
                (1..submeshes).map(|_| branches * leaves * leaf_cache.max_indices()),
            );
            Ok(BufferCapacity { vertices, indices })
        }
    }
}
