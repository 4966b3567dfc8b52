//! Growing branch strands as produced by a growth simulation.
//!
//! Points are stored in a flat append-only array owned by the
//! [`BranchContainer`]. A point refers to its predecessor by index.

use std::f32::consts::{PI, TAU};

use bevy::math::Affine3A;
use bevy::prelude::*;

use crate::error::{IvyMeshError, IvyMeshResult};
use crate::leaf_cache::LeafInstance;

const MIN_SEGMENT_LENGTH_SQUARED: f32 = 0.000001;

/// A single vertex as stored in rings and leaf instances.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexData {
    pub position: Vec3,
    pub normal: Vec3,
    pub uv: Vec2,
    pub color: Vec4,
}

/// One sample along a branch. Immutable once created.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplePoint {
    /// World-space position.
    pub position: Vec3,
    /// Ring center in branch-local space.
    pub center: Vec3,
    /// Cross-section ring in branch-local space, `sides + 1` vertices.
    pub ring: Vec<VertexData>,
    /// Arc length from the branch root.
    pub length: f32,
    pub color: Vec4,
    /// Index of the preceding point, `None` for the root.
    pub previous: Option<usize>,
}

/// One vine strand: its points, their leaves and its running length.
#[derive(Debug, Clone)]
pub struct BranchContainer {
    points: Vec<SamplePoint>,
    leaves: Vec<Vec<LeafInstance>>,
    total_length: f32,
    sides: usize,
    uv_scale: f32,
    local_from_world: Affine3A,
    frame: Quat,
}

impl BranchContainer {
    /// Creates an empty branch whose rings have `sides` segments.
    pub fn new(sides: usize, uv_scale: f32) -> Self {
        Self {
            points: Vec::new(),
            leaves: Vec::new(),
            total_length: 0.0,
            sides: sides.max(3),
            uv_scale,
            local_from_world: Affine3A::IDENTITY,
            frame: Quat::IDENTITY,
        }
    }

    /// Sets the transform from world space into the mesh's local space.
    ///
    /// Only affects points appended afterwards.
    pub fn with_local_from_world(mut self, local_from_world: Affine3A) -> Self {
        self.local_from_world = local_from_world;
        self
    }

    pub fn points(&self) -> &[SamplePoint] {
        &self.points
    }

    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    pub fn total_length(&self) -> f32 {
        self.total_length
    }

    pub fn sides(&self) -> usize {
        self.sides
    }

    pub fn uv_scale(&self) -> f32 {
        self.uv_scale
    }

    pub fn local_from_world(&self) -> Affine3A {
        self.local_from_world
    }

    /// Leaves rooted at `point`, empty when out of range.
    pub fn leaves_at(&self, point: usize) -> &[LeafInstance] {
        self.leaves.get(point).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn leaf_count(&self) -> usize {
        self.leaves.iter().map(Vec::len).sum()
    }

    /// UV of the tapered cap closing the newest ring.
    pub fn last_uv(&self) -> Vec2 {
        Vec2::new(0.5, self.total_length * self.uv_scale)
    }

    /// Local-space direction from the second newest point to the newest one.
    pub fn tip_direction(&self) -> Vec3 {
        let Some(last) = self.points.last() else {
            return Vec3::ZERO;
        };
        let Some(previous) = last.previous.and_then(|i| self.points.get(i)) else {
            return Vec3::ZERO;
        };
        self.local_from_world
            .transform_vector3(last.position - previous.position)
            .normalize_or_zero()
    }

    /// Appends a sample at a world-space position and returns its index.
    ///
    /// The ring is oriented by parallel transport along the incoming segment.
    /// A point landing on top of the previous one is rejected with `None`.
    pub fn push_point(&mut self, position: Vec3, radius: f32, color: Vec4) -> Option<usize> {
        let center = self.local_from_world.transform_point3(position);

        let (length, previous) = match self.points.last() {
            Some(last) => {
                if last.position.distance_squared(position) <= MIN_SEGMENT_LENGTH_SQUARED {
                    trace!("dropping zero-length ivy segment at {position}");
                    return None;
                }
                let tangent = (center - last.center).normalize_or_zero();
                let forward = self.frame * Vec3::Y;
                self.frame = robust_rotation_arc(forward, tangent) * self.frame;
                (
                    last.length + last.position.distance(position),
                    Some(self.points.len() - 1),
                )
            }
            None => (0.0, None),
        };

        let ring = build_ring(
            center,
            self.frame,
            radius,
            color,
            self.sides,
            length * self.uv_scale,
        );

        self.points.push(SamplePoint {
            position,
            center,
            ring,
            length,
            color,
            previous,
        });
        self.leaves.push(Vec::new());
        self.total_length = length;
        Some(self.points.len() - 1)
    }

    /// Roots a leaf at an existing point.
    pub fn add_leaf(&mut self, point: usize, leaf: LeafInstance) -> IvyMeshResult<()> {
        let point_count = self.points.len();
        let slot = self
            .leaves
            .get_mut(point)
            .ok_or(IvyMeshError::LeafPointOutOfRange { point, point_count })?;
        slot.push(leaf);
        Ok(())
    }
}

fn robust_rotation_arc(from: Vec3, to: Vec3) -> Quat {
    const DOT_THRESHOLD: f32 = 0.9999;
    if to == Vec3::ZERO {
        return Quat::IDENTITY;
    }
    let dot = from.dot(to);
    if dot < -DOT_THRESHOLD {
        let axis = if from.x.abs() < 0.8 {
            Vec3::X.cross(from).normalize()
        } else {
            Vec3::Y.cross(from).normalize()
        };
        return Quat::from_axis_angle(axis, PI);
    } else if dot > DOT_THRESHOLD {
        return Quat::IDENTITY;
    }
    Quat::from_rotation_arc(from, to)
}

fn build_ring(
    center: Vec3,
    rotation: Quat,
    radius: f32,
    color: Vec4,
    sides: usize,
    v: f32,
) -> Vec<VertexData> {
    (0..=sides)
        .map(|i| {
            let u = i as f32 / sides as f32;
            let (sin, cos) = (u * TAU).sin_cos();
            let local_normal = Vec3::new(cos, 0.0, sin);
            VertexData {
                position: center + rotation * (local_normal * radius),
                normal: rotation * local_normal,
                uv: Vec2::new(u, v),
                color,
            }
        })
        .collect()
}
