//! Fixed-capacity vertex/triangle buffer shared by the tip and baked meshes.

use bevy::prelude::*;

use crate::error::{IvyMeshError, IvyMeshResult};
use crate::sink::MeshSink;

/// Axis-aligned bounds of a vertex set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl Bounds {
    /// Returns `None` for an empty point set.
    pub fn from_points(points: &[Vec3]) -> Option<Self> {
        let first = *points.first()?;
        let (min, max) = points
            .iter()
            .fold((first, first), |(min, max), p| (min.min(*p), max.max(*p)));
        Some(Self { min, max })
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }
}

/// Parallel vertex attribute arrays plus one index list per submesh.
///
/// Capacity is fixed at construction. Going past it is reported as
/// [`IvyMeshError::CapacityExceeded`] instead of reallocating, since it means
/// the sizing estimate was wrong.
#[derive(Debug, Clone)]
pub struct MeshData {
    label: &'static str,
    positions: Vec<Vec3>,
    normals: Vec<Vec3>,
    uvs: Vec<Vec2>,
    colors: Vec<[f32; 4]>,
    submeshes: Vec<Vec<u32>>,
    vertex_capacity: usize,
    index_capacities: Vec<usize>,
}

impl MeshData {
    /// `index_capacities` holds one entry per submesh; submesh 0 is branch geometry.
    pub fn with_capacity(
        label: &'static str,
        vertex_capacity: usize,
        index_capacities: Vec<usize>,
    ) -> Self {
        Self {
            label,
            positions: Vec::with_capacity(vertex_capacity),
            normals: Vec::with_capacity(vertex_capacity),
            uvs: Vec::with_capacity(vertex_capacity),
            colors: Vec::with_capacity(vertex_capacity),
            submeshes: index_capacities
                .iter()
                .map(|&capacity| Vec::with_capacity(capacity))
                .collect(),
            vertex_capacity,
            index_capacities,
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Appends one vertex and returns its index.
    pub fn add_vertex(
        &mut self,
        position: Vec3,
        normal: Vec3,
        uv: Vec2,
        color: Vec4,
    ) -> IvyMeshResult<u32> {
        if self.positions.len() >= self.vertex_capacity {
            return Err(IvyMeshError::CapacityExceeded {
                buffer: self.label,
                resource: "vertex",
                capacity: self.vertex_capacity,
            });
        }
        let index = self.positions.len() as u32;
        self.positions.push(position);
        self.normals.push(normal);
        self.uvs.push(uv);
        self.colors.push(color.to_array());
        Ok(index)
    }

    /// Appends a single index to `submesh`. Three calls form one triangle;
    /// winding order is the caller's business.
    pub fn add_triangle(&mut self, submesh: usize, vertex_index: u32) -> IvyMeshResult<()> {
        let vertex_count = self.positions.len();
        if vertex_index as usize >= vertex_count {
            return Err(IvyMeshError::DanglingIndex {
                index: vertex_index,
                vertex_count,
            });
        }
        let capacity = *self
            .index_capacities
            .get(submesh)
            .ok_or(IvyMeshError::UnknownSubmesh(submesh))?;
        let indices = &mut self.submeshes[submesh];
        if indices.len() >= capacity {
            return Err(IvyMeshError::CapacityExceeded {
                buffer: self.label,
                resource: "triangle index",
                capacity,
            });
        }
        indices.push(vertex_index);
        Ok(())
    }

    /// Fails unless `vertices` more vertices and `indices[s]` more indices per
    /// submesh `s` still fit. Nothing is appended either way.
    pub fn check_room(&self, vertices: usize, indices: &[usize]) -> IvyMeshResult<()> {
        if self.positions.len() + vertices > self.vertex_capacity {
            return Err(IvyMeshError::CapacityExceeded {
                buffer: self.label,
                resource: "vertex",
                capacity: self.vertex_capacity,
            });
        }
        for (submesh, &needed) in indices.iter().enumerate() {
            if needed == 0 {
                continue;
            }
            let capacity = *self
                .index_capacities
                .get(submesh)
                .ok_or(IvyMeshError::UnknownSubmesh(submesh))?;
            if self.submeshes[submesh].len() + needed > capacity {
                return Err(IvyMeshError::CapacityExceeded {
                    buffer: self.label,
                    resource: "triangle index",
                    capacity,
                });
            }
        }
        Ok(())
    }

    /// Resets every count to zero. Capacity is kept.
    pub fn clear(&mut self) {
        self.positions.clear();
        self.normals.clear();
        self.uvs.clear();
        self.colors.clear();
        for indices in &mut self.submeshes {
            indices.clear();
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn vertex_capacity(&self) -> usize {
        self.vertex_capacity
    }

    pub fn submesh_count(&self) -> usize {
        self.submeshes.len()
    }

    pub fn index_capacity(&self, submesh: usize) -> Option<usize> {
        self.index_capacities.get(submesh).copied()
    }

    /// Number of whole triangles in `submesh`.
    pub fn triangle_count(&self, submesh: usize) -> usize {
        self.indices(submesh).len() / 3
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    pub fn uvs(&self) -> &[Vec2] {
        &self.uvs
    }

    pub fn colors(&self) -> &[[f32; 4]] {
        &self.colors
    }

    /// Index list of `submesh`, empty for unknown submeshes.
    pub fn indices(&self, submesh: usize) -> &[u32] {
        self.submeshes
            .get(submesh)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::from_points(&self.positions)
    }

    /// Hands the whole buffer to a renderable mesh and recomputes its bounds.
    pub fn push_to<S: MeshSink + ?Sized>(&self, sink: &mut S) {
        sink.push_vertices(&self.positions, &self.normals, &self.uvs, &self.colors);
        for (submesh, indices) in self.submeshes.iter().enumerate() {
            sink.push_triangles(submesh, indices);
        }
        sink.recalculate_bounds();
    }
}
