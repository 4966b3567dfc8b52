//! Leaf geometry templates and placed leaf instances.
//!
//! Each template carries a material id. Distinct material ids are assigned
//! submeshes `1..=N` in order of first appearance; submesh 0 is always the
//! branch geometry.

use bevy::prelude::*;

use crate::branch::VertexData;
use crate::error::{IvyMeshError, IvyMeshResult};

/// Vertices and triangle indices of one leaf variant, in leaf space.
#[derive(Debug, Clone, PartialEq)]
pub struct LeafTemplate {
    pub vertices: Vec<VertexData>,
    pub indices: Vec<u32>,
    pub material_id: u8,
}

impl LeafTemplate {
    /// A flat two-triangle card growing along +Y from its base, facing +Z.
    pub fn quad(width: f32, length: f32, material_id: u8) -> Self {
        let half = width * 0.5;
        let corner = |x: f32, y: f32, uv: Vec2| VertexData {
            position: Vec3::new(x, y, 0.0),
            normal: Vec3::Z,
            uv,
            color: Vec4::ONE,
        };
        Self {
            vertices: vec![
                corner(-half, 0.0, Vec2::new(0.0, 0.0)),
                corner(half, 0.0, Vec2::new(1.0, 0.0)),
                corner(half, length, Vec2::new(1.0, 1.0)),
                corner(-half, length, Vec2::new(0.0, 1.0)),
            ],
            indices: vec![0, 1, 2, 0, 2, 3],
            material_id,
        }
    }
}

/// A leaf placed on a branch, in branch-local space. Immutable once created.
#[derive(Debug, Clone, PartialEq)]
pub struct LeafInstance {
    leaf_type: usize,
    vertices: Vec<VertexData>,
    center: Vec3,
}

impl LeafInstance {
    pub fn new(leaf_type: usize, vertices: Vec<VertexData>, center: Vec3) -> Self {
        Self {
            leaf_type,
            vertices,
            center,
        }
    }

    pub fn leaf_type(&self) -> usize {
        self.leaf_type
    }

    pub fn vertices(&self) -> &[VertexData] {
        &self.vertices
    }

    /// Point the leaf shrinks toward near the growing tip.
    pub fn center(&self) -> Vec3 {
        self.center
    }
}

/// Read-only table of leaf templates indexed by leaf type.
#[derive(Debug, Clone, Default)]
pub struct LeafMeshCache {
    templates: Vec<LeafTemplate>,
    submesh_of: Vec<usize>,
    submesh_materials: Vec<u8>,
}

impl LeafMeshCache {
    /// Validates every template and assigns leaf submeshes.
    pub fn new(templates: Vec<LeafTemplate>) -> IvyMeshResult<Self> {
        let mut submesh_materials: Vec<u8> = Vec::new();
        let mut submesh_of = Vec::with_capacity(templates.len());

        for (template_index, template) in templates.iter().enumerate() {
            if let Some(&index) = template
                .indices
                .iter()
                .find(|&&i| i as usize >= template.vertices.len())
            {
                return Err(IvyMeshError::InvalidLeafTemplate {
                    template: template_index,
                    index,
                    vertex_count: template.vertices.len(),
                });
            }

            let slot = match submesh_materials
                .iter()
                .position(|&m| m == template.material_id)
            {
                Some(slot) => slot,
                None => {
                    submesh_materials.push(template.material_id);
                    submesh_materials.len() - 1
                }
            };
            submesh_of.push(slot + 1);
        }

        Ok(Self {
            templates,
            submesh_of,
            submesh_materials,
        })
    }

    /// A cache with no leaf variants; meshes then only have submesh 0.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn template(&self, leaf_type: usize) -> IvyMeshResult<&LeafTemplate> {
        self.templates
            .get(leaf_type)
            .ok_or(IvyMeshError::UnknownLeafType(leaf_type))
    }

    pub fn submesh_for(&self, leaf_type: usize) -> IvyMeshResult<usize> {
        self.submesh_of
            .get(leaf_type)
            .copied()
            .ok_or(IvyMeshError::UnknownLeafType(leaf_type))
    }

    /// Branch submesh plus one submesh per distinct leaf material.
    pub fn submesh_count(&self) -> usize {
        1 + self.submesh_materials.len()
    }

    /// Material id rendered by `submesh`; `None` for the branch submesh.
    pub fn material_for_submesh(&self, submesh: usize) -> Option<u8> {
        submesh
            .checked_sub(1)
            .and_then(|slot| self.submesh_materials.get(slot))
            .copied()
    }

    pub fn max_vertices(&self) -> usize {
        self.templates
            .iter()
            .map(|t| t.vertices.len())
            .max()
            .unwrap_or(0)
    }

    pub fn max_indices(&self) -> usize {
        self.templates
            .iter()
            .map(|t| t.indices.len())
            .max()
            .unwrap_or(0)
    }

    /// Places a template in branch-local space.
    pub fn instantiate(&self, leaf_type: usize, transform: &Transform) -> IvyMeshResult<LeafInstance> {
        let template = self.template(leaf_type)?;
        let vertices = template
            .vertices
            .iter()
            .map(|v| VertexData {
                position: transform.transform_point(v.position),
                normal: (transform.rotation * v.normal).normalize_or_zero(),
                uv: v.uv,
                color: v.color,
            })
            .collect();
        Ok(LeafInstance::new(leaf_type, vertices, transform.translation))
    }
}
