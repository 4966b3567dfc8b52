//! The narrow interface between the mesh builder and whatever renders its output.

use bevy::asset::RenderAssetUsages;
use bevy::mesh::{Indices, PrimitiveTopology};
use bevy::platform::collections::HashMap;
use bevy::prelude::*;

use crate::mesh_data::Bounds;

/// Receives a finished buffer once per step.
///
/// `push_vertices` always comes first and replaces any previous content, then
/// `push_triangles` once per submesh, then `recalculate_bounds`.
pub trait MeshSink {
    fn push_vertices(&mut self, positions: &[Vec3], normals: &[Vec3], uvs: &[Vec2], colors: &[[f32; 4]]);
    fn push_triangles(&mut self, submesh: usize, indices: &[u32]);
    fn recalculate_bounds(&mut self);
}

/// Bevy sink: one [`Mesh`] per non-empty submesh, keyed by submesh id.
///
/// Bevy meshes have no submeshes, so each submesh gets its own mesh holding
/// only the vertices its triangles reference.
#[derive(Default)]
pub struct SubmeshMeshes {
    positions: Vec<Vec3>,
    normals: Vec<Vec3>,
    uvs: Vec<Vec2>,
    colors: Vec<[f32; 4]>,
    meshes: HashMap<u8, Mesh>,
    bounds: Option<Bounds>,
}

impl SubmeshMeshes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn meshes(&self) -> &HashMap<u8, Mesh> {
        &self.meshes
    }

    pub fn into_meshes(self) -> HashMap<u8, Mesh> {
        self.meshes
    }

    /// Bounds of every pushed vertex, `None` when the buffer was empty.
    pub fn bounds(&self) -> Option<Bounds> {
        self.bounds
    }

    fn compact(&self, indices: &[u32]) -> Mesh {
        let mut remap: HashMap<u32, u32> = HashMap::new();
        let mut positions = Vec::new();
        let mut normals = Vec::new();
        let mut uvs = Vec::new();
        let mut colors = Vec::new();
        let mut local_indices = Vec::with_capacity(indices.len());

        for &index in indices {
            let local = *remap.entry(index).or_insert_with(|| {
                let i = index as usize;
                positions.push(self.positions[i]);
                normals.push(self.normals[i]);
                uvs.push(self.uvs[i]);
                colors.push(self.colors[i]);
                (positions.len() - 1) as u32
            });
            local_indices.push(local);
        }

        let mut mesh = Mesh::new(
            PrimitiveTopology::TriangleList,
            RenderAssetUsages::default(),
        );
        mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
        mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, normals);
        mesh.insert_attribute(Mesh::ATTRIBUTE_UV_0, uvs);
        mesh.insert_attribute(Mesh::ATTRIBUTE_COLOR, colors);
        mesh.insert_indices(Indices::U32(local_indices));
        mesh
    }
}

impl MeshSink for SubmeshMeshes {
    fn push_vertices(&mut self, positions: &[Vec3], normals: &[Vec3], uvs: &[Vec2], colors: &[[f32; 4]]) {
        self.positions = positions.to_vec();
        self.normals = normals.to_vec();
        self.uvs = uvs.to_vec();
        self.colors = colors.to_vec();
        self.meshes.clear();
    }

    fn push_triangles(&mut self, submesh: usize, indices: &[u32]) {
        if indices.is_empty() {
            return;
        }
        let Ok(key) = u8::try_from(submesh) else {
            warn!("submesh {submesh} has no u8 key, dropping {} indices", indices.len());
            return;
        };
        let mesh = self.compact(indices);
        self.meshes.insert(key, mesh);
    }

    fn recalculate_bounds(&mut self) {
        self.bounds = Bounds::from_points(&self.positions);
    }
}

/// Placeholder content for a submesh that has no triangles this step.
pub(crate) fn empty_mesh() -> Mesh {
    let mut mesh = Mesh::new(
        PrimitiveTopology::TriangleList,
        RenderAssetUsages::default(),
    );
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, Vec::<Vec3>::new());
    mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, Vec::<Vec3>::new());
    mesh.insert_attribute(Mesh::ATTRIBUTE_UV_0, Vec::<Vec2>::new());
    mesh.insert_attribute(Mesh::ATTRIBUTE_COLOR, Vec::<[f32; 4]>::new());
    mesh.insert_indices(Indices::U32(Vec::new()));
    mesh
}
