//! Bevy glue: pushes each ivy's tip and baked meshes into `Assets<Mesh>` once per frame.
//!
//! Branch growth is not done here. Grow the branches in [`IvyBranches`] during
//! `Update`; [`rebuild_ivy_meshes`] runs in `PostUpdate` so it always sees the
//! points grown this frame.

use bevy::platform::collections::HashMap;
use bevy::prelude::*;

use crate::branch::BranchContainer;
use crate::builder::IncrementalMeshBuilder;
use crate::error::IvyMeshResult;
use crate::sink::{SubmeshMeshes, empty_mesh};

/// Registers [`rebuild_ivy_meshes`] in [`IvyMeshSet`].
pub struct IvyMeshPlugin;

impl Plugin for IvyMeshPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(PostUpdate, rebuild_ivy_meshes.in_set(IvyMeshSet));
    }
}

#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct IvyMeshSet;

/// Branches of one ivy, written by the growth simulation.
///
/// Branch `i` must stay at index `i` for its whole life.
#[derive(Component, Default)]
pub struct IvyBranches(pub Vec<BranchContainer>);

/// Mesh builder state and the mesh handles it writes, keyed by submesh id.
#[derive(Component)]
pub struct IvyMesh {
    builder: IncrementalMeshBuilder,
    tip: HashMap<u8, Handle<Mesh>>,
    baked: HashMap<u8, Handle<Mesh>>,
}

impl IvyMesh {
    pub fn new(builder: IncrementalMeshBuilder) -> Self {
        Self {
            builder,
            tip: HashMap::new(),
            baked: HashMap::new(),
        }
    }

    pub fn builder(&self) -> &IncrementalMeshBuilder {
        &self.builder
    }

    pub fn builder_mut(&mut self) -> &mut IncrementalMeshBuilder {
        &mut self.builder
    }

    /// Handles of the live tip meshes, created on first use.
    pub fn tip_handles(&self) -> &HashMap<u8, Handle<Mesh>> {
        &self.tip
    }

    pub fn baked_handles(&self) -> &HashMap<u8, Handle<Mesh>> {
        &self.baked
    }

    /// One tick: promote, push the baked mesh if it grew, rebuild and push the tip.
    pub fn rebuild(&mut self, branches: &[BranchContainer], meshes: &mut Assets<Mesh>) -> IvyMeshResult<()> {
        for (index, branch) in branches.iter().enumerate() {
            self.builder.check_copy_mesh(index, branch)?;
        }

        if self.builder.take_baked_dirty() {
            let mut sink = SubmeshMeshes::new();
            self.builder.push_baked(&mut sink);
            apply_submeshes(meshes, &mut self.baked, sink);
        }

        let mut sink = SubmeshMeshes::new();
        self.builder.step(branches, &mut sink)?;
        apply_submeshes(meshes, &mut self.tip, sink);
        Ok(())
    }
}

fn apply_submeshes(
    meshes: &mut Assets<Mesh>,
    handles: &mut HashMap<u8, Handle<Mesh>>,
    built: SubmeshMeshes,
) {
    let mut built = built.into_meshes();

    for (submesh, handle) in handles.iter() {
        if built.contains_key(submesh) {
            continue;
        }
        if let Some(target) = meshes.get_mut(handle) {
            *target = empty_mesh();
        }
    }

    for (submesh, mesh) in built.drain() {
        match handles.get(&submesh) {
            Some(handle) => {
                if let Some(target) = meshes.get_mut(handle) {
                    *target = mesh;
                }
            }
            None => {
                handles.insert(submesh, meshes.add(mesh));
            }
        }
    }
}

/// Rebuilds every ivy. A failing ivy is logged and loses its [`IvyMesh`],
/// which stops it from being rebuilt.
pub fn rebuild_ivy_meshes(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut ivies: Query<(Entity, &IvyBranches, &mut IvyMesh)>,
) {
    for (entity, branches, mut ivy) in &mut ivies {
        if let Err(err) = ivy.rebuild(&branches.0, &mut meshes) {
            error!("ivy {entity} stopped: {err}");
            commands.entity(entity).remove::<IvyMesh>();
        }
    }
}
