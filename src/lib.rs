//! Incremental procedural ivy meshing for Bevy.
//!
//! A growth simulation appends sample points and leaves to
//! [`BranchContainer`]s. Every tick, [`IncrementalMeshBuilder`] turns them into
//! two meshes:
//!
//! - a **tip** mesh rebuilt from the newest `backtracking_points` of every
//!   branch, tapering toward a single cap vertex at the growing end;
//! - a **baked** mesh that older points are promoted into once and never
//!   recomputed.
//!
//! Submesh 0 holds branch geometry; submeshes `1..=N` hold leaves, one per
//! distinct leaf material of the [`LeafMeshCache`].
//!
//! # Features
//!
//! - **Two sizing modes**: [`IncrementalMeshBuilder::baked`] replays toward a
//!   known finished mesh, [`IncrementalMeshBuilder::procedural`] estimates
//!   capacity from lifetime and growth speed. See [`sizing`].
//! - **Renderer-agnostic output** through the [`MeshSink`] trait, with a Bevy
//!   implementation in [`SubmeshMeshes`].
//! - **Skeleton sources**: grow ivy along `symbios_turtle_3d` skeletons via
//!   [`skeleton`].
//! - **Plugin**: [`IvyMeshPlugin`] keeps `Assets<Mesh>` in sync every frame.
//!
//! # Example
//!
//! ```ignore
//! use bevy::prelude::*;
//! use bevy_ivy::*;
//!
//! fn setup(app: &mut App) {
//!     app.add_plugins(IvyMeshPlugin)
//!        .add_systems(Startup, spawn_ivy)
//!        .add_systems(Update, grow_ivy);
//! }
//!
//! fn spawn_ivy(mut commands: Commands) {
//!     let settings = IvyMeshSettings::new().with_sides(6).with_backtracking_points(8);
//!     let leaves = LeafMeshCache::new(vec![LeafTemplate::quad(0.1, 0.2, 1)]).unwrap();
//!     let builder = IncrementalMeshBuilder::procedural(settings, leaves, 30.0, 1.0).unwrap();
//!     commands.spawn((IvyBranches::default(), IvyMesh::new(builder)));
//! }
//!
//! fn grow_ivy(mut ivies: Query<&mut IvyBranches>) {
//!     for mut ivy in &mut ivies {
//!         // append points and leaves here
//!     }
//! }
//! ```

pub mod branch;
pub mod builder;
pub mod error;
pub mod leaf_cache;
pub mod mesh_data;
pub mod plugin;
pub mod settings;
pub mod sink;
pub mod sizing;
pub mod skeleton;

pub use branch::{BranchContainer, SamplePoint, VertexData};
pub use builder::{IncrementalMeshBuilder, tip_influence_factor};
pub use error::{IvyMeshError, IvyMeshResult};
pub use leaf_cache::{LeafInstance, LeafMeshCache, LeafTemplate};
pub use mesh_data::{Bounds, MeshData};
pub use plugin::{IvyBranches, IvyMesh, IvyMeshPlugin, IvyMeshSet};
pub use settings::IvyMeshSettings;
pub use sink::{MeshSink, SubmeshMeshes};
pub use sizing::{FinishedMeshCounts, SizingPolicy};

/// Re-export of `symbios_turtle_3d` for version compatibility.
pub use symbios_turtle_3d;
