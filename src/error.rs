//! Error taxonomy for ivy meshing.
//!
//! Every failure here is a programmer error (a wrong static estimate or a
//! branch fed in an inconsistent state). Nothing is retried.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum IvyMeshError {
    #[error("{buffer} buffer exceeded its {resource} capacity of {capacity}")]
    CapacityExceeded {
        buffer: &'static str,
        resource: &'static str,
        capacity: usize,
    },
    #[error("branch {branch} is malformed: {reason}")]
    MalformedBranch { branch: usize, reason: String },
    #[error("branch index {branch} is outside the {max_branches} branches this builder was sized for")]
    BranchOutOfRange { branch: usize, max_branches: usize },
    #[error("leaf rooted at point {point} but the branch has {point_count} points")]
    LeafPointOutOfRange { point: usize, point_count: usize },
    #[error("unknown leaf type {0}")]
    UnknownLeafType(usize),
    #[error("leaf template {template} references vertex {index} but has only {vertex_count} vertices")]
    InvalidLeafTemplate {
        template: usize,
        index: u32,
        vertex_count: usize,
    },
    #[error("unknown submesh {0}")]
    UnknownSubmesh(usize),
    #[error("triangle index {index} references a vertex that does not exist yet ({vertex_count} vertices)")]
    DanglingIndex { index: u32, vertex_count: usize },
    #[error("invalid sizing parameters: {0}")]
    InvalidSizing(String),
}

pub type IvyMeshResult<T> = Result<T, IvyMeshError>;
