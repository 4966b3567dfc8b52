use bevy::prelude::*;
use bevy_ivy::{IvyMeshError, MeshData, MeshSink};

#[derive(Default)]
struct RecordingSink {
    calls: Vec<String>,
    vertex_count: usize,
    submeshes: Vec<Vec<u32>>,
}

impl MeshSink for RecordingSink {
    fn push_vertices(&mut self, positions: &[Vec3], _normals: &[Vec3], _uvs: &[Vec2], _colors: &[[f32; 4]]) {
        self.calls.push("vertices".to_string());
        self.vertex_count = positions.len();
        self.submeshes.clear();
    }

    fn push_triangles(&mut self, submesh: usize, indices: &[u32]) {
        self.calls.push(format!("triangles {submesh}"));
        self.submeshes.push(indices.to_vec());
    }

    fn recalculate_bounds(&mut self) {
        self.calls.push("bounds".to_string());
    }
}

fn add(data: &mut MeshData, position: Vec3) -> u32 {
    data.add_vertex(position, Vec3::Y, Vec2::ZERO, Vec4::ONE)
        .expect("vertex within capacity")
}

#[test]
fn test_vertices_are_indexed_in_order() {
    let mut data = MeshData::with_capacity("test", 8, vec![12]);
    assert_eq!(add(&mut data, Vec3::ZERO), 0);
    assert_eq!(add(&mut data, Vec3::X), 1);
    assert_eq!(add(&mut data, Vec3::Y), 2);

    assert_eq!(data.vertex_count(), 3);
    assert_eq!(data.positions().len(), 3);
    assert_eq!(data.normals().len(), 3);
    assert_eq!(data.uvs().len(), 3);
    assert_eq!(data.colors().len(), 3);
}

#[test]
fn test_triangles_go_to_their_submesh() {
    let mut data = MeshData::with_capacity("test", 8, vec![6, 6]);
    for p in [Vec3::ZERO, Vec3::X, Vec3::Y] {
        add(&mut data, p);
    }
    for i in [0, 1, 2] {
        data.add_triangle(1, i).unwrap();
    }

    assert_eq!(data.triangle_count(0), 0);
    assert_eq!(data.triangle_count(1), 1);
    assert_eq!(data.indices(1), &[0, 1, 2]);
    assert!(data.indices(7).is_empty(), "Unknown submeshes read as empty");
}

#[test]
fn test_dangling_index_is_rejected() {
    let mut data = MeshData::with_capacity("test", 8, vec![6]);
    add(&mut data, Vec3::ZERO);

    let err = data.add_triangle(0, 1).unwrap_err();
    assert_eq!(
        err,
        IvyMeshError::DanglingIndex {
            index: 1,
            vertex_count: 1
        }
    );
}

#[test]
fn test_unknown_submesh_is_rejected() {
    let mut data = MeshData::with_capacity("test", 8, vec![6]);
    add(&mut data, Vec3::ZERO);
    assert_eq!(data.add_triangle(3, 0), Err(IvyMeshError::UnknownSubmesh(3)));
}

#[test]
fn test_vertex_capacity_exceeded_fails_loudly() {
    let mut data = MeshData::with_capacity("tip", 2, vec![3]);
    add(&mut data, Vec3::ZERO);
    add(&mut data, Vec3::X);

    let err = data
        .add_vertex(Vec3::Y, Vec3::Y, Vec2::ZERO, Vec4::ONE)
        .unwrap_err();
    assert!(
        matches!(
            err,
            IvyMeshError::CapacityExceeded {
                buffer: "tip",
                resource: "vertex",
                capacity: 2
            }
        ),
        "unexpected error {err:?}"
    );
    assert_eq!(data.vertex_count(), 2, "Failed append must not grow the buffer");
}

#[test]
fn test_index_capacity_exceeded_fails_loudly() {
    let mut data = MeshData::with_capacity("baked", 3, vec![3]);
    for p in [Vec3::ZERO, Vec3::X, Vec3::Y] {
        add(&mut data, p);
    }
    for i in [0, 1, 2] {
        data.add_triangle(0, i).unwrap();
    }
    assert!(matches!(
        data.add_triangle(0, 0),
        Err(IvyMeshError::CapacityExceeded {
            resource: "triangle index",
            ..
        })
    ));
}

#[test]
fn test_clear_resets_counts_and_keeps_capacity() {
    let mut data = MeshData::with_capacity("tip", 3, vec![3]);
    for p in [Vec3::ZERO, Vec3::X, Vec3::Y] {
        add(&mut data, p);
    }
    data.add_triangle(0, 0).unwrap();

    data.clear();
    assert_eq!(data.vertex_count(), 0);
    assert_eq!(data.triangle_count(0), 0);
    assert_eq!(data.vertex_capacity(), 3);
    assert_eq!(data.index_capacity(0), Some(3));

    // The full capacity is usable again after clearing.
    for p in [Vec3::ZERO, Vec3::X, Vec3::Y] {
        add(&mut data, p);
    }
}

#[test]
fn test_push_to_sink_order() {
    let mut data = MeshData::with_capacity("test", 4, vec![3, 3]);
    for p in [Vec3::ZERO, Vec3::X, Vec3::Y] {
        add(&mut data, p);
    }
    for i in [0, 2, 1] {
        data.add_triangle(0, i).unwrap();
    }

    let mut sink = RecordingSink::default();
    data.push_to(&mut sink);

    assert_eq!(
        sink.calls,
        vec!["vertices", "triangles 0", "triangles 1", "bounds"]
    );
    assert_eq!(sink.vertex_count, 3);
    assert_eq!(sink.submeshes, vec![vec![0, 2, 1], vec![]]);
}

#[test]
fn test_bounds() {
    let mut data = MeshData::with_capacity("test", 4, vec![0]);
    assert!(data.bounds().is_none());

    add(&mut data, Vec3::new(-1.0, 2.0, 0.5));
    add(&mut data, Vec3::new(3.0, -4.0, 0.0));

    let bounds = data.bounds().unwrap();
    assert_eq!(bounds.min, Vec3::new(-1.0, -4.0, 0.0));
    assert_eq!(bounds.max, Vec3::new(3.0, 2.0, 0.5));
    assert_eq!(bounds.center(), Vec3::new(1.0, -1.0, 0.25));
}

#[test]
fn test_check_room_counts_what_is_already_there() {
    let mut data = MeshData::with_capacity("test", 4, vec![6, 3]);
    add(&mut data, Vec3::ZERO);
    add(&mut data, Vec3::X);

    assert_eq!(data.check_room(2, &[6, 3]), Ok(()));
    assert!(matches!(
        data.check_room(3, &[]),
        Err(IvyMeshError::CapacityExceeded { resource: "vertex", .. })
    ));
    assert!(matches!(
        data.check_room(0, &[0, 4]),
        Err(IvyMeshError::CapacityExceeded { resource: "triangle index", capacity: 3, .. })
    ));
    assert_eq!(data.check_room(0, &[0, 0, 1]), Err(IvyMeshError::UnknownSubmesh(2)));
    assert_eq!(data.vertex_count(), 2);
}
