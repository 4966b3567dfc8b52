use bevy::prelude::*;
use bevy_ivy::{
    BranchContainer, IncrementalMeshBuilder, IvyMeshError, IvyMeshSettings, LeafMeshCache,
    LeafTemplate, VertexData,
};

fn straight_branch(points: usize, sides: usize) -> BranchContainer {
    let mut branch = BranchContainer::new(sides, 1.0);
    for i in 0..points {
        branch.push_point(Vec3::new(0.0, i as f32, 0.0), 0.1, Vec4::ONE);
    }
    branch
}

#[test]
fn test_submeshes_follow_distinct_materials() {
    let cache = LeafMeshCache::new(vec![
        LeafTemplate::quad(0.1, 0.2, 3),
        LeafTemplate::quad(0.2, 0.3, 5),
        LeafTemplate::quad(0.3, 0.4, 3),
    ])
    .unwrap();

    assert_eq!(cache.len(), 3);
    assert_eq!(cache.submesh_count(), 3);
    assert_eq!(cache.submesh_for(0), Ok(1));
    assert_eq!(cache.submesh_for(1), Ok(2));
    assert_eq!(cache.submesh_for(2), Ok(1));
    assert_eq!(cache.material_for_submesh(0), None, "submesh 0 is branch geometry");
    assert_eq!(cache.material_for_submesh(1), Some(3));
    assert_eq!(cache.material_for_submesh(2), Some(5));
    assert_eq!(cache.submesh_for(3), Err(IvyMeshError::UnknownLeafType(3)));
}

#[test]
fn test_empty_cache_has_only_branch_submesh() {
    let cache = LeafMeshCache::empty();
    assert!(cache.is_empty());
    assert_eq!(cache.submesh_count(), 1);
    assert_eq!(cache.max_vertices(), 0);
}

#[test]
fn test_template_with_dangling_index_is_rejected() {
    let mut broken = LeafTemplate::quad(0.1, 0.1, 1);
    broken.indices.push(9);

    let err = LeafMeshCache::new(vec![LeafTemplate::quad(0.1, 0.1, 1), broken]).unwrap_err();
    assert_eq!(
        err,
        IvyMeshError::InvalidLeafTemplate {
            template: 1,
            index: 9,
            vertex_count: 4
        }
    );
}

#[test]
fn test_instantiate_places_template() {
    let cache = LeafMeshCache::new(vec![LeafTemplate::quad(2.0, 1.0, 1)]).unwrap();
    let transform = Transform::from_xyz(1.0, 2.0, 3.0);

    let leaf = cache.instantiate(0, &transform).unwrap();

    assert_eq!(leaf.leaf_type(), 0);
    assert_eq!(leaf.center(), Vec3::new(1.0, 2.0, 3.0));
    assert_eq!(leaf.vertices()[0].position, Vec3::new(0.0, 2.0, 3.0));
    assert_eq!(leaf.vertices()[2].position, Vec3::new(2.0, 3.0, 3.0));
    assert!(cache.instantiate(4, &transform).is_err());
}

#[test]
fn test_leaf_at_tip_collapses_to_its_center() {
    let settings = IvyMeshSettings::new()
        .with_sides(4)
        .with_backtracking_points(5)
        .with_tip_influence(1.0)
        .with_generate_branches(false);
    let cache = LeafMeshCache::new(vec![LeafTemplate::quad(0.5, 0.5, 1)]).unwrap();

    let mut branch = straight_branch(4, 4);
    let tip_leaf = cache.instantiate(0, &Transform::from_xyz(0.0, 3.0, 0.0)).unwrap();
    let old_leaf = cache.instantiate(0, &Transform::from_xyz(0.0, 1.0, 0.0)).unwrap();
    let old_positions: Vec<Vec3> = old_leaf.vertices().iter().map(|v| v.position).collect();
    branch.add_leaf(3, tip_leaf).unwrap();
    branch.add_leaf(1, old_leaf).unwrap();

    let mut builder =
        IncrementalMeshBuilder::procedural(settings, cache, 1.0, 1.0).unwrap();
    builder.build_tip(&[branch]).unwrap();

    // Leaves are appended in point order: the old leaf first.
    let positions = builder.tip().positions();
    assert_eq!(&positions[..4], old_positions.as_slice());
    for p in &positions[4..8] {
        assert_eq!(*p, Vec3::new(0.0, 3.0, 0.0));
    }
    assert_eq!(builder.tip_leaf_vertex_count(0), 8);
    assert_eq!(builder.tip().indices(1)[6..], [4, 5, 6, 4, 6, 7]);
}

#[test]
fn test_leaves_disabled() {
    let settings = IvyMeshSettings::new().with_sides(4).with_generate_leaves(false);
    let cache = LeafMeshCache::new(vec![LeafTemplate::quad(0.5, 0.5, 1)]).unwrap();
    let mut branch = straight_branch(3, 4);
    let leaf = cache.instantiate(0, &Transform::IDENTITY).unwrap();
    branch.add_leaf(0, leaf).unwrap();

    let mut builder = IncrementalMeshBuilder::procedural(settings, cache, 1.0, 1.0).unwrap();
    builder.build_tip(&[branch]).unwrap();

    assert_eq!(builder.tip().triangle_count(1), 0);
    assert_eq!(builder.tip_leaf_vertex_count(0), 0);
}

#[test]
fn test_leaf_on_missing_point_is_rejected() {
    let mut branch = straight_branch(2, 4);
    let leaf = LeafMeshCache::new(vec![LeafTemplate::quad(0.5, 0.5, 1)])
        .unwrap()
        .instantiate(0, &Transform::IDENTITY)
        .unwrap();

    assert_eq!(
        branch.add_leaf(2, leaf),
        Err(IvyMeshError::LeafPointOutOfRange {
            point: 2,
            point_count: 2
        })
    );
}

#[test]
fn test_unknown_leaf_type_fails_the_step() {
    let cache = LeafMeshCache::new(vec![LeafTemplate::quad(0.5, 0.5, 1)]).unwrap();
    let mut branch = straight_branch(3, 6);
    let vertex = VertexData {
        position: Vec3::ZERO,
        normal: Vec3::Z,
        uv: Vec2::ZERO,
        color: Vec4::ONE,
    };
    branch
        .add_leaf(0, bevy_ivy::LeafInstance::new(7, vec![vertex; 4], Vec3::ZERO))
        .unwrap();

    let mut builder =
        IncrementalMeshBuilder::procedural(IvyMeshSettings::new(), cache, 1.0, 1.0).unwrap();
    assert_eq!(
        builder.build_tip(&[branch]),
        Err(IvyMeshError::UnknownLeafType(7))
    );
}

#[test]
fn test_leaf_short_of_template_vertices_is_rejected_whole() {
    let cache = LeafMeshCache::new(vec![LeafTemplate::quad(0.5, 0.5, 1)]).unwrap();
    let settings = IvyMeshSettings::new().with_sides(4).with_backtracking_points(2);
    let vertex = VertexData {
        position: Vec3::ZERO,
        normal: Vec3::Z,
        uv: Vec2::ZERO,
        color: Vec4::ONE,
    };
    let mut branch = straight_branch(5, 4);
    branch
        .add_leaf(0, bevy_ivy::LeafInstance::new(0, vec![vertex; 2], Vec3::ZERO))
        .unwrap();

    let mut builder = IncrementalMeshBuilder::procedural(settings, cache, 1.0, 1.0).unwrap();
    let dangling = IvyMeshError::DanglingIndex {
        index: 2,
        vertex_count: 2,
    };

    assert_eq!(builder.check_copy_mesh(0, &branch), Err(dangling.clone()));
    assert_eq!(builder.baked_mesh().vertex_count(), 0);
    assert_eq!(builder.baked_mesh().triangle_count(1), 0);
    assert_eq!(builder.promotion_cursor(0), None);

    // Leaf 0 is outside the tip window, so the tip step is unaffected.
    builder.build_tip(std::slice::from_ref(&branch)).unwrap();

    branch
        .add_leaf(4, bevy_ivy::LeafInstance::new(0, vec![vertex; 2], Vec3::ZERO))
        .unwrap();
    assert_eq!(builder.build_tip(std::slice::from_ref(&branch)), Err(dangling));
    assert_eq!(builder.tip().vertex_count(), builder.tip_vertex_count(0));
    assert_eq!(builder.tip().triangle_count(1), 0);
}
