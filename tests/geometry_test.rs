use approx::assert_relative_eq;
use cgmath::{InnerSpace, Vector3};
use lumen_ngin::data_structures::{
    geometry::{Geometry, MeshGroup, attribute},
    mesh::vertex_data,
};

fn triangle() -> Geometry {
    let mut geometry = Geometry::new();
    geometry.add_vec3(
        attribute::POSITION,
        &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
    );
    geometry.count_vertices();
    geometry
}

#[test]
fn uv_array_of_wrong_length_falls_back_to_zeros() {
    let mut geometry = triangle();

    geometry.add_vec2(attribute::UV, &[[0.5, 0.5], [1.0, 1.0]]);

    let uv = geometry.attribute(attribute::UV).unwrap();
    assert_eq!(uv.vertex_len(), 3);
    assert_eq!(uv.data, vec![0.0; 6]);
}

#[test]
fn normal_array_of_wrong_length_falls_back_to_plus_z() {
    let mut geometry = triangle();

    geometry.add_vec3(attribute::NORMAL, &[[1.0, 0.0, 0.0]]);

    let normals = geometry.attribute(attribute::NORMAL).unwrap();
    assert_eq!(
        normals.data,
        vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0]
    );
}

#[test]
fn matching_attributes_are_kept() {
    let mut geometry = triangle();
    let uvs = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]];

    geometry.add_vec2(attribute::UV, &uvs);

    assert_eq!(
        geometry.attribute(attribute::UV).unwrap().data,
        vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0]
    );
}

#[test]
fn attributes_added_before_counting_are_conformed_to_positions() {
    let mut geometry = Geometry::new();
    geometry.add_vec2(attribute::UV, &[[1.0, 1.0]]);
    geometry.add_vec3(attribute::POSITION, &[[0.0; 3]; 4]);

    assert_eq!(geometry.count_vertices(), 4);
    assert_eq!(geometry.attribute(attribute::UV).unwrap().vertex_len(), 4);
    assert_eq!(geometry.attribute(attribute::UV).unwrap().data, vec![0.0; 8]);
}

#[test]
fn vertex_data_fills_missing_inputs() {
    let geometry = triangle();

    let colors = vertex_data(&geometry, attribute::COLOR, 3, 3);
    let normals = vertex_data(&geometry, attribute::NORMAL, 3, 3);

    assert_eq!(colors, vec![1.0; 9]);
    assert_eq!(normals, vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0]);
}

#[test]
fn vertex_data_pads_and_truncates_components() {
    let geometry = triangle();

    let as_vec2 = vertex_data(&geometry, attribute::POSITION, 2, 3);
    let as_vec4 = vertex_data(&geometry, attribute::POSITION, 4, 3);

    assert_eq!(as_vec2, vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0]);
    assert_eq!(
        as_vec4,
        vec![0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0]
    );
}

#[test]
fn fullscreen_quad_covers_clip_space_with_top_left_uv_origin() {
    let quad = Geometry::fullscreen_quad();
    assert_eq!(quad.vertex_count(), 6);

    let positions = &quad.attribute(attribute::POSITION).unwrap().data;
    let uvs = &quad.attribute(attribute::UV).unwrap().data;
    for (p, t) in positions.chunks(2).zip(uvs.chunks(2)) {
        assert!(p[0].abs() == 1.0 && p[1].abs() == 1.0);
        assert_relative_eq!(t[0], p[0] * 0.5 + 0.5);
        assert_relative_eq!(t[1], 0.5 - p[1] * 0.5);
    }
}

#[test]
fn box_has_unit_normals_and_a_color_per_face() {
    let geometry = Geometry::box_geometry(2.0, 2.0, 2.0);
    assert_eq!(geometry.vertex_count(), 36);

    let normals = &geometry.attribute(attribute::NORMAL).unwrap().data;
    for n in normals.chunks(3) {
        assert_relative_eq!(Vector3::new(n[0], n[1], n[2]).magnitude(), 1.0);
    }
    assert!(geometry.attribute(attribute::COLOR).is_some());
}

#[test]
fn sphere_points_lie_on_the_radius() {
    let geometry = Geometry::sphere(2.0, 8, 4);
    assert_eq!(geometry.vertex_count(), 8 * 4 * 6);

    let positions = &geometry.attribute(attribute::POSITION).unwrap().data;
    for p in positions.chunks(3) {
        assert_relative_eq!(Vector3::new(p[0], p[1], p[2]).magnitude(), 2.0, epsilon = 1e-5);
    }
}

#[test]
fn geometry_from_group_default_fills_short_arrays() {
    let group = MeshGroup {
        name: "floor".to_string(),
        positions: vec![[0.0; 3]; 3],
        uvs: vec![],
        normals: vec![[0.0, 1.0, 0.0]; 3],
    };

    let geometry = Geometry::from_group(&group);

    assert_eq!(geometry.vertex_count(), 3);
    assert_eq!(geometry.attribute(attribute::UV).unwrap().data, vec![0.0; 6]);
    assert_eq!(
        geometry.attribute(attribute::NORMAL).unwrap().data,
        vec![0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0]
    );
}
