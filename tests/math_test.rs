use approx::assert_relative_eq;
use cgmath::{InnerSpace, Matrix4, Quaternion, Rotation3, Vector3, Vector4};
use lumen_ngin::math::{self, OPENGL_TO_WGPU_MATRIX, Transform};

fn project(m: Matrix4<f32>, p: Vector4<f32>) -> Vector3<f32> {
    let clip = m * p;
    clip.truncate() / clip.w
}

#[test]
fn perspective_maps_near_and_far_planes_to_device_depth_range() {
    let m = math::perspective(90.0, 1.0, 0.1, 1000.0);

    let near = project(m, Vector4::new(0.0, 0.0, -0.1, 1.0));
    let far = project(m, Vector4::new(0.0, 0.0, -1000.0, 1.0));

    assert_relative_eq!(near.z, -1.0, epsilon = 1e-4);
    assert_relative_eq!(far.z, 1.0, epsilon = 1e-4);
}

#[test]
fn wgpu_correction_maps_depth_into_unit_range() {
    let m = OPENGL_TO_WGPU_MATRIX * math::perspective(90.0, 1.0, 0.1, 1000.0);

    let near = project(m, Vector4::new(0.0, 0.0, -0.1, 1.0));
    let far = project(m, Vector4::new(0.0, 0.0, -1000.0, 1.0));

    assert_relative_eq!(near.z, 0.0, epsilon = 1e-4);
    assert_relative_eq!(far.z, 1.0, epsilon = 1e-4);
}

#[test]
fn orthographic_maps_bounds_to_unit_cube() {
    let m = math::orthographic(-2.0, 2.0, -1.0, 3.0, 0.0, 10.0);

    let corner = project(m, Vector4::new(2.0, 3.0, 0.0, 1.0));
    let opposite = project(m, Vector4::new(-2.0, -1.0, -10.0, 1.0));

    assert_relative_eq!(corner, Vector3::new(1.0, 1.0, -1.0), epsilon = 1e-6);
    assert_relative_eq!(opposite, Vector3::new(-1.0, -1.0, 1.0), epsilon = 1e-6);
}

#[test]
fn rotations_are_right_handed() {
    let quarter = std::f32::consts::FRAC_PI_2;
    let x = Vector4::new(1.0, 0.0, 0.0, 0.0);
    let y = Vector4::new(0.0, 1.0, 0.0, 0.0);

    assert_relative_eq!(math::rotation_z(quarter) * x, y, epsilon = 1e-6);
    assert_relative_eq!(
        math::rotation_x(quarter) * y,
        Vector4::new(0.0, 0.0, 1.0, 0.0),
        epsilon = 1e-6
    );
    assert_relative_eq!(
        math::rotation_y(quarter) * Vector4::new(0.0, 0.0, 1.0, 0.0),
        x,
        epsilon = 1e-6
    );
}

#[test]
fn transform_scales_then_rotates_then_translates() {
    let transform = Transform {
        position: Vector3::new(10.0, 0.0, 0.0),
        rotation: Quaternion::from_angle_z(cgmath::Rad(std::f32::consts::FRAC_PI_2)),
        scale: 2.0,
    };

    let p = transform.to_matrix() * Vector4::new(1.0, 0.0, 0.0, 1.0);

    // (1,0,0) -> scale (2,0,0) -> rotate (0,2,0) -> translate (10,2,0)
    assert_relative_eq!(p, Vector4::new(10.0, 2.0, 0.0, 1.0), epsilon = 1e-5);
}

#[test]
fn look_at_points_forward_axis_at_target() {
    let position = Vector3::new(1.0, 2.0, 3.0);
    let target = Vector3::new(-4.0, 0.0, 1.0);

    let m = math::look_at(position, target).unwrap();

    assert_relative_eq!(math::position_of(&m), position);
    assert_relative_eq!(
        math::forward_of(&m),
        (target - position).normalize(),
        epsilon = 1e-6
    );
}

#[test]
fn look_at_straight_down_stays_well_defined() {
    let m = math::look_at(Vector3::new(0.0, 5.0, 0.0), Vector3::new(0.0, 0.0, 0.0)).unwrap();

    assert_relative_eq!(
        math::forward_of(&m),
        Vector3::new(0.0, -1.0, 0.0),
        epsilon = 1e-3
    );
    assert!(m.x.truncate().magnitude().is_finite());
    assert!(m.y.truncate().magnitude() > 0.9);
}

#[test]
fn look_at_own_position_is_rejected() {
    let p = Vector3::new(1.0, 1.0, 1.0);
    assert!(math::look_at(p, p).is_none());
}
