use approx::assert_relative_eq;
use cgmath::Vector3;
use lumen_ngin::{
    data_structures::{
        camera::OrthoBounds,
        light::{Light, LightKind, smoothstep},
    },
    math,
};

fn up() -> Vector3<f32> {
    Vector3::new(0.0, 1.0, 0.0)
}

#[test]
fn ambient_light_ignores_geometry() {
    let data = Light::ambient([0.2, 0.3, 0.4]).data(&math::identity());

    let c = data.contribution(Vector3::new(5.0, 1.0, -2.0), Vector3::new(1.0, 0.0, 0.0));

    assert_relative_eq!(c, Vector3::new(0.2, 0.3, 0.4));
}

#[test]
fn directional_light_uses_absolute_cosine() {
    // Node pointing straight down.
    let global = math::look_at(Vector3::new(0.0, 5.0, 0.0), Vector3::new(0.0, 0.0, 0.0)).unwrap();
    let data = Light::directional([1.0, 1.0, 1.0]).data(&global);

    let lit = data.contribution(Vector3::new(0.0, 0.0, 0.0), up());
    let back = data.contribution(Vector3::new(0.0, 0.0, 0.0), -up());

    assert_relative_eq!(lit.x, 1.0, epsilon = 1e-3);
    assert_relative_eq!(back.x, 1.0, epsilon = 1e-3);
}

#[test]
fn point_light_attenuates_with_distance() {
    let global = math::translation(0.0, 2.0, 0.0);
    let data = Light::point([1.0, 1.0, 1.0], [1.0, 0.0, 0.1]).data(&global);

    let c = data.contribution(Vector3::new(0.0, 0.0, 0.0), up());

    // 1 / (1 + 0.1 * 2²)
    assert_relative_eq!(c.x, 1.0 / 1.4, epsilon = 1e-6);
}

#[test]
fn spot_light_cone_falls_off_between_inner_and_outer_angle() {
    let global = math::look_at(Vector3::new(0.0, 1.0, 0.0), Vector3::new(0.0, 0.0, 0.0)).unwrap();
    let light = Light::spot([1.0, 1.0, 1.0], [1.0, 0.0, 0.0], 30.0, 20.0);
    let data = light.data(&global);

    let center = data.contribution(Vector3::new(0.0, 0.0, 0.0), up());
    // 25 degrees off the axis: inside the outer cone, outside the inner one.
    let edge_point = Vector3::new(25f32.to_radians().tan(), 0.0, 0.0);
    let edge = data.contribution(edge_point, up());
    let outside = data.contribution(Vector3::new(1.0, 0.0, 0.0), up());

    assert_relative_eq!(center.x, 1.0, epsilon = 1e-3);
    assert!(edge.x > 0.0 && edge.x < center.x);
    assert_relative_eq!(outside.x, 0.0);
}

#[test]
fn spot_constructor_stores_cone_cosines() {
    let light = Light::spot([1.0; 3], [1.0, 0.0, 0.1], 30.0, 20.0);

    let LightKind::Spot {
        cutoff,
        inner_cutoff,
    } = light.kind
    else {
        panic!("not a spot light");
    };
    assert_relative_eq!(cutoff, 30f32.to_radians().cos());
    assert_relative_eq!(inner_cutoff, 20f32.to_radians().cos());
    assert_eq!(light.kind.type_id(), 4);
}

#[test]
fn light_data_follows_the_node_transform() {
    let global = math::translation(1.0, 2.0, 3.0) * math::rotation_y(std::f32::consts::FRAC_PI_2);

    let data = Light::point([1.0; 3], [1.0, 0.0, 0.0]).data(&global);

    assert_relative_eq!(Vector3::from(data.position), Vector3::new(1.0, 2.0, 3.0));
    assert_relative_eq!(
        Vector3::from(data.direction),
        Vector3::new(-1.0, 0.0, 0.0),
        epsilon = 1e-6
    );
}

#[test]
fn inactive_slot_contributes_nothing() {
    let data = lumen_ngin::data_structures::light::LightData::default();

    assert_relative_eq!(
        data.contribution(Vector3::new(0.0, 0.0, 0.0), up()),
        Vector3::new(0.0, 0.0, 0.0)
    );
}

#[test]
fn cone_shadow_bounds_enclose_the_cone() {
    let light = Light::directional_cone([1.0; 3], 45.0, 10.0);

    let bounds = light.shadow_bounds.unwrap();

    assert_relative_eq!(bounds.right, 10.0, epsilon = 1e-5);
    assert_eq!(bounds, OrthoBounds::new(-bounds.right, bounds.right, -bounds.right, bounds.right, 0.0, 10.0));
}

#[test]
fn smoothstep_matches_hermite_interpolation() {
    assert_relative_eq!(smoothstep(0.0, 1.0, -1.0), 0.0);
    assert_relative_eq!(smoothstep(0.0, 1.0, 0.5), 0.5);
    assert_relative_eq!(smoothstep(0.0, 1.0, 2.0), 1.0);
    assert_relative_eq!(smoothstep(0.0, 1.0, 0.25), 0.15625);
}
