use approx::assert_relative_eq;
use lumen_ngin::{
    data_structures::{
        camera::{OrthoBounds, Projection},
        light::Light,
    },
    shadow::{ShadowSettings, SpotShadow, in_shadow, shadow_camera, shadow_uv},
};

#[test]
fn fragment_behind_the_occluder_is_shadowed() {
    assert!(in_shadow(0.4, 0.3, 0.01));
}

#[test]
fn fragment_in_front_of_the_stored_depth_is_lit() {
    assert!(!in_shadow(0.29, 0.3, 0.01));
}

#[test]
fn bias_absorbs_self_shadowing() {
    assert!(!in_shadow(0.305, 0.3, 0.01));
    assert!(in_shadow(0.305, 0.3, 0.0));
}

#[test]
fn default_settings() {
    let settings = ShadowSettings::default();

    assert_relative_eq!(settings.strength, 0.5);
    assert_eq!(settings.resolution, [512, 512]);
    assert_relative_eq!(settings.bias, 0.01);
    assert_eq!(settings.bounds, OrthoBounds::new(-5.0, 5.0, -5.0, 5.0, 0.0, 20.0));
    assert_eq!(settings.spot, None);
    assert_relative_eq!(SpotShadow::default().fov, 45.0);
}

#[test]
fn shadow_camera_prefers_the_light_bounds() {
    let settings = ShadowSettings::default();
    let plain = Light::directional([1.0; 3]);
    let cone = Light::directional_cone([1.0; 3], 30.0, 8.0);

    let default_camera = shadow_camera(&plain, &settings).unwrap();
    let cone_camera = shadow_camera(&cone, &settings).unwrap();

    assert_eq!(
        *default_camera.projection(),
        Projection::Orthographic(settings.bounds)
    );
    assert_eq!(
        *cone_camera.projection(),
        Projection::Orthographic(OrthoBounds::from_cone(30.0, 8.0))
    );
}

#[test]
fn spot_shadows_use_a_perspective_camera() {
    let settings = ShadowSettings {
        spot: Some(SpotShadow::default()),
        ..Default::default()
    };

    let camera = shadow_camera(&Light::spot([1.0; 3], [1.0, 0.0, 0.1], 30.0, 20.0), &settings).unwrap();

    assert_eq!(
        *camera.projection(),
        Projection::Perspective {
            fov_deg: 45.0,
            aspect: 1.0,
            near: 0.1,
            far: 100.0,
        }
    );
}

#[test]
fn degenerate_shadow_bounds_are_rejected() {
    let flat = ShadowSettings {
        bounds: OrthoBounds::new(-5.0, 5.0, -5.0, 5.0, 10.0, 10.0),
        ..Default::default()
    };
    let inverted = ShadowSettings {
        bounds: OrthoBounds::new(-5.0, 5.0, -5.0, 5.0, 20.0, 1.0),
        ..Default::default()
    };
    let narrow = ShadowSettings {
        bounds: OrthoBounds::new(1.0, 1.0, -5.0, 5.0, 0.0, 20.0),
        ..Default::default()
    };
    let light = Light::directional([1.0; 3]);

    assert!(shadow_camera(&light, &flat).is_err());
    assert!(shadow_camera(&light, &inverted).is_err());
    assert!(shadow_camera(&light, &narrow).is_err());
}

#[test]
fn shadow_uv_flips_v_to_texture_rows() {
    assert_eq!(shadow_uv(0.0, 0.0), [0.5, 0.5]);
    assert_eq!(shadow_uv(-1.0, 1.0), [0.0, 0.0]);
    assert_eq!(shadow_uv(1.0, -1.0), [1.0, 1.0]);
}
