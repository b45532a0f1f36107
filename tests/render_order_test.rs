use approx::assert_relative_eq;
use cgmath::Vector3;
use lumen_ngin::{
    data_structures::{
        geometry::Geometry,
        scene_graph::NodeKind,
    },
    material::library,
    render::{World, is_transparent, sort_back_to_front, squared_distance},
};

#[test]
fn transparent_meshes_draw_farthest_first() {
    let mut draws = vec![("a", 3.0f32), ("b", 1.0), ("c", 5.0)];
    for draw in &mut draws {
        draw.1 *= draw.1;
    }

    sort_back_to_front(&mut draws);

    let order: Vec<_> = draws.iter().map(|(name, _)| *name).collect();
    assert_eq!(order, vec!["c", "a", "b"]);
}

#[test]
fn equal_distances_keep_insertion_order() {
    let mut draws = vec![(0, 2.0), (1, 4.0), (2, 2.0), (3, 4.0)];

    sort_back_to_front(&mut draws);

    assert_eq!(
        draws.iter().map(|(i, _)| *i).collect::<Vec<_>>(),
        vec![1, 3, 0, 2]
    );
}

#[test]
fn opacity_below_one_selects_the_transparent_pass() {
    assert!(is_transparent(Some(0.1)));
    assert!(is_transparent(Some(0.999)));
    assert!(!is_transparent(Some(1.0)));
    assert!(!is_transparent(None));
}

#[test]
fn squared_distance_is_not_rooted() {
    assert_relative_eq!(
        squared_distance(Vector3::new(1.0, 2.0, 3.0), Vector3::new(1.0, 2.0, 0.0)),
        9.0
    );
}

#[test]
fn add_mesh_requires_an_existing_material() {
    let mut world = World::new();
    let root = world.graph.add_group("scene");
    let material = world.add_material(library::transparent([1.0; 3], 0.5));

    let mesh = world
        .add_mesh(root, Geometry::rectangle(1.0, 1.0), material)
        .unwrap();
    world.materials.remove(material);

    assert!(matches!(
        world.graph.get(mesh).map(|n| &n.kind),
        Some(NodeKind::Mesh(_))
    ));
    assert_eq!(world.graph.mesh(mesh).unwrap().material(), material);
    assert!(
        world
            .add_mesh(root, Geometry::rectangle(1.0, 1.0), material)
            .is_err()
    );
}

#[test]
fn meshes_share_materials_by_handle() {
    let mut world = World::new();
    let root = world.graph.add_group("scene");
    let material = world.add_material(library::surface([1.0; 3], None));

    let a = world.add_mesh(root, Geometry::rectangle(1.0, 1.0), material).unwrap();
    let b = world.add_mesh(root, Geometry::box_geometry(1.0, 1.0, 1.0), material).unwrap();

    world.material_mut(material).unwrap().set("baseColor", [0.0, 0.0, 1.0]);

    assert_eq!(world.graph.mesh(a).unwrap().material(), world.graph.mesh(b).unwrap().material());
    assert_eq!(world.graph.mesh(a).unwrap().vertex_count(), 6);
    assert_eq!(world.graph.mesh(b).unwrap().vertex_count(), 36);
}
