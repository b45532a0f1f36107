use std::path::PathBuf;

use lumen_ngin::resources::{asset_path, load_obj_groups};

fn write_temp(name: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("lumen-ngin-{}-{name}", std::process::id()));
    std::fs::write(&path, contents).unwrap();
    path
}

#[test]
fn relative_paths_resolve_into_the_asset_directory() {
    assert_eq!(asset_path("cube.obj"), PathBuf::from("./assets/cube.obj"));
}

#[test]
fn absolute_paths_pass_through() {
    let absolute = std::env::temp_dir().join("model.obj");

    assert_eq!(asset_path(absolute.to_str().unwrap()), absolute);
}

#[test]
fn obj_groups_flip_v_and_keep_normals() {
    let path = write_temp(
        "textured.obj",
        "o tri\n\
         v 0 0 0\nv 1 0 0\nv 0 1 0\n\
         vt 0 0\nvt 1 0.25\nvt 0 1\n\
         vn 0 1 0\n\
         f 1/1/1 2/2/1 3/3/1\n",
    );

    let groups = futures::executor::block_on(load_obj_groups(path.to_str().unwrap())).unwrap();

    assert_eq!(groups.len(), 1);
    let group = &groups[0];
    assert_eq!(group.name, "tri");
    assert_eq!(group.positions, vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
    assert_eq!(group.uvs, vec![[0.0, 1.0], [1.0, 0.75], [0.0, 0.0]]);
    assert_eq!(group.normals, vec![[0.0, 1.0, 0.0]; 3]);
    std::fs::remove_file(path).unwrap();
}

#[test]
fn obj_groups_without_attributes_are_default_filled() {
    let path = write_temp(
        "bare.obj",
        "o quad\n\
         v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\n\
         f 1 2 3 4\n",
    );

    let groups = futures::executor::block_on(load_obj_groups(path.to_str().unwrap())).unwrap();

    let group = &groups[0];
    // The quad is triangulated.
    assert_eq!(group.positions.len(), 6);
    assert_eq!(group.uvs, vec![[0.0, 0.0]; 6]);
    assert_eq!(group.normals, vec![[0.0, 0.0, 1.0]; 6]);
    std::fs::remove_file(path).unwrap();
}

#[test]
fn missing_files_are_errors() {
    let missing = std::env::temp_dir().join("lumen-ngin-does-not-exist.obj");

    assert!(futures::executor::block_on(load_obj_groups(missing.to_str().unwrap())).is_err());
}
