use std::fs;
use std::path::PathBuf;

use nalgebra::{Matrix4, Point3};
use partview_core::stl::{write_binary_stl, StlError};
use partview_core::{
    populate_viewport, populate_vr, Camera, Framebuffer, Mesh, Part, PartList, PartTree, Rgb,
};
use rstest::{fixture, rstest};
use tempfile::TempDir;

const ASCII_TRIANGLE: &str = "solid plate
facet normal 0 0 1
  outer loop
    vertex -1 -1 0
    vertex 1 -1 0
    vertex 0 1 0
  endloop
endfacet
endsolid plate
";

struct Files {
    _dir: TempDir,
    cube: PathBuf,
    plate: PathBuf,
    empty: PathBuf,
    garbage: PathBuf,
    missing: PathBuf,
}

#[fixture]
fn files() -> Files {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = |name: &str| dir.path().join(name);

    let cube = path("cube.stl");
    fs::write(&cube, write_binary_stl(&Mesh::cube(2.0))).unwrap();
    let plate = path("plate.stl");
    fs::write(&plate, ASCII_TRIANGLE).unwrap();
    let empty = path("empty.stl");
    fs::write(&empty, write_binary_stl(&Mesh::new())).unwrap();
    let garbage = path("garbage.stl");
    fs::write(&garbage, b"not a mesh").unwrap();
    let missing = path("missing.stl");

    Files {
        cube,
        plate,
        empty,
        garbage,
        missing,
        _dir: dir,
    }
}

fn draw(part: &Part) -> usize {
    let mut fb = Framebuffer::new(40, 20);
    fb.render_actor(part.actor(), &Matrix4::identity(), &Camera::new(40, 20));
    fb.covered()
}

#[rstest]
fn fresh_part_draws_nothing() {
    let part = Part::new("TopLevel 0");
    assert!(!part.actor().has_geometry());
    assert_eq!(draw(&part), 0);
}

#[rstest]
fn loaded_part_draws_its_geometry(files: Files) {
    let mut part = Part::new("cube");
    part.load_stl(&files.cube).unwrap();

    assert_eq!(part.mesh().unwrap().point_count(), 36);
    assert_eq!(part.source(), Some(files.cube.as_path()));
    assert!(draw(&part) > 0);
}

#[rstest]
fn ascii_file_loads(files: Files) {
    let mut part = Part::new("plate");
    part.load_stl(&files.plate).unwrap();
    let bounds = part.mesh().unwrap().bounds().unwrap();
    assert_eq!(bounds.min, Point3::new(-1.0, -1.0, 0.0));
    assert_eq!(bounds.max, Point3::new(1.0, 1.0, 0.0));
}

#[rstest]
fn new_actor_is_a_deep_copy(files: Files) {
    let mut part = Part::new("cube");
    part.load_stl(&files.cube).unwrap();
    part.set_colour(Rgb::new(0, 128, 0));

    let mut copy = part.new_actor().expect("mesh is loaded");
    copy.mesh_mut().unwrap().triangles.truncate(1);
    copy.property_mut().colour = Rgb::WHITE;

    assert_eq!(part.actor().mesh().unwrap().triangles.len(), 12);
    assert_eq!(part.colour(), Rgb::new(0, 128, 0));
}

#[rstest]
#[case::missing(|f: &Files| f.missing.clone())]
#[case::empty(|f: &Files| f.empty.clone())]
#[case::garbage(|f: &Files| f.garbage.clone())]
fn failed_load_leaves_mesh_absent(files: Files, #[case] pick: fn(&Files) -> PathBuf) {
    let mut part = Part::new("broken");
    assert!(part.load_stl(pick(&files)).is_err());
    assert!(part.mesh().is_none());
    assert!(part.new_actor().is_none());
    assert_eq!(draw(&part), 0);
}

#[rstest]
fn empty_file_reports_no_geometry(files: Files) {
    let mut part = Part::new("empty");
    assert!(matches!(
        part.load_stl(&files.empty),
        Err(StlError::EmptyGeometry)
    ));
}

#[rstest]
fn failed_reload_keeps_previous_mesh(files: Files) {
    let mut part = Part::new("cube");
    part.load_stl(&files.cube).unwrap();
    assert!(part.load_stl(&files.missing).is_err());
    assert_eq!(part.mesh().unwrap().triangles.len(), 12);
    assert_eq!(part.source(), Some(files.cube.as_path()));
}

#[rstest]
fn render_lists_follow_visible_preorder(files: Files) {
    let mut list = PartList::new("PartsList", &["Part", "Visible?"]);
    let a = list.append_child(None, Part::new("A")).unwrap();
    for (name, path) in [("A1", &files.cube), ("A2", &files.plate)] {
        let mut part = Part::new(name);
        part.load_stl(path).unwrap();
        list.append_child(Some(&a), part).unwrap();
    }
    let mut b = Part::new("B");
    b.load_stl(&files.cube).unwrap();
    list.append_child(None, b).unwrap();

    let names = |tree: &PartTree, ids: Vec<_>| -> Vec<String> {
        ids.into_iter()
            .map(|id| tree.get(id).unwrap().name().to_string())
            .collect()
    };

    let ids = populate_viewport(list.tree_mut()).parts().collect();
    assert_eq!(names(list.tree(), ids), ["A1", "A2", "B"]);
    assert_eq!(populate_vr(list.tree()).len(), 3);

    list.part_mut(&a).unwrap().set_visible(false);
    let ids = populate_viewport(list.tree_mut()).parts().collect();
    assert_eq!(names(list.tree(), ids), ["B"]);
    assert_eq!(populate_vr(list.tree()).len(), 1);
}
