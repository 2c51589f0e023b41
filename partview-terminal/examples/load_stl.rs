/// Example: load an STL file into a part and print one shaded frame
///
/// Usage: cargo run --example load_stl -- path/to/file.stl
use std::env;

use anyhow::Context;
use partview_core::raster::CELL_ASPECT;
use partview_core::{populate_viewport, Camera, Framebuffer, Mesh, Orbit, Part, PartList};
use partview_terminal::presenter::snapshot_text;

fn main() -> anyhow::Result<()> {
    simple_logger::init_with_level(log::Level::Info)?;

    let mut part = Part::new("model");
    match env::args().nth(1) {
        Some(path) => part
            .load_stl(&path)
            .with_context(|| format!("failed to load {path}"))?,
        None => {
            eprintln!("No STL file provided, using default cube...");
            part.attach_mesh(Mesh::cube(2.0));
        }
    }
    part.set_colour("tomato".parse()?);

    let mut list = PartList::new("PartsList", &["Part", "Visible?"]);
    list.append_child(None, part);

    let (width, height) = (80, 30);
    let mut camera = Camera::new(width as u32, height as u32).with_cell_aspect(CELL_ASPECT);
    let mut frame = Framebuffer::new(width, height);

    let render = populate_viewport(list.tree_mut());
    let bounds = render.bounds().context("nothing to draw")?;
    camera.reset_to(&bounds);
    let model = Orbit::new(0.3, 0.3, 0.0).matrix_about(&bounds.center());
    frame.render_actors(render.actors(), &model, &camera);

    print!("{}", snapshot_text(&frame));
    Ok(())
}
