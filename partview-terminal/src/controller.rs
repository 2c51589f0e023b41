/// Window controller: wires user actions to the part list and the renderers
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use nalgebra::Point3;
use partview_core::raster::CELL_ASPECT;
use partview_core::{
    populate_viewport, populate_vr, Camera, Framebuffer, ModelIndex, Orbit, Part, PartList, Rgb,
    SharedFrame, StlError, VrSession,
};
use thiserror::Error;

use crate::config::Config;

pub const LIST_TITLE: &str = "PartsList";
pub const HEADERS: [&str; 2] = ["Part", "Visible?"];

/// Why a file could not be added to the part list
#[derive(Debug, Error)]
pub enum OpenError {
    #[error("The file does not exist.")]
    Missing(PathBuf),
    #[error("The STL file contains no geometry.")]
    NoGeometry(PathBuf),
    #[error("Could not load {}: {source}", path.display())]
    Load { path: PathBuf, source: StlError },
    #[error("The selected part does not exist.")]
    InvalidParent,
}

struct Status {
    message: String,
    expires: Instant,
}

pub struct Controller {
    list: PartList,
    config: Config,
    camera: Camera,
    orbit: Orbit,
    pivot: Point3<f32>,
    viewport: Framebuffer,
    vr: Option<VrSession>,
    vr_frame: SharedFrame,
    status: Option<Status>,
}

impl Controller {
    /// Viewport size is in character cells
    pub fn new(config: Config, width: usize, height: usize) -> Self {
        let mut list = PartList::new(LIST_TITLE, &HEADERS);
        for i in 0..config.initial_parts {
            list.append_child(None, Part::new(format!("TopLevel {i}")));
        }

        Self {
            list,
            camera: viewport_camera(width, height),
            orbit: Orbit::new(0.3, 0.3, 0.0),
            pivot: Point3::origin(),
            viewport: Framebuffer::new(width, height),
            vr: None,
            vr_frame: SharedFrame::new(),
            status: None,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn parts(&self) -> &PartList {
        &self.list
    }

    pub fn viewport(&self) -> &Framebuffer {
        &self.viewport
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        if (width, height) == (self.viewport.width(), self.viewport.height()) {
            return;
        }
        let mut camera = viewport_camera(width, height);
        camera.position = self.camera.position;
        camera.target = self.camera.target;
        camera.near = self.camera.near;
        camera.far = self.camera.far;
        self.camera = camera;
        self.viewport.resize(width, height);
        self.redraw();
    }

    /// Load each file into a new part under `under` (top level for `None`),
    /// then rebuild the render and reset the camera. Returns the indexes of
    /// the parts that were added.
    pub fn open_files(&mut self, paths: &[PathBuf], under: Option<&ModelIndex>) -> Vec<ModelIndex> {
        let mut added = Vec::new();
        for path in paths {
            match self.load_stl_file(path, under) {
                Ok(index) => added.push(index),
                Err(err) => {
                    warn!("{}: {err}", path.display());
                    self.set_status(format!("{}: {err}", path.display()));
                }
            }
        }
        if !added.is_empty() {
            let noun = if added.len() == 1 { "file" } else { "files" };
            self.set_status(format!("Loaded {} {noun}", added.len()));
        }
        self.update_render();
        added
    }

    fn load_stl_file(&mut self, path: &Path, under: Option<&ModelIndex>) -> Result<ModelIndex, OpenError> {
        if !path.is_file() {
            return Err(OpenError::Missing(path.to_path_buf()));
        }

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let mut part = Part::new(name);
        part.set_colour(self.config.default_colour);
        part.load_stl(path).map_err(|source| match source {
            StlError::EmptyGeometry => OpenError::NoGeometry(path.to_path_buf()),
            source => OpenError::Load {
                path: path.to_path_buf(),
                source,
            },
        })?;

        let index = self
            .list
            .append_child(under, part)
            .ok_or(OpenError::InvalidParent)?;
        info!("added part {} from {}", index.id, path.display());
        Ok(index)
    }

    /// Append a "New" part under `under` (top level for `None`)
    pub fn add_new_item(&mut self, under: Option<&ModelIndex>) -> Option<ModelIndex> {
        let index = self
            .list
            .append_child(under, Part::from_data(vec!["New".into(), "true".into()]))?;
        debug!("added new item {}", index.id);
        Some(index)
    }

    pub fn rename(&mut self, index: &ModelIndex, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() {
            return false;
        }
        let Some(part) = self.list.part_mut(index) else {
            return false;
        };
        part.set_name(name);
        true
    }

    pub fn set_colour(&mut self, index: &ModelIndex, colour: Rgb) -> bool {
        let Some(part) = self.list.part_mut(index) else {
            return false;
        };
        part.set_colour(colour);
        self.redraw();
        true
    }

    /// Flip the visibility of a part and return the new state
    pub fn toggle_visibility(&mut self, index: &ModelIndex) -> Option<bool> {
        let part = self.list.part_mut(index)?;
        let visible = !part.is_visible();
        part.set_visible(visible);
        self.update_render();
        Some(visible)
    }

    /// Rebuild the render list from the tree, reset the camera and draw
    pub fn update_render(&mut self) {
        self.reset_camera();
        let count = self.redraw();
        debug!("number of actors in renderer: {count}");
    }

    /// Redraw the viewport from the current tree without moving the camera.
    /// Returns the number of actors drawn.
    pub fn redraw(&mut self) -> usize {
        let model = self.orbit.matrix_about(&self.pivot);
        let list = populate_viewport(self.list.tree_mut());
        self.viewport.clear();
        self.viewport.render_actors(list.actors(), &model, &self.camera);
        list.len()
    }

    /// Fit the camera to everything currently visible
    pub fn reset_camera(&mut self) {
        let list = populate_viewport(self.list.tree_mut());
        if let Some(bounds) = list.bounds() {
            self.pivot = bounds.center();
            self.camera.reset_to(&bounds);
        }
    }

    pub fn rotate(&mut self, dx: f32, dy: f32, dz: f32) {
        self.orbit.rotate(dx, dy, dz);
    }

    /// Advance time-based state (auto-rotation, status expiry)
    pub fn tick(&mut self, dt: Duration) {
        if self.config.auto_rotate {
            self.orbit.rotate(0.0, 0.5 * dt.as_secs_f32(), 0.0);
        }
        if self.status.as_ref().is_some_and(|s| Instant::now() >= s.expires) {
            self.status = None;
        }
    }

    /// Start a VR session over copies of the visible parts, replacing any
    /// running session
    pub fn start_vr(&mut self) -> bool {
        self.stop_vr();
        let actors = populate_vr(self.list.tree());
        let count = actors.len();
        self.vr_frame.clear();

        match VrSession::start(actors, self.config.vr.clone(), self.vr_frame.clone()) {
            Ok(session) => {
                self.vr = Some(session);
                self.set_status(format!("VR started with {count} parts"));
                true
            }
            Err(err) => {
                warn!("{err}");
                self.set_status(err.to_string());
                false
            }
        }
    }

    /// Stop the VR session, if any
    pub fn stop_vr(&mut self) {
        if let Some(mut session) = self.vr.take() {
            session.stop();
            self.set_status("VR stopped");
        }
    }

    pub fn vr_running(&self) -> bool {
        self.vr.as_ref().is_some_and(VrSession::is_running)
    }

    /// Most recent VR frame, for previewing
    pub fn vr_preview(&self) -> Option<Framebuffer> {
        self.vr.as_ref()?;
        self.vr_frame.latest()
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status = Some(Status {
            message: message.into(),
            expires: Instant::now() + Duration::from_millis(self.config.status_timeout_ms),
        });
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_ref().map(|s| s.message.as_str())
    }
}

fn viewport_camera(width: usize, height: usize) -> Camera {
    Camera::new(width as u32, height as u32).with_cell_aspect(CELL_ASPECT)
}
