/// Partview Core Library - part tree, mesh loading and rendering
///
/// This library holds everything below the user interface: STL parsing,
/// the part hierarchy and its row/column adapter, render-list population,
/// the character-cell rasterizer and the stereo VR session.

pub mod actor;
pub mod camera;
pub mod colour;
pub mod geometry;
pub mod model;
pub mod part;
pub mod raster;
pub mod render;
pub mod stl;
pub mod tree;
pub mod vr;

// Re-export commonly used types
pub use actor::{Actor, Property};
pub use camera::{Camera, Orbit, ProjectionMode};
pub use colour::Rgb;
pub use geometry::{Bounds, Mesh, Triangle, Vertex};
pub use model::{ItemFlags, ModelIndex, PartList};
pub use part::{AttrValue, Part};
pub use raster::{Cell, Framebuffer};
pub use render::{populate_viewport, populate_vr, RenderList};
pub use stl::StlError;
pub use tree::{PartId, PartTree, TreeError};
pub use vr::{FrameSink, SharedFrame, VrConfig, VrError, VrSession};
