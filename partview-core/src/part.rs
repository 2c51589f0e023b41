/// A single named, coloured, visibility-toggleable part of a model
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{info, warn};

use crate::actor::Actor;
use crate::colour::Rgb;
use crate::geometry::Mesh;
use crate::stl::{self, StlError};

/// Column holding the part name
pub const NAME_COLUMN: usize = 0;
/// Column holding the visibility flag
pub const VISIBLE_COLUMN: usize = 1;

/// A value shown in one column of the part list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue {
    Text(String),
    Flag(bool),
}

impl AttrValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttrValue::Text(text) => Some(text),
            AttrValue::Flag(_) => None,
        }
    }

    /// Flags, or the text "true"/"false"
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            AttrValue::Flag(flag) => Some(*flag),
            AttrValue::Text(text) => text.trim().parse().ok(),
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Text(text) => f.write_str(text),
            AttrValue::Flag(flag) => write!(f, "{flag}"),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Text(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Text(value)
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Flag(value)
    }
}

/// One node's payload in a [`PartTree`](crate::tree::PartTree).
///
/// Name and visibility are stored as typed fields but stay addressable
/// through columns 0 and 1. Columns from 2 upward hold free-form values.
#[derive(Debug, Clone)]
pub struct Part {
    name: String,
    visible: bool,
    columns: usize,
    extra: Vec<AttrValue>,
    colour: Rgb,
    source: Option<PathBuf>,
    actor: Actor,
}

impl Part {
    /// A visible part with a name and visibility column
    pub fn new(name: impl Into<String>) -> Self {
        Self::from_data(vec![AttrValue::Text(name.into()), AttrValue::Flag(true)])
    }

    /// Build a part from its initial column values. The number of values
    /// fixes the column count for the part's lifetime.
    pub fn from_data(values: Vec<AttrValue>) -> Self {
        let columns = values.len();
        let mut values = values.into_iter();
        let name = values
            .next()
            .map(|v| v.to_string())
            .unwrap_or_default();
        let visible = values.next().and_then(|v| v.as_flag()).unwrap_or(true);

        Self {
            name,
            visible,
            columns,
            extra: values.collect(),
            colour: Rgb::default(),
            source: None,
            actor: Actor::new(),
        }
    }

    pub fn column_count(&self) -> usize {
        self.columns
    }

    /// Value of `column`, or `None` when out of range
    pub fn data(&self, column: usize) -> Option<AttrValue> {
        if column >= self.columns {
            return None;
        }
        match column {
            NAME_COLUMN => Some(AttrValue::Text(self.name.clone())),
            VISIBLE_COLUMN => Some(AttrValue::Flag(self.visible)),
            n => self.extra.get(n - 2).cloned(),
        }
    }

    /// Write `column`. Out-of-range columns and values that do not fit the
    /// column (text that is not a flag in the visibility column) are ignored.
    pub fn set(&mut self, column: usize, value: AttrValue) -> bool {
        if column >= self.columns {
            return false;
        }
        match column {
            NAME_COLUMN => match value {
                AttrValue::Text(name) => self.name = name,
                AttrValue::Flag(_) => return false,
            },
            VISIBLE_COLUMN => match value.as_flag() {
                Some(flag) => self.visible = flag,
                None => return false,
            },
            n => self.extra[n - 2] = value,
        }
        true
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn colour(&self) -> Rgb {
        self.colour
    }

    pub fn set_colour(&mut self, colour: Rgb) {
        self.colour = colour;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Geometry bound to the part's actor
    pub fn mesh(&self) -> Option<&Mesh> {
        self.actor.mesh()
    }

    /// Path of the last successfully loaded file
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Load an STL file and bind its geometry to this part's actor.
    ///
    /// On failure the error is logged and returned; the part keeps whatever
    /// mesh it had before (none for a fresh part).
    pub fn load_stl(&mut self, path: impl AsRef<Path>) -> Result<(), StlError> {
        let path = path.as_ref();
        match stl::load_stl(path) {
            Ok(mesh) => {
                info!(
                    "loaded {} triangles into part '{}' from {}",
                    mesh.triangles.len(),
                    self.name,
                    path.display()
                );
                self.attach_mesh(mesh);
                self.source = Some(path.to_path_buf());
                Ok(())
            }
            Err(err) => {
                warn!("failed to load STL file {}: {err}", path.display());
                Err(err)
            }
        }
    }

    /// Bind already-parsed geometry to this part
    pub fn attach_mesh(&mut self, mesh: Mesh) {
        self.actor.set_mesh(Arc::new(mesh));
    }

    /// The part's own actor. It draws nothing until a mesh is loaded.
    pub fn actor(&self) -> &Actor {
        &self.actor
    }

    pub fn actor_mut(&mut self) -> &mut Actor {
        &mut self.actor
    }

    /// Push the part's colour into its actor before drawing
    pub fn apply_colour(&mut self) {
        self.actor.property_mut().colour = self.colour;
    }

    /// A second, independently owned actor over a deep copy of the mesh,
    /// carrying the current colour. `None` until a mesh is loaded.
    pub fn new_actor(&self) -> Option<Actor> {
        let mut actor = self.actor.deep_copy()?;
        actor.property_mut().colour = self.colour;
        Some(actor)
    }
}
