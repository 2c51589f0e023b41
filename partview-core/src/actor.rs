/// Renderable handles: a mesh plus the visual properties used to draw it
use std::sync::Arc;

use crate::colour::Rgb;
use crate::geometry::{Bounds, Mesh};

/// Visual properties applied when an actor is drawn
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Property {
    pub colour: Rgb,
    pub opacity: f32,
    pub visible: bool,
}

impl Default for Property {
    fn default() -> Self {
        Self {
            colour: Rgb::WHITE,
            opacity: 1.0,
            visible: true,
        }
    }
}

/// A drawable bound to (at most) one mesh.
///
/// A part's primary actor shares its mesh with the part. Copies made with
/// [`Actor::deep_copy`] own their geometry outright, so they can be handed
/// to another render context (or thread) and restyled independently.
#[derive(Debug, Clone, Default)]
pub struct Actor {
    mesh: Option<Arc<Mesh>>,
    property: Property,
}

impl Actor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mesh(mesh: Arc<Mesh>) -> Self {
        Self {
            mesh: Some(mesh),
            property: Property::default(),
        }
    }

    pub fn set_mesh(&mut self, mesh: Arc<Mesh>) {
        self.mesh = Some(mesh);
    }

    pub fn mesh(&self) -> Option<&Mesh> {
        self.mesh.as_deref()
    }

    /// Mutable access to the geometry. Shared geometry is copied first.
    pub fn mesh_mut(&mut self) -> Option<&mut Mesh> {
        self.mesh.as_mut().map(Arc::make_mut)
    }

    /// True once the actor has at least one point to draw
    pub fn has_geometry(&self) -> bool {
        self.mesh.as_ref().is_some_and(|m| !m.is_empty())
    }

    pub fn bounds(&self) -> Option<Bounds> {
        self.mesh.as_ref()?.bounds()
    }

    pub fn property(&self) -> &Property {
        &self.property
    }

    pub fn property_mut(&mut self) -> &mut Property {
        &mut self.property
    }

    /// Independent handle with its own copy of the mesh data and properties
    pub fn deep_copy(&self) -> Option<Actor> {
        let mesh = self.mesh.as_deref()?;
        Some(Actor {
            mesh: Some(Arc::new(mesh.clone())),
            property: self.property,
        })
    }
}
