/// Render lists built from the part tree
///
/// Both lists follow the visible pre-order of the tree: parent before
/// children, siblings in insertion order, hidden subtrees skipped, and parts
/// without geometry left out.
use crate::actor::Actor;
use crate::geometry::Bounds;
use crate::tree::{PartId, PartTree};

/// Ordered primary actors for the desktop viewport, borrowed from the tree
#[derive(Debug, Default)]
pub struct RenderList<'a> {
    entries: Vec<(PartId, &'a Actor)>,
}

impl<'a> RenderList<'a> {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parts in draw order
    pub fn parts(&self) -> impl Iterator<Item = PartId> + '_ {
        self.entries.iter().map(|(id, _)| *id)
    }

    pub fn actors(&self) -> impl Iterator<Item = &'a Actor> + '_ {
        self.entries.iter().map(|(_, actor)| *actor)
    }

    /// Combined bounds of everything in the list
    pub fn bounds(&self) -> Option<Bounds> {
        combined_bounds(self.actors())
    }
}

/// Sync each visible part's colour into its actor, then collect the actors
/// that have geometry
pub fn populate_viewport(tree: &mut PartTree) -> RenderList<'_> {
    let visible: Vec<PartId> = tree.visible_preorder(tree.root()).collect();
    for &id in &visible {
        if let Some(part) = tree.get_mut(id) {
            part.apply_colour();
        }
    }

    let tree = &*tree;
    let entries = visible
        .into_iter()
        .filter_map(|id| {
            let actor = tree.get(id)?.actor();
            actor.has_geometry().then_some((id, actor))
        })
        .collect();
    RenderList { entries }
}

/// Independent actor copies for another render context. The copies own
/// their geometry and can be moved to another thread.
pub fn populate_vr(tree: &PartTree) -> Vec<Actor> {
    tree.visible_preorder(tree.root())
        .filter_map(|id| tree.get(id)?.new_actor())
        .filter(Actor::has_geometry)
        .collect()
}

pub fn combined_bounds<'a>(actors: impl IntoIterator<Item = &'a Actor>) -> Option<Bounds> {
    actors
        .into_iter()
        .filter_map(Actor::bounds)
        .reduce(|acc, b| acc.union(&b))
}
