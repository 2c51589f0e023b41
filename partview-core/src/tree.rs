/// Ownership hierarchy of parts
///
/// Nodes live in an arena owned by the tree. Each node owns its part and
/// lists its children in insertion order; the parent link is a plain id and
/// never participates in ownership. Parts are only ever added, never moved
/// or removed, so ids and rows stay stable for the lifetime of the tree.
use std::fmt;

use thiserror::Error;

use crate::part::{AttrValue, Part};

/// Handle to a part inside one [`PartTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PartId(usize);

impl fmt::Display for PartId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("part {0} does not belong to this tree")]
    UnknownPart(PartId),
}

#[derive(Debug)]
struct Node {
    part: Part,
    parent: Option<PartId>,
    row: usize,
    children: Vec<PartId>,
}

#[derive(Debug)]
pub struct PartTree {
    nodes: Vec<Node>,
}

impl PartTree {
    /// Create a tree around its (never displayed) root part
    pub fn new(root: Part) -> Self {
        Self {
            nodes: vec![Node {
                part: root,
                parent: None,
                row: 0,
                children: Vec::new(),
            }],
        }
    }

    pub fn root(&self) -> PartId {
        PartId(0)
    }

    /// Number of parts including the root
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when only the root exists
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    pub fn contains(&self, id: PartId) -> bool {
        id.0 < self.nodes.len()
    }

    /// Attach `part` as the last child of `parent`.
    ///
    /// The part is moved in by value, so it cannot already be an ancestor
    /// of `parent`.
    pub fn append_child(&mut self, parent: PartId, part: Part) -> Result<PartId, TreeError> {
        if !self.contains(parent) {
            return Err(TreeError::UnknownPart(parent));
        }
        let id = PartId(self.nodes.len());
        let row = self.nodes[parent.0].children.len();
        self.nodes.push(Node {
            part,
            parent: Some(parent),
            row,
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        Ok(id)
    }

    pub fn get(&self, id: PartId) -> Option<&Part> {
        self.nodes.get(id.0).map(|n| &n.part)
    }

    pub fn get_mut(&mut self, id: PartId) -> Option<&mut Part> {
        self.nodes.get_mut(id.0).map(|n| &mut n.part)
    }

    /// Child of `id` at `row`, if both exist
    pub fn child(&self, id: PartId, row: usize) -> Option<PartId> {
        self.nodes.get(id.0)?.children.get(row).copied()
    }

    pub fn children(&self, id: PartId) -> &[PartId] {
        self.nodes
            .get(id.0)
            .map(|n| n.children.as_slice())
            .unwrap_or_default()
    }

    pub fn child_count(&self, id: PartId) -> usize {
        self.children(id).len()
    }

    pub fn parent(&self, id: PartId) -> Option<PartId> {
        self.nodes.get(id.0)?.parent
    }

    /// Position of `id` among its siblings; 0 for the root
    pub fn row(&self, id: PartId) -> usize {
        self.nodes.get(id.0).map(|n| n.row).unwrap_or(0)
    }

    /// Number of ancestors below the root (top-level parts have depth 0)
    pub fn depth(&self, id: PartId) -> usize {
        let mut depth = 0;
        let mut current = self.parent(id);
        while let Some(parent) = current {
            current = self.parent(parent);
            if current.is_some() {
                depth += 1;
            }
        }
        depth
    }

    pub fn column_count(&self, id: PartId) -> usize {
        self.get(id).map(Part::column_count).unwrap_or(0)
    }

    pub fn data(&self, id: PartId, column: usize) -> Option<AttrValue> {
        self.get(id)?.data(column)
    }

    pub fn set_data(&mut self, id: PartId, column: usize, value: AttrValue) -> bool {
        self.get_mut(id).is_some_and(|p| p.set(column, value))
    }

    /// Every part below `from`, parent before children, children in
    /// insertion order. `from` itself is not yielded.
    pub fn preorder(&self, from: PartId) -> Preorder<'_> {
        Preorder::new(self, from, false)
    }

    /// Like [`preorder`](Self::preorder) but skips the whole subtree of any
    /// hidden part.
    pub fn visible_preorder(&self, from: PartId) -> Preorder<'_> {
        Preorder::new(self, from, true)
    }
}

impl Default for PartTree {
    fn default() -> Self {
        Self::new(Part::new("root"))
    }
}

/// Explicit-stack depth-first walk, safe for arbitrarily deep trees
pub struct Preorder<'a> {
    tree: &'a PartTree,
    stack: Vec<PartId>,
    skip_hidden: bool,
}

impl<'a> Preorder<'a> {
    fn new(tree: &'a PartTree, from: PartId, skip_hidden: bool) -> Self {
        let stack = tree.children(from).iter().rev().copied().collect();
        Self {
            tree,
            stack,
            skip_hidden,
        }
    }
}

impl Iterator for Preorder<'_> {
    type Item = PartId;

    fn next(&mut self) -> Option<PartId> {
        loop {
            let id = self.stack.pop()?;
            let node = &self.tree.nodes[id.0];
            if self.skip_hidden && !node.part.is_visible() {
                continue;
            }
            self.stack.extend(node.children.iter().rev().copied());
            return Some(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// root -> [A -> [A1, A2], B]
    fn sample() -> (PartTree, [PartId; 4]) {
        let mut tree = PartTree::default();
        let root = tree.root();
        let a = tree.append_child(root, Part::new("A")).unwrap();
        let a1 = tree.append_child(a, Part::new("A1")).unwrap();
        let a2 = tree.append_child(a, Part::new("A2")).unwrap();
        let b = tree.append_child(root, Part::new("B")).unwrap();
        (tree, [a, a1, a2, b])
    }

    fn names(tree: &PartTree, ids: impl Iterator<Item = PartId>) -> Vec<String> {
        ids.map(|id| tree.get(id).unwrap().name().to_string()).collect()
    }

    #[test]
    fn test_append_child_links_parent() {
        let mut tree = PartTree::default();
        let root = tree.root();
        assert_eq!(tree.child_count(root), 0);
        assert!(tree.is_empty());

        let first = tree.append_child(root, Part::new("first")).unwrap();
        let second = tree.append_child(root, Part::new("second")).unwrap();
        assert_eq!(tree.child_count(root), 2);
        assert_eq!(tree.row(second), tree.child_count(root) - 1);
        assert_eq!(tree.parent(second), Some(root));
        assert_eq!(tree.row(first), 0);
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn test_parent_child_row_invariant() {
        let (tree, ids) = sample();
        for id in ids {
            let parent = tree.parent(id).unwrap();
            assert_eq!(tree.child(parent, tree.row(id)), Some(id));
        }
        assert_eq!(tree.parent(tree.root()), None);
        assert_eq!(tree.row(tree.root()), 0);
    }

    #[test]
    fn test_child_out_of_range() {
        let (tree, [a, ..]) = sample();
        assert_eq!(tree.child(a, 2), None);
        assert_eq!(tree.child(a, usize::MAX), None);
        assert_eq!(tree.child(PartId(999), 0), None);
    }

    #[test]
    fn test_unknown_parent_is_rejected() {
        let mut tree = PartTree::default();
        let err = tree.append_child(PartId(7), Part::new("x")).unwrap_err();
        assert_eq!(err, TreeError::UnknownPart(PartId(7)));
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_preorder_visits_parent_first() {
        let (tree, _) = sample();
        assert_eq!(names(&tree, tree.preorder(tree.root())), ["A", "A1", "A2", "B"]);
    }

    #[test]
    fn test_hidden_subtree_is_elided() {
        let (mut tree, [a, ..]) = sample();
        tree.get_mut(a).unwrap().set_visible(false);
        assert_eq!(names(&tree, tree.visible_preorder(tree.root())), ["B"]);
        assert_eq!(tree.preorder(tree.root()).count(), 4);
    }

    #[test]
    fn test_hidden_leaf_only_hides_itself() {
        let (mut tree, [_, a1, ..]) = sample();
        tree.get_mut(a1).unwrap().set_visible(false);
        assert_eq!(names(&tree, tree.visible_preorder(tree.root())), ["A", "A2", "B"]);
    }

    #[test]
    fn test_deep_tree_does_not_recurse() {
        let mut tree = PartTree::default();
        let mut parent = tree.root();
        for i in 0..200_000 {
            parent = tree.append_child(parent, Part::new(format!("p{i}"))).unwrap();
        }
        assert_eq!(tree.visible_preorder(tree.root()).count(), 200_000);
        assert_eq!(tree.depth(parent), 199_999);
    }

    #[test]
    fn test_column_access_through_tree() {
        let (mut tree, [a, ..]) = sample();
        assert_eq!(tree.column_count(a), 2);
        assert!(tree.set_data(a, 0, "Axle".into()));
        assert_eq!(tree.data(a, 0), Some("Axle".into()));
        assert!(!tree.set_data(a, 5, "x".into()));
        assert_eq!(tree.data(a, 5), None);
    }
}
