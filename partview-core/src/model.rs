/// Row/column adapter over a [`PartTree`] for list and tree widgets
///
/// Widgets address cells by (row, column, parent index). A `None` parent
/// stands for the invisible root, whose children are the top-level rows.
use crate::part::{AttrValue, Part};
use crate::tree::{PartId, PartTree};

/// Address of one cell in the part list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModelIndex {
    pub row: usize,
    pub column: usize,
    pub id: PartId,
}

impl ModelIndex {
    /// Same row, different column
    pub fn sibling(&self, column: usize) -> ModelIndex {
        ModelIndex { column, ..*self }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ItemFlags {
    pub selectable: bool,
    pub editable: bool,
    pub has_children: bool,
}

#[derive(Debug)]
pub struct PartList {
    tree: PartTree,
    headers: Vec<String>,
}

impl PartList {
    pub fn new(title: &str, headers: &[&str]) -> Self {
        let root = Part::from_data(
            std::iter::once(title)
                .chain(headers.iter().skip(1).copied())
                .map(AttrValue::from)
                .collect(),
        );
        Self {
            tree: PartTree::new(root),
            headers: headers.iter().map(|h| h.to_string()).collect(),
        }
    }

    pub fn tree(&self) -> &PartTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut PartTree {
        &mut self.tree
    }

    pub fn root_item(&self) -> PartId {
        self.tree.root()
    }

    fn resolve(&self, parent: Option<&ModelIndex>) -> PartId {
        parent.map_or(self.tree.root(), |p| p.id)
    }

    /// Index of the cell at `row`/`column` under `parent`
    pub fn index(&self, row: usize, column: usize, parent: Option<&ModelIndex>) -> Option<ModelIndex> {
        let parent = self.resolve(parent);
        let id = self.tree.child(parent, row)?;
        if column >= self.column_count(None) {
            return None;
        }
        Some(ModelIndex { row, column, id })
    }

    /// Index (column 0) of an existing part; `None` for the root
    pub fn index_of(&self, id: PartId) -> Option<ModelIndex> {
        if id == self.tree.root() || !self.tree.contains(id) {
            return None;
        }
        Some(ModelIndex {
            row: self.tree.row(id),
            column: 0,
            id,
        })
    }

    /// Parent of `index`; `None` for top-level rows
    pub fn parent(&self, index: &ModelIndex) -> Option<ModelIndex> {
        self.index_of(self.tree.parent(index.id)?)
    }

    pub fn row_count(&self, parent: Option<&ModelIndex>) -> usize {
        // Only the first column carries children
        if parent.is_some_and(|p| p.column > 0) {
            return 0;
        }
        self.tree.child_count(self.resolve(parent))
    }

    pub fn column_count(&self, parent: Option<&ModelIndex>) -> usize {
        self.tree.column_count(self.resolve(parent))
    }

    pub fn has_children(&self, parent: Option<&ModelIndex>) -> bool {
        self.row_count(parent) > 0
    }

    pub fn data(&self, index: &ModelIndex) -> Option<AttrValue> {
        self.tree.data(index.id, index.column)
    }

    pub fn set_data(&mut self, index: &ModelIndex, value: AttrValue) -> bool {
        self.tree.set_data(index.id, index.column, value)
    }

    pub fn header_data(&self, section: usize) -> Option<&str> {
        self.headers.get(section).map(String::as_str)
    }

    pub fn flags(&self, index: &ModelIndex) -> ItemFlags {
        if !self.tree.contains(index.id) {
            return ItemFlags::default();
        }
        ItemFlags {
            selectable: true,
            editable: index.column < self.tree.column_count(index.id),
            has_children: self.tree.child_count(index.id) > 0,
        }
    }

    /// Append `part` below `parent` (top level for `None`) and return its index
    pub fn append_child(&mut self, parent: Option<&ModelIndex>, part: Part) -> Option<ModelIndex> {
        let parent = self.resolve(parent);
        let id = self.tree.append_child(parent, part).ok()?;
        self.index_of(id)
    }

    pub fn part(&self, index: &ModelIndex) -> Option<&Part> {
        self.tree.get(index.id)
    }

    pub fn part_mut(&mut self, index: &ModelIndex) -> Option<&mut Part> {
        self.tree.get_mut(index.id)
    }
}
