/// Part tree pane: flattens the part list into indented display rows
use partview_core::part::{NAME_COLUMN, VISIBLE_COLUMN};
use partview_core::{ModelIndex, PartId, PartList, Rgb};

/// One displayed line of the tree
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub index: ModelIndex,
    pub depth: usize,
    pub label: String,
    pub visible: bool,
    pub colour: Rgb,
    pub loaded: bool,
    pub has_children: bool,
}

impl Row {
    /// Text for a pane `width` columns wide
    pub fn format(&self, width: usize) -> String {
        let marker = if self.visible { "[x]" } else { "[ ]" };
        let branch = if self.has_children { "▾ " } else { "  " };
        let mesh = if self.loaded { "" } else { " (empty)" };
        let text = format!(
            "{marker} {}{branch}{}{mesh}",
            "  ".repeat(self.depth),
            self.label
        );
        let mut line: String = text.chars().take(width).collect();
        let len = line.chars().count();
        line.extend(std::iter::repeat(' ').take(width.saturating_sub(len)));
        line
    }
}

#[derive(Debug, Default)]
pub struct TreeView {
    rows: Vec<Row>,
    selected: Option<usize>,
    scroll: usize,
}

impl TreeView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-read the list, keeping the selection on the same part when it
    /// still exists
    pub fn rebuild(&mut self, list: &PartList) {
        let keep = self.selected_id();
        self.rows.clear();

        // Explicit stack of (parent, next row to visit)
        let mut stack: Vec<(Option<ModelIndex>, usize)> = vec![(None, 0)];
        while let Some((parent, row)) = stack.pop() {
            let Some(index) = list.index(row, NAME_COLUMN, parent.as_ref()) else {
                continue;
            };
            stack.push((parent, row + 1));

            let Some(part) = list.part(&index) else {
                continue;
            };
            let label = list
                .data(&index)
                .map(|v| v.to_string())
                .unwrap_or_default();
            let visible = list
                .data(&index.sibling(VISIBLE_COLUMN))
                .and_then(|v| v.as_flag())
                .unwrap_or(true);
            let has_children = list.flags(&index).has_children;
            self.rows.push(Row {
                index,
                depth: list.tree().depth(index.id),
                label,
                visible,
                colour: part.colour(),
                loaded: part.mesh().is_some(),
                has_children,
            });
            if has_children {
                stack.push((Some(index), 0));
            }
        }

        self.selected = match keep {
            Some(id) => self.rows.iter().position(|r| r.index.id == id),
            None => None,
        }
        .or(if self.rows.is_empty() { None } else { Some(0) });
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn selected(&self) -> Option<ModelIndex> {
        self.rows.get(self.selected?).map(|r| r.index)
    }

    fn selected_id(&self) -> Option<PartId> {
        self.selected().map(|i| i.id)
    }

    pub fn select_next(&mut self) {
        if let Some(i) = self.selected {
            self.selected = Some((i + 1).min(self.rows.len().saturating_sub(1)));
        }
    }

    pub fn select_previous(&mut self) {
        if let Some(i) = self.selected {
            self.selected = Some(i.saturating_sub(1));
        }
    }

    pub fn select(&mut self, id: PartId) -> bool {
        match self.rows.iter().position(|r| r.index.id == id) {
            Some(i) => {
                self.selected = Some(i);
                true
            }
            None => false,
        }
    }

    /// Scroll so the selection is inside a window of `height` rows, and
    /// return the rows to draw with their absolute positions
    pub fn window(&mut self, height: usize) -> impl Iterator<Item = (usize, &Row)> {
        if let Some(selected) = self.selected {
            if selected < self.scroll {
                self.scroll = selected;
            } else if height > 0 && selected >= self.scroll + height {
                self.scroll = selected + 1 - height;
            }
        }
        self.rows
            .iter()
            .enumerate()
            .skip(self.scroll)
            .take(height)
    }

    /// Hit-test a line of the pane (0 = first row below the header)
    pub fn part_at(&self, line: usize) -> Option<ModelIndex> {
        self.rows.get(self.scroll + line).map(|r| r.index)
    }

    /// Header text from the list's column titles
    pub fn header(list: &PartList) -> String {
        let name = list.header_data(NAME_COLUMN).unwrap_or_default();
        let visible = list.header_data(VISIBLE_COLUMN).unwrap_or_default();
        format!("{visible} {name}")
    }
}
