/// Writes framebuffers and the side panes to a terminal
use crossterm::{
    cursor::MoveTo,
    style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor},
    QueueableCommand,
};
use partview_core::{Cell, Framebuffer, PartList, Rgb};
use std::io::Write;

use crate::tree_view::TreeView;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

/// Screen split: tree pane on the left, viewport on the right, status line
/// at the bottom
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub tree: Rect,
    pub viewport: Rect,
    pub status_row: u16,
    pub columns: u16,
}

impl Layout {
    pub fn new(columns: u16, rows: u16, tree_width: u16) -> Self {
        let body = rows.saturating_sub(1);
        let tree_width = tree_width.min(columns / 2);
        // One column gap between the panes
        let viewport_x = (tree_width + 1).min(columns);
        Self {
            tree: Rect {
                x: 0,
                y: 0,
                width: tree_width,
                height: body,
            },
            viewport: Rect {
                x: viewport_x,
                y: 0,
                width: columns - viewport_x,
                height: body,
            },
            status_row: body,
            columns,
        }
    }

    /// Tree row under a terminal position; `None` on the header or outside
    pub fn tree_line(&self, column: u16, row: u16) -> Option<usize> {
        let inside = column < self.tree.x + self.tree.width && row < self.tree.y + self.tree.height;
        if !inside || row <= self.tree.y {
            return None;
        }
        Some(usize::from(row - self.tree.y - 1))
    }
}

fn terminal_colour(colour: Rgb) -> Color {
    Color::Rgb {
        r: colour.r,
        g: colour.g,
        b: colour.b,
    }
}

/// Queue a framebuffer into `area`, clipping or blank-filling to fit
pub fn draw_framebuffer<W: Write>(writer: &mut W, frame: &Framebuffer, area: Rect) -> std::io::Result<()> {
    let width = usize::from(area.width).min(frame.width());
    for (y, row) in frame.rows().take(usize::from(area.height)).enumerate() {
        writer.queue(MoveTo(area.x, area.y + y as u16))?;
        let mut current: Option<Rgb> = None;
        for cell in &row[..width] {
            if let Some(colour) = cell.colour {
                if current != Some(colour) {
                    writer.queue(SetForegroundColor(terminal_colour(colour)))?;
                    current = Some(colour);
                }
            }
            writer.queue(Print(cell.glyph))?;
        }
        // Blank the rest of the area when the frame is narrower
        let pad = usize::from(area.width).saturating_sub(width);
        if pad > 0 {
            writer.queue(Print(" ".repeat(pad)))?;
        }
    }
    for y in frame.height()..usize::from(area.height) {
        writer.queue(MoveTo(area.x, area.y + y as u16))?;
        writer.queue(Print(" ".repeat(usize::from(area.width))))?;
    }
    writer.queue(ResetColor)?;
    Ok(())
}

/// Queue the header and the visible rows of the tree pane
pub fn draw_tree<W: Write>(
    writer: &mut W,
    view: &mut TreeView,
    list: &PartList,
    area: Rect,
) -> std::io::Result<()> {
    if area.height == 0 || area.width == 0 {
        return Ok(());
    }
    let width = usize::from(area.width);
    let selected = view.selected();

    writer.queue(MoveTo(area.x, area.y))?;
    writer.queue(SetAttribute(Attribute::Bold))?;
    writer.queue(Print(fit(&TreeView::header(list), width)))?;
    writer.queue(SetAttribute(Attribute::Reset))?;

    let lines = usize::from(area.height) - 1;
    let mut drawn = 0;
    for (line, (_, row)) in view.window(lines).enumerate() {
        writer.queue(MoveTo(area.x, area.y + 1 + line as u16))?;
        let is_selected = Some(row.index) == selected;
        if is_selected {
            writer.queue(SetAttribute(Attribute::Reverse))?;
        }
        if row.loaded {
            writer.queue(SetForegroundColor(terminal_colour(row.colour)))?;
        } else {
            writer.queue(SetForegroundColor(Color::DarkGrey))?;
        }
        writer.queue(Print(row.format(width)))?;
        writer.queue(ResetColor)?;
        if is_selected {
            writer.queue(SetAttribute(Attribute::Reset))?;
        }
        drawn += 1;
    }
    for line in drawn..lines {
        writer.queue(MoveTo(area.x, area.y + 1 + line as u16))?;
        writer.queue(Print(" ".repeat(width)))?;
    }
    Ok(())
}

pub fn draw_status<W: Write>(writer: &mut W, text: &str, row: u16, columns: u16) -> std::io::Result<()> {
    writer.queue(MoveTo(0, row))?;
    writer.queue(SetForegroundColor(Color::Yellow))?;
    writer.queue(Print(fit(text, usize::from(columns))))?;
    writer.queue(ResetColor)?;
    Ok(())
}

/// Truncate or pad to exactly `width` characters
fn fit(text: &str, width: usize) -> String {
    let mut line: String = text.chars().take(width).collect();
    let len = line.chars().count();
    line.extend(std::iter::repeat(' ').take(width - len));
    line
}

/// Plain-text rendering of a frame, one line per row, trailing blanks removed
pub fn snapshot_text(frame: &Framebuffer) -> String {
    let mut out = String::with_capacity((frame.width() + 1) * frame.height());
    for row in frame.rows() {
        let line: String = row.iter().map(|c: &Cell| c.glyph).collect();
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Matrix4;
    use partview_core::{Actor, Camera, Mesh, Part};
    use std::sync::Arc;

    fn cube_frame(width: usize, height: usize) -> Framebuffer {
        let mut frame = Framebuffer::new(width, height);
        let mut actor = Actor::with_mesh(Arc::new(Mesh::cube(2.0)));
        actor.property_mut().colour = Rgb::new(0, 200, 0);
        frame.render_actor(&actor, &Matrix4::identity(), &Camera::new(width as u32, height as u32));
        frame
    }

    #[test]
    fn test_layout_splits_screen() {
        let layout = Layout::new(100, 30, 32);
        assert_eq!(layout.tree.width, 32);
        assert_eq!(layout.viewport.x, 33);
        assert_eq!(layout.viewport.width, 67);
        assert_eq!(layout.viewport.height, 29);
        assert_eq!(layout.status_row, 29);

        // Narrow terminals give the viewport at least half
        let narrow = Layout::new(40, 10, 32);
        assert_eq!(narrow.tree.width, 20);
        assert_eq!(narrow.viewport.width, 19);
    }

    #[test]
    fn test_tree_hit_testing() {
        let layout = Layout::new(100, 30, 32);
        assert_eq!(layout.tree_line(5, 0), None);
        assert_eq!(layout.tree_line(5, 1), Some(0));
        assert_eq!(layout.tree_line(5, 4), Some(3));
        assert_eq!(layout.tree_line(50, 4), None);
        assert_eq!(layout.tree_line(5, 29), None);
    }

    #[test]
    fn test_snapshot_text() {
        let frame = cube_frame(30, 15);
        let text = snapshot_text(&frame);
        assert_eq!(text.lines().count(), 15);
        assert!(text.lines().all(|l| l.chars().count() <= 30));
        assert!(!text.trim().is_empty());
        assert_eq!(snapshot_text(&Framebuffer::new(4, 2)), "\n\n");
    }

    #[test]
    fn test_framebuffer_uses_cell_colours() {
        let frame = cube_frame(20, 10);
        let mut out = Vec::new();
        let area = Rect {
            x: 2,
            y: 0,
            width: 20,
            height: 12,
        };
        draw_framebuffer(&mut out, &frame, area).unwrap();
        let text = String::from_utf8(out).unwrap();
        // 24-bit foreground escape for the shaded green
        assert!(text.contains(";2;0;"));
        assert!(text.ends_with("\u{1b}[0m"));
    }

    #[test]
    fn test_tree_pane_lists_parts() {
        let mut list = PartList::new("PartsList", &["Part", "Visible?"]);
        list.append_child(None, Part::new("TopLevel 0")).unwrap();
        let mut view = TreeView::new();
        view.rebuild(&list);

        let mut out = Vec::new();
        let area = Rect {
            x: 0,
            y: 0,
            width: 24,
            height: 5,
        };
        draw_tree(&mut out, &mut view, &list, area).unwrap();
        let text = String::from_utf8_lossy(&out);
        assert!(text.contains("Visible? Part"));
        assert!(text.contains("TopLevel 0"));

        let mut status = Vec::new();
        draw_status(&mut status, "Loaded 1 file", 9, 40).unwrap();
        assert!(String::from_utf8_lossy(&status).contains("Loaded 1 file"));
    }

    #[test]
    fn test_fit() {
        assert_eq!(fit("abcdef", 3), "abc");
        assert_eq!(fit("ab", 4), "ab  ");
    }
}
