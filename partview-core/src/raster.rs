/// Character-cell rasterizer shared by the desktop viewport and the VR session
use nalgebra::{Matrix4, Vector3};

use crate::actor::Actor;
use crate::camera::{self, Camera};
use crate::colour::Rgb;

/// Character luminosity ramp for depth/shading (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &['.', ':', '-', '=', '+', '*', '#', '%', '@'];

const AMBIENT: f32 = 0.2;

/// Height over width of a terminal character cell
pub const CELL_ASPECT: f32 = 2.0;

/// One character cell. Background cells have no colour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cell {
    pub glyph: char,
    pub colour: Option<Rgb>,
}

impl Cell {
    pub const EMPTY: Cell = Cell {
        glyph: ' ',
        colour: None,
    };

    pub fn is_empty(&self) -> bool {
        self.colour.is_none()
    }
}

/// Glyph buffer with a depth buffer
#[derive(Debug, Clone)]
pub struct Framebuffer {
    width: usize,
    height: usize,
    depth: Vec<f32>,
    cells: Vec<Cell>,
}

impl Framebuffer {
    pub fn new(width: usize, height: usize) -> Self {
        let size = width * height;
        Self {
            width,
            height,
            depth: vec![f32::INFINITY; size],
            cells: vec![Cell::EMPTY; size],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Resize and clear
    pub fn resize(&mut self, width: usize, height: usize) {
        *self = Self::new(width, height);
    }

    pub fn clear(&mut self) {
        self.depth.fill(f32::INFINITY);
        self.cells.fill(Cell::EMPTY);
    }

    pub fn cell(&self, x: usize, y: usize) -> Option<&Cell> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.cells.get(y * self.width + x)
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        // chunks_exact panics on zero, and an empty buffer has no rows anyway
        self.cells.chunks_exact(self.width.max(1))
    }

    /// Number of cells something was drawn into
    pub fn covered(&self) -> usize {
        self.cells.iter().filter(|c| !c.is_empty()).count()
    }

    /// Copy `other` into this buffer with its left edge at column `x_offset`
    pub fn blit(&mut self, other: &Framebuffer, x_offset: usize) {
        for (y, row) in other.rows().enumerate().take(self.height) {
            for (x, cell) in row.iter().enumerate() {
                let tx = x + x_offset;
                if tx >= self.width {
                    break;
                }
                let idx = y * self.width + tx;
                self.cells[idx] = *cell;
                self.depth[idx] = other.depth[y * other.width + x];
            }
        }
    }

    /// Draw every actor in order
    pub fn render_actors<'a>(
        &mut self,
        actors: impl IntoIterator<Item = &'a Actor>,
        model_matrix: &Matrix4<f32>,
        camera: &Camera,
    ) {
        for actor in actors {
            self.render_actor(actor, model_matrix, camera);
        }
    }

    /// Draw one actor. Actors without geometry, or hidden ones, draw nothing.
    pub fn render_actor(&mut self, actor: &Actor, model_matrix: &Matrix4<f32>, camera: &Camera) {
        // A zero-area frame has no aspect ratio to build a projection from
        if self.width == 0 || self.height == 0 {
            return;
        }
        let property = actor.property();
        if !property.visible || property.opacity <= 0.0 {
            return;
        }
        let Some(mesh) = actor.mesh() else {
            return;
        };

        let mvp = camera.projection_matrix() * camera.view_matrix() * model_matrix;
        let light_dir = (camera.position - camera.target)
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(Vector3::z);

        for triangle in &mesh.triangles {
            let world = triangle
                .vertices
                .map(|v| model_matrix.transform_point(&v.position));
            let (width, height) = (self.width as u32, self.height as u32);
            let [a, b, c] = triangle
                .vertices
                .map(|v| camera::project(&mvp, &v.position, width, height));
            let (Some(a), Some(b), Some(c)) = (a, b, c) else {
                continue; // Triangle is clipped
            };

            // Two-sided Lambert shading; STL winding is not always reliable
            let normal = (world[1] - world[0])
                .cross(&(world[2] - world[0]))
                .try_normalize(f32::EPSILON)
                .unwrap_or_else(Vector3::zeros);
            let brightness = AMBIENT + (1.0 - AMBIENT) * normal.dot(&light_dir).abs();

            let char_index = (brightness * (LUMINOSITY_RAMP.len() - 1) as f32) as usize;
            let glyph = LUMINOSITY_RAMP[char_index.min(LUMINOSITY_RAMP.len() - 1)];
            let cell = Cell {
                glyph,
                colour: Some(property.colour.scale(brightness)),
            };

            self.rasterize_triangle(&[a, b, c], cell);
        }
    }

    fn rasterize_triangle(&mut self, coords: &[(f32, f32, f32); 3], cell: Cell) {
        let (v0, v1, v2) = (coords[0], coords[1], coords[2]);

        // Bounding box clipped to screen bounds
        let min_x = v0.0.min(v1.0).min(v2.0).floor().max(0.0) as usize;
        let max_x = (v0.0.max(v1.0).max(v2.0).ceil() as i64).min(self.width as i64 - 1);
        let min_y = v0.1.min(v1.1).min(v2.1).floor().max(0.0) as usize;
        let max_y = (v0.1.max(v1.1).max(v2.1).ceil() as i64).min(self.height as i64 - 1);
        if max_x < 0 || max_y < 0 {
            return;
        }

        for y in min_y..=max_y as usize {
            for x in min_x..=max_x as usize {
                let px = x as f32 + 0.5;
                let py = y as f32 + 0.5;

                let Some((w0, w1, w2)) =
                    barycentric((v0.0, v0.1), (v1.0, v1.1), (v2.0, v2.1), (px, py))
                else {
                    return;
                };
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }

                let depth = w0 * v0.2 + w1 * v1.2 + w2 * v2.2;
                let idx = y * self.width + x;
                if depth < self.depth[idx] {
                    self.depth[idx] = depth;
                    self.cells[idx] = cell;
                }
            }
        }
    }
}

/// Calculate barycentric coordinates for a point in a triangle
fn barycentric(
    v0: (f32, f32),
    v1: (f32, f32),
    v2: (f32, f32),
    p: (f32, f32),
) -> Option<(f32, f32, f32)> {
    let denom = (v1.1 - v2.1) * (v0.0 - v2.0) + (v2.0 - v1.0) * (v0.1 - v2.1);

    if denom.abs() < 1e-6 {
        return None;
    }

    let w0 = ((v1.1 - v2.1) * (p.0 - v2.0) + (v2.0 - v1.0) * (p.1 - v2.1)) / denom;
    let w1 = ((v2.1 - v0.1) * (p.0 - v2.0) + (v0.0 - v2.0) * (p.1 - v2.1)) / denom;
    let w2 = 1.0 - w0 - w1;

    Some((w0, w1, w2))
}
