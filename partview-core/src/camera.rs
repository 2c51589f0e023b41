/// Camera, projection and orbit rotation
use nalgebra::{Matrix4, Point3, Vector3};

use crate::geometry::Bounds;

/// Projection mode for rendering
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProjectionMode {
    Orthographic,
    Perspective,
}

/// Camera configuration for 3D rendering
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub mode: ProjectionMode,
}

impl Camera {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            position: Point3::new(0.0, 0.0, 5.0),
            target: Point3::new(0.0, 0.0, 0.0),
            up: Vector3::new(0.0, 1.0, 0.0),
            fov: std::f32::consts::PI / 4.0, // 45 degrees
            aspect: width as f32 / height.max(1) as f32,
            near: 0.1,
            far: 100.0,
            mode: ProjectionMode::Perspective,
        }
    }

    /// Correct the aspect ratio for non-square cells (terminal glyphs are
    /// roughly twice as tall as they are wide)
    pub fn with_cell_aspect(mut self, cell_height_over_width: f32) -> Self {
        self.aspect /= cell_height_over_width;
        self
    }

    /// Create the view matrix (camera transformation)
    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(&self.position, &self.target, &self.up)
    }

    /// Create the projection matrix
    pub fn projection_matrix(&self) -> Matrix4<f32> {
        match self.mode {
            ProjectionMode::Perspective => {
                Matrix4::new_perspective(self.aspect, self.fov, self.near, self.far)
            }
            ProjectionMode::Orthographic => {
                let height = (self.position - self.target).norm();
                let width = height * self.aspect;
                Matrix4::new_orthographic(
                    -width / 2.0,
                    width / 2.0,
                    -height / 2.0,
                    height / 2.0,
                    self.near,
                    self.far,
                )
            }
        }
    }

    /// Project a 3D point to screen space as (x, y, depth).
    ///
    /// Points behind the camera or outside the near/far range yield `None`.
    /// Points beyond the screen edges are still returned; the rasterizer clips.
    pub fn project_to_screen(
        &self,
        point: &Point3<f32>,
        model_matrix: &Matrix4<f32>,
        width: u32,
        height: u32,
    ) -> Option<(f32, f32, f32)> {
        let mvp = self.projection_matrix() * self.view_matrix() * model_matrix;
        project(&mvp, point, width, height)
    }

    /// Frame `bounds`: look at its centre from the current viewing direction,
    /// far enough back for the bounding sphere to fit the view. A camera with
    /// no usable aspect ratio (a zero-width view) is left unchanged.
    pub fn reset_to(&mut self, bounds: &Bounds) {
        if !(self.aspect.is_finite() && self.aspect > 0.0) {
            return;
        }
        let radius = if bounds.radius() > f32::EPSILON {
            bounds.radius()
        } else {
            1.0
        };
        let direction = (self.position - self.target)
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(Vector3::z);
        let horizontal = (self.aspect * (self.fov / 2.0).tan()).atan();
        let half_fov = (self.fov / 2.0).min(horizontal);
        let distance = radius / half_fov.sin() * 1.05;

        self.target = bounds.center();
        self.position = self.target + direction * distance;
        self.near = (distance - radius * 2.0).max(distance * 0.01);
        self.far = distance + radius * 2.0;
    }

    /// Copy of this camera shifted sideways, for one eye of a stereo pair
    pub fn with_eye_offset(&self, offset: f32) -> Camera {
        let forward = self.target - self.position;
        let right = forward
            .cross(&self.up)
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(Vector3::x);
        Camera {
            position: self.position + right * offset,
            target: self.target + right * offset,
            ..self.clone()
        }
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(800, 600)
    }
}

/// Apply a full model-view-projection matrix and map to screen coordinates
pub fn project(
    mvp: &Matrix4<f32>,
    point: &Point3<f32>,
    width: u32,
    height: u32,
) -> Option<(f32, f32, f32)> {
    let clip = mvp * point.to_homogeneous();

    // Behind the camera (or degenerate)
    if clip.w < 1e-6 {
        return None;
    }

    let ndc = clip.xyz() / clip.w;
    if ndc.z < -1.0 || ndc.z > 1.0 {
        return None;
    }

    let screen_x = (ndc.x + 1.0) * 0.5 * width as f32;
    let screen_y = (1.0 - ndc.y) * 0.5 * height as f32;
    Some((screen_x, screen_y, ndc.z))
}

/// Rotation state around three axes (in radians)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Orbit {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Orbit {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Rotate by delta amounts (in radians)
    pub fn rotate(&mut self, dx: f32, dy: f32, dz: f32) {
        self.x += dx;
        self.y += dy;
        self.z += dz;
    }

    /// Rotation matrix, applied in order X, Y, Z
    pub fn matrix(&self) -> Matrix4<f32> {
        let rx = Matrix4::new_rotation(Vector3::new(self.x, 0.0, 0.0));
        let ry = Matrix4::new_rotation(Vector3::new(0.0, self.y, 0.0));
        let rz = Matrix4::new_rotation(Vector3::new(0.0, 0.0, self.z));
        rz * ry * rx
    }

    /// Model matrix rotating about `pivot` instead of the origin
    pub fn matrix_about(&self, pivot: &Point3<f32>) -> Matrix4<f32> {
        let to_origin = Matrix4::new_translation(&-pivot.coords);
        let back = Matrix4::new_translation(&pivot.coords);
        back * self.matrix() * to_origin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camera_creation() {
        let camera = Camera::new(800, 600);
        assert_eq!(camera.mode, ProjectionMode::Perspective);
        assert!((camera.aspect - 800.0 / 600.0).abs() < 1e-6);
    }

    #[test]
    fn test_target_projects_to_centre() {
        let camera = Camera::new(80, 40);
        let (x, y, depth) = camera
            .project_to_screen(&Point3::origin(), &Matrix4::identity(), 80, 40)
            .unwrap();
        assert!((x - 40.0).abs() < 1e-3);
        assert!((y - 20.0).abs() < 1e-3);
        assert!(depth > -1.0 && depth < 1.0);
    }

    #[test]
    fn test_point_behind_camera_is_rejected() {
        let camera = Camera::new(80, 40);
        let behind = Point3::new(0.0, 0.0, 10.0);
        assert!(camera
            .project_to_screen(&behind, &Matrix4::identity(), 80, 40)
            .is_none());
    }

    #[test]
    fn test_reset_frames_bounds() {
        let mut camera = Camera::new(80, 40);
        let mut bounds = Bounds::from_point(Point3::new(10.0, 10.0, 10.0));
        bounds.include(&Point3::new(30.0, 30.0, 30.0));
        camera.reset_to(&bounds);

        assert_eq!(camera.target, Point3::new(20.0, 20.0, 20.0));
        let model = Matrix4::identity();
        for corner in [bounds.min, bounds.max] {
            let (x, y, _) = camera.project_to_screen(&corner, &model, 80, 40).unwrap();
            assert!((0.0..=80.0).contains(&x), "x = {x}");
            assert!((0.0..=40.0).contains(&y), "y = {y}");
        }
    }

    #[test]
    fn test_reset_ignores_zero_width_view() {
        let mut camera = Camera::new(0, 20);
        let before = camera.clone();
        assert_eq!(camera.aspect, 0.0);
        let mut bounds = Bounds::from_point(Point3::new(-1.0, -1.0, -1.0));
        bounds.include(&Point3::new(1.0, 1.0, 1.0));
        camera.reset_to(&bounds);
        assert_eq!(camera.position, before.position);
        assert_eq!(camera.target, before.target);
        assert!(camera.near.is_finite() && camera.far.is_finite());
    }

    #[test]
    fn test_eye_offset_moves_sideways() {
        let camera = Camera::new(80, 40);
        let left = camera.with_eye_offset(-0.5);
        let right = camera.with_eye_offset(0.5);
        assert!((left.position.x + 0.5).abs() < 1e-6);
        assert!((right.position.x - 0.5).abs() < 1e-6);
        assert_eq!(right.position.z, camera.position.z);
        assert_eq!(right.target - right.position, camera.target - camera.position);
    }

    #[test]
    fn test_orbit_rotation() {
        let mut orbit = Orbit::default();
        assert!((orbit.matrix() - Matrix4::identity()).norm() < 1e-6);

        orbit.rotate(0.1, 0.2, 0.3);
        assert!((orbit.x - 0.1).abs() < 1e-6);
        assert!((orbit.y - 0.2).abs() < 1e-6);
        assert!((orbit.z - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_orbit_keeps_pivot_fixed() {
        let orbit = Orbit::new(0.4, 1.1, -0.7);
        let pivot = Point3::new(3.0, -2.0, 5.0);
        let moved = orbit.matrix_about(&pivot).transform_point(&pivot);
        assert!((moved - pivot).norm() < 1e-5);
    }
}
