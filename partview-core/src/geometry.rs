/// Geometry primitives shared by the loader, the part tree and the rasterizer
use nalgebra::{Point3, Vector3};

/// A 3D vertex with position and normal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: Point3<f32>,
    pub normal: Vector3<f32>,
}

impl Vertex {
    pub fn new(x: f32, y: f32, z: f32, nx: f32, ny: f32, nz: f32) -> Self {
        Self {
            position: Point3::new(x, y, z),
            normal: Vector3::new(nx, ny, nz),
        }
    }
}

/// A triangle face defined by three vertices
#[derive(Debug, Clone, PartialEq)]
pub struct Triangle {
    pub vertices: [Vertex; 3],
}

impl Triangle {
    pub fn new(v0: Vertex, v1: Vertex, v2: Vertex) -> Self {
        Self {
            vertices: [v0, v1, v2],
        }
    }

    /// Face normal from the winding order. Degenerate faces yield the zero vector.
    pub fn calculate_normal(&self) -> Vector3<f32> {
        let [v0, v1, v2] = self.vertices.map(|v| v.position);
        let edge1 = v1 - v0;
        let edge2 = v2 - v0;

        edge1
            .cross(&edge2)
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(Vector3::zeros)
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
}

impl Bounds {
    pub fn from_point(point: Point3<f32>) -> Self {
        Self {
            min: point,
            max: point,
        }
    }

    pub fn include(&mut self, point: &Point3<f32>) {
        self.min = self.min.inf(point);
        self.max = self.max.sup(point);
    }

    pub fn union(&self, other: &Bounds) -> Bounds {
        Bounds {
            min: self.min.inf(&other.min),
            max: self.max.sup(&other.max),
        }
    }

    pub fn center(&self) -> Point3<f32> {
        nalgebra::center(&self.min, &self.max)
    }

    pub fn extent(&self) -> Vector3<f32> {
        self.max - self.min
    }

    /// Half of the box diagonal
    pub fn radius(&self) -> f32 {
        self.extent().norm() / 2.0
    }
}

/// A 3D mesh composed of triangles
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub triangles: Vec<Triangle>,
}

impl Mesh {
    pub fn new() -> Self {
        Self {
            triangles: Vec::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            triangles: Vec::with_capacity(capacity),
        }
    }

    pub fn add_triangle(&mut self, triangle: Triangle) {
        self.triangles.push(triangle);
    }

    /// Number of geometry points (three per triangle, not deduplicated)
    pub fn point_count(&self) -> usize {
        self.triangles.len() * 3
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    pub fn bounds(&self) -> Option<Bounds> {
        let mut points = self
            .triangles
            .iter()
            .flat_map(|t| t.vertices.iter().map(|v| v.position));
        let mut bounds = Bounds::from_point(points.next()?);
        for point in points {
            bounds.include(&point);
        }
        Some(bounds)
    }

    /// Axis-aligned cube centred on the origin
    pub fn cube(size: f32) -> Self {
        let h = size / 2.0;
        // (normal, four corners counter-clockwise seen from outside)
        let faces: [([f32; 3], [[f32; 3]; 4]); 6] = [
            ([0.0, 0.0, 1.0], [[-h, -h, h], [h, -h, h], [h, h, h], [-h, h, h]]),
            ([0.0, 0.0, -1.0], [[h, -h, -h], [-h, -h, -h], [-h, h, -h], [h, h, -h]]),
            ([0.0, 1.0, 0.0], [[-h, h, h], [h, h, h], [h, h, -h], [-h, h, -h]]),
            ([0.0, -1.0, 0.0], [[-h, -h, -h], [h, -h, -h], [h, -h, h], [-h, -h, h]]),
            ([1.0, 0.0, 0.0], [[h, -h, h], [h, -h, -h], [h, h, -h], [h, h, h]]),
            ([-1.0, 0.0, 0.0], [[-h, -h, -h], [-h, -h, h], [-h, h, h], [-h, h, -h]]),
        ];

        let mut mesh = Self::with_capacity(12);
        for ([nx, ny, nz], corners) in faces {
            let v = corners.map(|[x, y, z]| Vertex::new(x, y, z, nx, ny, nz));
            mesh.add_triangle(Triangle::new(v[0], v[1], v[2]));
            mesh.add_triangle(Triangle::new(v[0], v[2], v[3]));
        }
        mesh
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cube_bounds() {
        let cube = Mesh::cube(2.0);
        assert_eq!(cube.triangles.len(), 12);
        assert_eq!(cube.point_count(), 36);

        let bounds = cube.bounds().unwrap();
        assert_eq!(bounds.min, Point3::new(-1.0, -1.0, -1.0));
        assert_eq!(bounds.max, Point3::new(1.0, 1.0, 1.0));
        assert_eq!(bounds.center(), Point3::origin());
        assert!((bounds.radius() - 3.0f32.sqrt()).abs() < 1e-6);
    }

    #[test]
    fn test_cube_winding_matches_normals() {
        for triangle in &Mesh::cube(1.0).triangles {
            let computed = triangle.calculate_normal();
            assert!((computed - triangle.vertices[0].normal).norm() < 1e-6);
        }
    }

    #[test]
    fn test_empty_mesh_has_no_bounds() {
        let mesh = Mesh::new();
        assert!(mesh.is_empty());
        assert!(mesh.bounds().is_none());
    }

    #[test]
    fn test_degenerate_normal_is_zero() {
        let v = Vertex::new(1.0, 1.0, 1.0, 0.0, 0.0, 0.0);
        let triangle = Triangle::new(v, v, v);
        assert_eq!(triangle.calculate_normal(), Vector3::zeros());
    }
}
