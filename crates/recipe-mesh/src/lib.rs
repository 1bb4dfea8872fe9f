pub mod builder;
pub mod material;
pub mod primitives;
pub mod transform;

use recipe_core::BoundingBox;

/// Indexed triangle mesh. Vertices are never welded or deduplicated.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<[f64; 3]>,
    pub triangles: Vec<[u32; 3]>,
}

impl Mesh {
    pub fn empty() -> Self {
        Self {
            vertices: Vec::new(),
            triangles: Vec::new(),
        }
    }

    /// Appends a vertex and returns its index.
    pub fn push_vertex(&mut self, vertex: [f64; 3]) -> u32 {
        self.vertices.push(vertex);
        (self.vertices.len() - 1) as u32
    }

    pub fn push_triangle(&mut self, a: u32, b: u32, c: u32) {
        self.triangles.push([a, b, c]);
    }

    pub fn bounding_box(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(&self.vertices)
    }
}

pub use builder::{BuildConfig, MeshBuilder};
pub use material::appearance;
pub use primitives::tessellate;
pub use transform::Transform;
