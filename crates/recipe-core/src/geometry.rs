use serde::{Deserialize, Serialize};

use crate::component::MaterialKind;
use crate::recipe::{Annotation, ValidatedRecipe};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaterialAppearance {
    pub kind: MaterialKind,
    /// 24-bit RGB color.
    pub color: u32,
    pub metalness: f64,
    pub roughness: f64,
}

/// Tessellated geometry for one component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentGeometry {
    pub component_id: String,
    pub vertices: Vec<[f64; 3]>,
    pub faces: Vec<[u32; 3]>,
    pub label: String,
    pub material: MaterialAppearance,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: [f64; 3],
    pub max: [f64; 3],
}

impl BoundingBox {
    pub fn empty() -> Self {
        Self {
            min: [0.0, 0.0, 0.0],
            max: [0.0, 0.0, 0.0],
        }
    }

    /// Smallest box containing every point, or `None` when there are none.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a [f64; 3]>) -> Option<Self> {
        let mut min = [f64::INFINITY; 3];
        let mut max = [f64::NEG_INFINITY; 3];
        let mut any = false;
        for point in points {
            any = true;
            for axis in 0..3 {
                min[axis] = min[axis].min(point[axis]);
                max[axis] = max[axis].max(point[axis]);
            }
        }
        any.then_some(Self { min, max })
    }

    pub fn extent(&self) -> [f64; 3] {
        [
            self.max[0] - self.min[0],
            self.max[1] - self.min[1],
            self.max[2] - self.min[2],
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    pub meshes: Vec<ComponentGeometry>,
    #[serde(rename = "boundingBox")]
    pub bounding_box: BoundingBox,
}

/// Result of one generation run: the validated recipe, its geometry and,
/// once the annotator has run, its annotations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryOutput {
    pub recipe: ValidatedRecipe,
    pub geometry: Geometry,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotations: Option<Vec<Annotation>>,
}
