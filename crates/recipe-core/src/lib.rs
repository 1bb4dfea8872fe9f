pub mod component;
pub mod geometry;
pub mod hierarchy;
pub mod recipe;
pub mod validate;

pub use component::{
    Axis, Component, Dimensions, MaterialKind, Primitive, PrimitiveError, PrimitiveKind, Rotation,
    Vec3,
};
pub use geometry::{BoundingBox, ComponentGeometry, Geometry, GeometryOutput, MaterialAppearance};
pub use hierarchy::{HierarchyError, absolute_position, has_parent_cycle};
pub use recipe::{
    Annotation, Correction, FieldPath, InvalidFieldPath, Recipe, RecipeMetadata, ValidatedRecipe,
    Validation,
};
pub use validate::{FIT_RATIO, GROUND_CLEARANCE, Validator};
