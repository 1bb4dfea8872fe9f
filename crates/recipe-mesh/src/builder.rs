//! Turns a validated recipe into world-space triangle meshes.

use recipe_core::{
    BoundingBox, Component, ComponentGeometry, Geometry, GeometryOutput, HierarchyError,
    MaterialKind, PrimitiveKind, Recipe, ValidatedRecipe, Vec3, absolute_position,
};
use tracing::{debug, info, warn};

use crate::material::appearance;
use crate::primitives::tessellate;
use crate::transform::Transform;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BuildConfig {
    /// Place children at the sum of their ancestors' offsets instead of at
    /// their own `relative_position` alone.
    pub compose_parent_offsets: bool,
}

#[derive(Debug, Clone, Default)]
pub struct MeshBuilder {
    config: BuildConfig,
}

impl MeshBuilder {
    pub fn new(config: BuildConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> BuildConfig {
        self.config
    }

    /// Builds geometry for every component, valid or not, and pairs it with
    /// the recipe. Annotations are left for the annotator.
    pub fn execute(&self, recipe: ValidatedRecipe) -> GeometryOutput {
        let geometry = self.build_geometry(&recipe);
        GeometryOutput {
            recipe,
            geometry,
            annotations: None,
        }
    }

    pub fn build_geometry(&self, recipe: &ValidatedRecipe) -> Geometry {
        let meshes = recipe
            .components()
            .iter()
            .map(|component| self.build_component(&recipe.recipe, component))
            .collect::<Vec<_>>();

        let bounding_box =
            BoundingBox::from_points(meshes.iter().flat_map(|mesh| mesh.vertices.iter()))
                .unwrap_or_else(BoundingBox::empty);

        info!(
            object_type = %recipe.recipe.object_type,
            meshes = meshes.len(),
            extent = ?bounding_box.extent(),
            "Built recipe geometry"
        );

        Geometry {
            meshes,
            bounding_box,
        }
    }

    /// Tessellates one component and bakes its placement into the vertices.
    pub fn build_component(&self, recipe: &Recipe, component: &Component) -> ComponentGeometry {
        if let PrimitiveKind::Other(kind) = &component.kind {
            warn!(
                component = %component.id,
                kind = %kind,
                "Unrecognized primitive type, substituting default box"
            );
        }

        let mesh = tessellate(&component.primitive_or_default());
        let transform = Transform::new(
            component.rotation.as_ref(),
            self.world_offset(recipe, component),
        );
        let vertices = mesh
            .vertices
            .iter()
            .map(|vertex| transform.apply(*vertex))
            .collect::<Vec<_>>();

        debug!(
            component = %component.id,
            vertices = vertices.len(),
            triangles = mesh.triangles.len(),
            "Tessellated component"
        );

        ComponentGeometry {
            component_id: component.id.clone(),
            vertices,
            faces: mesh.triangles,
            label: component.display_label().to_string(),
            material: appearance(MaterialKind::classify(component.material.as_deref())),
        }
    }

    fn world_offset(&self, recipe: &Recipe, component: &Component) -> Vec3 {
        let local = component.position();
        if !self.config.compose_parent_offsets {
            return local;
        }
        let Some(parent_id) = component.parent_id() else {
            return local;
        };

        match absolute_position(recipe, parent_id) {
            Ok(parent) => local + parent,
            Err(HierarchyError::UnknownComponent(_)) => local,
            Err(err) => {
                warn!(component = %component.id, error = %err, "Using local offset");
                local
            }
        }
    }
}
