//! Prompt decomposition into a component recipe.

use recipe_core::{Component, PrimitiveKind, Recipe, RecipeMetadata};
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::completion::{TextCompletion, strip_code_fences};

pub const SYSTEM_PROMPT: &str = r#"You are an expert mechanical engineer and CAD designer. Break the user's request down into a structured, component-based design recipe.

Respond with ONLY valid JSON in exactly this format:
{
  "object_type": "string describing the object",
  "root_component": "id of the main/base component",
  "components": [
    {
      "id": "unique_component_id",
      "type": "box" | "cylinder" | "sphere" | "plane" | "cone" | "torus",
      "parent": "parent_component_id (optional, for hierarchy)",
      "dimensions": {
        "length": number (boxes),
        "width": number (boxes),
        "height": number (boxes/cylinders),
        "radius": number (cylinders/spheres),
        "depth": number (planes)
      },
      "relative_position": { "x": number, "y": number, "z": number },
      "rotation": {
        "pitch": number (degrees, optional),
        "yaw": number (degrees, optional),
        "roll": number (degrees, optional)
      },
      "material": "string (optional)",
      "label": "human readable name"
    }
  ],
  "metadata": {
    "description": "brief description",
    "scale": "mm" | "cm" | "m" | "in"
  }
}

RULES:
1. Every component MUST have a unique "id".
2. Dimensions are in millimeters (mm) unless stated otherwise.
3. relative_position places a component relative to its parent.
4. root_component is the main structural element.
5. Label every component clearly (e.g. "wheel_front_left", "chassis_main").
6. Think hierarchically: chassis -> wheels, body -> windows.
7. Output ONLY the JSON, with no markdown and no explanations."#;

/// Fields a recipe response must carry with a non-empty value.
const REQUIRED_FIELDS: [&str; 3] = ["object_type", "root_component", "components"];

#[derive(Debug, Error)]
pub enum DecompositionError {
    #[error("failed to parse design recipe: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("design recipe is missing required field `{0}`")]
    MissingField(&'static str),
}

pub fn user_prompt(prompt: &str) -> String {
    format!(
        "Decompose this request into a component-based CAD design recipe:\n\n\"{prompt}\"\n\nOutput the JSON recipe now:"
    )
}

/// Turns a free-text prompt into a [`Recipe`].
#[derive(Clone, Copy)]
pub struct Decomposer<'a> {
    model: Option<&'a dyn TextCompletion>,
}

impl<'a> Decomposer<'a> {
    pub fn new(model: Option<&'a dyn TextCompletion>) -> Self {
        Self { model }
    }

    pub fn offline() -> Self {
        Self { model: None }
    }

    /// Asks the completion service once. When no service is configured or the
    /// call fails, falls back to [`fallback_recipe`]. A response that arrives
    /// but is not a usable recipe is an error.
    pub fn execute(&self, prompt: &str) -> Result<Recipe, DecompositionError> {
        let Some(model) = self.model else {
            warn!("No completion service configured, using keyword fallback recipe");
            return Ok(fallback_recipe(prompt));
        };

        let request = format!("{SYSTEM_PROMPT}\n\n{}", user_prompt(prompt));
        match model.complete(&request) {
            Ok(response) => {
                let recipe = parse_recipe(&response)?;
                info!(
                    object_type = %recipe.object_type,
                    components = recipe.components.len(),
                    "Decomposed prompt into recipe"
                );
                Ok(recipe)
            }
            Err(err) => {
                warn!(error = %err, "Decomposition request failed, using keyword fallback recipe");
                Ok(fallback_recipe(prompt))
            }
        }
    }
}

/// Parses a completion response, tolerating code fences around the JSON.
pub fn parse_recipe(response: &str) -> Result<Recipe, DecompositionError> {
    let value: Value = serde_json::from_str(&strip_code_fences(response))?;
    for field in REQUIRED_FIELDS {
        if is_blank(value.get(field)) {
            return Err(DecompositionError::MissingField(field));
        }
    }
    Ok(serde_json::from_value(value)?)
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(text)) => text.is_empty(),
        Some(_) => false,
    }
}

/// Deterministic recipe chosen from prompt keywords.
pub fn fallback_recipe(prompt: &str) -> Recipe {
    if prompt.to_lowercase().contains("car") {
        car_recipe()
    } else {
        default_recipe()
    }
}

fn car_recipe() -> Recipe {
    let wheel = |id: &str, label: &str, x: f64, y: f64| {
        Component::new(id, PrimitiveKind::Cylinder)
            .with_parent("chassis_main")
            .with_dimension("radius", 400.0)
            .with_dimension("height", 300.0)
            .with_position(x, y, -500.0)
            .with_label(label)
    };

    Recipe::new(
        "car",
        "chassis_main",
        vec![
            Component::new("chassis_main", PrimitiveKind::Box)
                .with_dimension("length", 4500.0)
                .with_dimension("width", 2000.0)
                .with_dimension("height", 1200.0)
                .with_position(0.0, 0.0, 0.0)
                .with_material("metal")
                .with_label("Chassis"),
            wheel("wheel_front_left", "Front Left Wheel", 1500.0, 1100.0),
            wheel("wheel_front_right", "Front Right Wheel", 1500.0, -1100.0),
            wheel("wheel_rear_left", "Rear Left Wheel", -1500.0, 1100.0),
            wheel("wheel_rear_right", "Rear Right Wheel", -1500.0, -1100.0),
        ],
    )
    .with_metadata("A basic car with chassis and four wheels", "mm")
}

fn default_recipe() -> Recipe {
    let mut recipe = Recipe::new(
        "object",
        "base",
        vec![
            Component::new("base", PrimitiveKind::Box)
                .with_dimension("length", 100.0)
                .with_dimension("width", 100.0)
                .with_dimension("height", 100.0)
                .with_position(0.0, 0.0, 0.0)
                .with_label("Base"),
        ],
    );
    recipe.metadata = Some(RecipeMetadata {
        scale: Some("mm".to_string()),
        ..RecipeMetadata::default()
    });
    recipe
}
