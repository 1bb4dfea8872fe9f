use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::component::{Axis, Component, id_text, lenient};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecipeMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Unit scale tag such as `mm`, `cm`, `m` or `in`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<String>,
    #[serde(flatten)]
    pub extra: IndexMap<String, serde_json::Value>,
}

/// Hierarchical part list for one design, prior to validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    #[serde(deserialize_with = "id_text")]
    pub object_type: String,
    #[serde(deserialize_with = "id_text")]
    pub root_component: String,
    #[serde(deserialize_with = "component_objects")]
    pub components: Vec<Component>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub metadata: Option<RecipeMetadata>,
}

impl Recipe {
    pub fn new(
        object_type: impl Into<String>,
        root_component: impl Into<String>,
        components: Vec<Component>,
    ) -> Self {
        Self {
            object_type: object_type.into(),
            root_component: root_component.into(),
            components,
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, description: impl Into<String>, scale: &str) -> Self {
        self.metadata = Some(RecipeMetadata {
            description: Some(description.into()),
            scale: Some(scale.to_string()),
            extra: IndexMap::new(),
        });
        self
    }

    pub fn component(&self, id: &str) -> Option<&Component> {
        self.components.iter().find(|component| component.id == id)
    }

    pub fn component_mut(&mut self, id: &str) -> Option<&mut Component> {
        self.components.iter_mut().find(|component| component.id == id)
    }

    pub fn root(&self) -> Option<&Component> {
        self.component(&self.root_component)
    }
}

/// Keeps every object entry of the component list and drops the rest.
fn component_objects<'de, D>(deserializer: D) -> Result<Vec<Component>, D::Error>
where
    D: Deserializer<'de>,
{
    let entries = Vec::<Value>::deserialize(deserializer)?;
    let total = entries.len();
    let components = entries
        .into_iter()
        .filter(Value::is_object)
        .filter_map(|entry| serde_json::from_value(entry).ok())
        .collect::<Vec<Component>>();
    if components.len() < total {
        warn!(
            dropped = total - components.len(),
            "Ignoring component entries that are not objects"
        );
    }
    Ok(components)
}

/// Location of a numeric field a correction rewrites.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FieldPath {
    Position(Axis),
    Dimension(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported correction field '{0}'")]
pub struct InvalidFieldPath(pub String);

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldPath::Position(axis) => write!(f, "relative_position.{}", axis.name()),
            FieldPath::Dimension(key) => write!(f, "dimensions.{key}"),
        }
    }
}

impl TryFrom<String> for FieldPath {
    type Error = InvalidFieldPath;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let parsed = match value.split_once('.') {
            Some(("relative_position", axis)) => Axis::from_name(axis).map(FieldPath::Position),
            Some(("dimensions", key)) if !key.is_empty() => {
                Some(FieldPath::Dimension(key.to_string()))
            }
            _ => None,
        };
        parsed.ok_or(InvalidFieldPath(value))
    }
}

impl From<FieldPath> for String {
    fn from(value: FieldPath) -> Self {
        value.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Correction {
    pub component_id: String,
    pub field: FieldPath,
    pub old_value: f64,
    pub new_value: f64,
    pub reason: String,
}

impl Correction {
    /// Writes `new_value` into the component, creating the position record
    /// when it is absent.
    pub fn apply_to(&self, component: &mut Component) {
        match &self.field {
            FieldPath::Position(axis) => {
                component
                    .relative_position
                    .get_or_insert_default()
                    .set(*axis, self.new_value);
            }
            FieldPath::Dimension(key) => {
                component.dimensions.insert(key.clone(), self.new_value);
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Validation {
    pub valid: bool,
    pub issues: Vec<String>,
    pub warnings: Vec<String>,
    pub corrections: Vec<Correction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatedRecipe {
    #[serde(flatten)]
    pub recipe: Recipe,
    pub validation: Validation,
}

impl ValidatedRecipe {
    pub fn is_valid(&self) -> bool {
        self.validation.valid
    }

    pub fn components(&self) -> &[Component] {
        &self.recipe.components
    }

    pub fn into_recipe(self) -> Recipe {
        self.recipe
    }
}

/// Human-readable notes for one component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub component_id: String,
    pub label: String,
    pub sizing: String,
    pub note: String,
}
