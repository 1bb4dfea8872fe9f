//! Human-readable sizing and placement notes for each component.

use std::collections::HashMap;

use recipe_core::{Annotation, Component, ValidatedRecipe};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::completion::{TextCompletion, strip_code_fences};

/// Placement text for a component that declares no position.
const UNPLACED: &str = "(0,0,0)";

/// Produces exactly one [`Annotation`] per component, in recipe order.
#[derive(Clone, Copy)]
pub struct Annotator<'a> {
    model: Option<&'a dyn TextCompletion>,
}

impl<'a> Annotator<'a> {
    pub fn new(model: Option<&'a dyn TextCompletion>) -> Self {
        Self { model }
    }

    pub fn offline() -> Self {
        Self { model: None }
    }

    /// Never fails. Service output is reconciled against the recipe, and any
    /// failure or empty result falls back to [`heuristic_annotations`].
    pub fn execute(&self, recipe: &ValidatedRecipe) -> Vec<Annotation> {
        if let Some(model) = self.model {
            match model.complete(&build_prompt(recipe)) {
                Ok(response) => {
                    let parsed = parse_annotations(&response);
                    if !parsed.is_empty() {
                        let annotations = reconcile(recipe, parsed);
                        info!(count = annotations.len(), "Annotated components");
                        return annotations;
                    }
                    warn!("Annotation response held no usable entries, using heuristics");
                }
                Err(err) => {
                    warn!(error = %err, "Annotation request failed, using heuristics");
                }
            }
        }

        let annotations = heuristic_annotations(recipe);
        info!(count = annotations.len(), "Annotated components heuristically");
        annotations
    }
}

pub fn build_prompt(recipe: &ValidatedRecipe) -> String {
    let listing = recipe
        .components()
        .iter()
        .map(|component| {
            let dims = serde_json::to_string(&component.dimensions)
                .unwrap_or_else(|_| "{}".to_string());
            let position = serde_json::to_string(&component.position())
                .unwrap_or_else(|_| "{}".to_string());
            format!(
                "- {} ({}) dims={dims} rel_pos={position}",
                component.id, component.kind
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"You are a senior mechanical engineer writing concise CAD annotations.
Return a JSON array with one entry per component containing:
- component_id: the id from the design
- label: a short human-readable label
- sizing: one sentence describing the key dimensions in mm
- note: one sentence describing placement, parent or purpose

Design object: {object_type}
Components:
{listing}

Output ONLY JSON in this form:
[
  {{
    "component_id": "base",
    "label": "Base Plate",
    "sizing": "200 x 150 x 10 mm box",
    "note": "Root component; located at origin."
  }}
]"#,
        object_type = recipe.recipe.object_type,
    )
}

/// Keeps array entries whose `component_id` and `label` are strings. Missing
/// or non-string `sizing`/`note` become empty. Anything unparseable yields an
/// empty list.
pub fn parse_annotations(response: &str) -> Vec<Annotation> {
    let Ok(Value::Array(items)) = serde_json::from_str::<Value>(&strip_code_fences(response))
    else {
        debug!("Annotation response is not a JSON array");
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| {
            let text = |key: &str| item.get(key).and_then(Value::as_str).map(str::to_string);
            Some(Annotation {
                component_id: text("component_id")?,
                label: text("label")?,
                sizing: text("sizing").unwrap_or_default(),
                note: text("note").unwrap_or_default(),
            })
        })
        .collect()
}

/// Orders service annotations by recipe component. Unknown ids are dropped,
/// the first entry wins for a repeated id and skipped components get a
/// heuristic annotation.
pub fn reconcile(recipe: &ValidatedRecipe, annotations: Vec<Annotation>) -> Vec<Annotation> {
    let mut by_id = HashMap::new();
    for annotation in annotations {
        by_id
            .entry(annotation.component_id.clone())
            .or_insert(annotation);
    }

    let annotations = recipe
        .components()
        .iter()
        .map(|component| {
            by_id
                .remove(&component.id)
                .unwrap_or_else(|| heuristic_annotation(component))
        })
        .collect();

    if !by_id.is_empty() {
        debug!(dropped = by_id.len(), "Dropped annotations for unknown components");
    }
    annotations
}

pub fn heuristic_annotations(recipe: &ValidatedRecipe) -> Vec<Annotation> {
    recipe.components().iter().map(heuristic_annotation).collect()
}

pub fn heuristic_annotation(component: &Component) -> Annotation {
    let sizing = if component.dimensions.is_empty() {
        format!("{} (dimensions unspecified)", component.kind)
    } else {
        let parts = component
            .dimensions
            .iter()
            .map(|(key, value)| format!("{key}:{value}mm"))
            .collect::<Vec<_>>();
        format!("{} ({})", component.kind, parts.join(", "))
    };

    let position = match component.relative_position {
        Some(position) => position.to_string(),
        None => UNPLACED.to_string(),
    };
    let note = match component.parent_id() {
        Some(parent) => format!("Child of {parent} @ {position}"),
        None => format!("Root component @ {position}"),
    };

    Annotation {
        component_id: component.id.clone(),
        label: component.display_label().to_string(),
        sizing,
        note,
    }
}

#[cfg(test)]
mod tests {
    use recipe_core::{Component, PrimitiveKind, Recipe, ValidatedRecipe, Validator};

    use super::{Annotator, build_prompt, heuristic_annotation, parse_annotations};
    use crate::completion::CompletionError;
    use crate::scripted::ScriptedCompletion;

    fn table() -> ValidatedRecipe {
        Validator::new().validate(Recipe::new(
            "table",
            "top",
            vec![
                Component::new("top", PrimitiveKind::Box)
                    .with_dimension("length", 200.0)
                    .with_dimension("width", 150.0)
                    .with_dimension("height", 10.0)
                    .with_label("Table Top"),
                Component::new("leg", PrimitiveKind::Cylinder)
                    .with_parent("top")
                    .with_dimension("radius", 5.0)
                    .with_dimension("height", 70.0)
                    .with_position(90.0, 65.0, -40.0),
                Component::new("ornament", PrimitiveKind::Sphere).with_parent("top"),
            ],
        ))
    }

    #[test]
    fn declared_origin_differs_from_missing_position() {
        let placed = Component::new("a", PrimitiveKind::Sphere).with_position(0.0, 0.0, 0.0);
        assert_eq!(heuristic_annotation(&placed).note, "Root component @ (0, 0, 0)");

        let unplaced = Component::new("b", PrimitiveKind::Sphere).with_parent("a");
        assert_eq!(heuristic_annotation(&unplaced).note, "Child of a @ (0,0,0)");
    }

    #[test]
    fn heuristics_describe_dimensions_and_placement() {
        let recipe = table();
        let annotations = Annotator::offline().execute(&recipe);
        assert_eq!(annotations.len(), 3);

        assert_eq!(annotations[0].component_id, "top");
        assert_eq!(annotations[0].label, "Table Top");
        assert_eq!(
            annotations[0].sizing,
            "box (length:200mm, width:150mm, height:10mm)"
        );
        assert_eq!(annotations[0].note, "Root component @ (0,0,0)");

        assert_eq!(annotations[1].label, "leg");
        assert_eq!(annotations[1].sizing, "cylinder (radius:5mm, height:70mm)");
        assert_eq!(annotations[1].note, "Child of top @ (90, 65, -40)");

        assert_eq!(annotations[2].sizing, "sphere (dimensions unspecified)");
    }

    #[test]
    fn heuristics_keep_fractional_values() {
        let component = Component::new("pin", PrimitiveKind::Cylinder)
            .with_dimension("radius", 2.5)
            .with_position(0.5, 0.0, 1.25);
        let annotation = heuristic_annotation(&component);
        assert_eq!(annotation.sizing, "cylinder (radius:2.5mm)");
        assert_eq!(annotation.note, "Root component @ (0.5, 0, 1.25)");
    }

    #[test]
    fn prompt_lists_every_component() {
        let prompt = build_prompt(&table());
        assert!(prompt.contains("Design object: table"));
        assert!(prompt.contains(
            r#"- top (box) dims={"length":200.0,"width":150.0,"height":10.0} rel_pos={"x":0.0,"y":0.0,"z":0.0}"#
        ));
        assert!(prompt.contains("- ornament (sphere) dims={}"));
    }

    #[test]
    fn parser_filters_malformed_entries() {
        let parsed = parse_annotations(
            r#"```json
            [
              {"component_id": "top", "label": "Top", "sizing": "200 x 150 x 10 mm", "note": "Root"},
              {"component_id": "leg", "label": 7},
              {"label": "orphan"},
              {"component_id": "ornament", "label": "Ball", "sizing": 12},
              "not an object"
            ]
            ```"#,
        );
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[1].component_id, "ornament");
        assert_eq!(parsed[1].sizing, "");
        assert_eq!(parsed[1].note, "");
    }

    #[test]
    fn parser_rejects_non_arrays() {
        assert!(parse_annotations(r#"{"component_id": "top", "label": "Top"}"#).is_empty());
        assert!(parse_annotations("no json here").is_empty());
    }

    #[test]
    fn service_annotations_are_reconciled_with_the_recipe() {
        let model = ScriptedCompletion::default().with_response(
            r#"[
              {"component_id": "leg", "label": "Leg", "sizing": "10 x 70 mm", "note": "Corner"},
              {"component_id": "ghost", "label": "Ghost", "sizing": "", "note": ""},
              {"component_id": "leg", "label": "Duplicate", "sizing": "", "note": ""},
              {"component_id": "top", "label": "Top", "sizing": "200 x 150 x 10 mm", "note": "Root"}
            ]"#,
        );
        let annotations = Annotator::new(Some(&model)).execute(&table());

        let ids = annotations
            .iter()
            .map(|annotation| annotation.component_id.as_str())
            .collect::<Vec<_>>();
        assert_eq!(ids, ["top", "leg", "ornament"]);
        assert_eq!(annotations[0].label, "Top");
        assert_eq!(annotations[1].label, "Leg");
        assert_eq!(annotations[2].sizing, "sphere (dimensions unspecified)");
    }

    #[test]
    fn failures_and_empty_results_fall_back_to_heuristics() {
        let recipe = table();
        let expected = Annotator::offline().execute(&recipe);

        let failing = ScriptedCompletion::default()
            .with_error(CompletionError::Status {
                status: 503,
                body: "overloaded".to_string(),
            });
        assert_eq!(Annotator::new(Some(&failing)).execute(&recipe), expected);

        let empty = ScriptedCompletion::default().with_response("[]");
        assert_eq!(Annotator::new(Some(&empty)).execute(&recipe), expected);
        assert_eq!(empty.prompts().len(), 1);
    }
}
