//! Prompt-to-geometry pipeline: decompose, validate, annotate, build.

use recipe_core::{GeometryOutput, Validator};
use recipe_mesh::{BuildConfig, MeshBuilder};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::annotate::Annotator;
use crate::completion::{GeminiClient, TextCompletion};
use crate::config::AiConfig;
use crate::decompose::{DecompositionError, Decomposer};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Decomposition(#[from] DecompositionError),
}

/// Runs every stage in sequence for each request. Holds no per-request
/// state, so one instance can serve concurrent callers.
pub struct DesignOrchestrator {
    model: Option<Box<dyn TextCompletion>>,
    validator: Validator,
    builder: MeshBuilder,
}

impl DesignOrchestrator {
    pub fn new(model: Option<Box<dyn TextCompletion>>, build: BuildConfig) -> Self {
        Self {
            model,
            validator: Validator::new(),
            builder: MeshBuilder::new(build),
        }
    }

    /// Every stage uses its deterministic fallback.
    pub fn offline(build: BuildConfig) -> Self {
        Self::new(None, build)
    }

    pub fn from_config(config: &AiConfig, build: BuildConfig) -> Self {
        let model = GeminiClient::from_config(config)
            .map(|client| Box::new(client) as Box<dyn TextCompletion>);
        if model.is_none() {
            warn!("No API credential configured, running offline");
        }
        Self::new(model, build)
    }

    pub fn is_online(&self) -> bool {
        self.model.is_some()
    }

    pub fn decomposer(&self) -> Decomposer<'_> {
        Decomposer::new(self.model.as_deref())
    }

    pub fn annotator(&self) -> Annotator<'_> {
        Annotator::new(self.model.as_deref())
    }

    /// Continues through every stage even when validation fails; the caller
    /// decides what to do with an invalid result.
    pub fn generate(&self, prompt: &str) -> Result<GeometryOutput, PipelineError> {
        info!("Step 1: decomposing prompt into recipe");
        let recipe = self.decomposer().execute(prompt)?;
        info!(components = recipe.components.len(), "Recipe created");

        info!("Step 2: validating and correcting dimensions");
        let validated = self.validator.validate(recipe);
        if !validated.is_valid() {
            warn!(issues = ?validated.validation.issues, "Recipe has validation issues");
        }
        if !validated.validation.corrections.is_empty() {
            info!(
                corrections = validated.validation.corrections.len(),
                "Applied corrections"
            );
        }

        info!("Step 3: annotating components");
        let annotations = self.annotator().execute(&validated);

        info!("Step 4: building geometry");
        let mut output = self.builder.execute(validated);
        info!(meshes = output.geometry.meshes.len(), "Geometry generated");

        output.annotations = Some(annotations);
        Ok(output)
    }

    /// Placeholder for incremental edits: the current recipe is ignored and
    /// the design is regenerated from `prompt`.
    pub fn update(
        &self,
        _recipe: &serde_json::Value,
        prompt: &str,
    ) -> Result<GeometryOutput, PipelineError> {
        debug!("Discarding current recipe and regenerating from prompt");
        self.generate(prompt)
    }
}

#[cfg(test)]
mod tests {
    use recipe_mesh::BuildConfig;
    use serde_json::json;

    use super::{DesignOrchestrator, PipelineError};
    use crate::completion::CompletionError;
    use crate::config::AiConfig;
    use crate::scripted::ScriptedCompletion;

    const FLOATING_WHEEL: &str = r#"{
        "object_type": "cart",
        "root_component": "deck",
        "components": [
            {"id": "deck", "type": "box", "dimensions": {"length": 200, "width": 100, "height": 20}},
            {"id": "w1", "type": "cylinder", "parent": "deck", "label": "Wheel",
             "dimensions": {"radius": 30, "height": 10}, "relative_position": {"x": 80, "y": 50, "z": 100}}
        ]
    }"#;

    #[test]
    fn offline_car_runs_every_stage() {
        let orchestrator = DesignOrchestrator::offline(BuildConfig::default());
        assert!(!orchestrator.is_online());

        let output = orchestrator.generate("car").expect("offline pipeline succeeds");
        assert!(output.recipe.is_valid());
        assert_eq!(output.geometry.meshes.len(), 5);
        let annotations = output.annotations.expect("annotations are attached");
        assert_eq!(annotations.len(), 5);
        assert_eq!(annotations[0].component_id, "chassis_main");
    }

    #[test]
    fn scripted_service_drives_both_ai_stages() {
        let model = ScriptedCompletion::default()
            .with_response(FLOATING_WHEEL)
            .with_response(r#"[{"component_id": "deck", "label": "Deck", "sizing": "200 mm", "note": "Base"}]"#);
        let orchestrator = DesignOrchestrator::new(Some(Box::new(model)), BuildConfig::default());
        assert!(orchestrator.is_online());

        let output = orchestrator.generate("a cart").expect("pipeline succeeds");

        let corrections = &output.recipe.validation.corrections;
        assert_eq!(corrections.len(), 1);
        assert_eq!(corrections[0].component_id, "w1");
        assert_eq!(corrections[0].new_value, 20.0);

        let wheel = output.recipe.recipe.component("w1").expect("wheel exists");
        assert_eq!(wheel.position().z, 20.0);

        let annotations = output.annotations.expect("annotations are attached");
        assert_eq!(annotations[0].label, "Deck");
        assert_eq!(annotations[1].component_id, "w1");
        assert!(annotations[1].note.starts_with("Child of deck"));
    }

    #[test]
    fn invalid_recipes_still_produce_geometry() {
        let model = ScriptedCompletion::default().with_response(
            r#"{"object_type": "blob", "root_component": "a",
                "components": [{"id": "a", "type": "sphere"}, {"id": "b", "type": "box", "parent": "nope"}]}"#,
        );
        let orchestrator = DesignOrchestrator::new(Some(Box::new(model)), BuildConfig::default());

        let output = orchestrator.generate("blob").expect("pipeline continues");
        assert!(!output.recipe.is_valid());
        assert_eq!(output.geometry.meshes.len(), 2);
        assert_eq!(output.annotations.map(|a| a.len()), Some(2));
    }

    #[test]
    fn untyped_components_are_built_as_default_boxes() {
        let model = ScriptedCompletion::default().with_response(
            r#"{"object_type": "thing", "root_component": "a",
                "components": [{"id": "a", "type": null}]}"#,
        );
        let orchestrator = DesignOrchestrator::new(Some(Box::new(model)), BuildConfig::default());

        let output = orchestrator.generate("thing").expect("pipeline continues");
        assert!(output.recipe.is_valid());
        assert_eq!(output.geometry.meshes.len(), 1);
        assert_eq!(output.geometry.bounding_box.min, [-50.0, -50.0, -50.0]);
        assert_eq!(output.geometry.bounding_box.max, [50.0, 50.0, 50.0]);
    }

    #[test]
    fn unparseable_decomposition_is_a_pipeline_error() {
        let model = ScriptedCompletion::default().with_response("not json at all");
        let orchestrator = DesignOrchestrator::new(Some(Box::new(model)), BuildConfig::default());

        let err = orchestrator.generate("car").expect_err("parse failure propagates");
        assert!(matches!(err, PipelineError::Decomposition(_)));
        assert!(err.to_string().starts_with("failed to parse design recipe"));
    }

    #[test]
    fn failed_service_calls_degrade_to_fallbacks() {
        let model = ScriptedCompletion::default()
            .with_error(CompletionError::Transport("timeout".to_string()))
            .with_error(CompletionError::EmptyResponse);
        let orchestrator = DesignOrchestrator::new(Some(Box::new(model)), BuildConfig::default());

        let output = orchestrator.generate("car").expect("fallbacks complete");
        assert_eq!(output.recipe.recipe.object_type, "car");
        assert_eq!(
            output.annotations.expect("annotations")[1].note,
            "Child of chassis_main @ (1500, 1100, -500)"
        );
    }

    #[test]
    fn update_ignores_the_current_recipe() {
        let orchestrator = DesignOrchestrator::offline(BuildConfig::default());
        let current = json!({"object_type": "car", "components": "garbage"});

        let output = orchestrator
            .update(&current, "a lamp")
            .expect("update regenerates");
        assert_eq!(output.recipe.recipe.object_type, "object");
        assert_eq!(output.geometry.meshes.len(), 1);
    }

    #[test]
    fn config_without_credential_is_offline() {
        let orchestrator =
            DesignOrchestrator::from_config(&AiConfig::default(), BuildConfig::default());
        assert!(!orchestrator.is_online());
    }
}
