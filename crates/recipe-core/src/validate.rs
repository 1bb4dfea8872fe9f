use std::collections::HashSet;

use tracing::{debug, warn};

use crate::component::{Axis, Component, PrimitiveError, PrimitiveKind};
use crate::hierarchy::{HierarchyError, absolute_position};
use crate::recipe::{Correction, FieldPath, Recipe, ValidatedRecipe, Validation};

/// Lowest allowed bottom extent (position.z - radius) for a wheel.
pub const GROUND_CLEARANCE: f64 = -10.0;

/// Largest share of a box parent's width a nested cylinder's diameter may take.
pub const FIT_RATIO: f64 = 0.8;

/// Checks a recipe against structural and geometric constraints and applies
/// the automatic repairs it finds.
///
/// Validation never fails: problems are reported as issues (which make the
/// recipe invalid), warnings, or corrections. Corrections are collected in a
/// first pass and written back to the components in a second one, so
/// validating an already corrected recipe yields no new corrections.
#[derive(Debug, Clone, Copy, Default)]
pub struct Validator;

impl Validator {
    pub fn new() -> Self {
        Self
    }

    pub fn validate(&self, mut recipe: Recipe) -> ValidatedRecipe {
        let mut validation = Validation::default();

        if recipe.root().is_none() {
            validation
                .issues
                .push(format!("Root component \"{}\" not found", recipe.root_component));
            warn!(
                root = %recipe.root_component,
                "Recipe root does not resolve, skipping component checks"
            );
            return ValidatedRecipe { recipe, validation };
        }

        {
            let mut seen = HashSet::new();
            for (index, component) in recipe.components.iter().enumerate() {
                if component.id.is_empty() {
                    validation
                        .issues
                        .push(format!("Component at index {index} has no id"));
                } else if !seen.insert(component.id.as_str()) {
                    validation
                        .issues
                        .push(format!("Duplicate component id \"{}\"", component.id));
                }
            }
        }

        for component in &recipe.components {
            validation.issues.extend(dimension_issues(component));
            validation.corrections.extend(ground_contact_correction(component));

            if let Some(parent_id) = component.parent_id() {
                let Some(parent) = recipe.component(parent_id) else {
                    validation.issues.push(format!(
                        "Component \"{}\" references non-existent parent \"{parent_id}\"",
                        component.id
                    ));
                    continue;
                };

                match absolute_position(&recipe, &component.id) {
                    Err(HierarchyError::Cycle { repeated, .. }) => {
                        validation.issues.push(format!(
                            "Component \"{}\" has a circular parent chain through \"{repeated}\"",
                            component.id
                        ));
                        continue;
                    }
                    Err(HierarchyError::UnknownComponent(_)) => {}
                    Ok(position) => {
                        debug!(component = %component.id, %position, "Resolved absolute position");
                    }
                }

                validation.warnings.extend(fit_warnings(component, parent));
            }
        }

        for correction in &validation.corrections {
            if let Some(component) = recipe.component_mut(&correction.component_id) {
                correction.apply_to(component);
            }
        }

        validation.valid = validation.issues.is_empty();
        debug!(
            valid = validation.valid,
            issues = validation.issues.len(),
            warnings = validation.warnings.len(),
            corrections = validation.corrections.len(),
            "Recipe validated"
        );

        ValidatedRecipe { recipe, validation }
    }
}

fn dimension_issues(component: &Component) -> Vec<String> {
    let mut issues = Vec::new();

    if let Err(PrimitiveError::MissingDimensions { missing, .. }) = component.primitive() {
        let required = component.kind.required_dimensions().join(", ");
        let noun = if required.contains(',') {
            "dimensions"
        } else {
            "dimension"
        };
        issues.push(format!(
            "{} component \"{}\" missing required {noun} ({required}): {}",
            capitalize(component.kind.as_str()),
            component.id,
            missing.join(", ")
        ));
    }

    for (key, value) in component.dimensions.iter() {
        if !(value.is_finite() && value > 0.0) {
            issues.push(format!(
                "Component \"{}\" has invalid {key}: {value} (must be positive)",
                component.id
            ));
        }
    }

    issues
}

fn fit_warnings(component: &Component, parent: &Component) -> Vec<String> {
    let mut warnings = Vec::new();

    if component.kind == PrimitiveKind::Cylinder
        && parent.kind == PrimitiveKind::Box
        && let (Some(radius), Some(width)) =
            (component.dimensions.radius(), parent.dimensions.width())
        && radius * 2.0 > width * FIT_RATIO
    {
        warnings.push(format!(
            "Component \"{}\" (radius: {radius}mm) may be too large for parent \"{}\" (width: {width}mm)",
            component.id, parent.id
        ));
    }

    warnings
}

fn ground_contact_correction(component: &Component) -> Option<Correction> {
    if component.kind != PrimitiveKind::Cylinder || !is_wheel(component) {
        return None;
    }

    let radius = component.dimensions.radius().filter(|radius| *radius > 0.0)?;
    let current_z = component.position().z;
    let grounded_z = radius + GROUND_CLEARANCE;
    // Same comparison as `z - radius <= GROUND_CLEARANCE`, but exact for values
    // this function wrote itself.
    if current_z <= grounded_z {
        return None;
    }

    Some(Correction {
        component_id: component.id.clone(),
        field: FieldPath::Position(Axis::Z),
        old_value: current_z,
        new_value: grounded_z,
        reason: "Wheel must touch or sit below ground level".to_string(),
    })
}

fn is_wheel(component: &Component) -> bool {
    component
        .label
        .as_deref()
        .is_some_and(|label| label.to_lowercase().contains("wheel"))
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
