//! Parent-chain traversal over a recipe's components.
//!
//! Every walk carries a visited-id guard, so a cyclic parent graph produces
//! an error instead of looping.

use std::collections::HashSet;

use thiserror::Error;

use crate::component::Vec3;
use crate::recipe::Recipe;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HierarchyError {
    #[error("component '{0}' not found")]
    UnknownComponent(String),
    #[error("parent chain of component '{id}' loops back to '{repeated}'")]
    Cycle { id: String, repeated: String },
}

/// Accumulates `relative_position` offsets from `id` up through its parents.
///
/// Ancestors without a position contribute a zero offset. The walk stops at a
/// component without a parent or at a parent id that does not resolve.
pub fn absolute_position(recipe: &Recipe, id: &str) -> Result<Vec3, HierarchyError> {
    let component = recipe
        .component(id)
        .ok_or_else(|| HierarchyError::UnknownComponent(id.to_string()))?;

    let mut position = component.position();
    let mut visited = HashSet::from([component.id.as_str()]);
    let mut current = component;

    while let Some(parent_id) = current.parent_id() {
        let Some(parent) = recipe.component(parent_id) else {
            break;
        };
        if !visited.insert(parent.id.as_str()) {
            return Err(HierarchyError::Cycle {
                id: id.to_string(),
                repeated: parent.id.clone(),
            });
        }
        position = position + parent.position();
        current = parent;
    }

    Ok(position)
}

pub fn has_parent_cycle(recipe: &Recipe, id: &str) -> bool {
    matches!(
        absolute_position(recipe, id),
        Err(HierarchyError::Cycle { .. })
    )
}
