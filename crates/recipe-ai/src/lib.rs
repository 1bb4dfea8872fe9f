pub mod annotate;
pub mod completion;
pub mod config;
pub mod decompose;
pub mod orchestrator;

#[cfg(test)]
mod scripted;

pub use annotate::{Annotator, heuristic_annotation, heuristic_annotations};
pub use completion::{CompletionError, GeminiClient, TextCompletion, strip_code_fences};
pub use config::{AiConfig, ConfigError};
pub use decompose::{DecompositionError, Decomposer, fallback_recipe, parse_recipe};
pub use orchestrator::{DesignOrchestrator, PipelineError};
