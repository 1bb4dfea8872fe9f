use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use recipe_ai::{AiConfig, Annotator, DesignOrchestrator, GeminiClient, TextCompletion, parse_recipe};
use recipe_core::{Recipe, Validator};
use recipe_mesh::{BuildConfig, MeshBuilder};
use serde::Serialize;
use serde_json::Value;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Turn text prompts into validated, annotated and tessellated design recipes
#[derive(Parser)]
#[command(name = "recipe-cli")]
#[command(about = "Design recipe generation from text prompts", long_about = None)]
#[command(version)]
struct Cli {
    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline for a prompt
    Generate {
        #[arg(long)]
        prompt: String,

        /// Skip the completion service even when a credential is configured
        #[arg(long)]
        offline: bool,

        /// Place children at their accumulated parent offsets
        #[arg(long)]
        compose_offsets: bool,
    },

    /// Validate a recipe file and print the corrected recipe
    Validate {
        #[arg(long)]
        recipe: PathBuf,
    },

    /// Validate a recipe file and print its geometry
    Build {
        #[arg(long)]
        recipe: PathBuf,

        #[arg(long)]
        compose_offsets: bool,
    },

    /// Validate a recipe file and print its annotations
    Annotate {
        #[arg(long)]
        recipe: PathBuf,

        #[arg(long)]
        offline: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output = run(cli.command)?;
    let rendered = if cli.pretty {
        serde_json::to_string_pretty(&output)?
    } else {
        serde_json::to_string(&output)?
    };
    println!("{rendered}");
    Ok(())
}

fn run(command: Commands) -> Result<Value> {
    match command {
        Commands::Generate {
            prompt,
            offline,
            compose_offsets,
        } => {
            let build = build_config(compose_offsets);
            let orchestrator = if offline {
                DesignOrchestrator::offline(build)
            } else {
                DesignOrchestrator::from_config(&AiConfig::from_env()?, build)
            };
            to_json(&orchestrator.generate(&prompt)?)
        }
        Commands::Validate { recipe } => {
            let validated = Validator::new().validate(read_recipe(&recipe)?);
            info!(
                valid = validated.is_valid(),
                issues = validated.validation.issues.len(),
                corrections = validated.validation.corrections.len(),
                "Validated recipe"
            );
            to_json(&validated)
        }
        Commands::Build {
            recipe,
            compose_offsets,
        } => {
            let validated = Validator::new().validate(read_recipe(&recipe)?);
            to_json(&MeshBuilder::new(build_config(compose_offsets)).execute(validated))
        }
        Commands::Annotate { recipe, offline } => {
            let validated = Validator::new().validate(read_recipe(&recipe)?);
            let client = if offline {
                None
            } else {
                GeminiClient::from_config(&AiConfig::from_env()?)
            };
            let model = client.as_ref().map(|client| client as &dyn TextCompletion);
            to_json(&Annotator::new(model).execute(&validated))
        }
    }
}

fn build_config(compose_offsets: bool) -> BuildConfig {
    BuildConfig {
        compose_parent_offsets: compose_offsets,
    }
}

fn read_recipe(path: &Path) -> Result<Recipe> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read recipe file {}", path.display()))?;
    parse_recipe(&text).with_context(|| format!("invalid recipe in {}", path.display()))
}

fn to_json(value: &impl Serialize) -> Result<Value> {
    Ok(serde_json::to_value(value)?)
}
