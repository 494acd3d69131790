//! Quill CLI - multi-step content review from the terminal
//!
//! Usage:
//!   quill init                          Write .quill/config.toml
//!   quill review <file|->               Run the revision loop
//!   quill debate <file|->               Run the simplifier/legalist debate
//!   quill persona <file|-> -p <key>     Read content as a persona
//!   quill draft -t <key> -b <brief>     Draft content from a template
//!   quill seed                          Index built-in department policies
//!   quill personas | templates          List registries

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use quill_agent::{Embedder, ModelClient, ModelInvoker, OpenAiEmbedder};
use quill_core::config::LoggingConfig;
use quill_core::{PersonaRegistry, QuillConfig, QuillError, TemplateRegistry};
use quill_orchestrator::{DebateSubLoop, ReviewPanel, RevisionLoop};
use quill_review::{
    legalist, simplifier, ConsistencyReviewer, Mediator, PersonaSimulator, PromptStep, ReviewStep,
    StepKind, TemplateDrafter,
};
use quill_store::{seed_policies, ConsistencyLookup, ConsistencyStore, MemoryStore};
use serde::Serialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "quill")]
#[command(author, version, about = "Multi-step review and revision of public content")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Project root holding .quill/ (defaults to current directory)
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default .quill/config.toml
    Init,

    /// Review and revise content until the judge passes it
    Review {
        /// Content file, or - for stdin
        input: String,

        /// Override revision.max_iterations
        #[arg(short = 'n', long)]
        max_iterations: Option<usize>,

        /// Write the final state here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Debate simple vs precise wording and mediate
    Debate {
        /// Content file, or - for stdin
        input: String,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Simulate a reader persona
    Persona {
        /// Content file, or - for stdin
        input: String,

        /// Persona key (see `quill personas`)
        #[arg(short, long, default_value = quill_core::DEFAULT_PERSONA)]
        persona: String,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Draft new content from a template
    Draft {
        /// Template key (see `quill templates`)
        #[arg(short, long)]
        template: String,

        /// What the content should cover
        #[arg(short, long)]
        brief: String,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Embed and index the built-in department policies
    Seed,

    /// List available personas
    Personas,

    /// List available content templates
    Templates,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = QuillConfig::load_or_default(&cli.root).context("Failed to load configuration")?;
    setup_logging(cli.verbose, &config.logging)?;

    let result = match cli.command {
        Commands::Init => cmd_init(&cli.root),
        Commands::Review {
            input,
            max_iterations,
            output,
        } => cmd_review(&cli.root, &config, &input, max_iterations, output).await,
        Commands::Debate { input, output } => cmd_debate(&config, &input, output).await,
        Commands::Persona {
            input,
            persona,
            output,
        } => cmd_persona(&config, &input, &persona, output).await,
        Commands::Draft {
            template,
            brief,
            output,
        } => cmd_draft(&config, &template, &brief, output).await,
        Commands::Seed => cmd_seed(&cli.root, &config).await,
        Commands::Personas => {
            cmd_personas();
            Ok(())
        }
        Commands::Templates => {
            cmd_templates();
            Ok(())
        }
    };

    if let Err(e) = &result {
        if is_credential_error(e) {
            eprintln!("Hint: set the API key environment variables named in .quill/config.toml");
        }
    }
    result
}

fn setup_logging(verbose: bool, logging: &LoggingConfig) -> Result<()> {
    let level = if verbose {
        Level::DEBUG.to_string()
    } else {
        logging.level.clone()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if logging.wants_json() {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

fn is_credential_error(error: &anyhow::Error) -> bool {
    error
        .chain()
        .filter_map(|cause| cause.downcast_ref::<QuillError>())
        .any(QuillError::is_credential_related)
}

fn cmd_init(root: &Path) -> Result<()> {
    let path = QuillConfig::write_default(root).context("Failed to write default config")?;
    println!("Initialized Quill in {:?}", root);
    println!("Created:");
    println!("  {}", path.display());
    println!("\nNext steps:");
    println!("  1. Export ANTHROPIC_API_KEY (reviews) and OPENAI_API_KEY (embeddings)");
    println!("  2. Run 'quill seed' to index the built-in policies");
    println!("  3. Run 'quill review <file>'");
    Ok(())
}

async fn cmd_review(
    root: &Path,
    config: &QuillConfig,
    input: &str,
    max_iterations: Option<usize>,
    output: Option<PathBuf>,
) -> Result<()> {
    let content = read_input(input)?;
    let invoker = build_invoker(config)?;
    let store = open_store(root, config)?;
    let lookup = ConsistencyLookup::from_config(build_embedder(config), store, &config.consistency);

    let panel = ReviewPanel {
        structure: step(StepKind::Structure, &invoker),
        style: step(StepKind::Style, &invoker),
        consistency: Arc::new(ConsistencyReviewer::new(invoker.clone(), lookup)),
        rewriter: step(StepKind::Rewriter, &invoker),
        judge: step(StepKind::Judge, &invoker),
    };

    let mut engine = RevisionLoop::from_config(panel, &config.revision);
    if let Some(n) = max_iterations {
        engine = engine.with_max_iterations(n);
    }

    let mut metadata = quill_core::Context::new();
    metadata.insert("source".to_string(), serde_json::Value::from(input));

    let state = engine
        .run_with_metadata(&content, metadata)
        .await
        .context("Revision loop failed")?;

    info!(
        "Finished after {} iteration(s): {:?} ({:?})",
        state.iteration, state.final_decision, state.final_score
    );
    emit_json(&state, output)
}

async fn cmd_debate(config: &QuillConfig, input: &str, output: Option<PathBuf>) -> Result<()> {
    let content = read_input(input)?;
    let invoker = build_invoker(config)?;

    let debate = DebateSubLoop::new(
        Arc::new(simplifier(invoker.clone())),
        Arc::new(legalist(invoker.clone())),
        Arc::new(Mediator::new(invoker)),
    );

    let outcome = debate.run(&content).await.context("Debate failed")?;
    emit_json(&outcome, output)
}

async fn cmd_persona(
    config: &QuillConfig,
    input: &str,
    persona: &str,
    output: Option<PathBuf>,
) -> Result<()> {
    let content = read_input(input)?;
    let mut simulator = PersonaSimulator::new(build_invoker(config)?);
    simulator.set_persona(persona)?;

    let feedback = simulator
        .execute(&content, None)
        .await
        .context("Persona simulation failed")?;
    emit_json(&feedback, output)
}

async fn cmd_draft(
    config: &QuillConfig,
    template: &str,
    brief: &str,
    output: Option<PathBuf>,
) -> Result<()> {
    let drafter = TemplateDrafter::new(build_invoker(config)?);
    let draft = drafter
        .generate_draft(template, brief)
        .await
        .context("Drafting failed")?;

    match output {
        Some(path) => {
            std::fs::write(&path, draft).with_context(|| format!("Failed to write {:?}", path))?;
            println!("Draft written to {:?}", path);
        }
        None => println!("{}", draft),
    }
    Ok(())
}

async fn cmd_seed(root: &Path, config: &QuillConfig) -> Result<()> {
    let embedder = build_embedder(config);
    let store = open_store(root, config)?;

    let ids = seed_policies(embedder.as_ref(), store.as_ref())
        .await
        .context("Seeding failed")?;
    store.save().await.context("Failed to save store")?;

    println!("Seeded {} policies ({} items indexed)", ids.len(), store.len().await);
    Ok(())
}

fn cmd_personas() {
    println!("Personas:");
    for persona in PersonaRegistry::builtin().iter() {
        println!("  {:<12} {}", persona.key, persona.name);
        println!("               {}", persona.role);
    }
}

fn cmd_templates() {
    println!("Templates:");
    for template in TemplateRegistry::builtin().iter() {
        println!("  {:<12} {}", template.key, template.name);
        println!("               {}", template.description);
    }
}

fn build_invoker(config: &QuillConfig) -> Result<Arc<dyn ModelInvoker>> {
    let client = ModelClient::from_config(config).context("Invalid model configuration")?;
    info!("Using {} model {}", client.provider(), client.model_name());
    Ok(Arc::new(client))
}

fn build_embedder(config: &QuillConfig) -> Arc<dyn Embedder> {
    Arc::new(OpenAiEmbedder::from_config(config))
}

fn open_store(root: &Path, config: &QuillConfig) -> Result<Arc<MemoryStore>> {
    let path = root.join(&config.consistency.store_path);
    let store = MemoryStore::open(&path, config.embedding.dimensions)
        .with_context(|| format!("Failed to open store at {:?}", path))?;
    Ok(Arc::new(store))
}

fn step(kind: StepKind, invoker: &Arc<dyn ModelInvoker>) -> Arc<dyn ReviewStep> {
    Arc::new(PromptStep::new(kind, invoker.clone()))
}

/// Read content from a file path, or stdin for `-`
fn read_input(input: &str) -> Result<String> {
    let content = if input == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read stdin")?;
        buf
    } else {
        std::fs::read_to_string(input).with_context(|| format!("Failed to read {}", input))?
    };

    if content.trim().is_empty() {
        anyhow::bail!("Input is empty");
    }
    Ok(content)
}

fn emit_json<T: Serialize>(value: &T, output: Option<PathBuf>) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    match output {
        Some(path) => {
            std::fs::write(&path, json).with_context(|| format!("Failed to write {:?}", path))?;
            println!("Wrote {:?}", path);
        }
        None => println!("{}", json),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use tempfile::TempDir;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_persona_defaults_to_anxious() {
        let cli = Cli::parse_from(["quill", "persona", "page.md"]);
        match cli.command {
            Commands::Persona { persona, .. } => assert_eq!(persona, "anxious"),
            _ => panic!("expected persona command"),
        }
    }

    #[test]
    fn test_read_input_rejects_blank_file() {
        let temp = TempDir::new().unwrap();
        let blank = temp.path().join("blank.md");
        std::fs::write(&blank, "  \n").unwrap();
        assert!(read_input(blank.to_str().unwrap()).is_err());

        let page = temp.path().join("page.md");
        std::fs::write(&page, "Mistakes were made.").unwrap();
        assert_eq!(read_input(page.to_str().unwrap()).unwrap(), "Mistakes were made.");
    }

    #[test]
    fn test_credential_errors_detected_through_context() {
        let err = anyhow::Error::new(QuillError::MissingCredential("OPENAI_API_KEY".into()))
            .context("Seeding failed");
        assert!(is_credential_error(&err));
        assert!(!is_credential_error(&anyhow::anyhow!("something else")));
    }
}
