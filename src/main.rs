use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use toolsmith::cli::{Cli, Commands};
use toolsmith::core::orchestrator::Orchestrator;
use toolsmith::executors::ExecutorSet;
use toolsmith::storage::{FileSystemStore, FunctionStore};
use toolsmith::{utils, FunctionRegistry, FunctionSpec, McpServer, Settings};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::new().context("Failed to load settings")?;

    // Logs go to stderr: stdout is the protocol channel in serve mode.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&settings.logging.level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let store: Arc<dyn FunctionStore> = Arc::new(
        FileSystemStore::new(PathBuf::from(&settings.storage.dir))
            .await
            .context("Failed to open function store")?,
    );
    let executors = ExecutorSet::with_defaults();
    let registry = FunctionRegistry::new(
        store.clone(),
        executors.clone(),
        settings.execution.max_timeout_ms,
    )
    .await?;
    let orchestrator = Orchestrator::new(
        executors,
        store,
        settings.execution.default_timeout_ms,
    );

    match cli.command {
        Commands::Serve => handle_serve(registry, orchestrator).await,
        Commands::Register { spec } => handle_register(registry, spec).await,
        Commands::List => handle_list(registry),
        Commands::Remove { name } => handle_remove(registry, name).await,
        Commands::Invoke { name, args } => handle_invoke(registry, orchestrator, name, args).await,
    }
}

async fn handle_serve(registry: FunctionRegistry, orchestrator: Orchestrator) -> Result<()> {
    McpServer::new(registry, orchestrator).run().await
}

async fn handle_register(mut registry: FunctionRegistry, spec_path: String) -> Result<()> {
    let json = tokio::fs::read_to_string(&spec_path)
        .await
        .with_context(|| format!("Failed to read spec file {spec_path}"))?;
    let spec: FunctionSpec =
        serde_json::from_str(&json).context("Spec file is not a valid function spec")?;

    match registry.validate_and_register(spec).await {
        Ok(definition) => {
            utils::print_success(&format!(
                "Registered '{}' ({})",
                definition.name, definition.language
            ));
            Ok(())
        }
        Err(e) => {
            utils::print_error(&format!("Registration failed: {e}"));
            std::process::exit(1);
        }
    }
}

fn handle_list(registry: FunctionRegistry) -> Result<()> {
    let functions = registry.list();
    if functions.is_empty() {
        utils::print_info("No functions registered");
        return Ok(());
    }

    utils::print_header("Registered functions");
    for definition in functions {
        let source = if definition.is_file_based() {
            "file"
        } else {
            "inline"
        };
        println!(
            "  {} ({}, {}): {}",
            definition.name, definition.language, source, definition.description
        );
        if let Some(dependencies) = &definition.dependencies {
            if !dependencies.is_empty() {
                println!("    dependencies: {}", dependencies.join(", "));
            }
        }
    }
    Ok(())
}

async fn handle_remove(mut registry: FunctionRegistry, name: String) -> Result<()> {
    if registry.remove(&name).await? {
        utils::print_success(&format!("Removed '{name}'"));
    } else {
        utils::print_error(&format!("No function named '{name}'"));
        std::process::exit(1);
    }
    Ok(())
}

async fn handle_invoke(
    registry: FunctionRegistry,
    orchestrator: Orchestrator,
    name: String,
    args: String,
) -> Result<()> {
    let definition = registry
        .get(&name)
        .with_context(|| format!("No function named '{name}'"))?
        .clone();
    let args: serde_json::Value =
        serde_json::from_str(&args).context("Arguments must be a JSON object")?;

    let outcome = orchestrator.execute(&definition, args).await;
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    if outcome.is_error {
        std::process::exit(1);
    }
    Ok(())
}
