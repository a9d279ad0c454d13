//! Swarm CLI
//!
//! Runs crews of agents against a single objective.
//!
//! Usage:
//!   swarm run research-roadmap --objective "AI Agents in 2026"
//!   swarm run trend-analysis --objective "Edge inference" --show-steps
//!   swarm crews list
//!   swarm crews show research-roadmap

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use swarm_orchestrator::{CrewCatalog, EngineConfig, SwarmEngine};
use swarm_providers::{completion_from_config, ProviderKind, SearXNGBackend, SwarmFileConfig};

#[derive(Parser)]
#[command(name = "swarm")]
#[command(about = "Run sequential crews of LLM agents against an objective")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Completion provider (openai or ollama)
    #[arg(long, global = true)]
    provider: Option<ProviderKind>,

    /// Default model to use
    #[arg(short = 'm', long, env = "SWARM_MODEL", global = true)]
    model: Option<String>,

    /// Provider endpoint URL
    #[arg(long, global = true)]
    url: Option<String>,

    /// API key for OpenAI-compatible providers
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,

    /// Default sampling temperature
    #[arg(long, global = true)]
    temperature: Option<f32>,

    /// Per-call completion timeout in seconds (0 = unbounded)
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    /// Increase verbosity (-v info, -vv debug, -vvv trace). Default is warn.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a crew
    Run {
        /// Crew name (e.g., "research-roadmap", "trend-analysis")
        crew: String,

        /// What the crew should work on
        #[arg(long, short)]
        objective: String,

        /// Directory for custom crew files
        #[arg(long)]
        crews_dir: Option<PathBuf>,

        /// Augment search-enabled tasks with web results
        #[arg(long)]
        search: bool,

        /// Print every task's output, not just the final one
        #[arg(long)]
        show_steps: bool,

        /// Named input for the crew's templates (NAME=VALUE, repeatable)
        #[arg(long = "input", value_parser = parse_input)]
        inputs: Vec<(String, String)>,

        /// Print the full run output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Crew definitions
    Crews {
        #[command(subcommand)]
        command: CrewCommands,
    },
}

#[derive(Subcommand)]
enum CrewCommands {
    /// List available crews
    List {
        /// Directory for custom crew files
        #[arg(long)]
        crews_dir: Option<PathBuf>,
    },
    /// Show crew definition
    Show {
        /// Crew name
        crew: String,

        /// Directory for custom crew files
        #[arg(long)]
        crews_dir: Option<PathBuf>,
    },
}

fn parse_input(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{}'", raw))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("input name is empty in '{}'", raw));
    }
    Ok((name.to_string(), value.to_string()))
}

/// Initialize tracing with the given verbosity level
///
/// - 0: warn (default)
/// - 1: info (-v)
/// - 2: debug (-vv)
/// - 3+: trace (-vvv)
fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    // Allow RUST_LOG to override if set
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.to_string()));

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI first to get verbosity before initializing tracing
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    let mut file_config = SwarmFileConfig::load()?;

    // CLI flags win over the config file
    if let Some(provider) = cli.provider {
        file_config.llm.provider = provider;
    }
    if let Some(model) = cli.model {
        file_config.llm.model = model;
    }
    if let Some(url) = cli.url {
        file_config.llm.url = Some(url);
    }
    if let Some(temperature) = cli.temperature {
        file_config.llm.temperature = temperature;
    }
    if let Some(timeout_secs) = cli.timeout_secs {
        file_config.llm.timeout_secs = timeout_secs;
    }

    // Explicit flag first, then whichever variable the config names
    let api_key = cli
        .api_key
        .or_else(|| std::env::var(&file_config.llm.api_key_env).ok());

    match cli.command {
        Commands::Run {
            crew,
            objective,
            crews_dir,
            search,
            show_steps,
            inputs,
            json,
        } => {
            let completion = completion_from_config(&file_config.llm, api_key)
                .context("Failed to create completion client")?;

            let mut config = EngineConfig::from_file_config(&file_config);
            config.custom_crews_dir = crews_dir;

            let mut engine = SwarmEngine::new(completion, config);
            if search || file_config.search.enabled {
                let backend = SearXNGBackend::new(&file_config.search)?;
                engine = engine.with_search(Arc::new(backend));
            }

            let inputs: BTreeMap<String, String> = inputs.into_iter().collect();

            let output = match engine.run_with_inputs(&crew, &objective, &inputs).await {
                Ok(output) => output,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&output)?);
                return Ok(());
            }

            if show_steps {
                for step in &output.task_outputs {
                    println!("=== Task {} ({}) ===", step.task_index + 1, step.role);
                    println!("{}\n", step.raw);
                }
                println!("=== Final ===");
            }

            println!("{}", output.raw());

            eprintln!(
                "\nTasks completed: {} in {}ms",
                output.task_outputs.len(),
                output.total_duration_ms()
            );
        }

        Commands::Crews { command } => run_crews_command(command)?,
    }

    Ok(())
}

fn run_crews_command(command: CrewCommands) -> Result<()> {
    match command {
        CrewCommands::List { crews_dir } => {
            let catalog = CrewCatalog::discover(crews_dir.as_deref());

            println!("Available Crews:\n");

            let mut builtins = Vec::new();
            let mut customs = Vec::new();

            for (name, desc, is_custom) in catalog.list() {
                if is_custom {
                    customs.push((name, desc));
                } else {
                    builtins.push((name, desc));
                }
            }

            println!("Built-in:");
            for (name, desc) in builtins {
                println!("  {} - {}", name, desc);
            }

            if !customs.is_empty() {
                println!("\nCustom:");
                for (name, desc) in customs {
                    println!("  {} - {}", name, desc);
                }
            }

            println!("\nRun a crew with: swarm run <name> --objective \"...\"");
        }

        CrewCommands::Show { crew, crews_dir } => {
            let catalog = CrewCatalog::discover(crews_dir.as_deref());

            match catalog.get(&crew) {
                Some(definition) => {
                    println!("Crew: {}\n", definition.name);
                    if !definition.description.is_empty() {
                        println!("Description: {}\n", definition.description);
                    }

                    println!("Agents:");
                    for agent in &definition.agents {
                        println!("  {} ({})", agent.name, agent.role);
                        println!("     Goal: {}", agent.goal);
                        if let Some(ref model) = agent.model {
                            println!("     Model: {}", model);
                        }
                    }

                    println!("\nTasks:");
                    for (i, task) in definition.tasks.iter().enumerate() {
                        println!("  {}. [Agent: {}]", i + 1, task.agent);
                        println!("     Task: {}", task.description);
                        if !task.expected_output.is_empty() {
                            println!("     Expected: {}", task.expected_output);
                        }
                        if task.search {
                            println!("     Search: yes");
                        }
                    }

                    if !definition.inputs.is_empty() {
                        println!("\nInputs:");
                        for (name, value) in &definition.inputs {
                            println!("  {} = {}", name, value);
                        }
                    }
                }
                None => {
                    eprintln!("Crew '{}' not found.", crew);
                    eprintln!("Use 'swarm crews list' to see available crews.");
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}
