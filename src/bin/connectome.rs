//! Connectome CLI — replay and inspect recorded flow-event scripts.
//!
//! Usage:
//!   connectome replay <script> [--steps N] [--format text|json]
//!   connectome inspect <script>
//!   connectome config

use clap::{Parser, Subcommand, ValueEnum};
use connectome::adapter::{EnergyPulse, TraversalStep};
use connectome::{
    ConfigOverrides, FlowEvent, FlowPayload, GraphSource, HealthUpdate, LocalAdapter,
    LocalAdapterConfig, Script, StepResult,
};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "connectome",
    version,
    about = "Graph data sources and script replay for the Connectome visualization"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Graph database URI (falls back to NEO4J_URI)
    #[arg(long, global = true)]
    uri: Option<String>,
    /// Database user (falls back to NEO4J_USER)
    #[arg(long, global = true)]
    user: Option<String>,
    /// Named graph to select (falls back to GRAPH_NAME)
    #[arg(long, global = true)]
    graph: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Step through a recorded script, printing each event
    Replay {
        /// Script file (.json, .jsonl, .ndjson, .yaml, .yml)
        script: PathBuf,
        /// Stop after this many steps
        #[arg(long)]
        steps: Option<usize>,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Validate a script and print a summary
    Inspect {
        /// Script file
        script: PathBuf,
    },
    /// Print the resolved adapter configuration
    Config,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

/// Environment lookup happens here, once, and nowhere else.
fn bootstrap_config(cli: &Cli) -> LocalAdapterConfig {
    let mut overrides = ConfigOverrides::new();
    overrides.uri = cli.uri.clone();
    overrides.user = cli.user.clone();
    overrides.graph_name = cli.graph.clone();
    LocalAdapterConfig::from_env(overrides)
}

fn describe(event: &FlowEvent) -> String {
    match &event.payload {
        FlowPayload::NodeCreated(c) | FlowPayload::NodeUpdated(c) | FlowPayload::NodeDeleted(c) => {
            match &c.node {
                Some(node) => format!("{} ({} '{}')", c.node_id, node.node_type, node.name),
                None => c.node_id.to_string(),
            }
        }
        FlowPayload::LinkCreated(c) | FlowPayload::LinkUpdated(c) | FlowPayload::LinkDeleted(c) => {
            match &c.link {
                Some(link) => format!("{} ({} -- {})", c.link_id, link.node_a, link.node_b),
                None => c.link_id.to_string(),
            }
        }
        FlowPayload::EnergyPulse(EnergyPulse {
            node_id,
            energy_delta,
            new_energy,
        }) => format!("{} {:+.3} -> {:.3}", node_id, energy_delta, new_energy),
        FlowPayload::TraversalStep(TraversalStep {
            from_node,
            to_node,
            via_link,
            energy_transferred,
            subentity_id,
        }) => format!(
            "{} -> {} via {} ({:.3}){}",
            from_node,
            to_node,
            via_link,
            energy_transferred,
            subentity_id
                .as_deref()
                .map(|s| format!(" by {}", s))
                .unwrap_or_default()
        ),
        FlowPayload::HealthUpdate(HealthUpdate {
            node_count,
            link_count,
            total_energy,
            active_subentities,
        }) => format!(
            "nodes={} links={} energy={:.3} subentities={}",
            node_count, link_count, total_energy, active_subentities
        ),
    }
}

fn print_step(index: usize, step: &StepResult, format: OutputFormat) -> Result<(), String> {
    match format {
        OutputFormat::Text => {
            println!(
                "[{:>4}] {:>13}  {:<15} {}",
                index,
                step.event.timestamp,
                step.event.kind().as_str(),
                describe(&step.event)
            );
        }
        OutputFormat::Json => {
            let line = serde_json::to_string(step).map_err(|e| format!("Failed to encode step: {}", e))?;
            println!("{}", line);
        }
    }
    Ok(())
}

fn load_script(path: &Path) -> Result<Script, String> {
    Script::load(path).map_err(|e| format!("Failed to load {}: {}", path.display(), e))
}

async fn replay(
    adapter: &dyn GraphSource,
    script: Script,
    limit: Option<usize>,
    format: OutputFormat,
) -> Result<usize, String> {
    let replay = adapter
        .as_replayable()
        .ok_or_else(|| format!("{} has no stepper (live mode)", adapter.id()))?;

    if script.is_empty() {
        info!("script is empty, nothing to replay");
        return Ok(0);
    }
    replay.load_script(script).await;

    let mut steps = 0;
    while limit.map_or(true, |n| steps < n) {
        let step = replay.next_step().await.map_err(|e| e.to_string())?;
        print_step(steps, &step, format)?;
        steps += 1;
        if !step.has_more {
            break;
        }
    }
    adapter.disconnect().await;
    Ok(steps)
}

fn cmd_replay(config: LocalAdapterConfig, path: &Path, steps: Option<usize>, format: OutputFormat) -> i32 {
    if let Err(e) = config.validate() {
        warn!("{}", e);
    }
    let script = match load_script(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("failed to create tokio runtime: {}", e);
            return 1;
        }
    };

    let adapter = LocalAdapter::new(config);
    match rt.block_on(replay(&adapter, script, steps, format)) {
        Ok(n) => {
            info!(steps = n, "replay finished");
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_inspect(path: &Path) -> i32 {
    match load_script(path) {
        Ok(script) => {
            print!("{}", script.summary());
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_config(config: &LocalAdapterConfig) -> i32 {
    println!("{}", config);
    match config.validate() {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging();
    let config = bootstrap_config(&cli);

    let code = match cli.command {
        Commands::Replay {
            ref script,
            steps,
            format,
        } => cmd_replay(config, script, steps, format),
        Commands::Inspect { ref script } => cmd_inspect(script),
        Commands::Config => cmd_config(&config),
    };
    std::process::exit(code);
}
