//! Opdeck CLI: inspect registered commands and run them against a scratch
//! in-memory host. Useful for trying out command libraries without a host
//! application attached.

use std::sync::{Arc, Mutex};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::debug;

use opdeck_engine::Executor;
use opdeck_host::{Host, MemoryHost};
use opdeck_library::BuiltinLibrary;
use opdeck_registry::{DEFAULT_LIBRARIES_ENV, LibraryCatalog, RegistryConfig};
use opdeck_types::{Args, Outcome};

#[derive(Parser)]
#[command(name = "opdeck", version, about = "Undoable command framework shell")]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// List every registered command.
    List,
    /// Show the full descriptor of one command.
    Describe {
        /// Command identifier, e.g. `create.nodes`.
        id: String,
    },
    /// Execute a command against a scratch scene.
    Run {
        /// Command identifier, e.g. `create.nodes`.
        id: String,
        /// Arguments as `key=value` pairs; values parse as JSON first, then
        /// fall back to plain strings.
        #[arg(short = 'a', long = "arg", value_name = "KEY=VALUE")]
        args: Vec<String>,
        /// Undo the command after running it, to exercise the round trip.
        #[arg(long)]
        undo: bool,
    },
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let host = Arc::new(Mutex::new(MemoryHost::new()));
    let mut executor = Executor::new(host.clone() as Arc<Mutex<dyn Host>>);
    register_libraries(&mut executor)?;

    match cli.command {
        CliCommand::List => list(&executor),
        CliCommand::Describe { id } => describe(&executor, &id),
        CliCommand::Run { id, args, undo } => run(&executor, &host, &id, &args, undo),
    }
}

fn init_tracing() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into());
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Registers libraries selected by env variable, then config file; when
/// neither selects anything, registers the built-in library so the shell is
/// usable out of the box.
fn register_libraries(executor: &mut Executor) -> Result<()> {
    let mut catalog = LibraryCatalog::new();
    catalog.provide(Box::new(BuiltinLibrary)).context("provide builtin library")?;

    let registry = executor.registry_mut();
    let mut registered = registry.register_by_env(DEFAULT_LIBRARIES_ENV, &catalog).context("register libraries from env")?;
    if registered == 0 {
        registered = registry
            .register_from_config(&RegistryConfig::load(), &catalog)
            .context("register libraries from config")?;
    }
    if registered == 0 {
        registry.register_library(&BuiltinLibrary).context("register builtin library")?;
    }
    debug!(commands = registry.len(), "registry populated");
    Ok(())
}

fn list(executor: &Executor) -> Result<()> {
    for descriptor in executor.registry().descriptors() {
        let undo = if descriptor.undoable { "undoable" } else { "not undoable" };
        println!("{:<24} {:<14} {}", descriptor.id, undo, descriptor.ui.tooltip);
    }
    Ok(())
}

fn describe(executor: &Executor, id: &str) -> Result<()> {
    let definition = executor.registry().get(id)?;
    println!("{}", serde_json::to_string_pretty(&definition.descriptor)?);
    Ok(())
}

fn run(executor: &Executor, host: &Arc<Mutex<MemoryHost>>, id: &str, raw_args: &[String], undo: bool) -> Result<()> {
    let args = parse_args(raw_args)?;
    match executor.execute(id, args)? {
        Outcome::Cancelled { reason } => {
            println!("cancelled: {reason}");
        }
        Outcome::Completed(value) => {
            println!("{}", serde_json::to_string_pretty(&value)?);
            let node_count = host.lock().expect("host lock poisoned").scene().node_count();
            println!("scene now holds {node_count} node(s)");
            if undo {
                let undone = executor.undo_last();
                let node_count = host.lock().expect("host lock poisoned").scene().node_count();
                println!("undo: {}; scene now holds {node_count} node(s)", if undone { "ok" } else { "nothing to undo" });
            }
        }
    }
    Ok(())
}

fn parse_args(raw_args: &[String]) -> Result<Args> {
    let mut args = Args::new();
    for raw in raw_args {
        let Some((key, value)) = raw.split_once('=') else {
            bail!("argument '{raw}' is not of the form key=value");
        };
        let value = serde_json::from_str::<Value>(value).unwrap_or_else(|_| Value::String(value.to_string()));
        args.insert(key, value);
    }
    Ok(args)
}
