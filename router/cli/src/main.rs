//! Memory Router CLI - Inspect and Drive Routing Decisions
//!
//! Command-line front end for the memory router. Loads configuration the
//! same way a host service would (file, environment, flags) and prints
//! results as JSON on stdout. Logs go to stderr.
//!
//! # Usage
//!
//! ```bash
//! # How would this text be classified?
//! memory-router classify "Find relationships between Alice and the project"
//!
//! # Full routing decision, without executing
//! memory-router route --operation retrieve "Remember what we discussed yesterday"
//!
//! # Store through in-process backends
//! memory-router store --payload '{"id":"n1","text":"retro notes"}' "save these notes"
//!
//! # Store against real services at the configured URLs
//! memory-router --http store --payload '{"id":"n1"}' "save these notes"
//!
//! # Hints are key=value; values are parsed as JSON when possible
//! memory-router route --hint intent=sync_data --hint is_temporary=true "keep it"
//!
//! # Context hints shift the ranking too
//! memory-router route --hint urgency=high --hint content_length=40 "quick note"
//!
//! # Verbose logging
//! RUST_LOG=debug memory-router route "..."
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use memory_router_core::{
    load_config_from_path, default_config_path, BackendId, ConfigOverrides, ContextHints,
    EntityExtractor, HttpBackend, InMemoryBackend, IntentClassifier, MemoryBackend, MemoryRouter,
    Operation, RouterConfig, RoutingRequest,
};

/// Memory Router - route memory requests to graph, document or semantic stores
#[derive(Parser, Debug)]
#[command(name = "memory-router")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short = 'c', long, env = "MEMORY_ROUTER_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Talk to backends over HTTP instead of in-process stores
    #[arg(long)]
    http: bool,

    /// Disable a backend (repeatable)
    #[arg(long = "disable", value_name = "BACKEND")]
    disabled: Vec<BackendArg>,

    /// Override the parallel read deadline
    #[arg(long, value_name = "MS")]
    read_deadline_ms: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, env = "MEMORY_ROUTER_LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Classify the intent of some text
    Classify {
        /// Request text
        text: String,
        /// Context hint as key=value (repeatable)
        #[arg(long = "hint", value_name = "KEY=VALUE")]
        hints: Vec<String>,
    },
    /// List the entities found in some text
    Extract {
        /// Request text
        text: String,
    },
    /// Show the routing decision without executing it
    Route {
        /// Request text
        text: String,
        /// Operation to route
        #[arg(long, value_enum, default_value_t = OperationArg::Retrieve)]
        operation: OperationArg,
        /// Context hint as key=value (repeatable)
        #[arg(long = "hint", value_name = "KEY=VALUE")]
        hints: Vec<String>,
    },
    /// Store a JSON payload
    Store {
        /// Text describing the payload; derived from the payload when empty
        #[arg(default_value = "")]
        text: String,
        /// Payload as JSON
        #[arg(long, value_name = "JSON")]
        payload: String,
        /// Context hint as key=value (repeatable)
        #[arg(long = "hint", value_name = "KEY=VALUE")]
        hints: Vec<String>,
    },
    /// Retrieve with a JSON query
    Retrieve {
        /// Text describing what is wanted; derived from the query when empty
        #[arg(default_value = "")]
        text: String,
        /// Query as JSON
        #[arg(long, value_name = "JSON")]
        query: String,
        /// Context hint as key=value (repeatable)
        #[arg(long = "hint", value_name = "KEY=VALUE")]
        hints: Vec<String>,
    },
    /// Show the effective configuration and router statistics
    Stats,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OperationArg {
    Store,
    Retrieve,
}

impl From<OperationArg> for Operation {
    fn from(arg: OperationArg) -> Self {
        match arg {
            OperationArg::Store => Operation::Store,
            OperationArg::Retrieve => Operation::Retrieve,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum BackendArg {
    Graph,
    Document,
    #[value(alias = "semantic")]
    SemanticMemory,
}

impl From<BackendArg> for BackendId {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Graph => BackendId::Graph,
            BackendArg::Document => BackendId::Document,
            BackendArg::SemanticMemory => BackendId::SemanticMemory,
        }
    }
}

/// Initialize logging to stderr with the specified level
fn init_logging(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!(
            "memory_router={level},memory_router_core={level}"
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}

/// Parse `key=value` hints; values that are valid JSON keep their type
fn parse_hints(raw: &[String]) -> Result<ContextHints> {
    let mut hints = ContextHints::new();
    for entry in raw {
        let (key, value) = entry
            .split_once('=')
            .with_context(|| format!("Hint '{entry}' is not in key=value form"))?;
        let value = serde_json::from_str::<Value>(value)
            .unwrap_or_else(|_| Value::String(value.to_string()));
        hints.insert(key.trim(), value);
    }
    Ok(hints)
}

fn parse_json(raw: &str, what: &str) -> Result<Value> {
    serde_json::from_str(raw).with_context(|| format!("{what} is not valid JSON"))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Load file and environment configuration, then apply flags
fn load(args: &Args) -> Result<RouterConfig> {
    let path = args.config.clone().or_else(default_config_path);
    let mut loaded = load_config_from_path(path).context("Failed to load configuration")?;

    let mut overrides = ConfigOverrides::new();
    for backend in &args.disabled {
        overrides = overrides.with_backend_disabled((*backend).into());
    }
    if let Some(ms) = args.read_deadline_ms {
        overrides = overrides.with_read_deadline_ms(ms);
    }
    overrides
        .apply(&mut loaded)
        .context("Invalid command-line overrides")?;

    info!(
        source = %loaded.source(),
        path = ?loaded.config_file_path,
        "Configuration ready"
    );
    Ok(loaded.router)
}

/// Build a router over HTTP or in-process adapters
fn build_router(config: RouterConfig, http: bool) -> Result<MemoryRouter> {
    let mut builder = MemoryRouter::builder(config.clone());
    for backend in config.enabled_backends() {
        let adapter: Arc<dyn MemoryBackend> = if http {
            let Some(url) = config.backends.get(backend).url.clone() else {
                warn!(backend = %backend, "No URL configured; backend skipped");
                continue;
            };
            Arc::new(HttpBackend::new(url))
        } else {
            Arc::new(InMemoryBackend::new(backend.as_str()))
        };
        builder = builder.with_adapter(backend, adapter);
    }
    builder.build().context("Failed to build router")
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level);

    let config = load(&args)?;

    match args.command {
        Command::Classify { text, hints } => {
            let hints = parse_hints(&hints)?;
            let entities = EntityExtractor::new().extract(&text);
            let result = IntentClassifier::new(config.confidence_floor).classify_with_entities(
                &text,
                &hints,
                &entities.kinds(),
            );
            print_json(&result)
        }
        Command::Extract { text } => print_json(&EntityExtractor::new().extract(&text)),
        Command::Route {
            text,
            operation,
            hints,
        } => {
            let router = build_router(config, args.http)?;
            let request = RoutingRequest::new(operation.into(), text).with_hints(parse_hints(&hints)?);
            print_json(&router.route(&request))
        }
        Command::Store {
            text,
            payload,
            hints,
        } => {
            let router = build_router(config, args.http)?;
            let payload = parse_json(&payload, "Payload")?;
            let outcome = router
                .store_data(payload, &text, parse_hints(&hints)?)
                .await?;
            print_json(&outcome)
        }
        Command::Retrieve { text, query, hints } => {
            let router = build_router(config, args.http)?;
            let query = parse_json(&query, "Query")?;
            let outcome = router
                .retrieve_data(query, &text, parse_hints(&hints)?)
                .await?;
            print_json(&outcome)
        }
        Command::Stats => {
            let router = build_router(config, args.http)?;
            print_json(&serde_json::json!({
                "config": router.config(),
                "stats": router.stats(),
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hint_values_keep_json_types() {
        let hints = parse_hints(&[
            "is_temporary=true".to_string(),
            "intent=sync_data".to_string(),
            "entity_types=[\"person\"]".to_string(),
        ])
        .unwrap();

        assert!(hints.flag("is_temporary"));
        assert_eq!(hints.str("intent"), Some("sync_data"));
        assert!(hints.get("entity_types").unwrap().is_array());
    }

    #[test]
    fn test_hint_without_equals_is_rejected() {
        assert!(parse_hints(&["oops".to_string()]).is_err());
    }

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from([
            "memory-router",
            "--disable",
            "semantic",
            "route",
            "--operation",
            "store",
            "hello",
        ])
        .unwrap();
        assert_eq!(args.disabled.len(), 1);
        assert!(matches!(
            args.command,
            Command::Route {
                operation: OperationArg::Store,
                ..
            }
        ));
    }

    #[test]
    fn test_in_process_router_builds_from_defaults() {
        let router = build_router(RouterConfig::default(), false).unwrap();
        assert_eq!(router.stats().available_backends.len(), 3);
    }
}
