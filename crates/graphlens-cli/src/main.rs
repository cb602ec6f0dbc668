use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr};
use graphlens_core::config::DEFAULT_DATABASE;
use graphlens_core::{tool_specs, Config, DatabaseContext, GraphSnapshot, MemoryServer, QueryEngine};
use serde_json::Value;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "graphlens")]
#[command(about = "Structural queries over a code knowledge graph", long_about = None)]
struct Cli {
    /// Tenant database to query (overrides the configured tenant)
    #[arg(long, global = true)]
    tenant: Option<String>,

    /// Config file to use instead of graphlens.toml / the user config
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Query a JSON graph snapshot in memory instead of SurrealDB
    #[arg(long, global = true)]
    snapshot: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the tool descriptions as JSON
    Tools,
    /// Invoke a tool and print its result envelope
    Call {
        /// Tool name, e.g. find_callers
        tool: String,
        /// Tool arguments as a JSON object
        #[arg(long, default_value = "{}")]
        args: String,
    },
    /// Check connectivity and tenant activation
    Health,
    /// Print the default configuration file
    Config,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    color_eyre::install()?;
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Tools => {
            println!("{}", serde_json::to_string_pretty(&tool_specs())?);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Config => {
            print!("{}", Config::default_config_string());
            Ok(ExitCode::SUCCESS)
        }
        Commands::Call { tool, args } => {
            let arguments: Value =
                serde_json::from_str(&args).wrap_err("--args must be valid JSON")?;

            let engine = open_engine(cli.config.as_deref(), cli.snapshot.as_deref(), cli.tenant.as_deref()).await?;
            let envelope = engine.call_tool(&tool, arguments).await;
            println!("{}", serde_json::to_string_pretty(&envelope)?);
            engine.close().await?;

            Ok(if envelope.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Commands::Health => {
            let engine = open_engine(cli.config.as_deref(), cli.snapshot.as_deref(), cli.tenant.as_deref()).await?;
            let report = engine.health().await;
            println!("{}", serde_json::to_string_pretty(&report)?);
            engine.close().await?;

            Ok(if report.is_healthy() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}

/// Logs go to stderr so stdout stays parseable JSON.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

async fn open_engine(config_path: Option<&Path>, snapshot: Option<&Path>, tenant: Option<&str>) -> Result<QueryEngine> {
    let config = match config_path {
        Some(path) => Config::from_file(path)
            .wrap_err_with(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::load().wrap_err("Failed to load configuration")?,
    };

    let Some(snapshot) = snapshot else {
        return Ok(QueryEngine::connect(&config, tenant).await?);
    };

    let graph = GraphSnapshot::from_json_file(snapshot)
        .wrap_err_with(|| format!("Failed to load snapshot {}", snapshot.display()))?;
    let tenant = config.database.resolve_tenant(tenant);

    let server = MemoryServer::new();
    server.insert_database(tenant.as_deref().unwrap_or(DEFAULT_DATABASE), graph);

    let context = DatabaseContext::bind(
        Arc::new(server.connect()),
        tenant.as_deref(),
        config.database.query_timeout(),
    )
    .await?;
    Ok(QueryEngine::new(context, config.query.clone()))
}
