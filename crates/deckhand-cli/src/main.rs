// crates/deckhand-cli/src/main.rs
// ============================================================================
// Module: Deckhand CLI Entry Point
// Description: Command dispatcher for serving and calling the Deckhand API.
// Purpose: Provide a safe, localized CLI for the server and the RPC client.
// Dependencies: clap, deckhand-core, deckhand-server, serde_json, tokio
// ============================================================================

//! ## Overview
//! The Deckhand CLI starts the line-framed TCP server (`serve`) and invokes
//! methods on a running server (`api`). The `serve` command hosts the
//! in-memory game session; embedding the dispatcher inside a real game
//! process uses the library crates directly.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use deckhand_cli::ClientError;
use deckhand_cli::RpcClient;
use deckhand_core::GameSession;
use deckhand_server::ApiServer;
use deckhand_server::DeckhandConfig;
use deckhand_server::InMemoryGame;
use deckhand_server::NoopMetrics;
use deckhand_server::server::build_audit_sink;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "deckhand", version, arg_required_else_help = true)]
struct Cli {
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the Deckhand TCP server with the in-memory game session.
    Serve(ServeCommand),
    /// Call an API method on a running server.
    Api(ApiCommand),
}

/// Configuration for the `serve` command.
#[derive(Args, Debug)]
struct ServeCommand {
    /// Optional config file path (defaults to deckhand.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Bind host override.
    #[arg(long, value_name = "HOST")]
    host: Option<String>,
    /// Bind port override.
    #[arg(long, value_name = "PORT")]
    port: Option<u16>,
}

/// Configuration for the `api` command.
#[derive(Args, Debug)]
struct ApiCommand {
    /// API method to call.
    method: String,
    /// JSON params object.
    #[arg(default_value = "{}")]
    params: String,
    /// Server hostname.
    #[arg(long, default_value = "127.0.0.1")]
    host: String,
    /// Server port.
    #[arg(long, default_value_t = 12346)]
    port: u16,
    /// Per-call timeout in seconds.
    #[arg(long, default_value_t = 30)]
    timeout: u64,
}

// ============================================================================
// SECTION: Entry Point
// ============================================================================

fn main() -> ExitCode {
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Serve(command) => run_serve(&command),
        Commands::Api(command) => run_api(&command),
    };
    match result {
        Ok(code) => code,
        Err(message) => {
            let _ = writeln!(std::io::stderr(), "Error: {message}");
            ExitCode::FAILURE
        }
    }
}

/// Runs the `serve` subcommand.
fn run_serve(command: &ServeCommand) -> Result<ExitCode, String> {
    let mut config =
        DeckhandConfig::load(command.config.as_deref()).map_err(|err| err.to_string())?;
    if let Some(host) = &command.host {
        config.server.host.clone_from(host);
    }
    if let Some(port) = command.port {
        config.server.port = port;
    }
    config.validate().map_err(|err| err.to_string())?;
    let audit = build_audit_sink(&config.audit).map_err(|err| err.to_string())?;
    let game: Arc<dyn GameSession> = Arc::new(InMemoryGame::new());
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_io()
        .enable_time()
        .build()
        .map_err(|err| err.to_string())?;
    runtime.block_on(async move {
        let server = ApiServer::bind(&config, game, Arc::new(NoopMetrics), audit)
            .await
            .map_err(|err| err.to_string())?;
        let addr = server.local_addr().map_err(|err| err.to_string())?;
        let _ = writeln!(std::io::stderr(), "deckhand listening on {addr}");
        server.serve().await.map_err(|err| err.to_string())
    })?;
    Ok(ExitCode::SUCCESS)
}

/// Runs the `api` subcommand.
fn run_api(command: &ApiCommand) -> Result<ExitCode, String> {
    let params: serde_json::Value = serde_json::from_str(&command.params)
        .map_err(|err| format!("Invalid JSON params - {err}"))?;
    if !params.is_object() {
        return Err("Invalid JSON params - must be an object".to_string());
    }
    let mut client = RpcClient::new(
        command.host.clone(),
        command.port,
        Duration::from_secs(command.timeout),
    );
    match client.call(&command.method, params) {
        Ok(result) => {
            let rendered =
                serde_json::to_string_pretty(&result).map_err(|err| err.to_string())?;
            let _ = writeln!(std::io::stdout(), "{rendered}");
            Ok(ExitCode::SUCCESS)
        }
        Err(ClientError::Api(api)) => {
            let _ = writeln!(std::io::stderr(), "Error: {} - {}", api.name, api.message);
            Ok(ExitCode::FAILURE)
        }
        Err(err) => Err(format!("Connection failed - {err}")),
    }
}
