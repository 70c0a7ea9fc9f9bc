//! mcp-sync-hub - keep MCP server configuration in sync across AI clients

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use mcp_sync_hub_lib::{
    get_app_servers, get_applications, get_source_app, plan_sync, sync_from_source, AppState,
    OutcomeStatus, SyncResult,
};

#[derive(Parser)]
#[command(name = "mcp-sync-hub", version)]
#[command(about = "Sync MCP server definitions from one application to the others")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List known applications with detection status
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the MCP servers configured in one application
    Show {
        /// Application id (e.g. claude-code, codex, vscode)
        app: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Preview what a sync would change, without writing
    Plan {
        /// Source of truth (defaults to sourceApp from settings)
        #[arg(long)]
        source: Option<String>,

        /// Remove servers the source does not have
        #[arg(long)]
        prune: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Push the source's servers to every other enabled application
    Sync {
        /// Source of truth (defaults to sourceApp from settings)
        #[arg(long)]
        source: Option<String>,

        /// Remove servers the source does not have
        #[arg(long)]
        prune: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let state = AppState::new();

    match cli.command {
        Commands::List { json } => {
            let apps = get_applications(&state).await.map_err(|e| anyhow!(e))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&apps)?);
                return Ok(());
            }
            for status in apps {
                let detail = match (&status.server_count, &status.error) {
                    (Some(count), _) => format!("{count} servers"),
                    (None, Some(err)) => format!("error: {err}"),
                    (None, None) => "-".to_string(),
                };
                println!(
                    "{:<16} {:<10} {:<9} {:<24} {}",
                    status.profile.app.as_str(),
                    if status.profile.installed { "installed" } else { "missing" },
                    if status.profile.enabled { "enabled" } else { "disabled" },
                    detail,
                    status.profile.config_path.display()
                );
            }
        }
        Commands::Show { app, json } => {
            let registry = get_app_servers(&state, app).await.map_err(|e| anyhow!(e))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&registry)?);
            } else if registry.is_empty() {
                println!("No MCP servers configured.");
            } else {
                for server in registry.iter() {
                    let flag = if server.enabled { "" } else { " (disabled)" };
                    println!("{}{}: {} {}", server.id, flag, server.command, server.args.join(" "));
                    for (key, value) in &server.env {
                        println!("    {key}={value}");
                    }
                }
            }
        }
        Commands::Plan {
            source,
            prune,
            json,
        } => {
            let source = resolve_source(&state, source)?;
            let result = plan_sync(&state, source, prune.then_some(true))
                .await
                .map_err(|e| anyhow!(e))?;
            report(&result, json)?;
        }
        Commands::Sync {
            source,
            prune,
            json,
        } => {
            let source = resolve_source(&state, source)?;
            let result = sync_from_source(&state, source, prune.then_some(true))
                .await
                .map_err(|e| anyhow!(e))?;
            report(&result, json)?;
            if result.failed_count() > 0 {
                bail!("{} application(s) failed to sync", result.failed_count());
            }
        }
    }

    Ok(())
}

fn resolve_source(state: &AppState, source: Option<String>) -> Result<String> {
    if let Some(source) = source {
        return Ok(source);
    }
    get_source_app(state)
        .map_err(|e| anyhow!(e))
        .context("Failed to read settings")?
        .map(|app| app.as_str().to_string())
        .ok_or_else(|| anyhow!("No source given: pass --source or set sourceApp in settings"))
}

fn report(result: &SyncResult, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }

    println!("{}", result.summary());
    for outcome in &result.outcomes {
        match &outcome.status {
            OutcomeStatus::Synced {
                added,
                updated,
                removed,
                conflicts,
                written,
            } => {
                for id in conflicts {
                    println!(
                        "  {:<16} ! {id} kept as is: the existing entry cannot be synced",
                        outcome.app.as_str()
                    );
                }
                if added.is_empty() && updated.is_empty() && removed.is_empty() {
                    println!("  {:<16} up to date", outcome.app.as_str());
                    continue;
                }
                println!(
                    "  {:<16} +{} ~{} -{}{}",
                    outcome.app.as_str(),
                    added.len(),
                    updated.len(),
                    removed.len(),
                    if *written { "" } else { " (not written)" }
                );
                for id in added {
                    println!("      + {id}");
                }
                for id in updated {
                    println!("      ~ {id}");
                }
                for id in removed {
                    println!("      - {id}");
                }
            }
            OutcomeStatus::Skipped { kind, message } => {
                println!("  {:<16} skipped ({kind}): {message}", outcome.app.as_str());
            }
            OutcomeStatus::Failed { kind, message } => {
                println!("  {:<16} FAILED ({kind}): {message}", outcome.app.as_str());
            }
        }
    }
    Ok(())
}
