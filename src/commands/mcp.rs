use serde::Serialize;
use std::str::FromStr;

use crate::app_config::AppType;
use crate::mcp::ServerRegistry;
use crate::profiles::{self, ApplicationProfile};
use crate::services::{SyncOptions, SyncResult};
use crate::store::AppState;

/// A detected application with the number of servers it currently holds.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationStatus {
    #[serde(flatten)]
    pub profile: ApplicationProfile,
    pub server_count: Option<usize>,
    pub error: Option<String>,
}

/// All known applications, reading the server list of each installed one.
pub async fn get_applications(state: &AppState) -> Result<Vec<ApplicationStatus>, String> {
    let settings = state.load_settings().map_err(|e| e.to_string())?;
    let timeout = settings.target_timeout();

    let mut statuses = Vec::new();
    for profile in profiles::list_applications(&settings) {
        let (server_count, error) = if profile.installed {
            match state.sync.read_registry(&profile, timeout).await {
                Ok(registry) => (Some(registry.len()), None),
                Err(err) => (None, Some(err.to_string())),
            }
        } else {
            (None, None)
        };
        statuses.push(ApplicationStatus {
            profile,
            server_count,
            error,
        });
    }
    Ok(statuses)
}

/// MCP servers currently configured in one application.
pub async fn get_app_servers(state: &AppState, app: String) -> Result<ServerRegistry, String> {
    let app_ty = AppType::from_str(&app).map_err(|e| e.to_string())?;
    let settings = state.load_settings().map_err(|e| e.to_string())?;
    let profile = profiles::list_applications(&settings)
        .into_iter()
        .find(|p| p.app == app_ty)
        .ok_or_else(|| format!("No profile for {app_ty}"))?;
    state
        .sync
        .read_registry(&profile, settings.target_timeout())
        .await
        .map_err(|e| e.to_string())
}

/// Source of truth saved in settings, if any.
pub fn get_source_app(state: &AppState) -> Result<Option<AppType>, String> {
    state
        .load_settings()
        .map(|settings| settings.source_app)
        .map_err(|e| e.to_string())
}

/// Push `source`'s servers to every other active application.
///
/// `prune` overrides the saved `pruneExtraneous` setting for this call.
pub async fn sync_from_source(
    state: &AppState,
    source: String,
    prune: Option<bool>,
) -> Result<SyncResult, String> {
    run_sync(state, &source, prune, false).await
}

/// Same as [`sync_from_source`] without writing anything.
pub async fn plan_sync(
    state: &AppState,
    source: String,
    prune: Option<bool>,
) -> Result<SyncResult, String> {
    run_sync(state, &source, prune, true).await
}

async fn run_sync(
    state: &AppState,
    source: &str,
    prune: Option<bool>,
    dry_run: bool,
) -> Result<SyncResult, String> {
    let source = AppType::from_str(source).map_err(|e| e.to_string())?;
    let settings = state.load_settings().map_err(|e| e.to_string())?;
    let options = SyncOptions::from_settings(&settings)
        .with_prune(prune.unwrap_or(settings.prune_extraneous))
        .with_dry_run(dry_run);
    let applications = profiles::list_applications(&settings);

    state
        .sync
        .sync_from_source(source, &applications, options)
        .await
        .map_err(|e| e.to_string())
}
