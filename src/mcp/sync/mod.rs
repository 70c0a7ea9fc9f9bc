// ============================================================================
// MCP Sync Module - native config store per application family
// ============================================================================

use std::path::Path;
use std::sync::Arc;

use crate::app_config::{AppType, ConfigFormat};
use crate::config::read_optional_text;
use crate::error::AppError;
use crate::profiles::ApplicationProfile;

use super::ServerRegistry;

mod codex;
mod continue_dev;
mod json_store;

pub use codex::CodexTomlStore;
pub use continue_dev::ContinueYamlStore;
pub use json_store::JsonStore;

/// Read/write access to one application's MCP servers in its native file.
///
/// `write` replaces the servers the registry models and nothing else: other
/// top-level keys, unknown per-server fields and entries the model cannot
/// express survive. Writes go through a temp file and a rename.
pub trait ConfigStore: Send + Sync {
    fn app(&self) -> AppType;

    fn config_path(&self) -> &Path;

    /// Fails with `NotFound` when the application is not installed and with
    /// a parse error when the file is malformed.
    fn read(&self) -> Result<ServerRegistry, AppError>;

    /// Fails with `PermissionDenied` or an IO error; the file is then left
    /// as it was.
    fn write(&self, registry: &ServerRegistry) -> Result<(), AppError>;
}

/// Pick the store implementation for a profile's native format.
pub fn store_for(profile: &ApplicationProfile) -> Arc<dyn ConfigStore> {
    match profile.format {
        ConfigFormat::Json => Arc::new(JsonStore::new(
            profile.app,
            profile.config_path.clone(),
            profile.structure,
        )),
        ConfigFormat::Toml => Arc::new(CodexTomlStore::new(profile.app, profile.config_path.clone())),
        ConfigFormat::Yaml => Arc::new(ContinueYamlStore::new(
            profile.app,
            profile.config_path.clone(),
        )),
    }
}

/// Current file text, `None` for a file that does not exist yet but whose
/// directory does. A missing directory means the application is absent.
pub(crate) fn read_native_text(app: AppType, path: &Path) -> Result<Option<String>, AppError> {
    let text = read_optional_text(path)?;
    if text.is_none() {
        let has_dir = path
            .parent()
            .map(|p| p.as_os_str().is_empty() || p.is_dir())
            .unwrap_or(false);
        if !has_dir {
            return Err(AppError::not_found(app, path));
        }
    }
    Ok(text.filter(|t| !t.trim().is_empty()))
}
