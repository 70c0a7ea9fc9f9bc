use std::path::PathBuf;
use std::sync::Arc;

use crate::error::AppError;
use crate::services::SyncService;
use crate::settings::AppSettings;

/// State shared by every command.
pub struct AppState {
    pub sync: Arc<SyncService>,
    pub settings_path: PathBuf,
}

impl AppState {
    pub fn new() -> Self {
        Self::with_settings_path(AppSettings::settings_path())
    }

    pub fn with_settings_path(settings_path: impl Into<PathBuf>) -> Self {
        Self {
            sync: Arc::new(SyncService::new()),
            settings_path: settings_path.into(),
        }
    }

    pub fn with_sync_service(mut self, sync: SyncService) -> Self {
        self.sync = Arc::new(sync);
        self
    }

    /// Settings as currently saved; defaults when the file does not exist.
    pub fn load_settings(&self) -> Result<AppSettings, AppError> {
        AppSettings::load_from(&self.settings_path)
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
