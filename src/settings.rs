use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::app_config::AppType;
use crate::config::{get_app_config_dir, read_json_file, write_json_file};
use crate::error::AppError;

const DEFAULT_TARGET_TIMEOUT_SECS: u64 = 10;
const MIN_TARGET_TIMEOUT_SECS: u64 = 1;
const MAX_TARGET_TIMEOUT_SECS: u64 = 120;

/// User configuration for syncing.
///
/// Loaded explicitly and handed to detection and to the sync call; nothing in
/// the crate reads it from global state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    /// Application whose servers are authoritative.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_app: Option<AppType>,
    /// Applications allowed to take part; `None` means all of them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled_apps: Option<Vec<AppType>>,
    /// Remove target servers the source does not have. Off unless the user
    /// opts in, since it deletes hand-added entries.
    #[serde(default)]
    pub prune_extraneous: bool,
    #[serde(default = "default_target_timeout_secs")]
    pub target_timeout_secs: u64,
    /// Replacement config file paths; `~` is expanded.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub config_path_overrides: HashMap<AppType, String>,
}

fn default_target_timeout_secs() -> u64 {
    DEFAULT_TARGET_TIMEOUT_SECS
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            source_app: None,
            enabled_apps: None,
            prune_extraneous: false,
            target_timeout_secs: DEFAULT_TARGET_TIMEOUT_SECS,
            config_path_overrides: HashMap::new(),
        }
    }
}

impl AppSettings {
    pub fn settings_path() -> PathBuf {
        get_app_config_dir().join("settings.json")
    }

    fn normalize(&mut self) {
        self.target_timeout_secs = self
            .target_timeout_secs
            .clamp(MIN_TARGET_TIMEOUT_SECS, MAX_TARGET_TIMEOUT_SECS);

        self.config_path_overrides = self
            .config_path_overrides
            .drain()
            .map(|(app, raw)| (app, raw.trim().to_string()))
            .filter(|(_, raw)| !raw.is_empty())
            .collect();

        if let Some(apps) = self.enabled_apps.as_mut() {
            apps.sort();
            apps.dedup();
        }
    }

    /// Load from `path`; a missing file yields defaults, a malformed one is an error.
    pub fn load_from(path: &Path) -> Result<Self, AppError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let mut settings: AppSettings = read_json_file(path)?;
        settings.normalize();
        Ok(settings)
    }

    /// Load from ~/.mcp-sync-hub/settings.json, falling back to defaults on error.
    pub fn load() -> Self {
        let path = Self::settings_path();
        match Self::load_from(&path) {
            Ok(settings) => settings,
            Err(err) => {
                log::warn!("Failed to load {}: {err}, using defaults", path.display());
                Self::default()
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<(), AppError> {
        let mut normalized = self.clone();
        normalized.normalize();
        write_json_file(path, &normalized)
    }

    pub fn save(&self) -> Result<(), AppError> {
        self.save_to(&Self::settings_path())
    }

    pub fn is_app_enabled(&self, app: AppType) -> bool {
        self.enabled_apps
            .as_ref()
            .map(|apps| apps.contains(&app))
            .unwrap_or(true)
    }

    pub fn target_timeout(&self) -> Duration {
        Duration::from_secs(
            self.target_timeout_secs
                .clamp(MIN_TARGET_TIMEOUT_SECS, MAX_TARGET_TIMEOUT_SECS),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = AppSettings::load_from(&dir.path().join("settings.json")).unwrap();
        assert_eq!(settings, AppSettings::default());
        assert!(!settings.prune_extraneous);
        assert!(settings.is_app_enabled(AppType::Warp));
    }

    #[test]
    fn save_and_load_normalizes_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let settings = AppSettings {
            source_app: Some(AppType::ClaudeCode),
            enabled_apps: Some(vec![AppType::Codex, AppType::ClaudeCode, AppType::Codex]),
            prune_extraneous: true,
            target_timeout_secs: 0,
            config_path_overrides: HashMap::from([
                (AppType::Codex, "  ~/codex/config.toml ".to_string()),
                (AppType::Warp, "   ".to_string()),
            ]),
        };
        settings.save_to(&path).unwrap();

        let loaded = AppSettings::load_from(&path).unwrap();
        assert_eq!(loaded.source_app, Some(AppType::ClaudeCode));
        assert_eq!(
            loaded.enabled_apps,
            Some(vec![AppType::ClaudeCode, AppType::Codex])
        );
        assert_eq!(loaded.target_timeout_secs, MIN_TARGET_TIMEOUT_SECS);
        assert_eq!(
            loaded.config_path_overrides.get(&AppType::Codex).map(String::as_str),
            Some("~/codex/config.toml")
        );
        assert!(!loaded.config_path_overrides.contains_key(&AppType::Warp));
    }

    #[test]
    fn settings_file_uses_camel_case_and_app_ids() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            json!({
                "sourceApp": "claude-desktop",
                "enabledApps": ["cursor", "vscode"],
                "pruneExtraneous": true
            })
            .to_string(),
        )
        .unwrap();

        let loaded = AppSettings::load_from(&path).unwrap();
        assert_eq!(loaded.source_app, Some(AppType::ClaudeDesktop));
        assert!(loaded.is_app_enabled(AppType::VsCode));
        assert!(!loaded.is_app_enabled(AppType::Codex));
        assert!(loaded.prune_extraneous);
        assert_eq!(loaded.target_timeout(), Duration::from_secs(10));
    }
}
