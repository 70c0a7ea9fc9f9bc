use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::app_config::{AppType, ConfigFormat, ConfigStructure};
use crate::config::{expand_tilde, home_dir, platform_config_dir};
use crate::settings::AppSettings;

/// An application that may take part in a sync, as seen right now on disk.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationProfile {
    pub app: AppType,
    pub name: String,
    pub config_path: PathBuf,
    pub format: ConfigFormat,
    pub structure: ConfigStructure,
    /// Detection status.
    pub installed: bool,
    /// User filter.
    pub enabled: bool,
}

impl ApplicationProfile {
    /// Profile for `app` reading from `config_path`, detected now and enabled.
    pub fn at(app: AppType, config_path: impl Into<PathBuf>) -> Self {
        let config_path = config_path.into();
        let installed = detect_installed(&config_path);
        Self {
            app,
            name: app.display_name().to_string(),
            config_path,
            format: app.config_format(),
            structure: app.config_structure(),
            installed,
            enabled: true,
        }
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn is_active(&self) -> bool {
        self.installed && self.enabled
    }
}

/// Default location of each application's MCP configuration.
pub fn default_config_path(app: AppType) -> PathBuf {
    let home = home_dir();
    match app {
        AppType::ClaudeDesktop => platform_config_dir()
            .join("Claude")
            .join("claude_desktop_config.json"),
        AppType::ClaudeCode => home.join(".claude.json"),
        AppType::Codex => home.join(".codex").join("config.toml"),
        AppType::Gemini => home.join(".gemini").join("settings.json"),
        AppType::Cursor => home.join(".cursor").join("mcp.json"),
        AppType::VsCode => platform_config_dir()
            .join("Code")
            .join("User")
            .join("settings.json"),
        AppType::AmazonQ => home.join(".aws").join("amazonq").join("mcp.json"),
        AppType::Warp => home.join(".warp").join("mcp_config.json"),
        AppType::ContinueDev => home.join(".continue").join("config.yaml"),
        AppType::Zed => zed_config_dir().join("settings.json"),
        AppType::JetBrainsIdea => jetbrains_settings(platform_config_dir(), "IntelliJIdea"),
        AppType::JetBrainsPhpStorm => jetbrains_settings(platform_config_dir(), "PhpStorm"),
        AppType::JetBrainsWebStorm => jetbrains_settings(platform_config_dir(), "WebStorm"),
        AppType::JetBrainsPyCharm => jetbrains_settings(platform_config_dir(), "PyCharm"),
    }
}

fn zed_config_dir() -> PathBuf {
    if cfg!(target_os = "macos") {
        platform_config_dir().join("Zed")
    } else {
        home_dir().join(".config").join("zed")
    }
}

fn jetbrains_settings(base: PathBuf, product: &str) -> PathBuf {
    base.join("JetBrains").join(product).join("mcp_settings.json")
}

/// Other places an application is known to keep the same configuration
/// (older releases, XDG layouts, community editions, insiders builds).
pub fn alternative_config_paths(app: AppType) -> Vec<PathBuf> {
    let home = home_dir();
    let xdg = home.join(".config");
    let platform = platform_config_dir();
    match app {
        AppType::ClaudeDesktop => vec![xdg.join("claude").join("claude_desktop_config.json")],
        AppType::ClaudeCode => vec![
            xdg.join("claude-code").join("config.json"),
            platform.join("Claude Code").join("config.json"),
        ],
        AppType::Cursor => vec![xdg.join("cursor").join("settings.json")],
        AppType::VsCode => vec![
            xdg.join("Code").join("User").join("settings.json"),
            platform
                .join("Code - Insiders")
                .join("User")
                .join("settings.json"),
        ],
        AppType::AmazonQ => vec![
            home.join(".aws").join("q").join("config.json"),
            platform.join("Amazon Q").join("config.json"),
        ],
        AppType::Warp => vec![
            platform.join("warp").join("mcp_config.json"),
            xdg.join("warp").join("mcp_config.json"),
        ],
        AppType::Zed => vec![
            platform.join("Zed").join("settings.json"),
            xdg.join("zed").join("settings.json"),
        ],
        AppType::JetBrainsIdea => vec![
            jetbrains_settings(xdg.clone(), "IntelliJIdea"),
            jetbrains_settings(platform, "IdeaIC"),
            jetbrains_settings(xdg, "IdeaIC"),
        ],
        AppType::JetBrainsPhpStorm => vec![jetbrains_settings(xdg, "PhpStorm")],
        AppType::JetBrainsWebStorm => vec![jetbrains_settings(xdg, "WebStorm")],
        AppType::JetBrainsPyCharm => vec![
            jetbrains_settings(xdg.clone(), "PyCharm"),
            jetbrains_settings(platform, "PyCharmCE"),
            jetbrains_settings(xdg, "PyCharmCE"),
        ],
        AppType::Codex | AppType::Gemini | AppType::ContinueDev => Vec::new(),
    }
}

/// The default path when its file exists, else the first alternative whose
/// file exists, else the default.
pub fn resolve_config_path(default: PathBuf, alternatives: &[PathBuf]) -> PathBuf {
    if default.is_file() {
        return default;
    }
    alternatives
        .iter()
        .find(|path| path.is_file())
        .cloned()
        .unwrap_or(default)
}

/// Installed when the config file exists or the directory that would hold
/// it does. `~/.claude.json` lives directly in the home directory, so for it
/// only the file itself counts.
fn detect_installed(config_path: &Path) -> bool {
    if config_path.is_file() {
        return true;
    }
    match config_path.parent() {
        Some(parent) if parent == home_dir() => false,
        Some(parent) if !parent.as_os_str().is_empty() => parent.is_dir(),
        _ => false,
    }
}

/// Every known application with detection status and the user's filter
/// applied. Path overrides from settings replace the defaults; otherwise an
/// existing alternative location is used when the default file is absent.
pub fn list_applications(settings: &AppSettings) -> Vec<ApplicationProfile> {
    AppType::ALL
        .iter()
        .map(|&app| {
            let path = settings
                .config_path_overrides
                .get(&app)
                .map(|raw| expand_tilde(raw))
                .unwrap_or_else(|| {
                    resolve_config_path(default_config_path(app), &alternative_config_paths(app))
                });
            let profile = ApplicationProfile::at(app, path);
            let enabled = settings.is_app_enabled(app);
            log::debug!(
                "Detected {}: installed={}, enabled={}, path={}",
                app,
                profile.installed,
                enabled,
                profile.config_path.display()
            );
            profile.with_enabled(enabled)
        })
        .collect()
}
