use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::AppError;

/// Applications whose MCP server configuration can be synced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AppType {
    ClaudeDesktop,
    ClaudeCode,
    Codex,
    Gemini,
    Cursor,
    #[serde(rename = "vscode")]
    VsCode,
    AmazonQ,
    Warp,
    ContinueDev,
    Zed,
    #[serde(rename = "jetbrains-idea")]
    JetBrainsIdea,
    #[serde(rename = "jetbrains-phpstorm")]
    JetBrainsPhpStorm,
    #[serde(rename = "jetbrains-webstorm")]
    JetBrainsWebStorm,
    #[serde(rename = "jetbrains-pycharm")]
    JetBrainsPyCharm,
}

impl AppType {
    pub const ALL: [AppType; 14] = [
        AppType::ClaudeDesktop,
        AppType::ClaudeCode,
        AppType::Codex,
        AppType::Gemini,
        AppType::Cursor,
        AppType::VsCode,
        AppType::AmazonQ,
        AppType::Warp,
        AppType::ContinueDev,
        AppType::Zed,
        AppType::JetBrainsIdea,
        AppType::JetBrainsPhpStorm,
        AppType::JetBrainsWebStorm,
        AppType::JetBrainsPyCharm,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AppType::ClaudeDesktop => "claude-desktop",
            AppType::ClaudeCode => "claude-code",
            AppType::Codex => "codex",
            AppType::Gemini => "gemini",
            AppType::Cursor => "cursor",
            AppType::VsCode => "vscode",
            AppType::AmazonQ => "amazon-q",
            AppType::Warp => "warp",
            AppType::ContinueDev => "continue-dev",
            AppType::Zed => "zed",
            AppType::JetBrainsIdea => "jetbrains-idea",
            AppType::JetBrainsPhpStorm => "jetbrains-phpstorm",
            AppType::JetBrainsWebStorm => "jetbrains-webstorm",
            AppType::JetBrainsPyCharm => "jetbrains-pycharm",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            AppType::ClaudeDesktop => "Claude Desktop",
            AppType::ClaudeCode => "Claude Code",
            AppType::Codex => "Codex",
            AppType::Gemini => "Gemini CLI",
            AppType::Cursor => "Cursor",
            AppType::VsCode => "Visual Studio Code",
            AppType::AmazonQ => "Amazon Q Developer",
            AppType::Warp => "Warp",
            AppType::ContinueDev => "Continue.dev",
            AppType::Zed => "Zed",
            AppType::JetBrainsIdea => "IntelliJ IDEA",
            AppType::JetBrainsPhpStorm => "PhpStorm",
            AppType::JetBrainsWebStorm => "WebStorm",
            AppType::JetBrainsPyCharm => "PyCharm",
        }
    }

    pub fn config_format(&self) -> ConfigFormat {
        match self {
            AppType::Codex => ConfigFormat::Toml,
            AppType::ContinueDev => ConfigFormat::Yaml,
            _ => ConfigFormat::Json,
        }
    }

    pub fn config_structure(&self) -> ConfigStructure {
        match self {
            AppType::VsCode
            | AppType::Warp
            | AppType::JetBrainsIdea
            | AppType::JetBrainsPhpStorm
            | AppType::JetBrainsWebStorm
            | AppType::JetBrainsPyCharm => ConfigStructure::NestedMcpServers,
            _ => ConfigStructure::DirectMcpServers,
        }
    }
}

impl std::fmt::Display for AppType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('_', "-");
        match normalized.as_str() {
            "claude-desktop" | "claude" => Ok(AppType::ClaudeDesktop),
            "claude-code" => Ok(AppType::ClaudeCode),
            "codex" => Ok(AppType::Codex),
            "gemini" | "gemini-cli" => Ok(AppType::Gemini),
            "cursor" => Ok(AppType::Cursor),
            "vscode" | "code" => Ok(AppType::VsCode),
            "amazon-q" | "amazonq" | "q" => Ok(AppType::AmazonQ),
            "warp" => Ok(AppType::Warp),
            "continue-dev" | "continue" => Ok(AppType::ContinueDev),
            "zed" => Ok(AppType::Zed),
            "jetbrains-idea" | "intellij" | "intellij-idea" | "idea" => Ok(AppType::JetBrainsIdea),
            "jetbrains-phpstorm" | "phpstorm" => Ok(AppType::JetBrainsPhpStorm),
            "jetbrains-webstorm" | "webstorm" => Ok(AppType::JetBrainsWebStorm),
            "jetbrains-pycharm" | "pycharm" => Ok(AppType::JetBrainsPyCharm),
            other => {
                let allowed: Vec<&str> = AppType::ALL.iter().map(|a| a.as_str()).collect();
                Err(AppError::InvalidInput(format!(
                    "Unsupported app id: '{other}'. Allowed: {}.",
                    allowed.join(", ")
                )))
            }
        }
    }
}

/// On-disk format of an application's config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigFormat {
    Json,
    Toml,
    Yaml,
}

/// Where the MCP server section lives inside a JSON config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigStructure {
    /// `{"mcpServers": {...}}`
    DirectMcpServers,
    /// `{"mcp": {"servers": {...}}}`
    NestedMcpServers,
}

impl ConfigStructure {
    pub fn key_path(&self) -> &'static [&'static str] {
        match self {
            ConfigStructure::DirectMcpServers => &["mcpServers"],
            ConfigStructure::NestedMcpServers => &["mcp", "servers"],
        }
    }

    /// Reject a document that keeps its servers under the other structure.
    ///
    /// Writing into the declared path would otherwise leave two competing
    /// server sections in the same file.
    pub fn validate(&self, app: AppType, root: &serde_json::Value) -> Result<(), String> {
        let has_direct = root.get("mcpServers").is_some();
        let has_nested = root.get("mcp").and_then(|m| m.get("servers")).is_some();

        match self {
            ConfigStructure::DirectMcpServers if !has_direct && has_nested => Err(format!(
                "{} is configured for mcpServers but the file uses mcp.servers",
                app.display_name()
            )),
            ConfigStructure::NestedMcpServers if !has_nested && has_direct => Err(format!(
                "{} is configured for mcp.servers but the file uses mcpServers",
                app.display_name()
            )),
            _ => Ok(()),
        }
    }
}
