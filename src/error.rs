use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::PoisonError;
use std::time::Duration;
use thiserror::Error;

use crate::app_config::AppType;

/// Failure category recorded per application in a sync report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FailureKind {
    NotFound,
    ParseError,
    PermissionDenied,
    IoError,
    Timeout,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::NotFound => "notFound",
            FailureKind::ParseError => "parseError",
            FailureKind::PermissionDenied => "permissionDenied",
            FailureKind::IoError => "ioError",
            FailureKind::Timeout => "timeout",
        }
    }

    /// Read-side failures skip the target instead of failing it.
    pub fn is_skip(&self) -> bool {
        matches!(self, FailureKind::NotFound | FailureKind::ParseError)
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("IO error: {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{context}: {source}")]
    IoContext {
        context: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Permission denied: {path}: {source}")]
    PermissionDenied {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON parse error: {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("JSON serialize error: {source}")]
    JsonSerialize {
        #[source]
        source: serde_json::Error,
    },
    #[error("Parse error: {path}: {message}")]
    Parse { path: String, message: String },
    #[error("MCP validation failed: {0}")]
    McpValidation(String),
    #[error("{app} is not installed: {path}")]
    NotFound { app: AppType, path: String },
    #[error("{app} cannot be used as the source of truth: {reason}")]
    InvalidSource { app: AppType, reason: String },
    #[error("Another sync is already running")]
    SyncInProgress,
    #[error("{app} did not respond within {timeout:?}")]
    Timeout { app: AppType, timeout: Duration },
    #[error("Lock poisoned: {0}")]
    Lock(String),
    #[error("{0}")]
    Message(String),
}

impl AppError {
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        let path = path.as_ref().display().to_string();
        if source.kind() == std::io::ErrorKind::PermissionDenied {
            Self::PermissionDenied { path, source }
        } else {
            Self::Io { path, source }
        }
    }

    pub fn json(path: impl AsRef<Path>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.as_ref().display().to_string(),
            source,
        }
    }

    pub fn parse(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.as_ref().display().to_string(),
            message: message.into(),
        }
    }

    pub fn not_found(app: AppType, path: &Path) -> Self {
        Self::NotFound {
            app,
            path: path.display().to_string(),
        }
    }

    /// Category this error is reported under in a `SyncResult`.
    pub fn kind(&self) -> FailureKind {
        match self {
            AppError::NotFound { .. } => FailureKind::NotFound,
            AppError::Json { .. } | AppError::Parse { .. } | AppError::McpValidation(_) => {
                FailureKind::ParseError
            }
            AppError::PermissionDenied { .. } => FailureKind::PermissionDenied,
            AppError::Timeout { .. } => FailureKind::Timeout,
            _ => FailureKind::IoError,
        }
    }
}

impl<T> From<PoisonError<T>> for AppError {
    fn from(err: PoisonError<T>) -> Self {
        Self::Lock(err.to_string())
    }
}
