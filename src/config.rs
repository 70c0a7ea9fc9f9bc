use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::AppError;

/// User home directory; falls back to the working directory when unknown.
pub fn home_dir() -> PathBuf {
    match dirs::home_dir() {
        Some(home) => home,
        None => {
            log::warn!("Unable to resolve the home directory, using the working directory");
            PathBuf::from(".")
        }
    }
}

/// Platform config directory (`~/Library/Application Support`, `~/.config`, `%APPDATA%`).
pub fn platform_config_dir() -> PathBuf {
    dirs::config_dir().unwrap_or_else(|| home_dir().join(".config"))
}

/// Application data directory (~/.mcp-sync-hub)
pub fn get_app_config_dir() -> PathBuf {
    home_dir().join(".mcp-sync-hub")
}

/// Expand a leading `~` against the home directory.
pub fn expand_tilde(raw: &str) -> PathBuf {
    let trimmed = raw.trim();
    if trimmed == "~" {
        return home_dir();
    }
    if let Some(rest) = trimmed
        .strip_prefix("~/")
        .or_else(|| trimmed.strip_prefix("~\\"))
    {
        return home_dir().join(rest);
    }
    PathBuf::from(trimmed)
}

/// Read a JSON file into `T`.
pub fn read_json_file<T: for<'a> Deserialize<'a>>(path: &Path) -> Result<T, AppError> {
    if !path.exists() {
        return Err(AppError::Config(format!("File does not exist: {}", path.display())));
    }

    let content = fs::read_to_string(path).map_err(|e| AppError::io(path, e))?;

    serde_json::from_str(&content).map_err(|e| AppError::json(path, e))
}

/// Write `data` as pretty JSON, atomically.
pub fn write_json_file<T: Serialize>(path: &Path, data: &T) -> Result<(), AppError> {
    let mut json =
        serde_json::to_string_pretty(data).map_err(|e| AppError::JsonSerialize { source: e })?;
    json.push('\n');

    atomic_write(path, json.as_bytes())
}

/// Atomic write for TOML/YAML/plain text.
pub fn write_text_file(path: &Path, data: &str) -> Result<(), AppError> {
    atomic_write(path, data.as_bytes())
}

/// Atomic write: the data goes to a temp file in the same directory which is
/// then renamed over the target, so readers see either the old or the new file.
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<(), AppError> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .ok_or_else(|| AppError::Config(format!("Invalid path: {}", path.display())))?;
    fs::create_dir_all(parent).map_err(|e| AppError::io(parent, e))?;

    let mut tmp = tempfile::Builder::new()
        .prefix(".mcp-sync-hub.")
        .suffix(".tmp")
        .tempfile_in(parent)
        .map_err(|e| AppError::io(parent, e))?;

    tmp.write_all(data).map_err(|e| AppError::io(tmp.path(), e))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| AppError::io(tmp.path(), e))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Ok(meta) = fs::metadata(path) {
            let perm = meta.permissions().mode();
            let _ = fs::set_permissions(tmp.path(), fs::Permissions::from_mode(perm));
        }
    }

    tmp.persist(path).map_err(|e| {
        let context = format!("Atomic replace failed: {}", path.display());
        if e.error.kind() == std::io::ErrorKind::PermissionDenied {
            AppError::PermissionDenied {
                path: path.display().to_string(),
                source: e.error,
            }
        } else {
            AppError::IoContext {
                context,
                source: e.error,
            }
        }
    })?;
    Ok(())
}

/// Read a file that may not exist yet.
pub fn read_optional_text(path: &Path) -> Result<Option<String>, AppError> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(AppError::io(path, err)),
    }
}
