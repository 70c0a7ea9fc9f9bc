#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use mcp_sync_hub_lib::{AppState, AppType, ApplicationProfile};

/// Isolated HOME for tests that go through default config paths.
pub fn ensure_test_home() -> &'static Path {
    static HOME: OnceLock<PathBuf> = OnceLock::new();
    HOME.get_or_init(|| {
        let base = std::env::temp_dir().join(format!("mcp-sync-hub-test-home-{}", std::process::id()));
        if base.exists() {
            let _ = fs::remove_dir_all(&base);
        }
        fs::create_dir_all(&base).expect("create test home");
        std::env::set_var("HOME", &base);
        std::env::set_var("XDG_CONFIG_HOME", base.join(".config"));
        #[cfg(windows)]
        std::env::set_var("USERPROFILE", &base);
        base
    })
    .as_path()
}

/// Remove everything the previous test left in the test HOME.
pub fn reset_test_fs() {
    let home = ensure_test_home();
    if let Ok(entries) = fs::read_dir(home) {
        for entry in entries.flatten() {
            let path = entry.path();
            let result = if path.is_dir() {
                fs::remove_dir_all(&path)
            } else {
                fs::remove_file(&path)
            };
            if let Err(err) = result {
                eprintln!("failed to clean {}: {}", path.display(), err);
            }
        }
    }
}

/// AppState reading settings from the test HOME.
pub fn create_test_state() -> AppState {
    let home = ensure_test_home();
    AppState::with_settings_path(home.join(".mcp-sync-hub").join("settings.json"))
}

pub fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(path, content).expect("write fixture");
}

pub fn read_json(path: &Path) -> serde_json::Value {
    let text = fs::read_to_string(path).expect("read written file");
    serde_json::from_str(&text).expect("written file is valid JSON")
}

/// Profile for `app` at `dir/<file>`, with `dir` created so it is detected.
pub fn profile_in(dir: &Path, app: AppType, file: &str) -> ApplicationProfile {
    let app_dir = dir.join(app.as_str());
    fs::create_dir_all(&app_dir).expect("create app dir");
    ApplicationProfile::at(app, app_dir.join(file))
}
