mod app_config;
mod commands;
mod config;
mod error;
pub mod mcp;
mod profiles;
mod services;
mod settings;
mod store;

pub use app_config::{AppType, ConfigFormat, ConfigStructure};
pub use commands::*;
pub use config::{atomic_write, expand_tilde, get_app_config_dir, read_json_file, write_json_file};
pub use error::{AppError, FailureKind};
pub use mcp::{
    diff_registries, store_for, CodexTomlStore, ConfigStore, ContinueYamlStore, JsonStore,
    McpServerConfig, ServerField, ServerRegistry, ServerUpdate, SyncPlan,
};
pub use profiles::{
    alternative_config_paths, default_config_path, list_applications, resolve_config_path,
    ApplicationProfile,
};
pub use services::{
    AppSyncOutcome, OutcomeStatus, StoreFactory, SyncOptions, SyncResult, SyncService,
};
pub use settings::AppSettings;
pub use store::AppState;
