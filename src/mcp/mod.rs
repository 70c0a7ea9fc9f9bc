// ============================================================================
// MCP Module - server model, registry diffing and native config stores
// ============================================================================

mod diff;
pub(crate) mod json_entry;
mod server;
pub mod sync;
pub(crate) mod toml_convert;
mod validation;

pub use diff::{diff_registries, ServerUpdate, SyncPlan};
pub use server::{McpServerConfig, ServerField, ServerRegistry};
pub use sync::{store_for, CodexTomlStore, ConfigStore, ContinueYamlStore, JsonStore};
pub use validation::{validate_server_id, validate_server_spec};
