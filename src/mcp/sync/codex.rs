use std::path::{Path, PathBuf};
use toml_edit::{DocumentMut, Item, Table};

use crate::app_config::AppType;
use crate::config::write_text_file;
use crate::error::AppError;
use crate::mcp::toml_convert::{server_to_toml_table, toml_item_to_server};
use crate::mcp::ServerRegistry;

use super::{read_native_text, ConfigStore};

const SERVERS_KEY: &str = "mcp_servers";

/// Codex `~/.codex/config.toml`, servers under `[mcp_servers.<id>]`.
///
/// Edits go through `toml_edit`, so comments, whitespace and ordering of the
/// rest of the file are kept.
pub struct CodexTomlStore {
    app: AppType,
    path: PathBuf,
}

impl CodexTomlStore {
    pub fn new(app: AppType, path: PathBuf) -> Self {
        Self { app, path }
    }

    fn read_document(&self) -> Result<DocumentMut, AppError> {
        match read_native_text(self.app, &self.path)? {
            None => Ok(DocumentMut::new()),
            Some(text) => text
                .parse::<DocumentMut>()
                .map_err(|e| AppError::parse(&self.path, e.to_string())),
        }
    }
}

impl ConfigStore for CodexTomlStore {
    fn app(&self) -> AppType {
        self.app
    }

    fn config_path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<ServerRegistry, AppError> {
        let doc = self.read_document()?;
        let Some(item) = doc.get(SERVERS_KEY) else {
            return Ok(ServerRegistry::new());
        };
        let servers = item
            .as_table_like()
            .ok_or_else(|| AppError::parse(&self.path, "[mcp_servers] must be a table"))?;

        let mut registry = ServerRegistry::new();
        for (id, entry) in servers.iter() {
            match toml_item_to_server(id, entry) {
                Ok(server) => {
                    registry.insert(server);
                }
                Err(err) => {
                    log::warn!("Skipping Codex MCP server '{id}': {err}");
                    registry.mark_unmanaged(id);
                }
            }
        }
        Ok(registry)
    }

    fn write(&self, registry: &ServerRegistry) -> Result<(), AppError> {
        let mut doc = self.read_document()?;

        let slot = &mut doc[SERVERS_KEY];
        if slot.is_none() {
            let mut tbl = Table::new();
            tbl.set_implicit(true);
            *slot = Item::Table(tbl);
        } else if slot.is_inline_table() {
            let inline = std::mem::take(slot);
            *slot = inline.into_table().map(Item::Table).unwrap_or_else(|item| item);
        }
        let servers = slot
            .as_table_mut()
            .ok_or_else(|| AppError::parse(&self.path, "[mcp_servers] must be a table"))?;

        let existing_ids: Vec<String> = servers.iter().map(|(k, _)| k.to_string()).collect();
        for id in existing_ids {
            let modelable = servers
                .get(&id)
                .map(|entry| toml_item_to_server(&id, entry).is_ok())
                .unwrap_or(false);
            if !modelable {
                if registry.contains(&id) {
                    log::warn!("Keeping unmanaged Codex MCP server '{id}' over the synced definition");
                }
                continue;
            }
            if let Some(server) = registry.get(&id) {
                let merged = server_to_toml_table(server, servers.get(&id));
                servers.insert(&id, Item::Table(merged));
            } else {
                servers.remove(&id);
                log::debug!("Dropping Codex MCP server '{id}' that is no longer in the registry");
            }
        }
        for server in registry.iter() {
            if !servers.contains_key(&server.id) {
                servers.insert(&server.id, Item::Table(server_to_toml_table(server, None)));
            }
        }

        write_text_file(&self.path, &doc.to_string())?;
        log::info!(
            "Wrote {} MCP servers to {} ({})",
            registry.len(),
            self.path.display(),
            self.app
        );
        Ok(())
    }
}
