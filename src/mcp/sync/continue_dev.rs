use serde_json::{json, Value};
use serde_yaml::{Mapping, Value as YamlValue};
use std::path::{Path, PathBuf};

use crate::app_config::AppType;
use crate::config::write_text_file;
use crate::error::AppError;
use crate::mcp::json_entry::{merge_entries, registry_from_entries};
use crate::mcp::ServerRegistry;

use super::{read_native_text, ConfigStore};

const SERVERS_KEY: &str = "mcpServers";

/// Continue `~/.continue/config.yaml`: `mcpServers` is a list of entries
/// carrying their id in `name`.
///
/// YAML comments do not survive a rewrite; keys and values do.
pub struct ContinueYamlStore {
    app: AppType,
    path: PathBuf,
}

impl ContinueYamlStore {
    pub fn new(app: AppType, path: PathBuf) -> Self {
        Self { app, path }
    }

    fn read_root(&self) -> Result<Mapping, AppError> {
        let Some(text) = read_native_text(self.app, &self.path)? else {
            return Ok(Mapping::new());
        };
        let value: YamlValue =
            serde_yaml::from_str(&text).map_err(|e| AppError::parse(&self.path, e.to_string()))?;
        match value {
            YamlValue::Null => Ok(Mapping::new()),
            YamlValue::Mapping(map) => Ok(map),
            _ => Err(AppError::parse(&self.path, "config root must be a mapping")),
        }
    }

    fn entries<'a>(&self, root: &'a Mapping) -> Result<&'a [YamlValue], AppError> {
        match root.get(SERVERS_KEY) {
            None | Some(YamlValue::Null) => Ok(&[]),
            Some(YamlValue::Sequence(seq)) => Ok(seq.as_slice()),
            Some(_) => Err(AppError::parse(&self.path, "mcpServers must be a list")),
        }
    }
}

/// Split a list item into its `name` and the remaining fields.
fn split_named_entry(item: &YamlValue) -> Option<(String, Value)> {
    let value = serde_json::to_value(item).ok()?;
    let mut obj = value.as_object()?.clone();
    let name = obj.remove("name")?.as_str()?.to_string();
    Some((name, Value::Object(obj)))
}

impl ConfigStore for ContinueYamlStore {
    fn app(&self) -> AppType {
        self.app
    }

    fn config_path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<ServerRegistry, AppError> {
        let root = self.read_root()?;
        let mut named = Vec::new();
        for item in self.entries(&root)? {
            match split_named_entry(item) {
                Some(entry) => named.push(entry),
                None => log::warn!("Skipping unnamed MCP server entry in {}", self.path.display()),
            }
        }
        Ok(registry_from_entries(
            self.app.as_str(),
            named.iter().map(|(id, spec)| (id.as_str(), spec)),
        ))
    }

    fn write(&self, registry: &ServerRegistry) -> Result<(), AppError> {
        let mut root = self.read_root()?;

        let mut named = Vec::new();
        let mut unnamed = Vec::new();
        for item in self.entries(&root)? {
            match split_named_entry(item) {
                Some(entry) => named.push(entry),
                None => unnamed.push(item.clone()),
            }
        }

        let mut out = Vec::with_capacity(named.len() + unnamed.len() + registry.len());
        for (id, spec) in merge_entries(named, registry) {
            let mut obj = serde_json::Map::new();
            obj.insert("name".into(), json!(id));
            if let Value::Object(fields) = spec {
                obj.extend(fields);
            }
            let item = serde_yaml::to_value(Value::Object(obj))
                .map_err(|e| AppError::Config(format!("Failed to encode MCP server '{id}': {e}")))?;
            out.push(item);
        }
        out.extend(unnamed);

        root.insert(YamlValue::String(SERVERS_KEY.into()), YamlValue::Sequence(out));

        let text = serde_yaml::to_string(&YamlValue::Mapping(root))
            .map_err(|e| AppError::Config(format!("Failed to encode {}: {e}", self.path.display())))?;
        write_text_file(&self.path, &text)?;

        log::info!(
            "Wrote {} MCP servers to {} ({})",
            registry.len(),
            self.path.display(),
            self.app
        );
        Ok(())
    }
}
