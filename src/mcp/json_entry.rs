use indexmap::IndexMap;
use serde_json::{json, Map, Value};

use crate::error::AppError;

use super::server::{McpServerConfig, ServerRegistry};
use super::validation::{validate_server_id, validate_server_spec};

/// Convert one native JSON entry into a server definition.
pub fn server_from_json(id: &str, spec: &Value) -> Result<McpServerConfig, AppError> {
    validate_server_id(id)?;
    validate_server_spec(spec)?;

    let command = spec
        .get("command")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();
    let args = spec
        .get("args")
        .and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|x| x.as_str())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    let env = spec
        .get("env")
        .and_then(|v| v.as_object())
        .map(|obj| {
            obj.iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                .collect::<IndexMap<_, _>>()
        })
        .unwrap_or_default();
    let disabled = spec
        .get("disabled")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);

    Ok(McpServerConfig {
        id: id.to_string(),
        command,
        args,
        env,
        enabled: !disabled,
    })
}

/// Write `server` over `base`, keeping every field the model does not own
/// (`type`, `cwd`, `timeout`, ...).
pub fn server_to_json(server: &McpServerConfig, base: Option<&Map<String, Value>>) -> Map<String, Value> {
    let mut obj = base.cloned().unwrap_or_default();

    obj.insert("command".into(), json!(server.command));

    if server.args.is_empty() {
        obj.remove("args");
    } else {
        obj.insert("args".into(), json!(server.args));
    }

    if server.env.is_empty() {
        obj.remove("env");
    } else {
        let env: Map<String, Value> = server
            .env
            .iter()
            .map(|(k, v)| (k.clone(), json!(v)))
            .collect();
        obj.insert("env".into(), Value::Object(env));
    }

    if server.enabled {
        obj.remove("disabled");
    } else {
        obj.insert("disabled".into(), json!(true));
    }

    obj
}

/// Read every modelable entry of a native section into a registry.
///
/// Entries that cannot be expressed are logged and marked unmanaged;
/// `merge_entries` keeps them on write.
pub fn registry_from_entries<'a, I>(app_label: &str, entries: I) -> ServerRegistry
where
    I: IntoIterator<Item = (&'a str, &'a Value)>,
{
    let mut registry = ServerRegistry::new();
    for (id, spec) in entries {
        match server_from_json(id, spec) {
            Ok(server) => {
                registry.insert(server);
            }
            Err(err) => {
                log::warn!("Skipping MCP server '{id}' in {app_label}: {err}");
                registry.mark_unmanaged(id);
            }
        }
    }
    registry
}

/// Rebuild a native section so that its modelable entries equal `registry`.
///
/// Existing entries keep their position and unknown fields. An entry the
/// model cannot express is kept verbatim even when `registry` holds a server
/// under the same id; that server is then not written. New entries are
/// appended in registry order.
pub fn merge_entries(existing: Vec<(String, Value)>, registry: &ServerRegistry) -> Vec<(String, Value)> {
    let mut out = Vec::with_capacity(existing.len().max(registry.len()));
    let mut written = std::collections::HashSet::new();

    for (id, spec) in existing {
        if server_from_json(&id, &spec).is_err() {
            if registry.contains(&id) {
                log::warn!("Keeping unmanaged MCP server '{id}' over the synced definition");
            }
            written.insert(id.clone());
            out.push((id, spec));
        } else if let Some(server) = registry.get(&id) {
            let merged = server_to_json(server, spec.as_object());
            written.insert(id.clone());
            out.push((id, Value::Object(merged)));
        } else {
            log::debug!("Dropping MCP server '{id}' that is no longer in the registry");
        }
    }

    for server in registry.iter() {
        if !written.contains(&server.id) {
            out.push((server.id.clone(), Value::Object(server_to_json(server, None))));
        }
    }

    out
}
