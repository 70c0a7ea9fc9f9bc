use indexmap::IndexMap;
use toml_edit::{Array, Item, Table};

use crate::error::AppError;

use super::server::McpServerConfig;
use super::validation::validate_server_id;

/// Convert a Codex `[mcp_servers.<id>]` table (or inline table) into a server.
///
/// Entries without a `command` (url-based transports) and entries with
/// non-string args/env are reported as validation errors.
pub fn toml_item_to_server(id: &str, item: &Item) -> Result<McpServerConfig, AppError> {
    validate_server_id(id)?;

    let tbl = item
        .as_table_like()
        .ok_or_else(|| AppError::McpValidation(format!("MCP server '{id}' must be a table")))?;

    let command = tbl
        .get("command")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string();
    if command.trim().is_empty() {
        return Err(AppError::McpValidation(format!(
            "MCP server '{id}' is missing the command field"
        )));
    }

    let mut args = Vec::new();
    if let Some(raw) = tbl.get("args") {
        let arr = raw
            .as_array()
            .ok_or_else(|| AppError::McpValidation(format!("MCP server '{id}' args must be an array")))?;
        for a in arr.iter() {
            let s = a.as_str().ok_or_else(|| {
                AppError::McpValidation(format!("MCP server '{id}' args must be strings"))
            })?;
            args.push(s.to_string());
        }
    }

    let mut env = IndexMap::new();
    if let Some(raw) = tbl.get("env") {
        let env_tbl = raw
            .as_table_like()
            .ok_or_else(|| AppError::McpValidation(format!("MCP server '{id}' env must be a table")))?;
        for (k, v) in env_tbl.iter() {
            let s = v.as_str().ok_or_else(|| {
                AppError::McpValidation(format!("MCP server '{id}' env value '{k}' must be a string"))
            })?;
            env.insert(k.to_string(), s.to_string());
        }
    }

    let disabled = match tbl.get("disabled") {
        None => false,
        Some(v) => v.as_bool().ok_or_else(|| {
            AppError::McpValidation(format!("MCP server '{id}' disabled must be a boolean"))
        })?,
    };

    Ok(McpServerConfig {
        id: id.to_string(),
        command,
        args,
        env,
        enabled: !disabled,
    })
}

/// Write `server` over an existing entry, keeping fields the model does not
/// own (`cwd`, `startup_timeout_sec`, ...). A new entry starts from an empty
/// table.
pub fn server_to_toml_table(server: &McpServerConfig, base: Option<&Item>) -> Table {
    let mut t = base
        .cloned()
        .and_then(|item| item.into_table().ok())
        .unwrap_or_default();

    t["command"] = toml_edit::value(server.command.as_str());

    if server.args.is_empty() {
        t.remove("args");
    } else {
        let mut arr_v = Array::default();
        for a in &server.args {
            arr_v.push(a.as_str());
        }
        t["args"] = Item::Value(toml_edit::Value::Array(arr_v));
    }

    if server.env.is_empty() {
        t.remove("env");
    } else {
        let mut env_tbl = Table::new();
        for (k, v) in server.env.iter() {
            env_tbl[k.as_str()] = toml_edit::value(v.as_str());
        }
        t["env"] = Item::Table(env_tbl);
    }

    if server.enabled {
        t.remove("disabled");
    } else {
        t["disabled"] = toml_edit::value(true);
    }

    t
}
