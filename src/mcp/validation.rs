use serde_json::Value;

use crate::error::AppError;

pub fn validate_server_id(id: &str) -> Result<(), AppError> {
    if id.trim().is_empty() {
        return Err(AppError::McpValidation("MCP server id must not be empty".into()));
    }
    if id.trim() != id {
        return Err(AppError::McpValidation(format!(
            "MCP server id '{id}' has leading or trailing whitespace"
        )));
    }
    Ok(())
}

/// Check that a native entry can be expressed as a command-based server:
/// `command` is a non-empty string, `args` a string array, `env` a string map
/// and `disabled` a boolean. Entries that fail (e.g. url-only servers) are
/// left to the owning application untouched.
pub fn validate_server_spec(spec: &Value) -> Result<(), AppError> {
    let obj = spec
        .as_object()
        .ok_or_else(|| AppError::McpValidation("MCP server entry must be a JSON object".into()))?;

    let cmd = obj.get("command").and_then(|x| x.as_str()).unwrap_or("");
    if cmd.trim().is_empty() {
        return Err(AppError::McpValidation(
            "MCP server entry is missing the command field".into(),
        ));
    }

    if let Some(args) = obj.get("args") {
        let arr = args
            .as_array()
            .ok_or_else(|| AppError::McpValidation("MCP server args must be an array".into()))?;
        if !arr.iter().all(|item| item.is_string()) {
            return Err(AppError::McpValidation(
                "MCP server args must be an array of strings".into(),
            ));
        }
    }

    if let Some(env) = obj.get("env") {
        let map = env
            .as_object()
            .ok_or_else(|| AppError::McpValidation("MCP server env must be an object".into()))?;
        if !map.values().all(|v| v.is_string()) {
            return Err(AppError::McpValidation(
                "MCP server env values must be strings".into(),
            ));
        }
    }

    if let Some(disabled) = obj.get("disabled") {
        if !disabled.is_boolean() {
            return Err(AppError::McpValidation(
                "MCP server disabled must be a boolean".into(),
            ));
        }
    }

    Ok(())
}
