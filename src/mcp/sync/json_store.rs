use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

use crate::app_config::{AppType, ConfigStructure};
use crate::config::write_text_file;
use crate::error::AppError;
use crate::mcp::json_entry::{merge_entries, registry_from_entries};
use crate::mcp::ServerRegistry;

use super::{read_native_text, ConfigStore};

/// JSON config with servers under `mcpServers` or `mcp.servers`
/// (every application except Codex and Continue).
///
/// Files with comments or trailing commas are read; a rewrite emits plain
/// JSON.
pub struct JsonStore {
    app: AppType,
    path: PathBuf,
    structure: ConfigStructure,
}

impl JsonStore {
    pub fn new(app: AppType, path: PathBuf, structure: ConfigStructure) -> Self {
        Self {
            app,
            path,
            structure,
        }
    }

    /// Parse the config root. The flag is set when the file only parsed
    /// once comments and trailing commas were stripped.
    fn read_root(&self) -> Result<(Map<String, Value>, bool), AppError> {
        let Some(text) = read_native_text(self.app, &self.path)? else {
            return Ok((Map::new(), false));
        };
        let (value, relaxed) = match serde_json::from_str::<Value>(&text) {
            Ok(value) => (value, false),
            Err(strict_err) => match serde_json::from_str::<Value>(&strip_jsonc(&text)) {
                Ok(value) => (value, true),
                Err(_) => return Err(AppError::json(&self.path, strict_err)),
            },
        };
        self.structure
            .validate(self.app, &value)
            .map_err(|msg| AppError::parse(&self.path, msg))?;
        match value {
            Value::Object(map) => Ok((map, relaxed)),
            _ => Err(AppError::parse(&self.path, "config root must be a JSON object")),
        }
    }

    fn section_label(&self) -> String {
        self.structure.key_path().join(".")
    }
}

impl ConfigStore for JsonStore {
    fn app(&self) -> AppType {
        self.app
    }

    fn config_path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<ServerRegistry, AppError> {
        let (root, _) = self.read_root()?;

        let mut current = &root;
        for key in self.structure.key_path() {
            match current.get(*key) {
                None | Some(Value::Null) => return Ok(ServerRegistry::new()),
                Some(Value::Object(next)) => current = next,
                Some(_) => {
                    return Err(AppError::parse(
                        &self.path,
                        format!("{} must be a JSON object", self.section_label()),
                    ))
                }
            }
        }

        Ok(registry_from_entries(
            self.app.as_str(),
            current.iter().map(|(id, spec)| (id.as_str(), spec)),
        ))
    }

    fn write(&self, registry: &ServerRegistry) -> Result<(), AppError> {
        let (mut root, relaxed) = self.read_root()?;
        if relaxed {
            log::warn!(
                "Rewriting {} drops its comments and trailing commas",
                self.path.display()
            );
        }
        let label = self.section_label();

        let mut section = &mut root;
        for key in self.structure.key_path() {
            let entry = section
                .entry(key.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if entry.is_null() {
                *entry = Value::Object(Map::new());
            }
            section = entry.as_object_mut().ok_or_else(|| {
                AppError::parse(&self.path, format!("{label} must be a JSON object"))
            })?;
        }

        let existing: Vec<(String, Value)> = std::mem::take(section).into_iter().collect();
        *section = merge_entries(existing, registry).into_iter().collect();

        let mut text = serde_json::to_string_pretty(&Value::Object(root))
            .map_err(|e| AppError::JsonSerialize { source: e })?;
        text.push('\n');
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

/// Reduce JSON with comments (VS Code and Zed settings) to plain JSON:
/// `//` and `/* */` comments and trailing commas outside strings are removed.
/// Line breaks are kept so parse errors still point at the right line.
fn strip_jsonc(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            match c {
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        out.push(escaped);
                    }
                }
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            '/' if chars.peek() == Some(&'/') => {
                for next in chars.by_ref() {
                    if next == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for next in chars.by_ref() {
                    if next == '\n' {
                        out.push('\n');
                    }
                    if prev == '*' && next == '/' {
                        break;
                    }
                    prev = next;
                }
            }
            _ => out.push(c),
        }
    }

    drop_trailing_commas(&out)
}

fn drop_trailing_commas(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if in_string {
            out.push(c);
            if c == '\\' {
                if let Some(&escaped) = chars.get(i + 1) {
                    out.push(escaped);
                    i += 1;
                }
            } else if c == '"' {
                in_string = false;
            }
        } else if c == ',' {
            let next = chars[i + 1..].iter().find(|ch| !ch.is_whitespace());
            if !matches!(next, Some('}') | Some(']')) {
                out.push(c);
            }
        } else {
            if c == '"' {
                in_string = true;
            }
            out.push(c);
        }
        i += 1;
    }
    out
}
