use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

/// One MCP server definition as the sync engine understands it.
///
/// Equality is field-by-field. `args` is an ordered command line, so order
/// matters there; `env` is an `IndexMap`, whose equality ignores key order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct McpServerConfig {
    pub id: String,
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: IndexMap<String, String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl McpServerConfig {
    pub fn new(id: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            command: command.into(),
            args: Vec::new(),
            env: IndexMap::new(),
            enabled: true,
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Fields in which `other` differs from `self`.
    pub fn changed_fields(&self, other: &McpServerConfig) -> Vec<ServerField> {
        let mut fields = Vec::new();
        if self.command != other.command {
            fields.push(ServerField::Command);
        }
        if self.args != other.args {
            fields.push(ServerField::Args);
        }
        if self.env != other.env {
            fields.push(ServerField::Env);
        }
        if self.enabled != other.enabled {
            fields.push(ServerField::Enabled);
        }
        fields
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ServerField {
    Command,
    Args,
    Env,
    Enabled,
}

/// The MCP servers owned by one application, keyed by server id.
///
/// Insertion order is kept for display; equality ignores it. Ids of native
/// entries the model cannot express (url transports and the like) are
/// tracked alongside so a sync never writes over them; they take no part in
/// equality or serialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServerRegistry {
    servers: IndexMap<String, McpServerConfig>,
    #[serde(skip)]
    unmanaged: IndexSet<String>,
}

impl PartialEq for ServerRegistry {
    fn eq(&self, other: &Self) -> bool {
        self.servers == other.servers
    }
}

impl Eq for ServerRegistry {}

impl ServerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace by id. A replaced entry keeps its position.
    pub fn insert(&mut self, server: McpServerConfig) -> Option<McpServerConfig> {
        self.servers.insert(server.id.clone(), server)
    }

    /// Remove by id, keeping the order of the remaining entries.
    pub fn remove(&mut self, id: &str) -> Option<McpServerConfig> {
        self.servers.shift_remove(id)
    }

    pub fn get(&self, id: &str) -> Option<&McpServerConfig> {
        self.servers.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.servers.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.servers.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &McpServerConfig> {
        self.servers.values()
    }

    pub fn len(&self) -> usize {
        self.servers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }

    /// Record that the native config holds an entry under `id` that the
    /// model cannot express.
    pub fn mark_unmanaged(&mut self, id: impl Into<String>) {
        self.unmanaged.insert(id.into());
    }

    pub fn is_unmanaged(&self, id: &str) -> bool {
        self.unmanaged.contains(id)
    }

    pub fn unmanaged_ids(&self) -> impl Iterator<Item = &str> {
        self.unmanaged.iter().map(String::as_str)
    }
}

impl FromIterator<McpServerConfig> for ServerRegistry {
    fn from_iter<T: IntoIterator<Item = McpServerConfig>>(iter: T) -> Self {
        let mut registry = ServerRegistry::new();
        for server in iter {
            registry.insert(server);
        }
        registry
    }
}
