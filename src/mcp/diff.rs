use serde::Serialize;

use super::server::{McpServerConfig, ServerField, ServerRegistry};

/// A server present on both sides whose definition differs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerUpdate {
    pub before: McpServerConfig,
    pub after: McpServerConfig,
}

impl ServerUpdate {
    pub fn id(&self) -> &str {
        &self.after.id
    }

    pub fn changed_fields(&self) -> Vec<ServerField> {
        self.before.changed_fields(&self.after)
    }
}

/// Operations that bring one target registry in line with the source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncPlan {
    pub add: Vec<McpServerConfig>,
    pub update: Vec<ServerUpdate>,
    pub remove: Vec<McpServerConfig>,
    /// Source ids the target already uses for an entry the model cannot
    /// express. Those entries are left as they are.
    pub conflicts: Vec<String>,
}

impl SyncPlan {
    /// True when applying the plan would not change the target. Conflicts
    /// are reported but never written.
    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.update.is_empty() && self.remove.is_empty()
    }

    pub fn added_ids(&self) -> Vec<String> {
        self.add.iter().map(|s| s.id.clone()).collect()
    }

    pub fn updated_ids(&self) -> Vec<String> {
        self.update.iter().map(|u| u.id().to_string()).collect()
    }

    pub fn removed_ids(&self) -> Vec<String> {
        self.remove.iter().map(|s| s.id.clone()).collect()
    }

    /// The registry `target` becomes once this plan is applied.
    ///
    /// Updated entries stay where they were; added entries are appended in
    /// source order.
    pub fn apply_to(&self, target: &ServerRegistry) -> ServerRegistry {
        let mut next = target.clone();
        for server in &self.remove {
            next.remove(&server.id);
        }
        for update in &self.update {
            next.insert(update.after.clone());
        }
        for server in &self.add {
            next.insert(server.clone());
        }
        next
    }
}

/// Compute the plan that makes `target` match `source`.
///
/// `prune_extraneous` decides what happens to servers only the target has:
/// when `false` they are left alone and the sync only adds and updates; when
/// `true` they are removed so the target mirrors the source exactly. Removal
/// deletes entries the user may have added by hand, so callers must opt in.
///
/// A source server whose id the target uses for an unmanaged entry lands in
/// `conflicts` instead of `add`, and unmanaged entries are never pruned.
pub fn diff_registries(
    source: &ServerRegistry,
    target: &ServerRegistry,
    prune_extraneous: bool,
) -> SyncPlan {
    let mut plan = SyncPlan::default();

    for server in source.iter() {
        if target.is_unmanaged(&server.id) {
            plan.conflicts.push(server.id.clone());
            continue;
        }
        match target.get(&server.id) {
            None => plan.add.push(server.clone()),
            Some(existing) if existing != server => plan.update.push(ServerUpdate {
                before: existing.clone(),
                after: server.clone(),
            }),
            Some(_) => {}
        }
    }

    if prune_extraneous {
        plan.remove = target
            .iter()
            .filter(|server| !source.contains(&server.id))
            .cloned()
            .collect();
    }

    plan
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry(servers: Vec<McpServerConfig>) -> ServerRegistry {
        servers.into_iter().collect()
    }

    #[test]
    fn port_change_is_a_single_args_update() {
        let source = registry(vec![
            McpServerConfig::new("fs", "node server.js").with_args(["--port", "3000"])
        ]);
        let target = registry(vec![
            McpServerConfig::new("fs", "node server.js").with_args(["--port", "3001"])
        ]);

        let plan = diff_registries(&source, &target, false);

        assert!(plan.add.is_empty());
        assert!(plan.remove.is_empty());
        assert_eq!(plan.update.len(), 1);
        let update = &plan.update[0];
        assert_eq!(update.id(), "fs");
        assert_eq!(update.changed_fields(), vec![ServerField::Args]);
        assert_eq!(update.before.args, vec!["--port", "3001"]);
        assert_eq!(update.after.args, vec!["--port", "3000"]);
    }

    #[test]
    fn missing_server_is_added_and_identical_one_untouched() {
        let a = McpServerConfig::new("a", "uvx").with_args(["mcp-server-git"]);
        let b = McpServerConfig::new("b", "npx").with_args(["-y", "@scope/b"]);
        let source = registry(vec![a.clone(), b.clone()]);
        let target = registry(vec![a]);

        let plan = diff_registries(&source, &target, false);

        assert_eq!(plan.added_ids(), vec!["b"]);
        assert!(plan.update.is_empty());
        assert!(plan.remove.is_empty());
    }

    #[test]
    fn argument_reordering_alone_is_an_update() {
        let source = registry(vec![McpServerConfig::new("x", "cmd").with_args(["a", "b"])]);
        let target = registry(vec![McpServerConfig::new("x", "cmd").with_args(["b", "a"])]);

        let plan = diff_registries(&source, &target, false);
        assert_eq!(plan.updated_ids(), vec!["x"]);
    }

    #[test]
    fn env_reordering_alone_is_not_an_update() {
        let source = registry(vec![McpServerConfig::new("x", "cmd")
            .with_env("TOKEN", "t")
            .with_env("REGION", "eu")]);
        let target = registry(vec![McpServerConfig::new("x", "cmd")
            .with_env("REGION", "eu")
            .with_env("TOKEN", "t")]);

        assert!(diff_registries(&source, &target, true).is_empty());
    }

    #[test]
    fn enabled_flag_difference_is_an_update() {
        let source = registry(vec![McpServerConfig::new("x", "cmd").with_enabled(false)]);
        let target = registry(vec![McpServerConfig::new("x", "cmd")]);

        let plan = diff_registries(&source, &target, false);
        assert_eq!(plan.update[0].changed_fields(), vec![ServerField::Enabled]);
    }

    #[test]
    fn target_only_servers_survive_without_prune() {
        let source = registry(vec![McpServerConfig::new("shared", "a")]);
        let local = McpServerConfig::new("local", "my-tool").with_args(["--flag"]);
        let target = registry(vec![McpServerConfig::new("shared", "b"), local.clone()]);

        let plan = diff_registries(&source, &target, false);

        assert!(!plan.added_ids().contains(&"local".to_string()));
        assert!(plan.remove.is_empty());
        assert!(plan.update.iter().all(|u| u.id() != "local"));
        assert_eq!(plan.apply_to(&target).get("local"), Some(&local));
    }

    #[test]
    fn prune_removes_target_only_servers() {
        let source = registry(vec![McpServerConfig::new("shared", "a")]);
        let target = registry(vec![
            McpServerConfig::new("shared", "a"),
            McpServerConfig::new("local", "b"),
        ]);

        let plan = diff_registries(&source, &target, true);
        assert_eq!(plan.removed_ids(), vec!["local"]);
        assert_eq!(plan.apply_to(&target), source);
    }

    #[test]
    fn applying_a_plan_then_rediffing_is_empty() {
        let cases = vec![
            (vec![], vec![McpServerConfig::new("only-target", "x")]),
            (vec![McpServerConfig::new("only-source", "x")], vec![]),
            (
                vec![
                    McpServerConfig::new("a", "node").with_args(["a.js"]),
                    McpServerConfig::new("b", "uvx").with_env("K", "v"),
                    McpServerConfig::new("c", "docker").with_enabled(false),
                ],
                vec![
                    McpServerConfig::new("c", "docker"),
                    McpServerConfig::new("a", "node").with_args(["b.js"]),
                    McpServerConfig::new("d", "python3"),
                ],
            ),
        ];

        for (source, target) in cases {
            let source = registry(source);
            let target = registry(target);
            for prune in [false, true] {
                let plan = diff_registries(&source, &target, prune);
                let applied = plan.apply_to(&target);
                let again = diff_registries(&source, &applied, prune);
                assert!(again.is_empty(), "not idempotent (prune={prune}): {again:?}");
            }
        }
    }

    #[test]
    fn applied_plan_keeps_existing_order_and_appends_new() {
        let source = registry(vec![
            McpServerConfig::new("new", "x"),
            McpServerConfig::new("b", "changed"),
        ]);
        let target = registry(vec![
            McpServerConfig::new("a", "x"),
            McpServerConfig::new("b", "x"),
        ]);

        let applied = diff_registries(&source, &target, false).apply_to(&target);
        let ids: Vec<&str> = applied.ids().collect();
        assert_eq!(ids, vec!["a", "b", "new"]);
    }

    #[test]
    fn unmanaged_target_id_is_a_conflict_not_an_add() {
        let source = registry(vec![
            McpServerConfig::new("remote", "npx").with_args(["a"]),
            McpServerConfig::new("fs", "npx"),
        ]);
        let mut target = ServerRegistry::new();
        target.mark_unmanaged("remote");

        let plan = diff_registries(&source, &target, true);
        assert_eq!(plan.added_ids(), vec!["fs"]);
        assert_eq!(plan.conflicts, vec!["remote"]);
        assert!(plan.remove.is_empty());

        let applied = plan.apply_to(&target);
        assert!(!applied.contains("remote"));
        let again = diff_registries(&source, &applied, true);
        assert!(again.is_empty());
        assert_eq!(again.conflicts, vec!["remote"]);
    }
}
