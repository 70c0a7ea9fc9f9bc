use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;

use crate::app_config::AppType;
use crate::error::{AppError, FailureKind};
use crate::mcp::SyncPlan;

/// What happened to one target application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum OutcomeStatus {
    /// Plan computed; `written` is false for an empty plan or a dry run.
    /// `conflicts` lists source servers left out because the target keeps an
    /// unmanaged entry under the same id.
    #[serde(rename_all = "camelCase")]
    Synced {
        added: Vec<String>,
        updated: Vec<String>,
        removed: Vec<String>,
        conflicts: Vec<String>,
        written: bool,
    },
    /// Target could not be read (`notFound` / `parseError`), left untouched.
    Skipped { kind: FailureKind, message: String },
    /// Target write or its worker failed, left as last-known-good.
    Failed { kind: FailureKind, message: String },
}

impl OutcomeStatus {
    pub fn synced(plan: &SyncPlan, written: bool) -> Self {
        OutcomeStatus::Synced {
            added: plan.added_ids(),
            updated: plan.updated_ids(),
            removed: plan.removed_ids(),
            conflicts: plan.conflicts.clone(),
            written,
        }
    }

    pub fn skipped(err: &AppError) -> Self {
        OutcomeStatus::Skipped {
            kind: err.kind(),
            message: err.to_string(),
        }
    }

    pub fn failed(err: &AppError) -> Self {
        OutcomeStatus::Failed {
            kind: err.kind(),
            message: err.to_string(),
        }
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            OutcomeStatus::Synced { .. } => None,
            OutcomeStatus::Skipped { kind, .. } | OutcomeStatus::Failed { kind, .. } => Some(*kind),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSyncOutcome {
    pub app: AppType,
    pub config_path: PathBuf,
    #[serde(flatten)]
    pub status: OutcomeStatus,
}

/// Aggregate report of one sync invocation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResult {
    pub source: AppType,
    pub prune_extraneous: bool,
    pub dry_run: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub summary: String,
    pub outcomes: Vec<AppSyncOutcome>,
}

impl SyncResult {
    pub(crate) fn new(
        source: AppType,
        prune_extraneous: bool,
        dry_run: bool,
        started_at: DateTime<Utc>,
        outcomes: Vec<AppSyncOutcome>,
    ) -> Self {
        let mut result = Self {
            source,
            prune_extraneous,
            dry_run,
            started_at,
            finished_at: Utc::now(),
            summary: String::new(),
            outcomes,
        };
        result.summary = result.render_summary();
        result
    }

    pub fn synced_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, OutcomeStatus::Synced { .. }))
            .count()
    }

    pub fn skipped_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, OutcomeStatus::Skipped { .. }))
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, OutcomeStatus::Failed { .. }))
            .count()
    }

    /// Every target that did not sync, skipped or failed, with its kind.
    pub fn failures(&self) -> Vec<(AppType, FailureKind)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.status.failure_kind().map(|kind| (o.app, kind)))
            .collect()
    }

    pub fn outcome(&self, app: AppType) -> Option<&AppSyncOutcome> {
        self.outcomes.iter().find(|o| o.app == app)
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    /// Number of source servers that could not be placed because a target
    /// keeps an unmanaged entry under the same id.
    pub fn conflict_count(&self) -> usize {
        self.outcomes
            .iter()
            .map(|o| match &o.status {
                OutcomeStatus::Synced { conflicts, .. } => conflicts.len(),
                _ => 0,
            })
            .sum()
    }

    fn render_summary(&self) -> String {
        let verb = if self.dry_run { "Planned" } else { "Synced" };
        let mut text = format!(
            "{verb} {} of {} applications from {}",
            self.synced_count(),
            self.outcomes.len(),
            self.source.display_name()
        );
        let (skipped, failed) = (self.skipped_count(), self.failed_count());
        if skipped > 0 || failed > 0 {
            text.push_str(&format!(" ({skipped} skipped, {failed} failed)"));
        }
        let conflicts = self.conflict_count();
        if conflicts > 0 {
            text.push_str(&format!(", {conflicts} id conflict(s) left as is"));
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn outcome(app: AppType, status: OutcomeStatus) -> AppSyncOutcome {
        AppSyncOutcome {
            app,
            config_path: PathBuf::from("/tmp/x"),
            status,
        }
    }

    #[test]
    fn counts_and_failures() {
        let result = SyncResult::new(
            AppType::ClaudeCode,
            false,
            false,
            Utc::now(),
            vec![
                outcome(
                    AppType::Cursor,
                    OutcomeStatus::Synced {
                        added: vec!["b".into()],
                        updated: vec![],
                        removed: vec![],
                        conflicts: vec![],
                        written: true,
                    },
                ),
                outcome(
                    AppType::Codex,
                    OutcomeStatus::Skipped {
                        kind: FailureKind::ParseError,
                        message: "bad".into(),
                    },
                ),
                outcome(
                    AppType::Warp,
                    OutcomeStatus::Failed {
                        kind: FailureKind::Timeout,
                        message: "slow".into(),
                    },
                ),
            ],
        );

        assert_eq!(result.synced_count(), 1);
        assert_eq!(result.skipped_count(), 1);
        assert_eq!(result.failed_count(), 1);
        assert_eq!(
            result.failures(),
            vec![
                (AppType::Codex, FailureKind::ParseError),
                (AppType::Warp, FailureKind::Timeout)
            ]
        );
        assert_eq!(
            result.summary(),
            "Synced 1 of 3 applications from Claude Code (1 skipped, 1 failed)"
        );
    }

    #[test]
    fn outcome_serializes_flat_with_status_tag() {
        let value = serde_json::to_value(outcome(
            AppType::Gemini,
            OutcomeStatus::Failed {
                kind: FailureKind::PermissionDenied,
                message: "denied".into(),
            },
        ))
        .unwrap();
        assert_eq!(
            value,
            json!({
                "app": "gemini",
                "configPath": "/tmp/x",
                "status": "failed",
                "kind": "permissionDenied",
                "message": "denied"
            })
        );
    }

    #[test]
    fn conflicts_show_up_in_summary_and_json() {
        let status = OutcomeStatus::Synced {
            added: vec![],
            updated: vec![],
            removed: vec![],
            conflicts: vec!["docs".into()],
            written: false,
        };
        let result = SyncResult::new(
            AppType::ClaudeDesktop,
            false,
            false,
            Utc::now(),
            vec![outcome(AppType::Cursor, status.clone())],
        );

        assert_eq!(result.conflict_count(), 1);
        assert_eq!(
            result.summary(),
            "Synced 1 of 1 applications from Claude Desktop, 1 id conflict(s) left as is"
        );
        assert_eq!(
            serde_json::to_value(&status).unwrap()["conflicts"],
            json!(["docs"])
        );
    }
}
