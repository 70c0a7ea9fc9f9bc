use chrono::Utc;
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::app_config::AppType;
use crate::error::AppError;
use crate::mcp::{diff_registries, store_for, ConfigStore, ServerRegistry};
use crate::profiles::ApplicationProfile;
use crate::services::report::{AppSyncOutcome, OutcomeStatus, SyncResult};
use crate::settings::AppSettings;

/// Builds the store used for a profile. Swapped out in tests.
pub type StoreFactory = Arc<dyn Fn(&ApplicationProfile) -> Arc<dyn ConfigStore> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOptions {
    pub prune_extraneous: bool,
    pub target_timeout: Duration,
    /// Compute and report plans without writing.
    pub dry_run: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            prune_extraneous: false,
            target_timeout: Duration::from_secs(10),
            dry_run: false,
        }
    }
}

impl SyncOptions {
    pub fn from_settings(settings: &AppSettings) -> Self {
        Self {
            prune_extraneous: settings.prune_extraneous,
            target_timeout: settings.target_timeout(),
            dry_run: false,
        }
    }

    pub fn with_prune(mut self, prune_extraneous: bool) -> Self {
        self.prune_extraneous = prune_extraneous;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_timeout(mut self, target_timeout: Duration) -> Self {
        self.target_timeout = target_timeout;
        self
    }
}

/// Decides, between a worker and the caller waiting on it, whether the
/// worker's write happens. Whoever moves the token out of `RUNNING` first
/// wins: the worker before writing, the caller once its deadline passes.
#[derive(Debug, Clone, Default)]
pub(crate) struct CommitToken(Arc<AtomicU8>);

const RUNNING: u8 = 0;
const CANCELLED: u8 = 1;
const COMMITTING: u8 = 2;

impl CommitToken {
    /// Claim the right to write. False once the caller has given up.
    pub(crate) fn begin_commit(&self) -> bool {
        self.0
            .compare_exchange(RUNNING, COMMITTING, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Give up on the worker. False when it is already writing.
    fn cancel(&self) -> bool {
        self.0
            .compare_exchange(RUNNING, CANCELLED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

/// Pushes one application's MCP servers out to every other active one.
///
/// One sync runs at a time. Within a sync, targets are processed in parallel
/// and each target's read, plan and write happen under that application's
/// own lock, which outlives a timed-out sync until its worker finishes. A
/// target reported as timed out is never written afterwards.
pub struct SyncService {
    gate: tokio::sync::Mutex<()>,
    app_locks: Mutex<HashMap<AppType, Arc<Mutex<()>>>>,
    store_factory: StoreFactory,
}

impl Default for SyncService {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncService {
    pub fn new() -> Self {
        Self::with_store_factory(Arc::new(store_for))
    }

    pub fn with_store_factory(store_factory: StoreFactory) -> Self {
        Self {
            gate: tokio::sync::Mutex::new(()),
            app_locks: Mutex::new(HashMap::new()),
            store_factory,
        }
    }

    /// Run a sync, waiting for any sync already in flight.
    pub async fn sync_from_source(
        &self,
        source: AppType,
        applications: &[ApplicationProfile],
        options: SyncOptions,
    ) -> Result<SyncResult, AppError> {
        let _running = self.gate.lock().await;
        self.run(source, applications, options).await
    }

    /// Run a sync, failing with `SyncInProgress` when another one is in flight.
    pub async fn try_sync_from_source(
        &self,
        source: AppType,
        applications: &[ApplicationProfile],
        options: SyncOptions,
    ) -> Result<SyncResult, AppError> {
        let _running = self.gate.try_lock().map_err(|_| AppError::SyncInProgress)?;
        self.run(source, applications, options).await
    }

    /// Current registry of one application, read under its lock.
    pub async fn read_registry(
        &self,
        profile: &ApplicationProfile,
        timeout: Duration,
    ) -> Result<ServerRegistry, AppError> {
        let store = (self.store_factory)(profile);
        self.run_locked(profile.app, timeout, move |_| store.read())
            .await
    }

    async fn run(
        &self,
        source: AppType,
        applications: &[ApplicationProfile],
        options: SyncOptions,
    ) -> Result<SyncResult, AppError> {
        let started_at = Utc::now();
        let source_profile = resolve_source(source, applications)?;
        if options.prune_extraneous && !source_profile.config_path.is_file() {
            return Err(AppError::InvalidSource {
                app: source,
                reason: format!(
                    "{} does not exist, pruning would empty every target",
                    source_profile.config_path.display()
                ),
            });
        }

        let source_registry = self
            .read_registry(source_profile, options.target_timeout)
            .await
            .map_err(|err| AppError::InvalidSource {
                app: source,
                reason: err.to_string(),
            })?;
        if source_registry.is_empty() {
            log::warn!("{source} has no MCP servers to sync");
        }
        let source_registry = Arc::new(source_registry);
        log::info!(
            "Syncing {} MCP servers from {} (prune={}, dry_run={})",
            source_registry.len(),
            source,
            options.prune_extraneous,
            options.dry_run
        );

        let targets: Vec<&ApplicationProfile> = applications
            .iter()
            .filter(|profile| profile.app != source)
            .filter(|profile| {
                if !profile.is_active() {
                    log::debug!(
                        "Leaving {} out of the sync (installed={}, enabled={})",
                        profile.app,
                        profile.installed,
                        profile.enabled
                    );
                }
                profile.is_active()
            })
            .collect();

        let outcomes = join_all(
            targets
                .into_iter()
                .map(|profile| self.sync_target(profile, Arc::clone(&source_registry), options)),
        )
        .await;

        let result = SyncResult::new(
            source,
            options.prune_extraneous,
            options.dry_run,
            started_at,
            outcomes,
        );
        log::info!("{}", result.summary());
        Ok(result)
    }

    async fn sync_target(
        &self,
        profile: &ApplicationProfile,
        source: Arc<ServerRegistry>,
        options: SyncOptions,
    ) -> AppSyncOutcome {
        let store = (self.store_factory)(profile);
        let status = self
            .run_locked(profile.app, options.target_timeout, move |token| {
                Ok(apply_to_target(store.as_ref(), &source, options, token))
            })
            .await
            .unwrap_or_else(|err| {
                log::error!("Sync to {} failed: {err}", profile.app);
                OutcomeStatus::failed(&err)
            });

        AppSyncOutcome {
            app: profile.app,
            config_path: profile.config_path.clone(),
            status,
        }
    }

    fn app_lock(&self, app: AppType) -> Result<Arc<Mutex<()>>, AppError> {
        let mut locks = self.app_locks.lock()?;
        Ok(Arc::clone(locks.entry(app).or_default()))
    }

    /// Run blocking store work under the application's lock with a deadline.
    ///
    /// Work that writes must call `CommitToken::begin_commit` first. When the
    /// deadline passes before that, the work is cancelled and the result is
    /// `Timeout`. When it passes mid-write, the write is awaited for one more
    /// deadline and its real outcome is returned.
    async fn run_locked<T, F>(&self, app: AppType, timeout: Duration, work: F) -> Result<T, AppError>
    where
        T: Send + 'static,
        F: FnOnce(&CommitToken) -> Result<T, AppError> + Send + 'static,
    {
        let lock = self.app_lock(app)?;
        let token = CommitToken::default();
        let worker_token = token.clone();
        let mut task = tokio::task::spawn_blocking(move || {
            let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
            work(&worker_token)
        });

        let joined = match tokio::time::timeout(timeout, &mut task).await {
            Ok(joined) => joined,
            Err(_) if token.cancel() => return Err(AppError::Timeout { app, timeout }),
            Err(_) => {
                log::warn!("{app} passed its deadline while writing, waiting for the write");
                match tokio::time::timeout(timeout, &mut task).await {
                    Ok(joined) => joined,
                    Err(_) => {
                        return Err(AppError::Message(format!(
                            "{app} write did not finish within {:?}; the file may still change",
                            timeout * 2
                        )))
                    }
                }
            }
        };

        joined.unwrap_or_else(|join_err| {
            Err(AppError::Message(format!(
                "{app} worker stopped unexpectedly: {join_err}"
            )))
        })
    }
}

fn resolve_source(
    source: AppType,
    applications: &[ApplicationProfile],
) -> Result<&ApplicationProfile, AppError> {
    let profile = applications
        .iter()
        .find(|profile| profile.app == source)
        .ok_or_else(|| AppError::InvalidSource {
            app: source,
            reason: "not in the application list".to_string(),
        })?;
    if !profile.installed {
        return Err(AppError::InvalidSource {
            app: source,
            reason: format!("not installed ({})", profile.config_path.display()),
        });
    }
    if !profile.enabled {
        return Err(AppError::InvalidSource {
            app: source,
            reason: "disabled in settings".to_string(),
        });
    }
    Ok(profile)
}

/// Read, plan and write one target. Read failures skip the target; write
/// failures fail it and leave the file as it was. Nothing is written once
/// `token` has been cancelled.
fn apply_to_target(
    store: &dyn ConfigStore,
    source: &ServerRegistry,
    options: SyncOptions,
    token: &CommitToken,
) -> OutcomeStatus {
    let app = store.app();
    let current = match store.read() {
        Ok(registry) => registry,
        Err(err) => {
            log::warn!("Skipping {app}: {err}");
            return OutcomeStatus::skipped(&err);
        }
    };

    let plan = diff_registries(source, &current, options.prune_extraneous);
    if !plan.conflicts.is_empty() {
        log::warn!(
            "{app} keeps unmanaged entries under source ids, left as is: {}",
            plan.conflicts.join(", ")
        );
    }
    if plan.is_empty() {
        log::debug!("{app} already matches the source");
        return OutcomeStatus::synced(&plan, false);
    }
    if options.dry_run {
        return OutcomeStatus::synced(&plan, false);
    }

    if !token.begin_commit() {
        log::warn!("Dropping the write to {app}: the sync already gave up on it");
        return OutcomeStatus::failed(&AppError::Timeout {
            app,
            timeout: options.target_timeout,
        });
    }

    match store.write(&plan.apply_to(&current)) {
        Ok(()) => {
            log::info!(
                "Synced {app}: {} added, {} updated, {} removed",
                plan.add.len(),
                plan.update.len(),
                plan.remove.len()
            );
            OutcomeStatus::synced(&plan, true)
        }
        Err(err) => {
            log::warn!("Failed to write {app}: {err}");
            OutcomeStatus::failed(&err)
        }
    }
}
