use crossbeam_channel::{Receiver, Sender};
use futures_util::future::join_all;
use log::{debug, info, warn};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tokio_util::sync::CancellationToken;

use polyver_backend::{LanguageConfig, ScanContext, ScanPathSpec, VersionRecord};
use polyver_platform::AppPaths;
use polyver_scan::{CustomScanner, InstallLayout};
use polyver_shell::EnvScriptWriter;

use crate::active::{
    ActiveState, ActiveVersionResolver, active_version_key, order_with_active_first,
};
use crate::custom_languages::{load_custom_languages, save_custom_languages};
use crate::error::AppError;
use crate::events::{ServiceEvent, Snapshot};
use crate::preferences::PreferenceStore;
use crate::registry::LanguageRegistry;
use crate::settings::AppSettings;

#[derive(Default)]
struct LanguageSlot {
    snapshot: RwLock<Option<Arc<Snapshot>>>,
    activation: tokio::sync::Mutex<()>,
    refresh_token: Mutex<Option<CancellationToken>>,
}

impl LanguageSlot {
    fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn store_snapshot(&self, snapshot: Arc<Snapshot>) {
        *self
            .snapshot
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(snapshot);
    }

    /// Install a fresh token for a new refresh, cancelling the one in flight.
    fn begin_refresh(&self) -> CancellationToken {
        let token = CancellationToken::new();
        let previous = self
            .refresh_token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(token.clone());
        if let Some(previous) = previous {
            previous.cancel();
        }
        token
    }

    fn cancel_refresh(&self) {
        if let Some(token) = self
            .refresh_token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            token.cancel();
        }
    }
}

/// Run blocking file work (script writes, preference locks) off the async
/// worker threads.
async fn run_blocking<T, F>(work: F) -> Result<T, AppError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, AppError> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|error| AppError::background_task_failed(error.to_string()))?
}

/// Owns the language registry and publishes one snapshot per language.
///
/// Refreshes of different languages run independently. A newer refresh of the
/// same language cancels the older one, which then publishes nothing.
/// Activations are serialized per language, and a refresh holds the same lock
/// from resolving the active version until its snapshot is stored.
pub struct RuntimeService {
    registry: LanguageRegistry,
    writer: EnvScriptWriter,
    preferences: Arc<dyn PreferenceStore>,
    settings: RwLock<AppSettings>,
    settings_path: PathBuf,
    context: ScanContext,
    slots: Mutex<HashMap<String, Arc<LanguageSlot>>>,
    subscribers: Mutex<Vec<Sender<ServiceEvent>>>,
}

impl RuntimeService {
    /// Build the service with the built-in languages plus every custom
    /// language stored in `preferences`.
    pub fn new(
        paths: &AppPaths,
        settings: AppSettings,
        preferences: Arc<dyn PreferenceStore>,
    ) -> Self {
        let context = ScanContext::default().with_command_timeout(settings.command_timeout());
        let service = Self {
            registry: LanguageRegistry::with_builtins(),
            writer: EnvScriptWriter::new(paths.script_dir().to_path_buf()),
            preferences,
            settings: RwLock::new(settings),
            settings_path: paths.settings_file(),
            context,
            slots: Mutex::new(HashMap::new()),
            subscribers: Mutex::new(Vec::new()),
        };

        for config in load_custom_languages(service.preferences.as_ref()) {
            let identifier = config.identifier.clone();
            if let Err(error) = service.registry.register(config, Arc::new(CustomScanner)) {
                warn!("Skipping stored custom language {identifier}: {error}");
            }
        }

        service
    }

    /// Replace the scan context, e.g. to confine scanning to granted
    /// directories or to point `~` elsewhere.
    #[must_use]
    pub fn with_scan_context(mut self, context: ScanContext) -> Self {
        self.context = context;
        self
    }

    #[must_use]
    pub fn registry(&self) -> &LanguageRegistry {
        &self.registry
    }

    #[must_use]
    pub fn script_writer(&self) -> &EnvScriptWriter {
        &self.writer
    }

    #[must_use]
    pub fn settings(&self) -> AppSettings {
        self.settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Receive every event published from now on.
    #[must_use]
    pub fn subscribe(&self) -> Receiver<ServiceEvent> {
        let (sender, receiver) = crossbeam_channel::unbounded();
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(sender);
        receiver
    }

    fn publish(&self, event: ServiceEvent) {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|sender| sender.send(event.clone()).is_ok());
    }

    fn slot(&self, identifier: &str) -> Arc<LanguageSlot> {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(identifier.to_string())
            .or_default()
            .clone()
    }

    #[must_use]
    pub fn snapshot(&self, identifier: &str) -> Option<Arc<Snapshot>> {
        let slot = self
            .slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(identifier)
            .cloned()?;
        slot.snapshot()
    }

    /// The language's configuration with the user's extra scan paths
    /// appended.
    ///
    /// # Errors
    /// Returns a not-found registry error for unknown identifiers.
    pub fn language(&self, identifier: &str) -> Result<LanguageConfig, AppError> {
        let entry = self
            .registry
            .get(identifier)
            .ok_or_else(|| AppError::not_found(identifier))?;
        Ok(self.with_extra_scan_paths(entry.config))
    }

    fn with_extra_scan_paths(&self, mut config: LanguageConfig) -> LanguageConfig {
        let settings = self.settings.read().unwrap_or_else(PoisonError::into_inner);
        for spec in settings.extra_scan_paths_for(&config.identifier) {
            if !config.scan_paths.iter().any(|existing| existing.raw == spec.raw) {
                config.scan_paths.push(spec.clone());
            }
        }
        config
    }

    /// Re-scan one language from scratch and publish the new snapshot.
    ///
    /// # Errors
    /// Fails for unknown languages, and with [`AppError::RefreshCancelled`]
    /// when a newer refresh of the same language superseded this one.
    pub async fn refresh(&self, identifier: &str) -> Result<Arc<Snapshot>, AppError> {
        let entry = self
            .registry
            .get(identifier)
            .ok_or_else(|| AppError::not_found(identifier))?;
        let config = self.with_extra_scan_paths(entry.config);
        let slot = self.slot(identifier);
        let token = slot.begin_refresh();

        debug!("Refreshing {identifier}");
        let records = tokio::select! {
            () = token.cancelled() => {
                debug!("Refresh of {identifier} superseded during scan");
                return Err(AppError::refresh_cancelled(identifier));
            }
            records = entry.scanner.scan(&config, &self.context) => records,
        };

        let _activation = slot.activation.lock().await;
        if token.is_cancelled() {
            debug!("Refresh of {identifier} superseded before resolving");
            return Err(AppError::refresh_cancelled(identifier));
        }

        let active = self.resolve_or_seed(&token, &config, &records).await;
        let snapshot = Arc::new(Snapshot::new(
            identifier,
            order_with_active_first(records, active.as_ref()),
            active,
        ));

        {
            let mut current = slot
                .refresh_token
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if token.is_cancelled() {
                return Err(AppError::refresh_cancelled(identifier));
            }
            *current = None;
            slot.store_snapshot(snapshot.clone());
        }

        debug!(
            "{identifier}: {} version(s), active {:?}",
            snapshot.records.len(),
            snapshot.active.as_ref().map(|record| record.version.as_str())
        );
        self.publish(ServiceEvent::SnapshotUpdated {
            identifier: identifier.to_string(),
            snapshot: snapshot.clone(),
        });
        Ok(snapshot)
    }

    /// Refresh every registered language concurrently.
    pub async fn refresh_all(&self) -> Vec<(String, Result<Arc<Snapshot>, AppError>)> {
        let identifiers: Vec<String> = self
            .registry
            .all()
            .into_iter()
            .map(|entry| entry.config.identifier)
            .collect();
        let results = join_all(
            identifiers
                .iter()
                .map(|identifier| self.refresh(identifier)),
        )
        .await;
        identifiers.into_iter().zip(results).collect()
    }

    /// Caller holds the slot's activation lock.
    async fn resolve_or_seed(
        &self,
        token: &CancellationToken,
        config: &LanguageConfig,
        records: &[VersionRecord],
    ) -> Option<VersionRecord> {
        let state = {
            let preferences = Arc::clone(&self.preferences);
            let writer = self.writer.clone();
            let config = config.clone();
            let records = records.to_vec();
            run_blocking(move || {
                Ok(ActiveVersionResolver::new(preferences.as_ref(), &writer)
                    .resolve_state(&records, &config))
            })
            .await
        };

        let state = match state {
            Ok(state) => state,
            Err(error) => {
                warn!("Could not resolve active {} version: {error}", config.identifier);
                return None;
            }
        };

        match state {
            ActiveState::Active(record) => Some(record),
            ActiveState::Unmatched(_) => None,
            ActiveState::Unset => {
                let first = records.first()?;
                if !self.settings().auto_activate.applies_to(config) || token.is_cancelled() {
                    return None;
                }

                match self.activate(config, first).await {
                    Ok(script_path) => {
                        info!(
                            "Selected {} {} as default",
                            config.identifier, first.version
                        );
                        self.publish(ServiceEvent::ActiveChanged {
                            identifier: config.identifier.clone(),
                            record: first.clone(),
                            script_path,
                        });
                        Some(first.clone())
                    }
                    Err(error) => {
                        warn!(
                            "Could not select default {} version: {error}",
                            config.identifier
                        );
                        self.publish(ServiceEvent::ActivationFailed {
                            identifier: config.identifier.clone(),
                            error,
                        });
                        None
                    }
                }
            }
        }
    }

    /// Write the script, then remember the choice.
    async fn activate(
        &self,
        config: &LanguageConfig,
        record: &VersionRecord,
    ) -> Result<PathBuf, AppError> {
        let writer = self.writer.clone();
        let preferences = Arc::clone(&self.preferences);
        let config = config.clone();
        let record = record.clone();
        run_blocking(move || {
            let script_path = writer.write(&config, &record)?;
            preferences.set(
                &active_version_key(&config.identifier),
                &record.install_path.to_string_lossy(),
            )?;
            Ok(script_path)
        })
        .await
    }

    /// The snapshot's own record for `record`'s install path, else `record`
    /// itself if `bin/<executable>` is present there.
    async fn verified_record(
        &self,
        slot: &LanguageSlot,
        config: &LanguageConfig,
        record: &VersionRecord,
    ) -> Result<VersionRecord, AppError> {
        if let Some(known) = slot.snapshot().and_then(|snapshot| {
            snapshot
                .records
                .iter()
                .find(|candidate| candidate.matches_path(&record.install_path))
                .cloned()
        }) {
            return Ok(known);
        }

        let layout = InstallLayout::flat(config.executable_name());
        let candidate = record.clone();
        let identifier = config.identifier.clone();
        run_blocking(move || {
            if layout.has_executable(&candidate.install_path) {
                Ok(candidate)
            } else {
                Err(AppError::NotInstalled {
                    identifier,
                    install_path: candidate.install_path,
                })
            }
        })
        .await
    }

    /// Make `record` the active version of `identifier`.
    ///
    /// `record` must be in the latest snapshot or hold the language's
    /// executable under `bin/`. The language's script is
    /// rewritten and the choice stored; the current snapshot, if any, is
    /// republished with `record` first.
    ///
    /// # Errors
    /// [`AppError::NotInstalled`] for unverified records. Script and
    /// preference failures are returned and also published as
    /// [`ServiceEvent::ActivationFailed`].
    pub async fn set_active(
        &self,
        identifier: &str,
        record: &VersionRecord,
    ) -> Result<PathBuf, AppError> {
        let config = self.language(identifier)?;
        let slot = self.slot(identifier);
        let _activation = slot.activation.lock().await;

        let record = &self.verified_record(&slot, &config, record).await?;
        let script_path = match self.activate(&config, record).await {
            Ok(path) => path,
            Err(error) => {
                warn!("Failed to activate {identifier} {}: {error}", record.version);
                self.publish(ServiceEvent::ActivationFailed {
                    identifier: identifier.to_string(),
                    error: error.clone(),
                });
                return Err(error);
            }
        };

        if let Some(current) = slot.snapshot() {
            let updated = Arc::new(Snapshot {
                identifier: current.identifier.clone(),
                records: order_with_active_first(current.records.clone(), Some(record)),
                active: Some(record.clone()),
                scanned_at: current.scanned_at,
            });
            slot.store_snapshot(updated.clone());
            self.publish(ServiceEvent::SnapshotUpdated {
                identifier: identifier.to_string(),
                snapshot: updated,
            });
        }

        self.publish(ServiceEvent::ActiveChanged {
            identifier: identifier.to_string(),
            record: record.clone(),
            script_path: script_path.clone(),
        });
        Ok(script_path)
    }

    /// Activate the record at `install_path` from the latest snapshot.
    ///
    /// # Errors
    /// [`AppError::NotInstalled`] when the latest snapshot has no such
    /// record, plus everything [`Self::set_active`] returns.
    pub async fn set_active_path(
        &self,
        identifier: &str,
        install_path: &Path,
    ) -> Result<PathBuf, AppError> {
        let record = self
            .snapshot(identifier)
            .and_then(|snapshot| {
                snapshot
                    .records
                    .iter()
                    .find(|record| record.matches_path(install_path))
                    .cloned()
            })
            .ok_or_else(|| AppError::NotInstalled {
                identifier: identifier.to_string(),
                install_path: install_path.to_path_buf(),
            })?;
        self.set_active(identifier, &record).await
    }

    fn persist_custom_languages(&self) -> Result<(), AppError> {
        save_custom_languages(self.preferences.as_ref(), &self.registry.custom_configs())?;
        Ok(())
    }

    /// Register and persist a user-defined language. No scan is started.
    ///
    /// # Errors
    /// Registry validation errors, or a preference error (the registration is
    /// rolled back).
    pub fn add_custom_language(&self, config: LanguageConfig) -> Result<(), AppError> {
        let identifier = config.identifier.clone();
        self.registry.register(config, Arc::new(CustomScanner))?;

        if let Err(error) = self.persist_custom_languages() {
            let _ = self.registry.unregister(&identifier);
            return Err(error);
        }

        info!("Added custom language {identifier}");
        self.publish(ServiceEvent::LanguageAdded { identifier });
        Ok(())
    }

    /// # Errors
    /// Unknown or built-in identifiers, or a preference error (the previous
    /// configuration is restored).
    pub fn update_custom_language(&self, config: LanguageConfig) -> Result<(), AppError> {
        let identifier = config.identifier.clone();
        let previous = self
            .registry
            .get(&identifier)
            .ok_or_else(|| AppError::not_found(&identifier))?
            .config;
        self.registry.update_config(config)?;

        if let Err(error) = self.persist_custom_languages() {
            let _ = self.registry.update_config(previous);
            return Err(error);
        }

        self.publish(ServiceEvent::LanguageUpdated { identifier });
        Ok(())
    }

    /// Unregister a custom language and delete its script, stored active
    /// version and extra scan paths.
    ///
    /// # Errors
    /// Unknown or built-in identifiers, or a preference error (the language
    /// is registered again).
    pub fn remove_custom_language(&self, identifier: &str) -> Result<(), AppError> {
        let removed = self.registry.unregister(identifier)?;

        if let Err(error) = self.persist_custom_languages() {
            let _ = self.registry.register(removed.config, removed.scanner);
            return Err(error);
        }

        if let Err(error) = self.writer.remove(&removed.config) {
            warn!("Could not remove script for {identifier}: {error}");
        }
        if let Err(error) = self.preferences.remove(&active_version_key(identifier)) {
            warn!("Could not clear active version for {identifier}: {error}");
        }

        let updated = {
            let mut settings = self.settings.write().unwrap_or_else(PoisonError::into_inner);
            settings
                .extra_scan_paths
                .remove(identifier)
                .map(|_| settings.clone())
        };
        if let Some(updated) = updated
            && let Err(error) = self.save_settings(&updated)
        {
            warn!("{error}");
        }

        if let Some(slot) = self
            .slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(identifier)
        {
            slot.cancel_refresh();
        }

        info!("Removed custom language {identifier}");
        self.publish(ServiceEvent::LanguageRemoved {
            identifier: identifier.to_string(),
        });
        Ok(())
    }

    /// Append a user scan path to any language. Takes effect on the next
    /// refresh.
    ///
    /// # Errors
    /// Blank paths, unknown languages, or a settings write failure.
    pub fn add_scan_path(&self, identifier: &str, raw: &str) -> Result<(), AppError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(AppError::InvalidScanPath {
                raw: raw.to_string(),
            });
        }
        if !self.registry.contains(identifier) {
            return Err(AppError::not_found(identifier));
        }

        let updated = {
            let mut settings = self.settings.write().unwrap_or_else(PoisonError::into_inner);
            let paths = settings
                .extra_scan_paths
                .entry(identifier.to_string())
                .or_default();
            if paths.iter().any(|spec| spec.raw == raw) {
                return Ok(());
            }
            paths.push(ScanPathSpec::custom(raw));
            settings.clone()
        };
        self.save_settings(&updated)
    }

    /// Remove a previously added user scan path. Built-in paths cannot be
    /// removed.
    ///
    /// # Errors
    /// [`AppError::ScanPathNotFound`] when the path was never added, or a
    /// settings write failure.
    pub fn remove_scan_path(&self, identifier: &str, raw: &str) -> Result<(), AppError> {
        let raw = raw.trim();
        let updated = {
            let mut settings = self.settings.write().unwrap_or_else(PoisonError::into_inner);
            let Some(paths) = settings.extra_scan_paths.get_mut(identifier) else {
                return Err(AppError::ScanPathNotFound {
                    identifier: identifier.to_string(),
                    raw: raw.to_string(),
                });
            };
            let before = paths.len();
            paths.retain(|spec| spec.raw != raw);
            if paths.len() == before {
                return Err(AppError::ScanPathNotFound {
                    identifier: identifier.to_string(),
                    raw: raw.to_string(),
                });
            }
            if paths.is_empty() {
                settings.extra_scan_paths.remove(identifier);
            }
            settings.clone()
        };
        self.save_settings(&updated)
    }

    fn save_settings(&self, settings: &AppSettings) -> Result<(), AppError> {
        settings
            .save_to(&self.settings_path)
            .map_err(AppError::settings_save_failed)
    }
}
