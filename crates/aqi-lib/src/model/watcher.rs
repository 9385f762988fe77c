//! Artifact file watching
//!
//! Reloads the model when its artifact is rewritten on disk. The watch is
//! placed on the parent directory because most deploy tools replace the
//! file by rename, which a watch on the file itself would miss.

use super::ModelRegistry;
use crate::error::AqiError;
use crate::health::{components, HealthRegistry};
use crate::observability::{AqiMetrics, StructuredLogger};
use anyhow::{Context, Result};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::ffi::OsString;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Reloads the registry's model when its artifact changes
#[derive(Clone)]
pub struct ModelWatcher {
    registry: Arc<ModelRegistry>,
    health: HealthRegistry,
    metrics: AqiMetrics,
    logger: StructuredLogger,
}

/// Stops watching when dropped
pub struct WatcherHandle {
    _watcher: RecommendedWatcher,
    _task: JoinHandle<()>,
}

impl ModelWatcher {
    pub fn new(
        registry: Arc<ModelRegistry>,
        health: HealthRegistry,
        metrics: AqiMetrics,
        logger: StructuredLogger,
    ) -> Self {
        Self {
            registry,
            health,
            metrics,
            logger,
        }
    }

    /// Start watching the artifact. Must be called inside a tokio runtime.
    pub fn start(self) -> Result<WatcherHandle> {
        let path = self
            .registry
            .path()
            .context("Model registry has no artifact path to watch")?
            .to_path_buf();
        let file_name = path
            .file_name()
            .context("Model artifact path has no file name")?
            .to_os_string();
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => Path::new(".").to_path_buf(),
        };

        let (tx, mut rx) = mpsc::unbounded_channel();

        let mut watcher = RecommendedWatcher::new(
            move |res: std::result::Result<Event, notify::Error>| {
                if let Ok(event) = res {
                    let _ = tx.send(event);
                }
            },
            notify::Config::default(),
        )
        .context("Failed to create filesystem watcher")?;

        watcher
            .watch(&dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch {}", dir.display()))?;
        info!(path = %path.display(), "Watching model artifact for changes");

        let task = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                if is_artifact_change(&event, &file_name) {
                    self.reload().await;
                }
            }
            debug!("Model watcher channel closed");
        });

        Ok(WatcherHandle {
            _watcher: watcher,
            _task: task,
        })
    }

    /// Reload the model and report the outcome to health, metrics and logs.
    /// Returns whether the new artifact is now serving.
    pub async fn reload(&self) -> bool {
        let old_version = self.registry.current().version().to_string();

        // Reading and optimizing the artifact blocks; keep it off the async workers
        let registry = Arc::clone(&self.registry);
        let outcome = tokio::task::spawn_blocking(move || registry.reload())
            .await
            .unwrap_or_else(|e| Err(AqiError::initialization("<reload task>", e)));

        match outcome {
            Ok(handle) => {
                self.metrics.inc_model_reloads(true);
                self.metrics
                    .set_model_version(handle.version(), handle.info().kind);
                self.health.set_model_loaded(handle.version()).await;
                self.logger
                    .log_model_reload(&old_version, handle.version(), true);
                true
            }
            Err(e) => {
                self.metrics.inc_model_reloads(false);
                self.health
                    .set_degraded(
                        components::MODEL,
                        format!("reload failed ({}), serving {}", e, old_version),
                    )
                    .await;
                self.logger.log_model_reload(&old_version, "", false);
                false
            }
        }
    }
}

fn is_artifact_change(event: &Event, file_name: &OsString) -> bool {
    matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_))
        && event
            .paths
            .iter()
            .any(|p| p.file_name() == Some(file_name.as_os_str()))
}
