//! Current-model slot with atomic replacement
//!
//! Predictions take an `Arc` to the handle that is current when they start
//! and keep it until they finish. A reload builds a complete new handle
//! before swapping it in, so an in-flight prediction never observes a
//! half-loaded model.

use super::ModelHandle;
use crate::error::{AqiError, Result};
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{info, warn};

pub struct ModelRegistry {
    path: Option<PathBuf>,
    current: RwLock<Arc<ModelHandle>>,
}

impl ModelRegistry {
    /// Load the initial artifact. Fails with `Initialization` if it cannot be loaded.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let handle = ModelHandle::load(&path)?;
        info!(path = %path.display(), version = %handle.version(), "Initial model loaded");
        Ok(Self {
            path: Some(path),
            current: RwLock::new(Arc::new(handle)),
        })
    }

    /// Registry around an already-built handle. `reload` is unavailable.
    pub fn from_handle(handle: ModelHandle) -> Self {
        Self {
            path: None,
            current: RwLock::new(Arc::new(handle)),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// The handle new predictions should use
    pub fn current(&self) -> Arc<ModelHandle> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Install a new handle, returning the one it replaced
    pub fn replace(&self, handle: ModelHandle) -> Arc<ModelHandle> {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *current, Arc::new(handle))
    }

    /// Re-read the artifact from disk.
    ///
    /// On failure the previous handle stays current and the error is returned.
    pub fn reload(&self) -> Result<Arc<ModelHandle>> {
        let path = self.path.as_ref().ok_or_else(|| {
            AqiError::initialization("<memory>", "registry has no artifact path to reload from")
        })?;

        match ModelHandle::load(path) {
            Ok(handle) => {
                let previous = self.replace(handle);
                let current = self.current();
                info!(
                    old_version = %previous.version(),
                    new_version = %current.version(),
                    "Model reloaded"
                );
                Ok(current)
            }
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    kept_version = %self.current().version(),
                    "Model reload failed, keeping previous version"
                );
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LinearModel;
    use crate::models::RawPredictionInput;

    fn write_linear(path: &Path, intercept: f64) {
        let model = LinearModel::constant(intercept);
        std::fs::write(path, serde_json::to_vec(&model).unwrap()).unwrap();
    }

    #[test]
    fn test_reload_swaps_handle_without_touching_old_one() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        write_linear(&path, 10.0);

        let registry = ModelRegistry::load(&path).unwrap();
        let before = registry.current();

        write_linear(&path, 20.0);
        let after = registry.reload().unwrap();

        let input = RawPredictionInput::new(1.0, 1.0, 1.0, 1.0).validate().unwrap();
        assert_eq!(before.score(&input).unwrap(), 10.0);
        assert_eq!(after.score(&input).unwrap(), 20.0);
        assert_ne!(before.version(), after.version());
        assert_eq!(registry.current().version(), after.version());
    }

    #[test]
    fn test_failed_reload_keeps_previous_handle() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        write_linear(&path, 10.0);

        let registry = ModelRegistry::load(&path).unwrap();
        let version = registry.current().version().to_string();

        std::fs::write(&path, b"{ truncated").unwrap();
        assert!(registry.reload().is_err());
        assert_eq!(registry.current().version(), version);
    }

    #[test]
    fn test_initial_load_failure_is_fatal() {
        let err = ModelRegistry::load("/nonexistent/model.json").err().unwrap();
        assert!(matches!(err, AqiError::Initialization { .. }));
    }

    #[test]
    fn test_in_memory_registry_cannot_reload() {
        let registry = ModelRegistry::from_handle(ModelHandle::from_model(
            LinearModel::constant(1.0),
            "test",
        ));
        assert!(registry.path().is_none());
        assert!(registry.reload().is_err());
    }
}
