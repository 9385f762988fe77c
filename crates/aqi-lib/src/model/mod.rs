//! Regression model handles
//!
//! A `ModelHandle` owns one loaded artifact and never changes after it is
//! built. Reloading produces a new handle; see `ModelRegistry`.

mod inference;
mod linear;
mod registry;
mod watcher;

pub use inference::OnnxModel;
pub use linear::LinearModel;
pub use registry::ModelRegistry;
pub use watcher::{ModelWatcher, WatcherHandle};

use crate::error::{AqiError, Result};
use crate::models::{PredictionInput, NUM_FEATURES};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Length of the checksum prefix used as the model version
const VERSION_LEN: usize = 12;

/// Trait for regression model implementations
pub trait AqiModel: Send + Sync {
    /// Score one row of features in training column order
    fn score(&self, features: &[f64; NUM_FEATURES]) -> Result<f64>;

    /// Artifact format name, for logs and metrics
    fn kind(&self) -> &'static str;
}

/// Metadata describing the artifact behind a handle
#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub path: Option<PathBuf>,
    pub kind: &'static str,
    pub checksum: String,
    pub version: String,
    pub loaded_at: i64,
}

/// Immutable, shareable handle to a loaded model
pub struct ModelHandle {
    model: Box<dyn AqiModel>,
    info: ModelInfo,
}

impl fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelHandle").field("info", &self.info).finish()
    }
}

impl ModelHandle {
    /// Load an artifact from disk, choosing the format from the extension.
    ///
    /// Any failure here is an `Initialization` error: the caller must not
    /// serve predictions without a model.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let path_str = path.display().to_string();

        let bytes = std::fs::read(path).map_err(|e| AqiError::initialization(&path_str, e))?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        let model: Box<dyn AqiModel> = match extension.as_deref() {
            Some("onnx") => Box::new(
                OnnxModel::from_bytes(&bytes).map_err(|e| AqiError::initialization(&path_str, e))?,
            ),
            Some("json") => Box::new(
                LinearModel::from_bytes(&bytes)
                    .map_err(|e| AqiError::initialization(&path_str, e))?,
            ),
            other => {
                return Err(AqiError::initialization(
                    &path_str,
                    format!("unsupported artifact extension {:?}", other.unwrap_or("")),
                ))
            }
        };

        let checksum = compute_checksum(&bytes);
        let info = ModelInfo {
            path: Some(path.to_path_buf()),
            kind: model.kind(),
            version: version_from_checksum(&checksum),
            checksum,
            loaded_at: chrono::Utc::now().timestamp(),
        };

        debug!(path = %path_str, version = %info.version, kind = info.kind, "Model artifact loaded");
        Ok(Self { model, info })
    }

    /// Wrap an in-memory model, e.g. one built programmatically
    pub fn from_model(model: impl AqiModel + 'static, version: impl Into<String>) -> Self {
        let kind = model.kind();
        Self {
            model: Box::new(model),
            info: ModelInfo {
                path: None,
                kind,
                checksum: String::new(),
                version: version.into(),
                loaded_at: chrono::Utc::now().timestamp(),
            },
        }
    }

    /// Score a validated input. Errors are passed through unchanged.
    pub fn score(&self, input: &PredictionInput) -> Result<f64> {
        self.model.score(input.as_features())
    }

    pub fn info(&self) -> &ModelInfo {
        &self.info
    }

    pub fn version(&self) -> &str {
        &self.info.version
    }
}

/// Compute the hex SHA256 checksum of an artifact
pub fn compute_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

fn version_from_checksum(checksum: &str) -> String {
    format!("sha256:{}", &checksum[..VERSION_LEN.min(checksum.len())])
}
