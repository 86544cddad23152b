use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::CaptureError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionStatus {
    /// Never asked; the platform prompt has not been shown yet.
    Undetermined,
    Granted,
    Denied,
}

impl PermissionStatus {
    pub fn is_granted(self) -> bool {
        self == PermissionStatus::Granted
    }
}

/// A source of still frames plus the permission that guards it.
#[async_trait]
pub trait Camera: Send + Sync {
    async fn permission(&self) -> PermissionStatus;

    /// Shows the platform prompt (when it still can) and returns the outcome.
    async fn request_permission(&self) -> PermissionStatus;

    /// One encoded frame (JPEG/PNG/...), straight from the sensor.
    async fn capture_frame(&self) -> Result<Vec<u8>, CaptureError>;
}

/// Treats an image on disk as the camera. Used by the CLI and photo import,
/// where there is no live feed and nothing to ask permission for.
#[derive(Debug, Clone)]
pub struct StillImageCamera {
    path: PathBuf,
}

impl StillImageCamera {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl Camera for StillImageCamera {
    async fn permission(&self) -> PermissionStatus {
        PermissionStatus::Granted
    }

    async fn request_permission(&self) -> PermissionStatus {
        PermissionStatus::Granted
    }

    async fn capture_frame(&self) -> Result<Vec<u8>, CaptureError> {
        tokio::fs::read(&self.path)
            .await
            .map_err(|source| CaptureError::Io {
                path: self.path.display().to_string(),
                source,
            })
    }
}
