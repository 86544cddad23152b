use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use super::ProgressError;
use crate::{
    api::{PlantBackend, QueryCache, QueryKey},
    capture::{compress_frame, Camera, CapturedImage},
    models::{PlantRecord, ProgressEntry, ProgressSnapshot, ProgressUpload},
    workflow::{CameraAccess, WorkflowConfig},
};

const ENABLE_LOGS: bool = true;
use crate::{log_info, log_warn};

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressState {
    pub photo: Option<CapturedImage>,
    pub submitting: bool,
    pub last_error: Option<String>,
    /// Set once an entry was recorded; the screen is done after that.
    pub finished: bool,
}

/// The add-progress screen for one saved plant: take a photo, add notes,
/// upload them together with the plant's recent history.
#[derive(Clone)]
pub struct ProgressController {
    plant: Arc<PlantRecord>,
    state: Arc<Mutex<ProgressState>>,
    camera: Arc<dyn Camera>,
    backend: Arc<dyn PlantBackend>,
    cache: QueryCache,
    config: WorkflowConfig,
    cancel: CancellationToken,
}

impl ProgressController {
    pub fn new(
        plant: PlantRecord,
        config: WorkflowConfig,
        camera: Arc<dyn Camera>,
        backend: Arc<dyn PlantBackend>,
        cache: QueryCache,
    ) -> Self {
        Self {
            plant: Arc::new(plant),
            state: Arc::new(Mutex::new(ProgressState::default())),
            camera,
            backend,
            cache,
            config,
            cancel: CancellationToken::new(),
        }
    }

    pub fn plant(&self) -> &PlantRecord {
        &self.plant
    }

    pub async fn snapshot(&self) -> ProgressState {
        self.state.lock().await.clone()
    }

    pub async fn open_camera(&self) -> CameraAccess {
        let permission = self.camera.permission().await;
        if permission.is_granted() {
            CameraAccess::Ready
        } else {
            CameraAccess::PermissionRequired(permission)
        }
    }

    pub async fn request_permission(&self) -> CameraAccess {
        let permission = self.camera.request_permission().await;
        if permission.is_granted() {
            CameraAccess::Ready
        } else {
            CameraAccess::PermissionRequired(permission)
        }
    }

    /// Takes a photo, replacing (and deleting) any earlier one.
    pub async fn capture(&self) -> Result<CapturedImage, ProgressError> {
        self.ensure_open().await?;
        if !self.camera.permission().await.is_granted() {
            return Err(ProgressError::PermissionDenied);
        }
        if self.state.lock().await.submitting {
            return Err(ProgressError::Busy);
        }

        let frame = self.camera.capture_frame().await?;
        let image = compress_frame(frame, &self.config.capture, &self.config.capture_dir).await?;

        let mut state = self.state.lock().await;
        if self.cancel.is_cancelled() || state.submitting {
            drop(state);
            discard(&image);
            return Err(if self.cancel.is_cancelled() {
                ProgressError::Cancelled
            } else {
                ProgressError::Busy
            });
        }
        if let Some(previous) = state.photo.replace(image.clone()) {
            discard(&previous);
        }
        state.last_error = None;
        Ok(image)
    }

    pub async fn retake(&self) -> Result<(), ProgressError> {
        self.ensure_open().await?;
        let mut state = self.state.lock().await;
        if state.submitting {
            return Err(ProgressError::Busy);
        }
        if let Some(previous) = state.photo.take() {
            discard(&previous);
        }
        Ok(())
    }

    /// Uploads the photo with `notes`. On success the plant's cached detail
    /// is dropped, the photo deleted and the controller finished, since its
    /// copy of the plant's history is now out of date. On failure the photo
    /// is kept.
    pub async fn submit(&self, notes: &str) -> Result<Option<ProgressEntry>, ProgressError> {
        self.ensure_open().await?;
        let upload = {
            let mut state = self.state.lock().await;
            if state.submitting {
                return Err(ProgressError::Busy);
            }
            let photo = state.photo.as_ref().ok_or(ProgressError::MissingPhoto)?;
            let upload = self.upload_for(photo, notes)?;
            state.submitting = true;
            state.last_error = None;
            upload
        };

        let outcome = tokio::select! {
            _ = self.cancel.cancelled() => Err(ProgressError::Cancelled),
            result = self.backend.generate_progress(&upload) => result.map_err(ProgressError::from),
        };
        if self.cancel.is_cancelled() {
            return Err(ProgressError::Cancelled);
        }

        let mut state = self.state.lock().await;
        state.submitting = false;
        match outcome {
            Ok(entry) => {
                state.finished = true;
                if let Some(photo) = state.photo.take() {
                    discard(&photo);
                }
                drop(state);
                self.cache.invalidate(&QueryKey::PlantDetail(upload.plant_id.clone())).await;
                log_info!("added progress to plant {}", upload.plant_id);
                Ok(entry)
            }
            Err(err) => {
                log_warn!("progress upload failed: {err}");
                state.last_error = Some(err.to_string());
                Err(err)
            }
        }
    }

    fn upload_for(&self, photo: &CapturedImage, notes: &str) -> Result<ProgressUpload, ProgressError> {
        let plant_id = self.plant.id.trim();
        let plant_name = self.plant.name.trim();
        if plant_id.is_empty() || plant_name.is_empty() {
            return Err(ProgressError::MissingPlant);
        }

        Ok(ProgressUpload {
            photo: photo.path.clone(),
            notes: notes.to_string(),
            plant_id: plant_id.to_string(),
            plant_name: plant_name.to_string(),
            history: ProgressSnapshot::trailing(&self.plant.plant_progress),
        })
    }

    /// Abandons any upload in flight and deletes the photo.
    pub async fn close(&self) {
        self.cancel.cancel();
        if let Some(photo) = self.state.lock().await.photo.take() {
            discard(&photo);
        }
    }

    async fn ensure_open(&self) -> Result<(), ProgressError> {
        if self.cancel.is_cancelled() {
            return Err(ProgressError::Cancelled);
        }
        if self.state.lock().await.finished {
            return Err(ProgressError::Finished);
        }
        Ok(())
    }
}

fn discard(image: &CapturedImage) {
    if let Err(err) = image.discard() {
        log_warn!("could not delete {}: {err}", image.path.display());
    }
}
