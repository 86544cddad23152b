use std::{path::PathBuf, sync::Arc, time::Duration};

use serde::Serialize;
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
    time,
};
use tokio_util::sync::CancellationToken;

use super::{LoadingMessages, ReviewSet, Selection, WorkflowError, WorkflowState, WorkflowStatus};
use crate::{
    api::{PlantBackend, QueryCache, QueryKey},
    capture::{compress_frame, Camera, CapturedImage, PermissionStatus},
    models::{CandidateRef, PlantRecord},
    settings::{CaptureSettings, ClientSettings},
};

const ENABLE_LOGS: bool = true;
use crate::{log_info, log_warn};

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    pub capture: CaptureSettings,
    /// Where compressed photos wait for upload.
    pub capture_dir: PathBuf,
    pub loading_interval: Duration,
}

impl WorkflowConfig {
    pub fn from_settings(settings: &ClientSettings, capture_dir: PathBuf) -> Self {
        Self {
            capture: settings.capture.clone(),
            capture_dir,
            loading_interval: settings.loading_message_interval(),
        }
    }
}

/// Outcome of trying to show the camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "permission")]
pub enum CameraAccess {
    Ready,
    /// Show the permission affordance instead of the feed.
    PermissionRequired(PermissionStatus),
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum WorkflowEvent {
    StatusChanged { status: WorkflowStatus },
    LoadingMessage { message: String },
    SelectionChanged { selection: Option<Selection> },
    Failed { message: String },
    Saved { plant_id: Option<String> },
}

/// Drives one identify screen: capture, identify, review, save.
///
/// Every network call is tied to the controller's cancellation token. After
/// [`close`](Self::close) any response that still arrives is dropped and the
/// state is not touched.
#[derive(Clone)]
pub struct IdentifyController {
    state: Arc<Mutex<WorkflowState>>,
    camera: Arc<dyn Camera>,
    backend: Arc<dyn PlantBackend>,
    cache: QueryCache,
    config: WorkflowConfig,
    ticker: Arc<Mutex<Option<JoinHandle<()>>>>,
    cancel: CancellationToken,
    events: broadcast::Sender<WorkflowEvent>,
}

impl IdentifyController {
    pub fn new(
        config: WorkflowConfig,
        camera: Arc<dyn Camera>,
        backend: Arc<dyn PlantBackend>,
        cache: QueryCache,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            state: Arc::new(Mutex::new(WorkflowState::new())),
            camera,
            backend,
            cache,
            config,
            ticker: Arc::new(Mutex::new(None)),
            cancel: CancellationToken::new(),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WorkflowEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> WorkflowState {
        self.state.lock().await.clone()
    }

    pub async fn status(&self) -> WorkflowStatus {
        self.state.lock().await.status
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Shows the live feed when the camera permission is granted. Otherwise
    /// the workflow stays idle and the caller shows the permission prompt.
    pub async fn open_camera(&self) -> Result<CameraAccess, WorkflowError> {
        self.ensure_open()?;
        let permission = self.camera.permission().await;
        self.enter_capturing(permission).await
    }

    /// The "grant permission" button.
    pub async fn request_permission(&self) -> Result<CameraAccess, WorkflowError> {
        self.ensure_open()?;
        let permission = self.camera.request_permission().await;
        self.enter_capturing(permission).await
    }

    async fn enter_capturing(&self, permission: PermissionStatus) -> Result<CameraAccess, WorkflowError> {
        if !permission.is_granted() {
            log_info!("camera permission {:?}, staying idle", permission);
            return Ok(CameraAccess::PermissionRequired(permission));
        }
        self.state.lock().await.begin_capturing()?;
        self.emit_status(WorkflowStatus::Capturing);
        Ok(CameraAccess::Ready)
    }

    /// Takes one frame and compresses it into the capture directory.
    pub async fn capture(&self) -> Result<CapturedImage, WorkflowError> {
        self.ensure_open()?;
        {
            let state = self.state.lock().await;
            if state.status == WorkflowStatus::Idle && !self.camera.permission().await.is_granted() {
                return Err(WorkflowError::PermissionDenied);
            }
            if state.status != WorkflowStatus::Capturing {
                return Err(WorkflowError::invalid(state.status, super::WorkflowAction::Capture));
            }
        }

        let image = tokio::select! {
            _ = self.cancel.cancelled() => return Err(WorkflowError::Cancelled),
            captured = self.take_photo() => captured?,
        };

        let accepted = {
            let mut state = self.state.lock().await;
            if self.cancel.is_cancelled() {
                Err(WorkflowError::Cancelled)
            } else {
                state.captured(image.clone())
            }
        };
        if let Err(err) = accepted {
            discard(&image);
            return Err(err);
        }

        log_info!("captured {}x{} photo", image.width, image.height);
        self.emit_status(WorkflowStatus::Previewing);
        Ok(image)
    }

    async fn take_photo(&self) -> Result<CapturedImage, WorkflowError> {
        let frame = self.camera.capture_frame().await?;
        Ok(compress_frame(frame, &self.config.capture, &self.config.capture_dir).await?)
    }

    /// Deletes the previewed photo and goes back to the feed.
    pub async fn retake(&self) -> Result<(), WorkflowError> {
        self.ensure_open()?;
        let previous = self.state.lock().await.retake()?;
        if let Some(image) = previous {
            discard(&image);
        }
        self.emit_status(WorkflowStatus::Capturing);
        Ok(())
    }

    /// Uploads the previewed photo. Only one identification runs at a time;
    /// on failure the photo is kept so the user can retry or retake.
    pub async fn identify(&self) -> Result<ReviewSet, WorkflowError> {
        self.ensure_open()?;
        let photo = self.state.lock().await.begin_identify()?;
        self.emit_status(WorkflowStatus::Identifying);
        self.spawn_ticker().await;

        let outcome = tokio::select! {
            _ = self.cancel.cancelled() => Err(WorkflowError::Cancelled),
            result = self.backend.identify(&photo) => result.map_err(WorkflowError::from),
        };
        self.cancel_ticker().await;

        if self.cancel.is_cancelled() {
            log_info!("identify screen closed, dropping response");
            return Err(WorkflowError::Cancelled);
        }

        let mut state = self.state.lock().await;
        match outcome {
            Ok(result) => {
                log_info!(
                    "identified {} with {} alternatives",
                    result.primary().name,
                    result.alternatives().len()
                );
                let review = state.identified(result)?.clone();
                drop(state);
                self.emit_status(WorkflowStatus::Reviewing);
                self.emit(WorkflowEvent::SelectionChanged {
                    selection: review.selection().cloned(),
                });
                Ok(review)
            }
            Err(err) => {
                log_warn!("identify failed: {err}");
                state.identify_failed(err.to_string());
                drop(state);
                self.emit(WorkflowEvent::Failed {
                    message: err.to_string(),
                });
                self.emit_status(WorkflowStatus::Previewing);
                Err(err)
            }
        }
    }

    pub async fn select(&self, target: CandidateRef) -> Result<Option<Selection>, WorkflowError> {
        self.ensure_open()?;
        let mut state = self.state.lock().await;
        let changed = state.select(target)?;
        let selection = state
            .review
            .as_ref()
            .and_then(|review| review.selection().cloned());
        drop(state);

        if changed {
            self.emit(WorkflowEvent::SelectionChanged {
                selection: selection.clone(),
            });
        }
        Ok(selection)
    }

    pub async fn clear_selection(&self) -> Result<(), WorkflowError> {
        self.ensure_open()?;
        self.state.lock().await.clear_selection()?;
        self.emit(WorkflowEvent::SelectionChanged { selection: None });
        Ok(())
    }

    /// Whether the save button is enabled.
    pub async fn can_save(&self) -> bool {
        !self.is_closed() && self.state.lock().await.can_save()
    }

    /// Creates the selected plant. Retries of the same selection send the
    /// same idempotency key.
    pub async fn save(&self) -> Result<PlantRecord, WorkflowError> {
        self.ensure_open()?;
        let (plant, key) = self.state.lock().await.begin_save()?;
        self.emit_status(WorkflowStatus::Saving);

        let outcome = tokio::select! {
            _ = self.cancel.cancelled() => Err(WorkflowError::Cancelled),
            result = self.backend.create_plant(&plant, key) => result.map_err(WorkflowError::from),
        };
        if self.cancel.is_cancelled() {
            log_info!("identify screen closed, dropping save response");
            return Err(WorkflowError::Cancelled);
        }

        match outcome {
            Ok(record) => {
                let plant_id = Some(record.id.clone()).filter(|id| !id.is_empty());
                let leftover = self.state.lock().await.saved(plant_id.clone());
                self.cache.invalidate(&QueryKey::PlantList).await;
                if let Some(image) = leftover {
                    discard(&image);
                }
                log_info!("saved plant {}", record.name);
                self.emit(WorkflowEvent::Saved { plant_id });
                self.emit_status(WorkflowStatus::Done);
                Ok(record)
            }
            Err(err) => {
                log_warn!("save failed: {err}");
                self.state.lock().await.save_failed(err.to_string());
                self.emit(WorkflowEvent::Failed {
                    message: err.to_string(),
                });
                self.emit_status(WorkflowStatus::Reviewing);
                Err(err)
            }
        }
    }

    /// From review back to the camera, dropping result and photo.
    pub async fn restart(&self) -> Result<(), WorkflowError> {
        self.ensure_open()?;
        let previous = self.state.lock().await.restart()?;
        if let Some(image) = previous {
            discard(&image);
        }
        self.emit_status(WorkflowStatus::Capturing);
        Ok(())
    }

    /// The screen is going away. In-flight requests are abandoned and their
    /// results ignored; the temporary photo is deleted.
    pub async fn close(&self) {
        if self.cancel.is_cancelled() {
            return;
        }
        self.cancel.cancel();
        self.cancel_ticker().await;

        let leftover = self.state.lock().await.close();
        if let Some(image) = leftover {
            discard(&image);
        }
        self.emit_status(WorkflowStatus::Done);
    }

    fn ensure_open(&self) -> Result<(), WorkflowError> {
        if self.cancel.is_cancelled() {
            return Err(WorkflowError::Cancelled);
        }
        Ok(())
    }

    async fn spawn_ticker(&self) {
        let mut ticker_guard = self.ticker.lock().await;
        if let Some(handle) = ticker_guard.take() {
            handle.abort();
        }

        let state = self.state.clone();
        let events = self.events.clone();
        let interval_length = self.config.loading_interval;

        let handle = tokio::spawn(async move {
            let mut interval = time::interval(interval_length);
            let mut messages = LoadingMessages::default();
            loop {
                interval.tick().await;

                let message = {
                    let mut guard = state.lock().await;
                    if guard.status != WorkflowStatus::Identifying {
                        break;
                    }
                    let message = messages.next().unwrap_or_default().to_string();
                    guard.loading_message = Some(message.clone());
                    message
                };

                let _ = events.send(WorkflowEvent::LoadingMessage { message });
            }
        });

        *ticker_guard = Some(handle);
    }

    async fn cancel_ticker(&self) {
        if let Some(handle) = self.ticker.lock().await.take() {
            handle.abort();
        }
    }

    fn emit_status(&self, status: WorkflowStatus) {
        self.emit(WorkflowEvent::StatusChanged { status });
    }

    fn emit(&self, event: WorkflowEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

fn discard(image: &CapturedImage) {
    if let Err(err) = image.discard() {
        log_warn!("could not delete {}: {err}", image.path.display());
    }
}
