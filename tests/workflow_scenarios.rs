use std::{
    collections::VecDeque,
    io::Cursor,
    path::Path,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, RgbImage};
use plantcare_lib::{
    api::{ApiClient, ApiError, PlantBackend, QueryCache, QueryKey},
    auth::TokenStore,
    capture::{Camera, CaptureError, PermissionStatus},
    models::{
        CandidateRef, IdentificationResult, NewPlant, PlantCandidate, PlantRecord, ProgressEntry,
        ProgressUpload,
    },
    settings::CaptureSettings,
    workflow::{
        commands as workflow_commands, CameraAccess, IdentifyController, WorkflowAction,
        WorkflowConfig, WorkflowError, WorkflowEvent, WorkflowStatus,
    },
};
use tempfile::TempDir;
use tokio::sync::Notify;
use uuid::Uuid;

struct FakeCamera {
    permission: Mutex<PermissionStatus>,
    grant_on_request: bool,
}

impl FakeCamera {
    fn new(permission: PermissionStatus, grant_on_request: bool) -> Arc<Self> {
        Arc::new(Self {
            permission: Mutex::new(permission),
            grant_on_request,
        })
    }
}

#[async_trait]
impl Camera for FakeCamera {
    async fn permission(&self) -> PermissionStatus {
        *self.permission.lock().unwrap()
    }

    async fn request_permission(&self) -> PermissionStatus {
        let mut permission = self.permission.lock().unwrap();
        if self.grant_on_request {
            *permission = PermissionStatus::Granted;
        } else {
            *permission = PermissionStatus::Denied;
        }
        *permission
    }

    async fn capture_frame(&self) -> Result<Vec<u8>, CaptureError> {
        let frame = DynamicImage::ImageRgb8(RgbImage::from_pixel(1200, 900, image::Rgb([40, 160, 60])));
        let mut bytes = Cursor::new(Vec::new());
        frame
            .write_to(&mut bytes, ImageFormat::Png)
            .map_err(|e| CaptureError::Camera(e.to_string()))?;
        Ok(bytes.into_inner())
    }
}

#[derive(Default)]
struct FakeBackend {
    identify_results: Mutex<VecDeque<Result<IdentificationResult, ApiError>>>,
    identify_calls: Mutex<usize>,
    identify_gate: Option<Arc<Notify>>,
    create_failures: Mutex<usize>,
    created: Mutex<Vec<(NewPlant, Uuid)>>,
}

impl FakeBackend {
    fn answering(results: Vec<Result<IdentificationResult, ApiError>>) -> Self {
        Self {
            identify_results: Mutex::new(results.into()),
            ..Self::default()
        }
    }

    fn identify_calls(&self) -> usize {
        *self.identify_calls.lock().unwrap()
    }

    fn created(&self) -> Vec<(NewPlant, Uuid)> {
        self.created.lock().unwrap().clone()
    }
}

#[async_trait]
impl PlantBackend for FakeBackend {
    async fn identify(&self, photo: &Path) -> Result<IdentificationResult, ApiError> {
        assert!(photo.is_file(), "photo should exist while uploading");
        *self.identify_calls.lock().unwrap() += 1;
        if let Some(gate) = &self.identify_gate {
            gate.notified().await;
        }
        self.identify_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(ApiError::MissingData))
    }

    async fn create_plant(
        &self,
        plant: &NewPlant,
        idempotency_key: Uuid,
    ) -> Result<PlantRecord, ApiError> {
        self.created
            .lock()
            .unwrap()
            .push((plant.clone(), idempotency_key));

        let mut failures = self.create_failures.lock().unwrap();
        if *failures > 0 {
            *failures -= 1;
            return Err(ApiError::Status {
                status: 502,
                message: "Bad Gateway".into(),
            });
        }
        Ok(PlantRecord {
            id: "plant-1".into(),
            name: plant.name.clone(),
            ..PlantRecord::default()
        })
    }

    async fn generate_progress(
        &self,
        _upload: &ProgressUpload,
    ) -> Result<Option<ProgressEntry>, ApiError> {
        Ok(None)
    }
}

fn monstera_result() -> IdentificationResult {
    IdentificationResult::new(
        PlantCandidate {
            name: "Monstera".into(),
            latin_name: Some("Monstera deliciosa".into()),
            water_frequency: Some(7),
            image_url: Some("/uploads/capture.jpg".into()),
            ..PlantCandidate::default()
        },
        vec![PlantCandidate {
            id: Some("tpl-philodendron".into()),
            name: "Philodendron".into(),
            ..PlantCandidate::default()
        }],
    )
}

struct Harness {
    _dir: TempDir,
    cache: QueryCache,
    controller: IdentifyController,
}

fn harness(camera: Arc<dyn Camera>, backend: Arc<dyn PlantBackend>) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let cache = QueryCache::new(Duration::from_secs(300));
    let config = WorkflowConfig {
        capture: CaptureSettings::default(),
        capture_dir: dir.path().join("captures"),
        loading_interval: Duration::from_millis(10),
    };
    let controller = IdentifyController::new(config, camera, backend, cache.clone());
    Harness {
        _dir: dir,
        cache,
        controller,
    }
}

async fn wait_for(controller: &IdentifyController, status: WorkflowStatus) {
    for _ in 0..400 {
        if controller.status().await == status {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("workflow never reached {status}");
}

#[tokio::test]
async fn denied_permission_never_reaches_identifying() {
    let backend = Arc::new(FakeBackend::answering(vec![Ok(monstera_result())]));
    let h = harness(FakeCamera::new(PermissionStatus::Denied, false), backend.clone());

    assert_eq!(
        h.controller.open_camera().await.unwrap(),
        CameraAccess::PermissionRequired(PermissionStatus::Denied)
    );
    assert_eq!(h.controller.status().await, WorkflowStatus::Idle);

    assert!(matches!(
        h.controller.capture().await,
        Err(WorkflowError::PermissionDenied)
    ));
    assert!(matches!(
        h.controller.request_permission().await.unwrap(),
        CameraAccess::PermissionRequired(PermissionStatus::Denied)
    ));
    assert!(matches!(
        h.controller.identify().await,
        Err(WorkflowError::InvalidTransition {
            from: WorkflowStatus::Idle,
            action: WorkflowAction::Identify
        })
    ));

    assert_eq!(h.controller.status().await, WorkflowStatus::Idle);
    assert_eq!(backend.identify_calls(), 0);
}

#[tokio::test]
async fn granting_permission_opens_the_camera() {
    let backend = Arc::new(FakeBackend::default());
    let h = harness(FakeCamera::new(PermissionStatus::Undetermined, true), backend);

    assert_eq!(
        h.controller.open_camera().await.unwrap(),
        CameraAccess::PermissionRequired(PermissionStatus::Undetermined)
    );
    assert_eq!(
        h.controller.request_permission().await.unwrap(),
        CameraAccess::Ready
    );
    assert_eq!(h.controller.status().await, WorkflowStatus::Capturing);
}

#[tokio::test]
async fn identification_defaults_selection_to_primary() {
    let only_primary = IdentificationResult::new(monstera_result().primary().clone(), Vec::new());
    for result in [only_primary, monstera_result()] {
        let backend = Arc::new(FakeBackend::answering(vec![Ok(result)]));
        let h = harness(FakeCamera::new(PermissionStatus::Granted, true), backend);

        h.controller.open_camera().await.unwrap();
        h.controller.capture().await.unwrap();
        let review = h.controller.identify().await.unwrap();

        assert_eq!(review.selection().unwrap().target, CandidateRef::Primary);
        assert!(!review.selection().unwrap().from_alternative);
        assert_eq!(h.controller.status().await, WorkflowStatus::Reviewing);
        assert!(h.controller.can_save().await);
    }
}

#[tokio::test]
async fn saving_an_alternative_posts_its_name_and_template() {
    let backend = Arc::new(FakeBackend::answering(vec![Ok(monstera_result())]));
    let h = harness(FakeCamera::new(PermissionStatus::Granted, true), backend.clone());
    h.cache.put(QueryKey::PlantList, &vec!["stale"]).await;

    h.controller.open_camera().await.unwrap();
    let photo = h.controller.capture().await.unwrap();
    assert_eq!((photo.width, photo.height), (800, 600));
    h.controller.identify().await.unwrap();
    h.controller.select(CandidateRef::Alternative(0)).await.unwrap();
    let record = h.controller.save().await.unwrap();

    let created = backend.created();
    assert_eq!(created.len(), 1);
    let body = serde_json::to_value(&created[0].0).unwrap();
    assert_eq!(body["name"], "Philodendron");
    assert_eq!(body["templateId"], "tpl-philodendron");

    assert_eq!(record.name, "Philodendron");
    assert_eq!(h.controller.status().await, WorkflowStatus::Done);
    assert!(!photo.path.exists());
    assert!(h.cache.get::<Vec<String>>(&QueryKey::PlantList).await.is_none());
}

#[tokio::test]
async fn selection_is_idempotent_and_exclusive() {
    let backend = Arc::new(FakeBackend::answering(vec![Ok(monstera_result())]));
    let h = harness(FakeCamera::new(PermissionStatus::Granted, true), backend);
    let mut events = h.controller.subscribe();

    h.controller.open_camera().await.unwrap();
    h.controller.capture().await.unwrap();
    h.controller.identify().await.unwrap();

    let first = h.controller.select(CandidateRef::Alternative(0)).await.unwrap();
    let again = h.controller.select(CandidateRef::Alternative(0)).await.unwrap();
    assert_eq!(first, again);

    h.controller.select(CandidateRef::Primary).await.unwrap();
    let review = h.controller.snapshot().await.review.unwrap();
    let selected: Vec<_> = review
        .result()
        .iter()
        .filter(|(target, _)| review.is_selected(*target))
        .collect();
    assert_eq!(selected.len(), 1);
    assert_eq!(selected[0].0, CandidateRef::Primary);

    // identify default, the move to the alternative, the move back
    let mut selection_events = 0;
    while let Ok(event) = events.try_recv() {
        if matches!(event, WorkflowEvent::SelectionChanged { .. }) {
            selection_events += 1;
        }
    }
    assert_eq!(selection_events, 3);
}

#[tokio::test]
async fn save_is_disabled_without_a_selection() {
    let backend = Arc::new(FakeBackend::answering(vec![Ok(monstera_result())]));
    let h = harness(FakeCamera::new(PermissionStatus::Granted, true), backend.clone());

    h.controller.open_camera().await.unwrap();
    h.controller.capture().await.unwrap();
    assert!(!h.controller.can_save().await);
    h.controller.identify().await.unwrap();

    h.controller.clear_selection().await.unwrap();
    assert!(!h.controller.can_save().await);
    assert!(matches!(
        h.controller.save().await,
        Err(WorkflowError::NoSelection)
    ));
    assert!(backend.created().is_empty());

    h.controller.select(CandidateRef::Alternative(0)).await.unwrap();
    assert!(h.controller.can_save().await);
}

#[tokio::test]
async fn network_failure_returns_to_preview_with_photo() {
    let dir = tempfile::tempdir().unwrap();
    let tokens = TokenStore::in_dir(dir.path()).unwrap();
    // Nothing listens on the discard port, so the upload fails at connect.
    let unreachable = ApiClient::new("http://127.0.0.1:9", Some(Duration::from_secs(5)), tokens).unwrap();
    let h = harness(
        FakeCamera::new(PermissionStatus::Granted, true),
        Arc::new(unreachable),
    );

    h.controller.open_camera().await.unwrap();
    let photo = h.controller.capture().await.unwrap();
    let err = h.controller.identify().await.unwrap_err();
    assert!(matches!(err, WorkflowError::Api(ApiError::Transport(_))));

    let state = h.controller.snapshot().await;
    assert_eq!(state.status, WorkflowStatus::Previewing);
    assert_eq!(state.image.as_ref(), Some(&photo));
    assert!(photo.path.exists());
    assert!(state.last_error.is_some());
    assert!(state.loading_message.is_none());

    h.controller.retake().await.unwrap();
    assert_eq!(h.controller.status().await, WorkflowStatus::Capturing);
}

#[tokio::test]
async fn failed_identify_can_be_retried() {
    let backend = Arc::new(FakeBackend::answering(vec![
        Err(ApiError::Status {
            status: 503,
            message: "Service Unavailable".into(),
        }),
        Ok(monstera_result()),
    ]));
    let h = harness(FakeCamera::new(PermissionStatus::Granted, true), backend.clone());

    h.controller.open_camera().await.unwrap();
    h.controller.capture().await.unwrap();
    assert!(h.controller.identify().await.is_err());
    assert_eq!(h.controller.status().await, WorkflowStatus::Previewing);

    h.controller.identify().await.unwrap();
    assert_eq!(h.controller.status().await, WorkflowStatus::Reviewing);
    assert_eq!(backend.identify_calls(), 2);
}

#[tokio::test]
async fn retake_deletes_the_photo() {
    let backend = Arc::new(FakeBackend::default());
    let h = harness(FakeCamera::new(PermissionStatus::Granted, true), backend);

    h.controller.open_camera().await.unwrap();
    let photo = h.controller.capture().await.unwrap();
    assert!(photo.path.exists());

    h.controller.retake().await.unwrap();
    assert!(!photo.path.exists());
    assert_eq!(h.controller.status().await, WorkflowStatus::Capturing);
    assert!(h.controller.snapshot().await.image.is_none());
}

#[tokio::test]
async fn failed_save_keeps_selection_and_key() {
    let backend = Arc::new(FakeBackend::answering(vec![Ok(monstera_result())]));
    *backend.create_failures.lock().unwrap() = 1;
    let h = harness(FakeCamera::new(PermissionStatus::Granted, true), backend.clone());

    h.controller.open_camera().await.unwrap();
    let photo = h.controller.capture().await.unwrap();
    h.controller.identify().await.unwrap();
    h.controller.select(CandidateRef::Alternative(0)).await.unwrap();

    assert!(h.controller.save().await.is_err());
    let state = h.controller.snapshot().await;
    assert_eq!(state.status, WorkflowStatus::Reviewing);
    assert!(state
        .review
        .as_ref()
        .unwrap()
        .is_selected(CandidateRef::Alternative(0)));
    assert!(photo.path.exists());

    h.controller.save().await.unwrap();
    let created = backend.created();
    assert_eq!(created.len(), 2);
    assert_eq!(created[0].1, created[1].1);
}

#[tokio::test]
async fn only_one_identification_in_flight() {
    let gate = Arc::new(Notify::new());
    let backend = Arc::new(FakeBackend {
        identify_gate: Some(gate.clone()),
        ..FakeBackend::answering(vec![Ok(monstera_result())])
    });
    let h = harness(FakeCamera::new(PermissionStatus::Granted, true), backend.clone());

    h.controller.open_camera().await.unwrap();
    h.controller.capture().await.unwrap();

    let running = {
        let controller = h.controller.clone();
        tokio::spawn(async move { controller.identify().await })
    };
    wait_for(&h.controller, WorkflowStatus::Identifying).await;

    assert!(matches!(h.controller.identify().await, Err(WorkflowError::Busy)));
    assert!(matches!(h.controller.retake().await, Err(WorkflowError::Busy)));

    for _ in 0..400 {
        if h.controller.snapshot().await.loading_message.is_some() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(h.controller.snapshot().await.loading_message.is_some());

    gate.notify_one();
    running.await.unwrap().unwrap();
    assert_eq!(backend.identify_calls(), 1);
    assert!(h.controller.snapshot().await.loading_message.is_none());
}

#[tokio::test]
async fn closing_discards_a_late_response() {
    let gate = Arc::new(Notify::new());
    let backend = Arc::new(FakeBackend {
        identify_gate: Some(gate.clone()),
        ..FakeBackend::answering(vec![Ok(monstera_result())])
    });
    let h = harness(FakeCamera::new(PermissionStatus::Granted, true), backend);

    h.controller.open_camera().await.unwrap();
    let photo = h.controller.capture().await.unwrap();

    let running = {
        let controller = h.controller.clone();
        tokio::spawn(async move { controller.identify().await })
    };
    wait_for(&h.controller, WorkflowStatus::Identifying).await;

    h.controller.close().await;
    gate.notify_one();

    assert!(matches!(
        running.await.unwrap(),
        Err(WorkflowError::Cancelled)
    ));
    let state = h.controller.snapshot().await;
    assert_eq!(state.status, WorkflowStatus::Done);
    assert!(state.review.is_none());
    assert!(!photo.path.exists());
    assert!(matches!(
        h.controller.open_camera().await,
        Err(WorkflowError::Cancelled)
    ));
}

#[tokio::test]
async fn picking_by_position_updates_the_current_review() {
    let backend = Arc::new(FakeBackend::answering(vec![Ok(monstera_result())]));
    let h = harness(FakeCamera::new(PermissionStatus::Granted, true), backend);

    h.controller.open_camera().await.unwrap();
    h.controller.capture().await.unwrap();
    let identified = workflow_commands::identify_photo(&h.controller).await.unwrap();

    workflow_commands::select_candidate(&h.controller, 1).await.unwrap();
    let current = workflow_commands::get_workflow_state(&h.controller)
        .await
        .review
        .unwrap();

    assert!(identified.is_selected(CandidateRef::Primary));
    assert!(current.is_selected(CandidateRef::Alternative(0)));
    assert!(!current.is_selected(CandidateRef::Primary));
}
