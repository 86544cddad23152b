use std::sync::Arc;

use crate::{
    capture::{Camera, CapturedImage},
    models::{CandidateRef, PlantRecord},
    workflow::{CameraAccess, IdentifyController, ReviewSet, Selection, WorkflowState},
    AppState,
};

/// A fresh controller for one identify screen, wired to the live backend.
pub fn start_identify(state: &AppState, camera: Arc<dyn Camera>) -> IdentifyController {
    IdentifyController::new(
        state.workflow_config(),
        camera,
        Arc::new(state.api.clone()),
        state.cache.clone(),
    )
}

pub async fn get_workflow_state(controller: &IdentifyController) -> WorkflowState {
    controller.snapshot().await
}

pub async fn open_camera(controller: &IdentifyController) -> Result<CameraAccess, String> {
    controller.open_camera().await.map_err(|e| e.to_string())
}

pub async fn request_camera_permission(
    controller: &IdentifyController,
) -> Result<CameraAccess, String> {
    controller
        .request_permission()
        .await
        .map_err(|e| e.to_string())
}

pub async fn capture_photo(controller: &IdentifyController) -> Result<CapturedImage, String> {
    controller.capture().await.map_err(|e| e.to_string())
}

pub async fn retake_photo(controller: &IdentifyController) -> Result<(), String> {
    controller.retake().await.map_err(|e| e.to_string())
}

pub async fn identify_photo(controller: &IdentifyController) -> Result<ReviewSet, String> {
    controller.identify().await.map_err(|e| e.to_string())
}

/// `position` 0 is the AI pick, 1.. the alternatives in list order.
pub async fn select_candidate(
    controller: &IdentifyController,
    position: usize,
) -> Result<Option<Selection>, String> {
    controller
        .select(CandidateRef::from_position(position))
        .await
        .map_err(|e| e.to_string())
}

pub async fn can_save(controller: &IdentifyController) -> bool {
    controller.can_save().await
}

pub async fn save_selection(controller: &IdentifyController) -> Result<PlantRecord, String> {
    controller.save().await.map_err(|e| e.to_string())
}

pub async fn restart_capture(controller: &IdentifyController) -> Result<(), String> {
    controller.restart().await.map_err(|e| e.to_string())
}

pub async fn close_identify(controller: &IdentifyController) {
    controller.close().await;
}
