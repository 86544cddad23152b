use std::sync::Arc;

use crate::{
    capture::{Camera, CapturedImage},
    handoff::FlowId,
    models::ProgressEntry,
    progress::ProgressController,
    workflow::CameraAccess,
    AppState,
};

/// Detail screen's "add progress" button: stages the plant and returns the
/// id the add-progress screen is opened with.
pub async fn begin_add_progress(state: &AppState, plant_id: &str) -> Result<FlowId, String> {
    let plant = state
        .plants
        .get_plant(plant_id)
        .await
        .map_err(|e| e.to_string())?;
    Ok(state.handoff.stage(plant).await)
}

/// Add-progress screen mount. The staged plant is consumed.
pub async fn open_add_progress(
    state: &AppState,
    flow: FlowId,
    camera: Arc<dyn Camera>,
) -> Result<ProgressController, String> {
    let plant = state
        .handoff
        .take(flow)
        .await
        .ok_or_else(|| "Plant data not found".to_string())?;

    Ok(ProgressController::new(
        plant,
        state.workflow_config(),
        camera,
        Arc::new(state.api.clone()),
        state.cache.clone(),
    ))
}

pub async fn progress_camera(controller: &ProgressController) -> CameraAccess {
    controller.open_camera().await
}

pub async fn capture_progress_photo(
    controller: &ProgressController,
) -> Result<CapturedImage, String> {
    controller.capture().await.map_err(|e| e.to_string())
}

pub async fn submit_progress(
    controller: &ProgressController,
    notes: &str,
) -> Result<Option<ProgressEntry>, String> {
    controller.submit(notes).await.map_err(|e| e.to_string())
}

pub async fn close_add_progress(controller: &ProgressController) {
    controller.close().await;
}
