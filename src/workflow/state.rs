use std::{fmt, path::PathBuf};

use serde::Serialize;

use super::{ReviewSet, WorkflowError};
use crate::{
    capture::CapturedImage,
    models::{CandidateRef, IdentificationResult, NewPlant},
};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum WorkflowStatus {
    #[default]
    Idle,
    Capturing,
    Previewing,
    Identifying,
    Reviewing,
    Saving,
    Done,
}

impl WorkflowStatus {
    /// A network call is outstanding.
    pub fn is_busy(self) -> bool {
        matches!(self, WorkflowStatus::Identifying | WorkflowStatus::Saving)
    }
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkflowStatus::Idle => "idle",
            WorkflowStatus::Capturing => "capturing",
            WorkflowStatus::Previewing => "previewing",
            WorkflowStatus::Identifying => "identifying",
            WorkflowStatus::Reviewing => "reviewing",
            WorkflowStatus::Saving => "saving",
            WorkflowStatus::Done => "done",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum WorkflowAction {
    OpenCamera,
    Capture,
    Retake,
    Identify,
    Select,
    Save,
    Restart,
}

impl fmt::Display for WorkflowAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkflowAction::OpenCamera => "open the camera",
            WorkflowAction::Capture => "take a photo",
            WorkflowAction::Retake => "retake",
            WorkflowAction::Identify => "identify",
            WorkflowAction::Select => "change the selection",
            WorkflowAction::Save => "save",
            WorkflowAction::Restart => "start over",
        };
        f.write_str(name)
    }
}

/// Everything one identify screen knows. Transition methods check the
/// current status and leave the state untouched when they refuse.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowState {
    pub status: WorkflowStatus,
    pub image: Option<CapturedImage>,
    pub review: Option<ReviewSet>,
    pub loading_message: Option<String>,
    pub last_error: Option<String>,
    pub saved_plant_id: Option<String>,
}

impl WorkflowState {
    pub fn new() -> Self {
        Self::default()
    }

    fn require(&self, allowed: &[WorkflowStatus], action: WorkflowAction) -> Result<(), WorkflowError> {
        if allowed.contains(&self.status) {
            return Ok(());
        }
        if self.status.is_busy() {
            return Err(WorkflowError::Busy);
        }
        Err(WorkflowError::invalid(self.status, action))
    }

    /// Camera granted; show the live feed. Re-opening while already
    /// capturing is harmless.
    pub fn begin_capturing(&mut self) -> Result<(), WorkflowError> {
        self.require(
            &[WorkflowStatus::Idle, WorkflowStatus::Capturing],
            WorkflowAction::OpenCamera,
        )?;
        self.status = WorkflowStatus::Capturing;
        self.last_error = None;
        Ok(())
    }

    pub fn captured(&mut self, image: CapturedImage) -> Result<(), WorkflowError> {
        self.require(&[WorkflowStatus::Capturing], WorkflowAction::Capture)?;
        self.image = Some(image);
        self.status = WorkflowStatus::Previewing;
        Ok(())
    }

    /// Back to the live feed. Hands back the photo for the caller to delete.
    pub fn retake(&mut self) -> Result<Option<CapturedImage>, WorkflowError> {
        self.require(&[WorkflowStatus::Previewing], WorkflowAction::Retake)?;
        self.status = WorkflowStatus::Capturing;
        self.last_error = None;
        Ok(self.image.take())
    }

    /// Returns the photo to upload.
    pub fn begin_identify(&mut self) -> Result<PathBuf, WorkflowError> {
        self.require(&[WorkflowStatus::Previewing], WorkflowAction::Identify)?;
        let path = match &self.image {
            Some(image) => image.path.clone(),
            None => return Err(WorkflowError::invalid(self.status, WorkflowAction::Identify)),
        };
        self.status = WorkflowStatus::Identifying;
        self.last_error = None;
        Ok(path)
    }

    pub fn identified(&mut self, result: IdentificationResult) -> Result<&ReviewSet, WorkflowError> {
        if self.status != WorkflowStatus::Identifying {
            return Err(WorkflowError::invalid(self.status, WorkflowAction::Identify));
        }
        self.status = WorkflowStatus::Reviewing;
        self.loading_message = None;
        Ok(self.review.insert(ReviewSet::new(result)))
    }

    /// The photo stays so the user can retry or retake.
    pub fn identify_failed(&mut self, message: String) {
        if self.status == WorkflowStatus::Identifying {
            self.status = WorkflowStatus::Previewing;
        }
        self.loading_message = None;
        self.last_error = Some(message);
    }

    pub fn select(&mut self, target: CandidateRef) -> Result<bool, WorkflowError> {
        self.require(&[WorkflowStatus::Reviewing], WorkflowAction::Select)?;
        match self.review.as_mut() {
            Some(review) => review.select(target),
            None => Err(WorkflowError::invalid(self.status, WorkflowAction::Select)),
        }
    }

    pub fn clear_selection(&mut self) -> Result<(), WorkflowError> {
        self.require(&[WorkflowStatus::Reviewing], WorkflowAction::Select)?;
        if let Some(review) = self.review.as_mut() {
            review.clear_selection();
        }
        Ok(())
    }

    pub fn can_save(&self) -> bool {
        self.status == WorkflowStatus::Reviewing
            && self
                .review
                .as_ref()
                .is_some_and(|review| review.selection().is_some())
    }

    pub fn begin_save(&mut self) -> Result<(NewPlant, Uuid), WorkflowError> {
        self.require(&[WorkflowStatus::Reviewing], WorkflowAction::Save)?;
        let request = self
            .review
            .as_ref()
            .and_then(ReviewSet::new_plant)
            .ok_or(WorkflowError::NoSelection)?;
        self.status = WorkflowStatus::Saving;
        self.last_error = None;
        Ok(request)
    }

    /// Terminal. Hands back the photo, which is no longer needed.
    pub fn saved(&mut self, plant_id: Option<String>) -> Option<CapturedImage> {
        self.status = WorkflowStatus::Done;
        self.saved_plant_id = plant_id;
        self.image.take()
    }

    /// Selection and photo are kept for another attempt.
    pub fn save_failed(&mut self, message: String) {
        if self.status == WorkflowStatus::Saving {
            self.status = WorkflowStatus::Reviewing;
        }
        self.last_error = Some(message);
    }

    /// Drops the result and goes back to the live feed.
    pub fn restart(&mut self) -> Result<Option<CapturedImage>, WorkflowError> {
        self.require(&[WorkflowStatus::Reviewing], WorkflowAction::Restart)?;
        self.status = WorkflowStatus::Capturing;
        self.review = None;
        self.last_error = None;
        Ok(self.image.take())
    }

    /// Leaves the workflow from wherever it is.
    pub fn close(&mut self) -> Option<CapturedImage> {
        self.status = WorkflowStatus::Done;
        self.loading_message = None;
        self.review = None;
        self.image.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PlantCandidate;

    fn image() -> CapturedImage {
        CapturedImage {
            path: PathBuf::from("/tmp/capture/a.jpg"),
            width: 800,
            height: 600,
            byte_len: 1024,
        }
    }

    fn result() -> IdentificationResult {
        IdentificationResult::new(
            PlantCandidate {
                name: "Fern".into(),
                ..PlantCandidate::default()
            },
            Vec::new(),
        )
    }

    fn reviewing() -> WorkflowState {
        let mut state = WorkflowState::new();
        state.begin_capturing().unwrap();
        state.captured(image()).unwrap();
        state.begin_identify().unwrap();
        state.identified(result()).unwrap();
        state
    }

    #[test]
    fn happy_path_walks_every_state() {
        let mut state = reviewing();
        assert_eq!(state.status, WorkflowStatus::Reviewing);
        assert!(state.can_save());

        state.begin_save().unwrap();
        assert_eq!(state.status, WorkflowStatus::Saving);
        let leftover = state.saved(Some("12".into()));
        assert_eq!(state.status, WorkflowStatus::Done);
        assert_eq!(leftover, Some(image()));
    }

    #[test]
    fn identify_only_from_previewing() {
        let mut state = WorkflowState::new();
        assert!(matches!(
            state.begin_identify(),
            Err(WorkflowError::InvalidTransition {
                from: WorkflowStatus::Idle,
                action: WorkflowAction::Identify
            })
        ));
        assert_eq!(state.status, WorkflowStatus::Idle);
    }

    #[test]
    fn second_identify_is_busy() {
        let mut state = WorkflowState::new();
        state.begin_capturing().unwrap();
        state.captured(image()).unwrap();
        state.begin_identify().unwrap();
        assert!(matches!(state.begin_identify(), Err(WorkflowError::Busy)));
    }

    #[test]
    fn identify_failure_keeps_the_photo() {
        let mut state = WorkflowState::new();
        state.begin_capturing().unwrap();
        state.captured(image()).unwrap();
        state.begin_identify().unwrap();
        state.identify_failed("offline".into());

        assert_eq!(state.status, WorkflowStatus::Previewing);
        assert_eq!(state.image, Some(image()));
        assert_eq!(state.last_error.as_deref(), Some("offline"));
    }

    #[test]
    fn retake_hands_back_the_photo() {
        let mut state = WorkflowState::new();
        state.begin_capturing().unwrap();
        state.captured(image()).unwrap();
        assert_eq!(state.retake().unwrap(), Some(image()));
        assert_eq!(state.status, WorkflowStatus::Capturing);
        assert!(state.image.is_none());
    }

    #[test]
    fn save_failure_returns_to_review_with_selection() {
        let mut state = reviewing();
        let (_, key) = state.begin_save().unwrap();
        assert!(matches!(state.begin_save(), Err(WorkflowError::Busy)));
        state.save_failed("500".into());

        assert_eq!(state.status, WorkflowStatus::Reviewing);
        let (_, retry_key) = state.begin_save().unwrap();
        assert_eq!(key, retry_key);
    }

    #[test]
    fn empty_selection_blocks_save() {
        let mut state = reviewing();
        state.clear_selection().unwrap();
        assert!(!state.can_save());
        assert!(matches!(state.begin_save(), Err(WorkflowError::NoSelection)));
        assert_eq!(state.status, WorkflowStatus::Reviewing);

        state.select(CandidateRef::Primary).unwrap();
        assert!(state.can_save());
    }

    #[test]
    fn restart_discards_the_result() {
        let mut state = reviewing();
        assert_eq!(state.restart().unwrap(), Some(image()));
        assert_eq!(state.status, WorkflowStatus::Capturing);
        assert!(state.review.is_none());
    }
}
