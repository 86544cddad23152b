use serde::Serialize;
use uuid::Uuid;

use super::WorkflowError;
use crate::models::{CandidateRef, IdentificationResult, NewPlant, PlantCandidate};

/// The candidate the user picked.
///
/// `idempotency_key` is minted when the pointer moves and then reused for
/// every save attempt of this selection, so a retried create cannot produce
/// a second plant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    pub target: CandidateRef,
    pub from_alternative: bool,
    pub idempotency_key: Uuid,
}

impl Selection {
    fn new(target: CandidateRef) -> Self {
        Self {
            target,
            from_alternative: !target.is_primary(),
            idempotency_key: Uuid::new_v4(),
        }
    }
}

/// An identification result under review plus the selection pointer over it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewSet {
    result: IdentificationResult,
    selection: Option<Selection>,
}

impl ReviewSet {
    /// Starts with the AI pick selected.
    pub fn new(result: IdentificationResult) -> Self {
        Self {
            result,
            selection: Some(Selection::new(CandidateRef::Primary)),
        }
    }

    pub fn result(&self) -> &IdentificationResult {
        &self.result
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn is_selected(&self, target: CandidateRef) -> bool {
        self.selection
            .as_ref()
            .is_some_and(|selection| selection.target == target)
    }

    /// Moves the pointer. Returns whether anything changed; tapping the
    /// current item is a no-op and keeps its idempotency key.
    pub fn select(&mut self, target: CandidateRef) -> Result<bool, WorkflowError> {
        if self.result.candidate(target).is_none() {
            return Err(WorkflowError::UnknownCandidate(target.position()));
        }
        if self.is_selected(target) {
            return Ok(false);
        }
        self.selection = Some(Selection::new(target));
        Ok(true)
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    pub fn selected(&self) -> Option<&PlantCandidate> {
        self.selection
            .as_ref()
            .and_then(|selection| self.result.candidate(selection.target))
    }

    /// Create body for the current selection.
    ///
    /// An alternative is one of the server's templates: its id goes out as
    /// `templateId`, and when it has no picture of its own the photo that was
    /// just identified stands in.
    pub fn new_plant(&self) -> Option<(NewPlant, Uuid)> {
        let selection = self.selection.as_ref()?;
        let candidate = self.result.candidate(selection.target)?;

        let plant = if selection.from_alternative {
            let mut plant = NewPlant::from_candidate(candidate, candidate.id.clone());
            if plant.image_url.is_none() {
                plant.image_url = self.result.primary().image_url.clone();
            }
            plant
        } else {
            NewPlant::from_candidate(candidate, None)
        };
        Some((plant, selection.idempotency_key))
    }
}
