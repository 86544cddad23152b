use thiserror::Error;

use super::{WorkflowAction, WorkflowStatus};
use crate::{api::ApiError, capture::CaptureError};

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Camera permission is required to take a photo")]
    PermissionDenied,

    #[error("cannot {action} while {from}")]
    InvalidTransition {
        from: WorkflowStatus,
        action: WorkflowAction,
    },

    #[error("Please wait for the current request to finish")]
    Busy,

    #[error("Select a plant before saving")]
    NoSelection,

    #[error("no candidate at position {0}")]
    UnknownCandidate(usize),

    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("the identify screen was closed")]
    Cancelled,
}

impl WorkflowError {
    pub(crate) fn invalid(from: WorkflowStatus, action: WorkflowAction) -> Self {
        WorkflowError::InvalidTransition { from, action }
    }
}
