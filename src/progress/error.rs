use thiserror::Error;

use crate::{api::ApiError, capture::CaptureError};

#[derive(Debug, Error)]
pub enum ProgressError {
    #[error("Please take a photo first")]
    MissingPhoto,

    #[error("Plant data not found")]
    MissingPlant,

    #[error("Camera permission is required to take a photo")]
    PermissionDenied,

    #[error("Please wait for the current upload to finish")]
    Busy,

    #[error("Failed to generate progress: {0}")]
    Api(#[from] ApiError),

    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error("Progress for this photo was already recorded")]
    Finished,

    #[error("the add-progress screen was closed")]
    Cancelled,
}
