mod camera;
mod captured;
mod compress;

pub use camera::{Camera, PermissionStatus, StillImageCamera};
pub use captured::CapturedImage;
pub use compress::compress_frame;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("camera unavailable: {0}")]
    Camera(String),

    #[error("could not decode captured frame: {0}")]
    Decode(#[source] image::ImageError),

    #[error("could not encode photo: {0}")]
    Encode(#[source] image::ImageError),

    #[error("could not write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("image worker stopped: {0}")]
    Worker(String),
}
