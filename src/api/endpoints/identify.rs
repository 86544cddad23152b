use std::path::Path;

use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use crate::{
    api::{ApiClient, ApiError},
    models::{IdentificationResult, PlantCandidate},
};

/// Payload under the envelope's `data`: the generated match plus the
/// server's existing templates that look alike.
#[derive(Debug, Deserialize)]
struct IdentifyPayload {
    #[serde(default)]
    data: Option<PlantCandidate>,
    #[serde(rename = "plantBase", default)]
    plant_base: Vec<PlantCandidate>,
}

/// Multipart part for a captured JPEG, named the way the backend expects.
pub(crate) async fn photo_part(photo: &Path) -> Result<Part, ApiError> {
    let bytes = tokio::fs::read(photo).await.map_err(|source| ApiError::File {
        path: photo.display().to_string(),
        source,
    })?;

    Ok(Part::bytes(bytes)
        .file_name("photo.jpg")
        .mime_str("image/jpeg")?)
}

impl ApiClient {
    /// `POST /plant/generate` with the photo under `file`.
    pub async fn identify_photo(&self, photo: &Path) -> Result<IdentificationResult, ApiError> {
        let form = Form::new().part("file", photo_part(photo).await?);
        let (status, envelope) = self.post_multipart("/plant/generate", form).await?;
        let payload: IdentifyPayload = envelope.into_data(status)?;
        identification_from_payload(payload)
    }
}

fn identification_from_payload(payload: IdentifyPayload) -> Result<IdentificationResult, ApiError> {
    let primary = payload
        .data
        .filter(|candidate| !candidate.name.trim().is_empty())
        .ok_or(ApiError::MissingData)?;

    let alternatives = payload
        .plant_base
        .into_iter()
        .filter(|candidate| !candidate.name.trim().is_empty())
        .collect();

    Ok(IdentificationResult::new(primary, alternatives))
}
