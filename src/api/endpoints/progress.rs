use reqwest::multipart::Form;

use crate::{
    api::{ApiClient, ApiError},
    models::{ProgressEntry, ProgressUpload},
};

use super::identify::photo_part;

const PROGRESS_NOT_CONFIRMED: &str = "server did not confirm the progress entry";

impl ApiClient {
    /// `POST /plant-progress/generate`.
    ///
    /// The history travels as a JSON string in the `progress` field; the
    /// backend reads it as context for the new observation. Only a reply whose
    /// envelope states success counts. The created entry is returned when the
    /// server includes one.
    pub async fn generate_progress(
        &self,
        upload: &ProgressUpload,
    ) -> Result<Option<ProgressEntry>, ApiError> {
        let history = serde_json::to_string(&upload.history)?;
        let form = Form::new()
            .part("file", photo_part(&upload.photo).await?)
            .text("notes", upload.notes.clone())
            .text("name", upload.plant_name.clone())
            .text("plantId", upload.plant_id.clone())
            .text("progress", history);

        let (status, envelope) = self.post_multipart("/plant-progress/generate", form).await?;
        envelope.into_confirmed_data(status, PROGRESS_NOT_CONFIRMED)
    }
}
