use reqwest::Method;
use uuid::Uuid;

use crate::{
    api::{ApiClient, ApiError, IDEMPOTENCY_HEADER},
    models::{NewPlant, PlantRecord, PlantSummary, PlantUpdate},
};

fn plant_path(id: &str) -> Result<String, ApiError> {
    let id = id.trim();
    if id.is_empty() || id.contains('/') {
        return Err(ApiError::Rejected {
            status: None,
            message: format!("invalid plant id '{id}'"),
        });
    }
    Ok(format!("/plant/{id}"))
}

impl ApiClient {
    /// `GET /plant`
    pub async fn list_plants(&self) -> Result<Vec<PlantSummary>, ApiError> {
        self.get("/plant").await
    }

    /// `GET /plant/{id}`, including the progress history.
    pub async fn fetch_plant(&self, id: &str) -> Result<PlantRecord, ApiError> {
        self.get(&plant_path(id)?).await
    }

    /// `POST /plant/new`. The same key must be reused when retrying the same
    /// submission so the server can collapse duplicates.
    pub async fn create_plant(
        &self,
        plant: &NewPlant,
        idempotency_key: Uuid,
    ) -> Result<PlantRecord, ApiError> {
        let builder = self
            .request(Method::POST, "/plant/new")
            .header(IDEMPOTENCY_HEADER, idempotency_key.to_string())
            .json(plant);
        let (status, envelope) = self.send(builder).await?;
        envelope.into_data(status)
    }

    /// `PUT /plant/{id}`. Returns the updated record when the server echoes it.
    pub async fn update_plant(
        &self,
        id: &str,
        update: &PlantUpdate,
    ) -> Result<Option<PlantRecord>, ApiError> {
        self.put_json(&plant_path(id)?, update).await
    }

    /// `DELETE /plant/{id}`
    pub async fn delete_plant(&self, id: &str) -> Result<(), ApiError> {
        self.delete(&plant_path(id)?).await
    }
}
