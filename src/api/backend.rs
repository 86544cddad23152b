use std::path::Path;

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{
    IdentificationResult, NewPlant, PlantRecord, PlantSummary, PlantUpdate, ProgressEntry,
    ProgressUpload,
};

use super::{ApiClient, ApiError};

/// The backend calls the capture workflows depend on.
///
/// `ApiClient` is the production implementation; tests swap in scripted
/// backends so the workflows run without a network.
#[async_trait]
pub trait PlantBackend: Send + Sync {
    /// Upload a captured photo and get the species match plus alternatives.
    async fn identify(&self, photo: &Path) -> Result<IdentificationResult, ApiError>;

    /// Persist a plant. Retries of the same submission reuse `idempotency_key`.
    async fn create_plant(
        &self,
        plant: &NewPlant,
        idempotency_key: Uuid,
    ) -> Result<PlantRecord, ApiError>;

    /// Upload a progress photo with notes and recent history.
    async fn generate_progress(
        &self,
        upload: &ProgressUpload,
    ) -> Result<Option<ProgressEntry>, ApiError>;
}

/// Reads and edits of the user's saved plants.
#[async_trait]
pub trait PlantCatalog: Send + Sync {
    async fn list_plants(&self) -> Result<Vec<PlantSummary>, ApiError>;

    async fn fetch_plant(&self, id: &str) -> Result<PlantRecord, ApiError>;

    async fn update_plant(
        &self,
        id: &str,
        update: &PlantUpdate,
    ) -> Result<Option<PlantRecord>, ApiError>;

    async fn delete_plant(&self, id: &str) -> Result<(), ApiError>;
}

#[async_trait]
impl PlantBackend for ApiClient {
    async fn identify(&self, photo: &Path) -> Result<IdentificationResult, ApiError> {
        self.identify_photo(photo).await
    }

    async fn create_plant(
        &self,
        plant: &NewPlant,
        idempotency_key: Uuid,
    ) -> Result<PlantRecord, ApiError> {
        ApiClient::create_plant(self, plant, idempotency_key).await
    }

    async fn generate_progress(
        &self,
        upload: &ProgressUpload,
    ) -> Result<Option<ProgressEntry>, ApiError> {
        ApiClient::generate_progress(self, upload).await
    }
}

#[async_trait]
impl PlantCatalog for ApiClient {
    async fn list_plants(&self) -> Result<Vec<PlantSummary>, ApiError> {
        ApiClient::list_plants(self).await
    }

    async fn fetch_plant(&self, id: &str) -> Result<PlantRecord, ApiError> {
        ApiClient::fetch_plant(self, id).await
    }

    async fn update_plant(
        &self,
        id: &str,
        update: &PlantUpdate,
    ) -> Result<Option<PlantRecord>, ApiError> {
        ApiClient::update_plant(self, id, update).await
    }

    async fn delete_plant(&self, id: &str) -> Result<(), ApiError> {
        ApiClient::delete_plant(self, id).await
    }
}
