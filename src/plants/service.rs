use std::sync::Arc;

use anyhow::{anyhow, Result};

use crate::{
    api::{PlantCatalog, QueryCache, QueryKey},
    models::{PlantRecord, PlantSummary, PlantUpdate},
};

const ENABLE_LOGS: bool = true;
use crate::log_info;

/// Fields the edit screen lets the user change. `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct PlantEdit {
    pub name: Option<String>,
    pub water_frequency: Option<u32>,
    pub sunlight: Option<String>,
    pub soil_type: Option<String>,
}

impl PlantEdit {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.water_frequency.is_none()
            && self.sunlight.is_none()
            && self.soil_type.is_none()
    }

    fn apply(&self, update: &mut PlantUpdate) -> Result<()> {
        if let Some(name) = &self.name {
            let name = name.trim();
            if name.is_empty() {
                return Err(anyhow!("Plant name cannot be empty"));
            }
            update.name = name.to_string();
        }
        if let Some(days) = self.water_frequency {
            if days == 0 {
                return Err(anyhow!("Watering frequency must be at least one day"));
            }
            update.water_frequency = Some(days);
        }
        if let Some(sunlight) = &self.sunlight {
            update.sunlight = Some(sunlight.trim().to_string());
        }
        if let Some(soil) = &self.soil_type {
            update.soil_type = Some(soil.trim().to_string());
        }
        Ok(())
    }
}

/// The user's plant collection, read through the query cache.
#[derive(Clone)]
pub struct PlantService {
    catalog: Arc<dyn PlantCatalog>,
    cache: QueryCache,
}

impl PlantService {
    pub fn new(catalog: Arc<dyn PlantCatalog>, cache: QueryCache) -> Self {
        Self { catalog, cache }
    }

    pub async fn list_plants(&self) -> Result<Vec<PlantSummary>> {
        let catalog = self.catalog.clone();
        let plants = self
            .cache
            .get_or_fetch(QueryKey::PlantList, || async move { catalog.list_plants().await })
            .await?;
        Ok(plants)
    }

    pub async fn get_plant(&self, id: &str) -> Result<PlantRecord> {
        let catalog = self.catalog.clone();
        let owned_id = id.to_string();
        let plant = self
            .cache
            .get_or_fetch(QueryKey::PlantDetail(id.to_string()), || async move {
                catalog.fetch_plant(&owned_id).await
            })
            .await?;
        Ok(plant)
    }

    /// Sends the edited fields on top of the stored record and drops the
    /// cached detail and list.
    pub async fn update_plant(&self, id: &str, edit: &PlantEdit) -> Result<Option<PlantRecord>> {
        let current = self.get_plant(id).await?;
        let mut update = PlantUpdate::from_record(&current);
        edit.apply(&mut update)?;

        let updated = self.catalog.update_plant(id, &update).await?;
        self.cache.invalidate_plant(id).await;
        log_info!("updated plant {id}");
        Ok(updated)
    }

    pub async fn delete_plant(&self, id: &str) -> Result<()> {
        self.catalog.delete_plant(id).await?;
        self.cache.invalidate_plant(id).await;
        log_info!("deleted plant {id}");
        Ok(())
    }
}
