use chrono::Utc;
use serde::Serialize;

use crate::{
    display::{
        care_steps, condition_style, growth_stage_icon, progress_type_icon, relative_time,
        sunlight_icon, watering_badge, ConditionStyle,
    },
    models::{PlantRecord, PlantSummary, ProgressEntry},
    plants::PlantEdit,
    AppState,
};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressView {
    pub entry: ProgressEntry,
    pub condition_style: ConditionStyle,
    pub progress_icon: &'static str,
    pub growth_icon: &'static str,
    pub when: Option<String>,
}

/// Everything the detail screen renders for one plant.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlantDetailView {
    pub plant: PlantRecord,
    pub image_url: Option<String>,
    pub watering: Option<String>,
    pub sunlight_icon: Option<&'static str>,
    pub care_steps: Vec<String>,
    pub progress: Vec<ProgressView>,
    /// Badge for the most recent entry, shown on the plant's header.
    pub current_condition: Option<ConditionStyle>,
}

impl PlantDetailView {
    pub fn build(plant: PlantRecord, image_url: Option<String>) -> Self {
        let now = Utc::now();
        let progress = plant
            .plant_progress
            .iter()
            .map(|entry| ProgressView {
                condition_style: condition_style(entry.condition.as_deref().unwrap_or_default()),
                progress_icon: progress_type_icon(entry.progress_type.as_deref().unwrap_or_default()),
                growth_icon: growth_stage_icon(entry.growth_stage.as_deref().unwrap_or_default()),
                when: entry.created_at.map(|at| relative_time(at, now)),
                entry: entry.clone(),
            })
            .collect();

        let current_condition = plant
            .latest_progress()
            .and_then(|entry| entry.condition.as_deref())
            .map(condition_style);

        Self {
            image_url,
            watering: plant.water_frequency.map(watering_badge),
            sunlight_icon: plant.sunlight.as_deref().map(sunlight_icon),
            care_steps: plant
                .care_instructions
                .as_deref()
                .map(care_steps)
                .unwrap_or_default(),
            progress,
            current_condition,
            plant,
        }
    }
}

pub async fn list_plants(state: &AppState) -> Result<Vec<PlantSummary>, String> {
    state.plants.list_plants().await.map_err(|e| e.to_string())
}

pub async fn get_plant_detail(state: &AppState, id: &str) -> Result<PlantDetailView, String> {
    let plant = state.plants.get_plant(id).await.map_err(|e| e.to_string())?;
    let image_url = plant.image_url.as_deref().map(|url| state.api.asset_url(url));
    Ok(PlantDetailView::build(plant, image_url))
}

pub async fn update_plant(
    state: &AppState,
    id: &str,
    edit: PlantEdit,
) -> Result<Option<PlantRecord>, String> {
    state
        .plants
        .update_plant(id, &edit)
        .await
        .map_err(|e| e.to_string())
}

pub async fn delete_plant(state: &AppState, id: &str) -> Result<(), String> {
    state.plants.delete_plant(id).await.map_err(|e| e.to_string())
}
