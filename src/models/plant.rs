use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{lenient, PlantCandidate, ProgressEntry};

/// A plant in the user's collection.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PlantRecord {
    #[serde(deserialize_with = "lenient::id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "latinName", default)]
    pub latin_name: Option<String>,
    #[serde(rename = "imageUrl", default)]
    pub image_url: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_days")]
    pub water_frequency: Option<u32>,
    #[serde(default)]
    pub sunlight: Option<String>,
    #[serde(rename = "soilType", default)]
    pub soil_type: Option<String>,
    #[serde(default)]
    pub care_instructions: Option<String>,
    #[serde(rename = "plantProgress", default)]
    pub plant_progress: Vec<ProgressEntry>,
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "updatedAt", default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl PlantRecord {
    /// Most recent progress entry by timestamp, falling back to list order.
    pub fn latest_progress(&self) -> Option<&ProgressEntry> {
        self.plant_progress
            .iter()
            .enumerate()
            .max_by_key(|(index, entry)| (entry.created_at, *index))
            .map(|(_, entry)| entry)
    }
}

/// Grid item on the home screen.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlantSummary {
    #[serde(deserialize_with = "lenient::id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "imageUrl", default)]
    pub image_url: Option<String>,
}

/// Body of `POST /plant/new`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewPlant {
    pub name: String,
    #[serde(rename = "imageUrl")]
    pub image_url: Option<String>,
    pub water_frequency: Option<u32>,
    #[serde(rename = "soilType")]
    pub soil_type: Option<String>,
    pub sunlight: Option<String>,
    pub care_instructions: Option<String>,
    /// Set when the user saved one of the server's existing templates rather
    /// than the freshly generated match.
    #[serde(rename = "templateId", skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
}

impl NewPlant {
    pub fn from_candidate(candidate: &PlantCandidate, template_id: Option<String>) -> Self {
        Self {
            name: candidate.name.clone(),
            image_url: candidate.image_url.clone(),
            water_frequency: candidate.water_frequency,
            soil_type: candidate.soil_type.clone(),
            sunlight: candidate.sunlight.clone(),
            care_instructions: candidate.care_instructions.clone(),
            template_id,
        }
    }
}

/// Body of `PUT /plant/{id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PlantUpdate {
    pub name: String,
    #[serde(rename = "imageUrl")]
    pub image_url: Option<String>,
    pub water_frequency: Option<u32>,
    #[serde(rename = "soilType")]
    pub soil_type: Option<String>,
    pub sunlight: Option<String>,
}

impl PlantUpdate {
    /// Starts from the stored values so unchanged fields are sent back as-is.
    pub fn from_record(record: &PlantRecord) -> Self {
        Self {
            name: record.name.clone(),
            image_url: record.image_url.clone(),
            water_frequency: record.water_frequency,
            soil_type: record.soil_type.clone(),
            sunlight: record.sunlight.clone(),
        }
    }
}
