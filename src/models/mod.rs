mod identification;
mod plant;
mod progress;
mod user;

pub use identification::{CandidateRef, IdentificationResult, PlantCandidate};
pub use plant::{NewPlant, PlantRecord, PlantSummary, PlantUpdate};
pub use progress::{ProgressEntry, ProgressSnapshot, ProgressUpload, PROGRESS_HISTORY_WINDOW};
pub use user::{Credentials, Registration, User};

/// Deserializers for fields the backend sends with loose typing.
pub(crate) mod lenient {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNumber {
        Text(String),
        Integer(i64),
        Float(f64),
    }

    /// Ids arrive as JSON numbers from some endpoints and strings from others.
    pub fn id<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        match StringOrNumber::deserialize(deserializer)? {
            StringOrNumber::Text(value) => Ok(value),
            StringOrNumber::Integer(value) => Ok(value.to_string()),
            StringOrNumber::Float(value) => Ok(value.to_string()),
        }
    }

    pub fn optional_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(
            match Option::<StringOrNumber>::deserialize(deserializer)? {
                Some(StringOrNumber::Text(value)) if value.is_empty() => None,
                Some(StringOrNumber::Text(value)) => Some(value),
                Some(StringOrNumber::Integer(value)) => Some(value.to_string()),
                Some(StringOrNumber::Float(value)) => Some(value.to_string()),
                None => None,
            },
        )
    }

    /// Watering frequency in days. The model sometimes answers `"7"` instead of `7`;
    /// anything that is not a non-negative whole number becomes `None`.
    pub fn optional_days<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(
            match Option::<StringOrNumber>::deserialize(deserializer)? {
                Some(StringOrNumber::Text(value)) => value.trim().parse::<u32>().ok(),
                Some(StringOrNumber::Integer(value)) => u32::try_from(value).ok(),
                Some(StringOrNumber::Float(value)) if value >= 0.0 && value.fract() == 0.0 => {
                    Some(value as u32)
                }
                Some(StringOrNumber::Float(_)) | None => None,
            },
        )
    }
}
