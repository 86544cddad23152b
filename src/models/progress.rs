use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::lenient;

/// How many of the most recent entries accompany a new progress photo.
pub const PROGRESS_HISTORY_WINDOW: usize = 3;

/// A timestamped observation attached to a saved plant.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEntry {
    #[serde(default, deserialize_with = "lenient::id")]
    pub id: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub progress_type: Option<String>,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub growth_stage: Option<String>,
}

/// The three fields of an entry the progress generator uses as context.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    pub growth_stage: Option<String>,
    pub progress_type: Option<String>,
    pub condition: Option<String>,
}

impl From<&ProgressEntry> for ProgressSnapshot {
    fn from(entry: &ProgressEntry) -> Self {
        Self {
            growth_stage: entry.growth_stage.clone(),
            progress_type: entry.progress_type.clone(),
            condition: entry.condition.clone(),
        }
    }
}

impl ProgressSnapshot {
    /// Trailing window of `history`, oldest first, in list order.
    pub fn trailing(history: &[ProgressEntry]) -> Vec<ProgressSnapshot> {
        let start = history.len().saturating_sub(PROGRESS_HISTORY_WINDOW);
        history[start..].iter().map(ProgressSnapshot::from).collect()
    }
}

/// Everything `POST /plant-progress/generate` needs for one observation.
#[derive(Debug, Clone)]
pub struct ProgressUpload {
    pub photo: PathBuf,
    pub notes: String,
    pub plant_id: String,
    pub plant_name: String,
    pub history: Vec<ProgressSnapshot>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(condition: &str) -> ProgressEntry {
        ProgressEntry {
            condition: Some(condition.into()),
            ..Default::default()
        }
    }

    #[test]
    fn trailing_keeps_last_three() {
        let history = vec![entry("a"), entry("b"), entry("c"), entry("d")];
        let window = ProgressSnapshot::trailing(&history);
        let conditions: Vec<_> = window.iter().map(|s| s.condition.as_deref().unwrap()).collect();
        assert_eq!(conditions, ["b", "c", "d"]);
    }

    #[test]
    fn trailing_handles_short_history() {
        assert!(ProgressSnapshot::trailing(&[]).is_empty());
        assert_eq!(ProgressSnapshot::trailing(&[entry("a")]).len(), 1);
    }

    #[test]
    fn snapshot_serializes_camel_case() {
        let snapshot = ProgressSnapshot {
            growth_stage: Some("seedling".into()),
            progress_type: Some("watered".into()),
            condition: None,
        };
        let json = serde_json::to_string(&snapshot).unwrap();
        assert_eq!(
            json,
            r#"{"growthStage":"seedling","progressType":"watered","condition":null}"#
        );
    }
}
