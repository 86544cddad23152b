use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ConditionKind {
    Healthy,
    WaterIssue,
    Infestation,
    Sunburnt,
    Other,
}

/// Badge colors for a progress entry's condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionStyle {
    pub kind: ConditionKind,
    pub background: &'static str,
    pub text: &'static str,
}

const HEALTHY: ConditionStyle = ConditionStyle {
    kind: ConditionKind::Healthy,
    background: "#4ade80",
    text: "#14532d",
};
const WATER_ISSUE: ConditionStyle = ConditionStyle {
    kind: ConditionKind::WaterIssue,
    background: "#fbbf24",
    text: "#78350f",
};
const INFESTATION: ConditionStyle = ConditionStyle {
    kind: ConditionKind::Infestation,
    background: "#f87171",
    text: "#7f1d1d",
};
const SUNBURNT: ConditionStyle = ConditionStyle {
    kind: ConditionKind::Sunburnt,
    background: "#fb923c",
    text: "#7c2d12",
};
const OTHER: ConditionStyle = ConditionStyle {
    kind: ConditionKind::Other,
    background: "#e5e5e5",
    text: "#525252",
};

/// Case and surrounding whitespace are ignored.
pub fn condition_style(condition: &str) -> ConditionStyle {
    match condition.trim().to_ascii_lowercase().as_str() {
        "healthy" => HEALTHY,
        "wilted" | "overwatered" | "underwatered" | "yellowing" => WATER_ISSUE,
        "pest detected" | "fungal infection" => INFESTATION,
        "sunburnt" => SUNBURNT,
        _ => OTHER,
    }
}

pub fn progress_type_icon(progress_type: &str) -> &'static str {
    match progress_type.trim().to_ascii_lowercase().as_str() {
        "watered" | "watering" => "water",
        "pruned" | "pruning" => "cut",
        "fertilized" | "fertilizing" => "flask",
        "repotted" | "repotting" => "basket",
        "treated" | "treatment" => "medkit",
        "observed" | "observation" => "eye",
        _ => "flower",
    }
}

pub fn growth_stage_icon(stage: &str) -> &'static str {
    match stage.trim().to_ascii_lowercase().as_str() {
        "seed" | "seedling" | "sprout" => "sprout",
        "vegetative" | "growing" => "leaf",
        "budding" => "flower-outline",
        "flowering" | "blooming" => "flower",
        "fruiting" => "fruit-cherries",
        "dormant" => "sleep",
        _ => "flower",
    }
}
