//! Derived display data: badge colors, icons, option lists and text helpers
//! the screens render. Nothing here talks to the network.

mod care;
mod condition;
mod options;
mod time;

pub use care::care_steps;
pub use condition::{condition_style, growth_stage_icon, progress_type_icon, ConditionKind, ConditionStyle};
pub use options::{
    sunlight_icon, watering_badge, watering_label, ChoiceOption, SOIL_OPTIONS, SUNLIGHT_OPTIONS,
    WATERING_OPTIONS,
};
pub use time::{format_timestamp, format_timestamp_in, relative_time};

pub use crate::workflow::LOADING_MESSAGES;
