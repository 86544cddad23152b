use serde::Serialize;

/// One entry of a picker on the edit screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChoiceOption<T: 'static> {
    pub label: &'static str,
    pub value: T,
    pub icon: Option<&'static str>,
}

pub const WATERING_OPTIONS: [ChoiceOption<u32>; 5] = [
    ChoiceOption { label: "Every 2 Days", value: 2, icon: None },
    ChoiceOption { label: "Every 3 Days", value: 3, icon: None },
    ChoiceOption { label: "Every 4 Days", value: 4, icon: None },
    ChoiceOption { label: "Weekly", value: 7, icon: None },
    ChoiceOption { label: "Every 2 Weeks", value: 14, icon: None },
];

pub const SUNLIGHT_OPTIONS: [ChoiceOption<&str>; 5] = [
    ChoiceOption { label: "Full Sun", value: "Full Sun", icon: Some("sunny") },
    ChoiceOption { label: "Partial Sun", value: "Partial Sun", icon: Some("partly-sunny") },
    ChoiceOption { label: "Partial Shade", value: "Partial Shade", icon: Some("cloudy") },
    ChoiceOption { label: "Full Shade", value: "Full Shade", icon: Some("moon") },
    ChoiceOption { label: "Dappled Sun", value: "Dappled Sun", icon: Some("sunny-outline") },
];

pub const SOIL_OPTIONS: [ChoiceOption<&str>; 6] = [
    ChoiceOption { label: "Clay", value: "Clay", icon: None },
    ChoiceOption { label: "Sandy", value: "Sandy", icon: None },
    ChoiceOption { label: "Loamy", value: "Loamy", icon: None },
    ChoiceOption { label: "Silt", value: "Silt", icon: None },
    ChoiceOption { label: "Peat", value: "Peat", icon: None },
    ChoiceOption { label: "Chalky", value: "Chalky", icon: None },
];

/// Picker label for a frequency, or a plain count for values off the list.
pub fn watering_label(days: u32) -> String {
    WATERING_OPTIONS
        .iter()
        .find(|option| option.value == days)
        .map(|option| option.label.to_string())
        .unwrap_or_else(|| match days {
            1 => "Every Day".to_string(),
            n => format!("Every {n} Days"),
        })
}

/// The short form on the detail card, e.g. "7 Days".
pub fn watering_badge(days: u32) -> String {
    match days {
        1 => "1 Day".to_string(),
        n => format!("{n} Days"),
    }
}

pub fn sunlight_icon(sunlight: &str) -> &'static str {
    let sunlight = sunlight.trim();
    SUNLIGHT_OPTIONS
        .iter()
        .find(|option| option.value.eq_ignore_ascii_case(sunlight))
        .and_then(|option| option.icon)
        .unwrap_or("sunny")
}
