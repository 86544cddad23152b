use chrono::{DateTime, Duration, Local, TimeZone, Utc};

/// "just now", "5 minutes ago", "yesterday", then a plain date past a week.
pub fn relative_time(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(then);
    if elapsed < Duration::minutes(1) {
        return "just now".to_string();
    }
    if elapsed < Duration::hours(1) {
        return plural(elapsed.num_minutes(), "minute");
    }
    if elapsed < Duration::days(1) {
        return plural(elapsed.num_hours(), "hour");
    }
    match elapsed.num_days() {
        1 => "yesterday".to_string(),
        days if days < 7 => format!("{days} days ago"),
        _ => then.format("%-d %B %Y").to_string(),
    }
}

fn plural(count: i64, unit: &str) -> String {
    if count == 1 {
        format!("1 {unit} ago")
    } else {
        format!("{count} {unit}s ago")
    }
}

/// Long date plus short time in the given zone, e.g. "5 October 2026 08.30".
pub fn format_timestamp_in<Tz: TimeZone>(at: DateTime<Utc>, zone: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.with_timezone(zone).format("%-d %B %Y %H.%M").to_string()
}

pub fn format_timestamp(at: DateTime<Utc>) -> String {
    format_timestamp_in(at, &Local)
}
