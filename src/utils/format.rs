//! Human-readable distance and duration strings returned alongside route values.

/// Meters as kilometers with two decimals, e.g. `7500` -> `"7.50 km"`.
pub fn format_distance(meters: f64) -> String {
    format!("{:.2} km", meters / 1000.0)
}

/// Seconds broken down into days, hours and minutes. Each unit is truncated
/// before moving to the next; zero components are omitted.
pub fn format_duration(seconds: f64) -> String {
    let mut remaining = seconds.max(0.0).trunc() as u64;

    let days = remaining / 86_400;
    remaining %= 86_400;
    let hours = remaining / 3_600;
    remaining %= 3_600;
    let minutes = remaining / 60;

    let parts: Vec<String> = [(days, "day"), (hours, "hour"), (minutes, "minute")]
        .into_iter()
        .filter(|(value, _)| *value > 0)
        .map(|(value, unit)| pluralize(value, unit))
        .collect();

    if parts.is_empty() {
        "0 minutes".to_string()
    } else {
        parts.join(" ")
    }
}

fn pluralize(value: u64, unit: &str) -> String {
    if value == 1 {
        format!("{} {}", value, unit)
    } else {
        format!("{} {}s", value, unit)
    }
}
