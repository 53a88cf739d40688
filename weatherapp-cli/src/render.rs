use weatherapp_core::{Snapshot, WeatherPayload};

/// Shown when loading outlasts the configured timeout.
pub const TIMEOUT_MESSAGE: &str = "Cannot fetch! Try another location";

/// Text for the current state, or `None` when nothing has been requested yet.
pub fn render(snapshot: &Snapshot<WeatherPayload>) -> Option<String> {
    let state = snapshot.as_ref()?;
    if let Some(message) = state.error() {
        return Some(format!("Error: {message}"));
    }
    Some(state.success().map_or_else(|| "Loading weather...".to_string(), details))
}

fn details(data: &WeatherPayload) -> String {
    let location = &data.location;
    let current = &data.current;

    let local_date = location
        .local_datetime()
        .map(|dt| dt.format("%a %d %b %Y").to_string())
        .unwrap_or_else(|| location.local_date().to_string());

    let rows = [
        ("Humidity", current.humidity.clone()),
        ("Wind Speed", format!("{} km/hr", current.wind_kph)),
        ("UV", current.uv.clone()),
        ("Precipitation", format!("{} mm", current.precip_mm)),
        ("Local time", location.local_time().to_string()),
        ("Local date", local_date),
    ];

    let mut out = format!(
        "{}, {}\n{}°C  {}\nicon: {}\n",
        location.name,
        location.country,
        current.temp_c,
        current.condition.text,
        current.condition.icon_url(),
    );
    for (key, value) in rows {
        out.push_str(&format!("\n{key:<14} {value}"));
    }
    out
}
