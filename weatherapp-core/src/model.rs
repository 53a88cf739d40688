use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};

/// Current conditions for a single location, as returned by the weather service.
///
/// The payload is read-only once received; every derived value is computed
/// from it on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherPayload {
    pub location: Location,
    pub current: Current,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub country: String,
    /// Combined local date and time, e.g. `2024-01-01 10:00`.
    pub localtime: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Current {
    #[serde(deserialize_with = "display_string")]
    pub temp_c: String,
    #[serde(deserialize_with = "display_string")]
    pub humidity: String,
    #[serde(deserialize_with = "display_string")]
    pub wind_kph: String,
    #[serde(deserialize_with = "display_string")]
    pub uv: String,
    #[serde(deserialize_with = "display_string")]
    pub precip_mm: String,
    pub condition: Condition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub text: String,
    /// Protocol-relative icon path, e.g. `//cdn.weatherapi.com/weather/64x64/day/116.png`.
    pub icon: String,
}

impl Condition {
    /// Absolute URL of the large variant of the condition icon.
    pub fn icon_url(&self) -> String {
        format!("https:{}", self.icon).replace("64*64", "256*256")
    }
}

impl Location {
    pub fn local_date(&self) -> &str {
        self.localtime.split_once(' ').map_or(self.localtime.as_str(), |(date, _)| date)
    }

    pub fn local_time(&self) -> &str {
        self.localtime.split_once(' ').map_or("", |(_, time)| time)
    }

    /// Parsed local timestamp, if the service sent one in the usual format.
    pub fn local_datetime(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(&self.localtime, "%Y-%m-%d %H:%M").ok()
    }
}

/// Accepts a JSON string or number and keeps it as display text.
fn display_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    })
}
