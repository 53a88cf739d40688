use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use crate::{ProviderError, WeatherPayload};

use super::{ProviderReply, WeatherProvider};

/// Client for the WeatherAPI.com current conditions endpoint.
#[derive(Debug, Clone)]
pub struct WeatherApiProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl WeatherApiProvider {
    /// Point the client at a different host, e.g. a local mock server.
    pub fn with_base_url(api_key: String, base_url: &str) -> Self {
        Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    fn current_url(&self) -> String {
        format!("{}/v1/current.json", self.base_url)
    }
}

#[async_trait]
impl WeatherProvider for WeatherApiProvider {
    async fn current(&self, query: &str) -> Result<ProviderReply<WeatherPayload>, ProviderError> {
        debug!(query, "requesting current weather");

        let res = self
            .http
            .get(self.current_url())
            .query(&[("key", self.api_key.as_str()), ("q", query), ("aqi", "no")])
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            // The body only feeds the log line; a failed read must not hide the status.
            let body = res.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %truncate_body(&body), "weather service rejected request");
            return Ok(ProviderReply::Status(status.as_u16()));
        }

        let body = res.text().await?;
        if body.trim().is_empty() {
            return Ok(ProviderReply::Empty);
        }

        // A literal `null` is an absent body, not a malformed one.
        let parsed: Option<WeatherPayload> = serde_json::from_str(&body)?;
        Ok(parsed.map_or(ProviderReply::Empty, ProviderReply::Body))
    }
}

fn truncate_body(body: &str) -> &str {
    const MAX: usize = 200;
    if body.len() <= MAX {
        return body;
    }
    let mut end = MAX;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}
