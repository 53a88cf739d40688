use crate::{Config, ProviderError, WeatherPayload, provider::weatherapi::WeatherApiProvider};
use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

pub mod weatherapi;

/// What the weather service answered, short of a transport failure.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderReply<T> {
    /// Success status with a decoded body.
    Body(T),
    /// Success status, but nothing in the body.
    Empty,
    /// Non-success HTTP status.
    Status(u16),
}

#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Current conditions for a free-text location query.
    ///
    /// The query is passed through untouched; the service decides whether
    /// it is valid.
    async fn current(&self, query: &str) -> Result<ProviderReply<WeatherPayload>, ProviderError>;
}

/// Construct the weather provider from config.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Arc<dyn WeatherProvider>> {
    let api_key = config.resolved_api_key().ok_or_else(|| {
        anyhow::anyhow!(
            "No API key configured.\n\
             Hint: run `weatherapp configure` or set {}.",
            crate::config::API_KEY_ENV
        )
    })?;

    Ok(Arc::new(WeatherApiProvider::with_base_url(api_key, &config.base_url)))
}
