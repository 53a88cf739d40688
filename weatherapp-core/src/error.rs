use thiserror::Error;

/// Failure talking to the weather service.
///
/// The controller collapses every variant into one generic message; the
/// detail only reaches the logs.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request to weather service failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("weather service sent a malformed payload: {0}")]
    Decode(#[from] serde_json::Error),
}
