use async_trait::async_trait;
use serde_json::Value;
use std::fmt::Debug;
use thiserror::Error;

pub mod weatherapi;

pub use weatherapi::WeatherApiProvider;

/// Failures talking to the weather provider. None of them are retried.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("call to weather API failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("unable to read weather API response body: {0}")]
    Body(#[source] reqwest::Error),

    #[error("failed to decode weather API response: {0}")]
    Decode(#[from] serde_json::Error),
}

#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Fetch current conditions for a free-text location and return the raw document.
    async fn fetch_weather(&self, location: &str) -> Result<Value, ProviderError>;
}
