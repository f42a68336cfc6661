//! Upstream joke API client.

use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

use crate::config::SampleConfig;

/// Failure fetching a joke.
#[derive(Debug, Error)]
pub enum SampleError {
    #[error("joke upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),
    #[error("joke upstream response has no `value` field")]
    MissingJoke,
}

/// A joke as returned by the upstream, plus its extracted text.
#[derive(Debug, Clone)]
pub struct FetchedJoke {
    pub api_data: Value,
    pub text: String,
}

/// HTTP client for the configured joke API.
#[derive(Debug, Clone)]
pub struct JokeClient {
    http: reqwest::Client,
    url: String,
}

impl JokeClient {
    pub fn new(config: &SampleConfig) -> Result<Self, SampleError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            url: config.joke_api_url.clone(),
        })
    }

    pub async fn fetch(&self) -> Result<FetchedJoke, SampleError> {
        let api_data: Value = self
            .http
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let text = api_data
            .get("value")
            .and_then(Value::as_str)
            .ok_or(SampleError::MissingJoke)?
            .to_string();

        Ok(FetchedJoke { api_data, text })
    }
}
