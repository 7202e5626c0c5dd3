use std::future::Future;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::header::CONTENT_TYPE;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("{url} returned content-type {content_type:?}, expected text/html")]
    ContentType {
        url: String,
        content_type: Option<String>,
    },
}

/// Anything that can turn a URL into page markup.
pub trait PageFetcher {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String, FetchError>> + Send;
}

/// Plain HTTP GET via reqwest. No retries: one failure is final for that page.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client })
    }
}

impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let transport = |source: reqwest::Error| FetchError::Transport {
            url: url.to_string(),
            source,
        };

        info!("Fetching: {} ...", url);
        let response = self.client.get(url).send().await.map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        if !content_type
            .as_deref()
            .is_some_and(|ct| ct.contains("text/html"))
        {
            return Err(FetchError::ContentType {
                url: url.to_string(),
                content_type,
            });
        }

        let body = response.text().await.map_err(transport)?;
        info!("Fetched: {} ({} bytes)", url, body.len());
        Ok(body)
    }
}
