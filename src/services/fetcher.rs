// src/services/fetcher.rs

//! Page fetching service.

use async_trait::async_trait;
use reqwest::Client;

use crate::error::{AppError, Result};

/// Source of the watched page's content.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch the page body. Any non-success status is an error.
    async fn fetch(&self) -> Result<String>;
}

/// Fetches the watched page over HTTP.
///
/// One round trip per call, no retries. Retry happens at cycle
/// granularity in the watcher loop.
pub struct PageFetcher {
    client: Client,
    url: String,
}

impl PageFetcher {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl PageSource for PageFetcher {
    async fn fetch(&self) -> Result<String> {
        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Status {
                url: self.url.clone(),
                status,
            });
        }
        Ok(response.text().await?)
    }
}
