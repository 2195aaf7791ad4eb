// src/fetch/mod.rs

pub mod images;

use anyhow::{Context, Result};
use reqwest::Client;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Something that can GET a URL. Lets the scraper run against canned pages.
#[allow(async_fn_in_trait)]
pub trait Fetcher {
    async fn text(&self, url: &Url) -> Result<String>;
    async fn bytes(&self, url: &Url) -> Result<Vec<u8>>;
}

/// Shared client for both pipelines.
pub fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .user_agent(concat!("geoscrape/", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .cookie_store(true)
        .gzip(true)
        .build()
        .context("building HTTP client")
}

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl Fetcher for HttpFetcher {
    async fn text(&self, url: &Url) -> Result<String> {
        debug!("Fetching text from {}", url);
        self.client
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("GET {} failed", url))?
            .error_for_status()
            .with_context(|| format!("Non-success status {}", url))?
            .text()
            .await
            .with_context(|| format!("Reading text from {}", url))
    }

    async fn bytes(&self, url: &Url) -> Result<Vec<u8>> {
        debug!("Fetching bytes from {}", url);
        let bytes = self
            .client
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("GET {} failed", url))?
            .error_for_status()
            .with_context(|| format!("Non-success status {}", url))?
            .bytes()
            .await
            .with_context(|| format!("Reading body from {}", url))?;
        Ok(bytes.to_vec())
    }
}
