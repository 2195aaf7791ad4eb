// src/routing/client.rs

use anyhow::{Context, Result};
use reqwest::{
    header::{ACCEPT, AUTHORIZATION},
    Client,
};
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::{GeometryRequest, RoutingError, RoutingService};

pub const DEFAULT_BASE_URL: &str = "https://api.openrouteservice.org/";

/// OpenRouteService REST client. One POST per request, no retries.
pub struct OpenRouteService {
    client: Client,
    base: Url,
    api_key: String,
}

impl OpenRouteService {
    pub fn new(client: Client, base_url: &str, api_key: impl Into<String>) -> Result<Self> {
        // `Url::join` drops the last path segment unless the base ends in '/'
        let base = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };
        let base = Url::parse(&base).with_context(|| format!("parsing routing base URL {}", base))?;
        Ok(Self {
            client,
            base,
            api_key: api_key.into(),
        })
    }

    pub fn url_for(&self, request: &GeometryRequest) -> Result<Url, RoutingError> {
        self.base
            .join(&request.endpoint())
            .map_err(|e| RoutingError::InvalidRequest(format!("building URL: {}", e)))
    }
}

impl RoutingService for OpenRouteService {
    async fn request(&self, request: &GeometryRequest) -> Result<Value, RoutingError> {
        request.validate()?;
        let url = self.url_for(request)?;
        debug!(%url, profile = %request.profile, points = request.coordinates.len(), "requesting geometry");

        let resp = self
            .client
            .post(url.clone())
            .header(AUTHORIZATION, &self.api_key)
            .header(ACCEPT, "application/geo+json, application/json")
            .json(&request.body())
            .send()
            .await
            .map_err(|source| RoutingError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|source| RoutingError::Transport {
                url: url.to_string(),
                source,
            })?;

        if !status.is_success() {
            return Err(RoutingError::Service {
                status: status.as_u16(),
                message: service_message(&body),
            });
        }

        serde_json::from_str(&body).map_err(|e| RoutingError::Decode(e.to_string()))
    }
}

/// Pull the human-readable message out of an error body.
/// Handles `{"error": {"message": ...}}`, `{"error": "..."}` and plain text.
fn service_message(body: &str) -> String {
    const MAX_LEN: usize = 200;

    if let Ok(v) = serde_json::from_str::<Value>(body) {
        let err = v.get("error");
        if let Some(msg) = err.and_then(|e| e.get("message")).and_then(Value::as_str) {
            return msg.to_string();
        }
        if let Some(msg) = err.and_then(Value::as_str) {
            return msg.to_string();
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        "empty response body".to_string()
    } else {
        trimmed.chars().take(MAX_LEN).collect()
    }
}
