//! reqwest implementation of the listings API capability.

use reqwest::{Client, Response, StatusCode, Url};
use serde::Deserialize;

use super::{ListingsApi, RemoteError, RemoteResult};
use crate::config::ClientConfig;
use crate::models::{Listing, ListingId};
use crate::util::compact_text;
use crate::{Error, Result};

/// Client for the rentals REST API.
#[derive(Debug, Clone)]
pub struct HttpListingsApi {
    base_url: Url,
    client: Client,
}

impl HttpListingsApi {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let base_url = Url::parse(&config.api_base_url).map_err(|error| {
            Error::Validation(format!(
                "invalid API base URL {}: {error}",
                config.api_base_url
            ))
        })?;
        let client = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.request_timeout)
            .build()
            .map_err(|error| Error::Network(format!("failed to build HTTP client: {error}")))?;

        Ok(Self { base_url, client })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    fn endpoint(&self, segments: &[&str]) -> RemoteResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| RemoteError::Unavailable("API base URL cannot hold a path".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Unavailable(format!("request timed out: {error}"))
        } else {
            Self::Unavailable(error.to_string())
        }
    }
}

impl ListingsApi for HttpListingsApi {
    async fn ping(&self) -> RemoteResult<()> {
        let response = self
            .client
            .get(self.endpoint(&["listings", "ping"])?)
            .send()
            .await?;
        ensure_success(response).await.map(|_| ())
    }

    async fn list_page(&self, page: usize, limit: usize) -> RemoteResult<Vec<Listing>> {
        let response = self
            .client
            .get(self.endpoint(&["listings"])?)
            .query(&[("page", page), ("limit", limit)])
            .send()
            .await?;
        Ok(ensure_success(response).await?.json().await?)
    }

    async fn fetch(&self, id: &ListingId) -> RemoteResult<Listing> {
        let response = self
            .client
            .get(self.endpoint(&["listings", id.as_str()])?)
            .send()
            .await?;
        Ok(ensure_success(response).await?.json().await?)
    }

    async fn create(&self, listing: &Listing) -> RemoteResult<Listing> {
        let response = self
            .client
            .post(self.endpoint(&["listings"])?)
            .json(listing)
            .send()
            .await?;
        Ok(ensure_success(response).await?.json().await?)
    }

    async fn update(&self, listing: &Listing) -> RemoteResult<Listing> {
        let response = self
            .client
            .put(self.endpoint(&["listings", listing.id.as_str()])?)
            .json(listing)
            .send()
            .await?;
        Ok(ensure_success(response).await?.json().await?)
    }

    async fn delete(&self, id: &ListingId) -> RemoteResult<()> {
        let response = self
            .client
            .delete(self.endpoint(&["listings", id.as_str()])?)
            .send()
            .await?;
        ensure_success(response).await.map(|_| ())
    }
}

async fn ensure_success(response: Response) -> RemoteResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(classify_failure(status, &body))
}

fn classify_failure(status: StatusCode, body: &str) -> RemoteError {
    let message = parse_api_error(status, body);
    match status {
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            RemoteError::Validation(message)
        }
        StatusCode::NOT_FOUND => RemoteError::NotFound(message),
        StatusCode::CONFLICT => RemoteError::Conflict(message),
        _ => RemoteError::Unavailable(message),
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<String>,
    message: Option<String>,
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ApiErrorBody>(body) {
        if let Some(message) = payload.error.or(payload.message) {
            return format!("{} ({})", message.trim(), status.as_u16());
        }
    }

    let trimmed = compact_text(body);
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", trimmed, status.as_u16())
    }
}
