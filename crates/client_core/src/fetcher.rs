//! Network access for the admin client: reads representations and submits form payloads.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{
    header::{ACCEPT, LOCATION},
    Client, StatusCode,
};
use serde_json::{Map, Value};
use shared::{
    domain::{Method, MASON_JSON, PLAIN_JSON},
    error::{ErrorDocument, FetchError},
    protocol::Representation,
};
use tracing::{debug, warn};
use url::Url;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Successful response to a write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendOutcome {
    pub status: u16,
    pub location: Option<String>,
}

#[async_trait]
pub trait ResourceFetcher: Send + Sync {
    async fn fetch(&self, href: &str) -> Result<Representation, FetchError>;

    /// Sends `payload` as a flat JSON object. `None` sends no body.
    async fn send(
        &self,
        href: &str,
        method: Method,
        payload: Option<&Map<String, Value>>,
    ) -> Result<SendOutcome, FetchError>;
}

pub struct HttpFetcher {
    http: Client,
    base_url: Url,
}

impl HttpFetcher {
    pub fn new(entry_url: &str) -> Result<Self, FetchError> {
        Self::with_timeout(entry_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(entry_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let base_url = Url::parse(entry_url).map_err(|e| FetchError::InvalidHref {
            href: entry_url.to_string(),
            reason: e.to_string(),
        })?;
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Network {
                href: entry_url.to_string(),
                reason: format!("failed to build http client: {e}"),
            })?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolves server-relative hrefs against the entry URL; absolute hrefs pass through.
    pub fn resolve(&self, href: &str) -> Result<Url, FetchError> {
        self.base_url
            .join(href)
            .map_err(|e| FetchError::InvalidHref {
                href: href.to_string(),
                reason: e.to_string(),
            })
    }
}

#[async_trait]
impl ResourceFetcher for HttpFetcher {
    async fn fetch(&self, href: &str) -> Result<Representation, FetchError> {
        let url = self.resolve(href)?;
        debug!(%url, "fetching representation");
        let response = self
            .http
            .get(url)
            .header(ACCEPT, format!("{MASON_JSON}, {PLAIN_JSON}"))
            .send()
            .await
            .map_err(|e| network_error(href, &e))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| network_error(href, &e))?;
        if !status.is_success() {
            return Err(protocol_error(href, status, &body));
        }

        Representation::from_slice(&body).map_err(|source| {
            warn!(href, %source, "server returned a malformed representation");
            FetchError::Decode {
                href: href.to_string(),
                source,
            }
        })
    }

    async fn send(
        &self,
        href: &str,
        method: Method,
        payload: Option<&Map<String, Value>>,
    ) -> Result<SendOutcome, FetchError> {
        let url = self.resolve(href)?;
        debug!(%url, %method, "sending payload");
        let mut request = self
            .http
            .request(http_method(method), url)
            .header(ACCEPT, format!("{MASON_JSON}, {PLAIN_JSON}"));
        if let Some(payload) = payload {
            request = request.json(payload);
        }
        let response = request.send().await.map_err(|e| network_error(href, &e))?;

        let status = response.status();
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        if !status.is_success() {
            let body = response
                .bytes()
                .await
                .map_err(|e| network_error(href, &e))?;
            return Err(protocol_error(href, status, &body));
        }

        Ok(SendOutcome {
            status: status.as_u16(),
            location,
        })
    }
}

fn http_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
    }
}

fn network_error(href: &str, err: &reqwest::Error) -> FetchError {
    warn!(href, error = %err, "request did not reach the server");
    FetchError::Network {
        href: href.to_string(),
        reason: err.to_string(),
    }
}

fn protocol_error(href: &str, status: StatusCode, body: &[u8]) -> FetchError {
    let (message, details) = match serde_json::from_slice::<ErrorDocument>(body) {
        Ok(doc) => (Some(doc.error.message), doc.error.messages),
        Err(_) => (None, Vec::new()),
    };
    warn!(
        href,
        status = status.as_u16(),
        message = message.as_deref().unwrap_or_default(),
        ?details,
        "server rejected request"
    );
    FetchError::Protocol {
        href: href.to_string(),
        status: status.as_u16(),
        message,
        details,
    }
}

#[cfg(test)]
#[path = "tests/fetcher_tests.rs"]
mod tests;
