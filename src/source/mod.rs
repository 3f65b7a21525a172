use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::debug;

use crate::launch::Launch;

pub const DEFAULT_API_URL: &str = "https://api.spacexdata.com/v4/launches/query";

const USER_AGENT: &str = concat!("launchlist/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("invalid page request: page {page}, page size {page_size}")]
    InvalidPage { page: u32, page_size: u32 },

    #[error("request failed: {source}")]
    Http {
        #[source]
        source: reqwest::Error,
    },

    #[error("unexpected HTTP status {status}")]
    Status { status: u16 },

    #[error("failed to decode launch page: {source}")]
    Decode {
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to read fixture file: {path}: {source}")]
    FixtureRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to build HTTP client: {source}")]
    ClientBuild {
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to setup proxy: {proxy}: {source}")]
    ProxySetup {
        proxy: String,
        #[source]
        source: reqwest::Error,
    },
}

// a paginated provider of launches. an empty page signals exhaustion.
pub trait RecordSource: Send + Sync {
    fn fetch_page(
        &self,
        page: u32,
        page_size: u32,
    ) -> BoxFuture<'_, Result<Vec<Launch>, SourceError>>;
}

impl<T: RecordSource + ?Sized> RecordSource for Arc<T> {
    fn fetch_page(
        &self,
        page: u32,
        page_size: u32,
    ) -> BoxFuture<'_, Result<Vec<Launch>, SourceError>> {
        (**self).fetch_page(page, page_size)
    }
}

// pages are 1-based
pub fn page_offset(page: u32, page_size: u32) -> Result<u64, SourceError> {
    if page == 0 || page_size == 0 {
        return Err(SourceError::InvalidPage { page, page_size });
    }
    Ok(u64::from(page - 1) * u64::from(page_size))
}

pub fn query_body(page: u32, page_size: u32) -> Result<serde_json::Value, SourceError> {
    let offset = page_offset(page, page_size)?;
    Ok(json!({
        "query": {},
        "options": { "limit": page_size, "offset": offset },
    }))
}

#[derive(Deserialize)]
struct QueryResponse {
    docs: Vec<Launch>,
}

pub fn decode_page(body: &[u8]) -> Result<Vec<Launch>, SourceError> {
    serde_json::from_slice::<QueryResponse>(body)
        .map(|r| r.docs)
        .map_err(|source| SourceError::Decode { source })
}

#[derive(Clone, Debug)]
pub struct SpaceXSource {
    client: reqwest::Client,
    api_url: String,
}

impl SpaceXSource {
    pub fn new(
        api_url: &str,
        timeout_seconds: Option<usize>,
        proxy: Option<&str>,
    ) -> Result<Self, SourceError> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static(USER_AGENT),
        );

        let mut builder = reqwest::Client::builder().default_headers(headers);
        // requests wait as long as the API takes unless a limit is configured
        if let Some(seconds) = timeout_seconds {
            builder = builder.timeout(Duration::from_secs(seconds as u64));
        }

        if let Some(proxy) = proxy.filter(|p| !p.trim().is_empty()) {
            let proxy = reqwest::Proxy::all(proxy).map_err(|e| SourceError::ProxySetup {
                proxy: proxy.to_string(),
                source: e,
            })?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|source| SourceError::ClientBuild { source })?;
        Ok(Self {
            client,
            api_url: api_url.to_string(),
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }
}

impl RecordSource for SpaceXSource {
    fn fetch_page(
        &self,
        page: u32,
        page_size: u32,
    ) -> BoxFuture<'_, Result<Vec<Launch>, SourceError>> {
        Box::pin(async move {
            let body = query_body(page, page_size)?;
            debug!(page, page_size, url = %self.api_url, "requesting launch page");
            let resp = self
                .client
                .post(&self.api_url)
                .json(&body)
                .send()
                .await
                .map_err(|source| SourceError::Http { source })?;
            let status = resp.status();
            if !status.is_success() {
                return Err(SourceError::Status {
                    status: status.as_u16(),
                });
            }
            let bytes = resp
                .bytes()
                .await
                .map_err(|source| SourceError::Http { source })?;
            let launches = decode_page(&bytes)?;
            debug!(page, received = launches.len(), "launch page received");
            Ok(launches)
        })
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Fixture {
    Envelope { docs: Vec<Launch> },
    List(Vec<Launch>),
}

// serves an in-memory catalogue by offset, used for offline fixtures and tests
#[derive(Clone, Debug, Default)]
pub struct StaticSource {
    launches: Vec<Launch>,
}

impl StaticSource {
    pub fn new(launches: Vec<Launch>) -> Self {
        Self { launches }
    }

    pub fn from_json(raw: &str) -> Result<Self, SourceError> {
        let fixture = serde_json::from_str::<Fixture>(raw)
            .map_err(|source| SourceError::Decode { source })?;
        let launches = match fixture {
            Fixture::Envelope { docs } => docs,
            Fixture::List(list) => list,
        };
        Ok(Self::new(launches))
    }

    pub async fn from_json_file(path: &str) -> Result<Self, SourceError> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| SourceError::FixtureRead {
                path: path.to_string(),
                source,
            })?;
        Self::from_json(&raw)
    }

    pub fn len(&self) -> usize {
        self.launches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.launches.is_empty()
    }
}

impl RecordSource for StaticSource {
    fn fetch_page(
        &self,
        page: u32,
        page_size: u32,
    ) -> BoxFuture<'_, Result<Vec<Launch>, SourceError>> {
        Box::pin(async move {
            let offset = page_offset(page, page_size)?;
            let offset = usize::try_from(offset).unwrap_or(usize::MAX);
            Ok(self
                .launches
                .iter()
                .skip(offset)
                .take(page_size as usize)
                .cloned()
                .collect())
        })
    }
}
