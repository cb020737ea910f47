//! HTTP retrieval of tracked pages.

use async_trait::async_trait;
use reqwest::Client;
use std::error::Error;
use std::fmt;
use std::time::Duration;
use url::Url;

/// User agent sent by default on every request.
pub const DEFAULT_USER_AGENT: &str = "pagewatch/0.1";

/// Abstraction over page retrieval so the run coordinator can be exercised
/// without the network.
#[async_trait]
pub trait PageSource {
    /// Retrieves the raw response body for `url`.
    async fn fetch_page(&self, url: &Url) -> Result<String, FetchError>;
}

/// Reqwest-backed page source with a bounded per-request timeout.
#[derive(Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    /// Builds a fetcher with the given timeout and user agent.
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(user_agent)
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageSource for Fetcher {
    async fn fetch_page(&self, url: &Url) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|err| FetchError::http(url, err))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response
            .text()
            .await
            .map_err(|err| FetchError::http(url, err))
    }
}

/// Per-target retrieval failures. None of these abort the batch.
#[derive(Debug)]
pub enum FetchError {
    /// Transport-level failure: connect, timeout, or body read.
    Http {
        /// URL that failed.
        url: String,
        /// Underlying client error.
        source: reqwest::Error,
    },
    /// The server answered with a non-success status.
    Status {
        /// URL that failed.
        url: String,
        /// HTTP status code received.
        status: u16,
    },
}

impl FetchError {
    fn http(url: &Url, source: reqwest::Error) -> Self {
        Self::Http {
            url: url.to_string(),
            source,
        }
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http { url, source } => write!(f, "http error fetching {url}: {source}"),
            Self::Status { url, status } => write!(f, "{url} returned status {status}"),
        }
    }
}

impl Error for FetchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Http { source, .. } => Some(source),
            Self::Status { .. } => None,
        }
    }
}
