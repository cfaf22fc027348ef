//! Remote image fetching.
//!
//! [`ImageFetcher`] is the transport seam of the ingestion pipeline: it turns
//! an admitted URL into a verified response stream without buffering the body.
//! Callers admit URLs through `UrlPolicy` before fetching; this layer only
//! handles transport concerns (timeouts, status codes, content-type parsing).

use std::io;
use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use futures::TryStreamExt;
use tokio::io::AsyncRead;
use tokio_util::io::StreamReader;
use url::Url;

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Why a remote fetch did not produce an image stream
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Request failed: {0}")]
    Request(String),

    #[error("URL returned status code {0}")]
    BadStatus(u16),

    #[error("Fetch timed out")]
    TimedOut,
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::TimedOut
        } else {
            FetchError::Request(err.to_string())
        }
    }
}

/// A successful response, body not yet consumed.
pub struct FetchedImage {
    /// Media type as declared by the remote, lowercased, parameters stripped.
    pub content_type: String,
    /// Content-Length when the remote declared one.
    pub content_length: Option<u64>,
    pub body: Pin<Box<dyn AsyncRead + Send + Unpin>>,
}

impl std::fmt::Debug for FetchedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchedImage")
            .field("content_type", &self.content_type)
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

#[async_trait]
pub trait ImageFetcher: Send + Sync {
    /// GET the URL and return its body as a stream. Non-2xx responses fail
    /// with [`FetchError::BadStatus`]; redirects are never followed, so the
    /// fetched location is exactly the admitted one.
    async fn fetch_image(&self, url: &Url) -> Result<FetchedImage, FetchError>;
}

/// Production fetcher over a shared reqwest client.
pub struct HttpImageFetcher {
    client: reqwest::Client,
}

impl HttpImageFetcher {
    pub fn new(timeout: Duration) -> Result<Self, anyhow::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch_image(&self, url: &Url) -> Result<FetchedImage, FetchError> {
        let response = self.client.get(url.as_str()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::BadStatus(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|h| h.to_str().ok())
            .unwrap_or(FALLBACK_CONTENT_TYPE)
            .split(';')
            .next()
            .unwrap_or(FALLBACK_CONTENT_TYPE)
            .trim()
            .to_ascii_lowercase();

        let content_length = response.content_length();

        let stream = response.bytes_stream().map_err(io::Error::other);
        let body: Pin<Box<dyn AsyncRead + Send + Unpin>> =
            Box::pin(StreamReader::new(Box::pin(stream)));

        Ok(FetchedImage {
            content_type,
            content_length,
            body,
        })
    }
}
