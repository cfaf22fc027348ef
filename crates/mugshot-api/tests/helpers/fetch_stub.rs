//! Canned ImageFetcher for exercising the pipeline without a network.

use async_trait::async_trait;
use mugshot_api::fetch::{FetchError, FetchedImage, ImageFetcher};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use url::Url;

/// What the stub serves for a URL.
pub enum StubResponse {
    Image {
        content_type: String,
        content_length: Option<u64>,
        body: Vec<u8>,
    },
    Status(u16),
    TimedOut,
}

impl StubResponse {
    /// Successful image response declaring its true body length.
    pub fn image(content_type: &str, body: &[u8]) -> Self {
        StubResponse::Image {
            content_type: content_type.to_string(),
            content_length: Some(body.len() as u64),
            body: body.to_vec(),
        }
    }

    /// Successful image response without a Content-Length declaration.
    pub fn image_unsized(content_type: &str, body: &[u8]) -> Self {
        StubResponse::Image {
            content_type: content_type.to_string(),
            content_length: None,
            body: body.to_vec(),
        }
    }
}

/// Fetcher serving canned responses keyed by URL. Unstubbed URLs fail the
/// same way an unreachable remote would.
#[derive(Default)]
pub struct StubFetcher {
    responses: Mutex<HashMap<String, StubResponse>>,
    fetch_count: AtomicUsize,
}

impl StubFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the response served for `url`.
    pub fn stub(&self, url: &str, response: StubResponse) {
        self.responses
            .lock()
            .unwrap()
            .insert(url.to_string(), response);
    }

    /// Number of fetch attempts made through this stub.
    pub fn fetch_count(&self) -> usize {
        self.fetch_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageFetcher for StubFetcher {
    async fn fetch_image(&self, url: &Url) -> Result<FetchedImage, FetchError> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);

        let responses = self.responses.lock().unwrap();
        match responses.get(url.as_str()) {
            Some(StubResponse::Image {
                content_type,
                content_length,
                body,
            }) => Ok(FetchedImage {
                content_type: content_type.clone(),
                content_length: *content_length,
                body: Box::pin(std::io::Cursor::new(body.clone())),
            }),
            Some(StubResponse::Status(code)) => Err(FetchError::BadStatus(*code)),
            Some(StubResponse::TimedOut) => Err(FetchError::TimedOut),
            None => Err(FetchError::Request(format!("no stub for {}", url))),
        }
    }
}
