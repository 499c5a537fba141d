use std::time::Duration;

use anyhow::Context;

use crate::foundation::error::{SlidecastError, SlidecastResult};

/// Resolves image and audio references to raw bytes.
///
/// References starting with `http://` or `https://` are fetched with a single
/// GET bounded by the configured timeout; anything else is read from the local
/// filesystem. Failures are not retried: one bad reference fails the whole
/// request.
#[derive(Clone, Debug)]
pub struct SourceFetcher {
    client: reqwest::blocking::Client,
}

impl SourceFetcher {
    /// Build a fetcher whose remote requests give up after `timeout`.
    pub fn new(timeout: Duration) -> SlidecastResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .context("build blocking HTTP client")?;
        Ok(Self { client })
    }

    /// Whether `source` names a remote resource rather than a local file.
    pub fn is_remote(source: &str) -> bool {
        source.starts_with("http://") || source.starts_with("https://")
    }

    /// Return the bytes behind `source`, fetching or reading as appropriate.
    pub fn fetch(&self, source: &str) -> SlidecastResult<Vec<u8>> {
        if Self::is_remote(source) {
            self.fetch_remote(source)
        } else {
            self.read_local(source)
        }
    }

    fn fetch_remote(&self, source: &str) -> SlidecastResult<Vec<u8>> {
        let response = self
            .client
            .get(source)
            .send()
            .map_err(|e| SlidecastError::fetch(source, e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(SlidecastError::fetch(
                source,
                format!("server answered {status}"),
            ));
        }
        let bytes = response
            .bytes()
            .map_err(|e| SlidecastError::fetch(source, format!("reading body: {e}")))?;
        Ok(bytes.to_vec())
    }

    fn read_local(&self, source: &str) -> SlidecastResult<Vec<u8>> {
        std::fs::read(source).map_err(|e| SlidecastError::fetch(source, e.to_string()))
    }
}
