//! Fetching remote resources and turning them into data URIs

use std::time::Duration;

use base64::prelude::BASE64_STANDARD;
use base64::Engine;
use ureq::Agent;

use crate::error::FetchError;

/// Upper bound on a single response body
const MAX_BODY_BYTES: u64 = 256 * 1024 * 1024;

/// Bytes of a fetched resource
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resource {
    pub bytes: Vec<u8>,
    /// `Content-Type` the server declared, if any
    pub content_type: Option<String>,
}

impl Resource {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            content_type: None,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Media type for a data URI: the declared type without parameters, or a
    /// guess from the name the resource was fetched under
    pub fn media_type(&self, name: &str) -> String {
        self.content_type
            .as_deref()
            .and_then(|ct| ct.split(';').next())
            .map(|ct| ct.trim().to_ascii_lowercase())
            .filter(|ct| !ct.is_empty())
            .unwrap_or_else(|| guess_media_type(name))
    }

    /// Encode as a `data:` URI
    pub fn to_data_uri(&self, name: &str) -> String {
        data_uri(&self.media_type(name), &self.bytes)
    }
}

/// `data:<media type>;base64,<payload>`
pub fn data_uri(media_type: &str, bytes: &[u8]) -> String {
    format!("data:{media_type};base64,{}", BASE64_STANDARD.encode(bytes))
}

/// Guess a media type from a file name or asset URL.
///
/// Asset URLs end in `<id>.<ext>/get/`, so a trailing `/get/` is skipped.
pub fn guess_media_type(name: &str) -> String {
    let name = name.trim_end_matches('/');
    let name = name.strip_suffix("/get").unwrap_or(name);
    mime_guess::from_path(name)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

/// Source of remote resources.
///
/// Implementations must be usable from several threads at once.
pub trait Fetcher: Send + Sync {
    /// Fetch the raw bytes at `url`
    fn fetch(&self, url: &str) -> Result<Resource, FetchError>;

    /// Fetch `url` as UTF-8 text; invalid sequences become U+FFFD
    fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        let resource = self.fetch(url)?;
        Ok(String::from_utf8_lossy(&resource.bytes).into_owned())
    }
}

/// Blocking HTTP fetcher with a shared connection pool
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    agent: Agent,
}

impl HttpFetcher {
    /// Create a fetcher whose requests give up after `timeout`, or never
    pub fn new(timeout: Option<Duration>) -> Self {
        let agent = Agent::config_builder()
            .timeout_global(timeout)
            .http_status_as_error(false)
            .build()
            .into();
        Self { agent }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new(Some(Duration::from_secs(60)))
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Resource, FetchError> {
        tracing::debug!(%url, "GET");

        let response = self
            .agent
            .get(url)
            .call()
            .map_err(|source| FetchError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let bytes = response
            .into_body()
            .with_config()
            .limit(MAX_BODY_BYTES)
            .read_to_vec()
            .map_err(|source| FetchError::Body {
                url: url.to_string(),
                source,
            })?;

        tracing::debug!(%url, bytes = bytes.len(), "fetched");
        Ok(Resource {
            bytes,
            content_type,
        })
    }
}
