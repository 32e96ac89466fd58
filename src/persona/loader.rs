//! Persona loading from files, URLs, and peer Stuntman servers.
//!
//! All I/O here is blocking and expected to run once at startup, before the
//! registry is shared with request handlers. Do not call these from inside an
//! async runtime.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::header::ACCEPT;
use tracing::debug;
use url::Url;

use crate::error::{Error, Result};

use super::contract;
use super::registry::{DEFAULT_ROOT_PATH, SERVER_ENDPOINT};
use super::types::Persona;

/// Default timeout for a single fetch.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

// ─────────────────────────────────────────────────────────────────
// Retriever
// ─────────────────────────────────────────────────────────────────

/// Reads raw persona JSON. Swappable so loading can be tested offline.
pub trait PersonaRetriever: Send + Sync {
    /// Read a local file to a string.
    fn read_file(&self, path: &Path) -> Result<String>;

    /// GET a URL and return the body of a successful response.
    fn fetch_url(&self, url: &Url) -> Result<String>;
}

/// Default retriever: `std::fs` for files, blocking `reqwest` for URLs.
#[derive(Debug, Clone)]
pub struct HttpRetriever {
    timeout: Duration,
}

impl HttpRetriever {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for HttpRetriever {
    fn default() -> Self {
        Self::new(DEFAULT_FETCH_TIMEOUT)
    }
}

impl PersonaRetriever for HttpRetriever {
    fn read_file(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path).map_err(|source| Error::IoRead {
            path: path.to_path_buf(),
            source,
        })
    }

    fn fetch_url(&self, url: &Url) -> Result<String> {
        // The blocking client owns a runtime, which must never be built or
        // dropped on an async worker thread.
        std::thread::scope(|scope| {
            scope
                .spawn(|| self.fetch_blocking(url))
                .join()
                .map_err(|_| Error::Internal(format!("Fetch of {} panicked", url)))?
        })
    }
}

impl HttpRetriever {
    fn fetch_blocking(&self, url: &Url) -> Result<String> {
        let http_error = |source: reqwest::Error| Error::Http {
            url: url.to_string(),
            source,
        };

        // Built per call: the blocking client owns a runtime and fetches are one-shot.
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(http_error)?;

        debug!(url = %url, "Fetching persona configuration");
        let response = client
            .get(url.clone())
            .header(ACCEPT, "application/json")
            .send()
            .map_err(http_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().map_err(http_error)
    }
}

// ─────────────────────────────────────────────────────────────────
// Location resolution
// ─────────────────────────────────────────────────────────────────

/// Where persona JSON lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    File(PathBuf),
    Url(Url),
}

/// Resolve user input as an absolute file path, `file://` URL, or `http(s)://` URL.
///
/// Relative paths and other schemes are rejected.
pub fn resolve_location(input: &str) -> Result<Location> {
    if input.trim().is_empty() {
        return Err(Error::invalid_uri(input, "must not be empty"));
    }

    if Path::new(input).is_absolute() {
        return Ok(Location::File(PathBuf::from(input)));
    }

    let url = Url::parse(input).map_err(|e| match e {
        url::ParseError::RelativeUrlWithoutBase => {
            Error::invalid_uri(input, "relative paths and URLs are not supported")
        }
        other => Error::invalid_uri(input, other.to_string()),
    })?;

    match url.scheme() {
        "file" => url
            .to_file_path()
            .map(Location::File)
            .map_err(|()| Error::invalid_uri(input, "file URL does not name a local path")),
        "http" | "https" => Ok(Location::Url(url)),
        scheme => Err(Error::invalid_uri(
            input,
            format!("unsupported scheme '{}'", scheme),
        )),
    }
}

/// URL of a peer's federation endpoint. Peers are assumed to use the default root path.
pub fn server_url(base_url: &str) -> Result<Url> {
    let base = Url::parse(base_url).map_err(|e| Error::invalid_uri(base_url, e.to_string()))?;

    if !matches!(base.scheme(), "http" | "https") {
        return Err(Error::invalid_uri(
            base_url,
            "server base URL must use http or https",
        ));
    }

    base.join(&format!("{}{}", DEFAULT_ROOT_PATH, SERVER_ENDPOINT))
        .map_err(|e| Error::invalid_uri(base_url, e.to_string()))
}

// ─────────────────────────────────────────────────────────────────
// Loading
// ─────────────────────────────────────────────────────────────────

/// Read and parse a persona file or URL. Nothing is registered here.
pub fn load_persona_document(
    retriever: &dyn PersonaRetriever,
    path_or_url: &str,
) -> Result<Vec<Persona>> {
    let text = match resolve_location(path_or_url)? {
        Location::File(path) => retriever.read_file(&path)?,
        Location::Url(url) => retriever.fetch_url(&url)?,
    };

    let personas = contract::parse_persona_document(path_or_url, &text)?;
    debug!(origin = %path_or_url, count = personas.len(), "Parsed persona document");
    Ok(personas)
}

/// Fetch and parse a peer's persona list. Nothing is registered here.
pub fn fetch_server_personas(
    retriever: &dyn PersonaRetriever,
    base_url: &str,
) -> Result<Vec<Persona>> {
    let url = server_url(base_url)?;
    let text = retriever.fetch_url(&url)?;

    let personas = contract::parse_server_response(url.as_str(), &text)?;
    debug!(server = %base_url, count = personas.len(), "Parsed server response");
    Ok(personas)
}
