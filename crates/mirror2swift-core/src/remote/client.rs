use eyre::{bail, Result, WrapErr};
use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, CONTENT_LENGTH};
use reqwest::StatusCode;

/// Thin blocking HTTP client shared by enumeration and transfers. Every call
/// blocks until complete and relies on the library's default timeouts.
#[derive(Clone, Debug)]
pub struct HttpClient {
    http: Client,
}

impl HttpClient {
    pub fn new() -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("mirror2swift/", env!("CARGO_PKG_VERSION")))
            .build()
            .wrap_err("failed to build HTTP client")?;
        Ok(Self { http })
    }

    /// GET `url` and return the body, failing on non-2xx responses.
    pub fn get_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.get(url)?;
        let status = response.status();
        if !status.is_success() {
            bail!("GET {url} returned {status}");
        }
        let body = response
            .bytes()
            .wrap_err_with(|| format!("reading body of {url}"))?;
        Ok(body.to_vec())
    }

    /// GET `url` without interpreting the status.
    pub fn get(&self, url: &str) -> Result<Response> {
        log::debug!("GET {url}");
        self.http
            .get(url)
            .send()
            .wrap_err_with(|| format!("GET {url}"))
    }

    /// `Content-Length` of `url` as reported by HEAD. `None` when the request
    /// does not succeed or the header is absent.
    pub fn head_content_length(&self, url: &str) -> Result<Option<u64>> {
        log::debug!("HEAD {url}");
        let response = self
            .http
            .head(url)
            .send()
            .wrap_err_with(|| format!("HEAD {url}"))?;
        if !response.status().is_success() {
            return Ok(None);
        }
        Ok(content_length(response.headers()))
    }

    /// Whether HEAD on `url` succeeds.
    pub fn exists(&self, url: &str) -> bool {
        match self.http.head(url).send() {
            Ok(response) => response.status().is_success(),
            Err(err) => {
                log::debug!("HEAD {url}: {err}");
                false
            }
        }
    }

    /// PUT `body` to `url` and return the response status.
    pub fn put(&self, url: &str, body: Vec<u8>, headers: HeaderMap) -> Result<StatusCode> {
        log::debug!("PUT {url} ({} bytes)", body.len());
        let response = self
            .http
            .put(url)
            .headers(headers)
            .body(body)
            .send()
            .wrap_err_with(|| format!("PUT {url}"))?;
        Ok(response.status())
    }
}

// HEAD bodies are empty, so the header is read directly instead of
// `Response::content_length`.
fn content_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok())
}
