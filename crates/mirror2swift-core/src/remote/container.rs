use eyre::{bail, Result, WrapErr};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Url;
use serde::Deserialize;

use crate::config::Destination;
use crate::encode_uri_path;
use crate::remote::client::HttpClient;
use crate::remote::tempurl::{Clock, TempUrlSigner};

/// Swift returns at most this many names per listing request.
pub const LISTING_PAGE_LIMIT: usize = 10_000;

const DELETE_AFTER: HeaderName = HeaderName::from_static("x-delete-after");

#[derive(Debug, Deserialize)]
struct ObjectEntry {
    name: String,
}

/// A Swift container addressed by URL. Reads use the public listing API,
/// writes go through temp URLs signed with the container key.
#[derive(Debug, Clone)]
pub struct SwiftContainer {
    client: HttpClient,
    base_url: String,
    signer: TempUrlSigner,
    ttl: Option<u64>,
}

impl SwiftContainer {
    pub fn new(client: HttpClient, destination: &Destination) -> Self {
        Self {
            client,
            base_url: destination.url.clone(),
            signer: TempUrlSigner::new(destination.key.clone()),
            ttl: destination.ttl,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `<base>?format=json[&prefix=<p>][&marker=<m>]`
    pub fn listing_url(&self, prefix: &str, marker: Option<&str>) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .wrap_err_with(|| format!("invalid container url {}", self.base_url))?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("format", "json");
            if !prefix.is_empty() {
                query.append_pair("prefix", prefix);
            }
            if let Some(marker) = marker {
                query.append_pair("marker", marker);
            }
        }
        Ok(url)
    }

    /// Names of every object under `prefix`, in listing order.
    pub fn list_objects(&self, prefix: &str) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut marker: Option<String> = None;

        loop {
            let url = self.listing_url(prefix, marker.as_deref())?;
            log::debug!("Listing swift container {url}");
            let body = self.client.get_bytes(url.as_str())?;
            let page: Vec<ObjectEntry> = serde_json::from_slice(&body)
                .wrap_err_with(|| format!("invalid container listing from {url}"))?;

            let full_page = page.len() >= LISTING_PAGE_LIMIT;
            names.extend(page.into_iter().map(|entry| entry.name));

            if !full_page {
                break;
            }
            marker = names.last().cloned();
        }

        Ok(names)
    }

    /// Destination URL of `uri` inside `prefix`, escaped segment by segment.
    /// The signer decodes the path again before signing.
    pub fn object_url(&self, prefix: &str, uri: &str) -> String {
        format!("{}{}", self.base_url, encode_uri_path(&format!("{prefix}{uri}")))
    }

    /// Size of an existing object, `None` when it does not exist.
    pub fn object_size(&self, object_url: &str) -> Result<Option<u64>> {
        self.client.head_content_length(object_url)
    }

    /// Sign and PUT `body` to `object_url`.
    pub fn upload(&self, object_url: &str, body: Vec<u8>, clock: &dyn Clock) -> Result<()> {
        let temp = self.signer.sign_put(object_url, clock)?;
        let signed = temp.apply(object_url);

        let mut headers = HeaderMap::new();
        if let Some(ttl) = self.ttl {
            headers.insert(DELETE_AFTER, HeaderValue::from(ttl));
        }

        let status = self.client.put(&signed, body, headers)?;
        if !status.is_success() {
            bail!("PUT {object_url} returned {status}");
        }
        log::debug!("stored {object_url} ({status})");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn container(url: &str) -> SwiftContainer {
        let destination = Destination {
            key: "secret".into(),
            ttl: None,
            url: url.into(),
        };
        SwiftContainer::new(HttpClient::new().unwrap(), &destination)
    }

    #[test]
    fn listing_url_adds_prefix_once() {
        let c = container("http://some/url/");
        assert_eq!(
            c.listing_url("", None).unwrap().as_str(),
            "http://some/url/?format=json"
        );
        let with_prefix = c.listing_url("prefix", None).unwrap();
        assert_eq!(
            with_prefix.as_str(),
            "http://some/url/?format=json&prefix=prefix"
        );
        assert_eq!(with_prefix.as_str().matches("prefix=").count(), 1);
    }

    #[test]
    fn object_url_joins_prefix_and_uri() {
        let c = container("http://swift/v1/a/c/");
        assert_eq!(
            c.object_url("centos/", "Packages/a.rpm"),
            "http://swift/v1/a/c/centos/Packages/a.rpm"
        );
        assert_eq!(
            c.object_url("centos/", "pkgs/c#.rpm"),
            "http://swift/v1/a/c/centos/pkgs/c%23.rpm"
        );
    }
}
