//! Source enumeration: turn a mirror descriptor into the list of relative
//! paths that should exist at the destination.

use eyre::{eyre, Result};
use percent_encoding::percent_decode_str;
use std::path::Path;

use crate::config::{MirrorSource, SourceKind};
use crate::remote::HttpClient;
use crate::remote::source::is_remote;
use crate::{encode_uri_path, with_trailing_slash};

pub mod git;
pub mod local;
pub mod repodata;
pub mod web;

pub use git::GitCache;
pub use local::local_file_list;
pub use repodata::repodata_uri_list;
pub use web::WebListing;

/// Files published by a mirror. Every URI is relative to `base`, which
/// always ends with `/` and may be a URL or a local directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceListing {
    pub base: String,
    pub uris: Vec<String>,
}

impl SourceListing {
    /// Location of `uri` on the mirror. URIs are kept decoded, so they are
    /// escaped again when the base is a URL.
    pub fn location(&self, uri: &str) -> String {
        if is_remote(&self.base) {
            format!("{}{}", self.base, encode_uri_path(uri))
        } else {
            format!("{}{}", self.base, uri)
        }
    }
}

/// Enumerate `mirror` according to its kind. Git mirrors are cloned or
/// refreshed beneath `cache_dir` first.
pub fn enumerate_mirror(
    client: &HttpClient,
    mirror: &MirrorSource,
    cache_dir: &Path,
) -> Result<SourceListing> {
    let base = with_trailing_slash(&mirror.url);

    match mirror.kind() {
        SourceKind::Repodata => {
            log::info!("Getting repodata uri list {base}");
            let uris = repodata_uri_list(client, &base)?;
            Ok(SourceListing { base, uris })
        }
        SourceKind::Direct => {
            let listing = direct_listing(&mirror.url)?;
            log::info!("Direct get {} from {}", listing.uris[0], listing.base);
            Ok(listing)
        }
        SourceKind::Local => {
            log::info!("Getting local files list {base}");
            let uris = local_file_list(Path::new(&base))?;
            Ok(SourceListing { base, uris })
        }
        SourceKind::Git => {
            let repo_dir = GitCache::new(cache_dir).sync(&mirror.name, &mirror.url)?;
            let base = with_trailing_slash(&repo_dir.to_string_lossy());
            let uris = local_file_list(&repo_dir)?;
            Ok(SourceListing { base, uris })
        }
        SourceKind::WebListing => {
            log::info!("Getting web listing uri list {base}");
            let uris = WebListing::new(client, &base).collect_uris()?;
            Ok(SourceListing { base, uris })
        }
    }
}

/// A single file: the last path segment is the URI and its parent becomes
/// the base.
pub fn direct_listing(url: &str) -> Result<SourceListing> {
    let trimmed = url.trim_end_matches('/');
    let (parent, name) = trimmed
        .rsplit_once('/')
        .filter(|(_, name)| !name.is_empty())
        .ok_or_else(|| eyre!("direct mirror url has no file component: {url}"))?;
    Ok(SourceListing {
        base: format!("{parent}/"),
        uris: vec![percent_decode_str(name).decode_utf8_lossy().into_owned()],
    })
}
