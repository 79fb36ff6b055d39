use eyre::{Result, WrapErr};
use std::fs;
use std::path::PathBuf;

use crate::remote::client::HttpClient;

/// A single file on a mirror, either on local disk or behind HTTP.
pub trait FileSource {
    /// Location as given by the mirror (path or URL).
    fn location(&self) -> &str;

    fn exists(&self) -> bool;

    /// Size in bytes, `None` when it cannot be determined.
    fn size(&self) -> Result<Option<u64>>;

    /// Full file contents.
    fn read(&self) -> Result<Vec<u8>>;
}

pub struct LocalFile {
    path: PathBuf,
    location: String,
}

impl LocalFile {
    pub fn new(location: &str) -> Self {
        Self {
            path: PathBuf::from(location),
            location: location.to_string(),
        }
    }
}

impl FileSource for LocalFile {
    fn location(&self) -> &str {
        &self.location
    }

    fn exists(&self) -> bool {
        self.path.exists()
    }

    fn size(&self) -> Result<Option<u64>> {
        let metadata = fs::metadata(&self.path)
            .wrap_err_with(|| format!("stat {}", self.path.display()))?;
        Ok(Some(metadata.len()))
    }

    fn read(&self) -> Result<Vec<u8>> {
        fs::read(&self.path).wrap_err_with(|| format!("reading {}", self.path.display()))
    }
}

pub struct HttpFile {
    client: HttpClient,
    url: String,
}

impl HttpFile {
    pub fn new(client: HttpClient, url: &str) -> Self {
        Self {
            client,
            url: url.to_string(),
        }
    }
}

impl FileSource for HttpFile {
    fn location(&self) -> &str {
        &self.url
    }

    fn exists(&self) -> bool {
        self.client.exists(&self.url)
    }

    fn size(&self) -> Result<Option<u64>> {
        self.client.head_content_length(&self.url)
    }

    fn read(&self) -> Result<Vec<u8>> {
        self.client.get_bytes(&self.url)
    }
}

pub fn is_remote(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

/// Pick the source implementation matching `location`.
pub fn open_source(client: &HttpClient, location: &str) -> Box<dyn FileSource> {
    if is_remote(location) {
        Box::new(HttpFile::new(client.clone(), location))
    } else {
        Box::new(LocalFile::new(location))
    }
}
