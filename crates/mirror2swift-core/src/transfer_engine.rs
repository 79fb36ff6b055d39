use crate::errors::{TransferError, TransferResult};
use crate::remote::{open_source, Clock, FileSource, HttpClient, SwiftContainer, SystemClock};

/// What happened to a single scheduled file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferOutcome {
    Uploaded { bytes: u64 },
    /// Same size already stored at the destination (update mode only).
    AlreadyCached,
}

/// Moves one file at a time from a mirror into a container.
pub struct TransferEngine {
    client: HttpClient,
    clock: Box<dyn Clock>,
}

impl TransferEngine {
    pub fn new(client: HttpClient) -> Self {
        Self {
            client,
            clock: Box::new(SystemClock),
        }
    }

    /// Replace the clock used for temp URL expiry.
    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Copy `location` to `object_url`. With `size_check`, an object whose
    /// size matches the source is left alone.
    pub fn upload_missing(
        &self,
        location: &str,
        object_url: &str,
        container: &SwiftContainer,
        size_check: bool,
    ) -> TransferResult<TransferOutcome> {
        let source = open_source(&self.client, location);

        if size_check && self.is_cached(source.as_ref(), container, object_url)? {
            log::debug!("{location}: already cached");
            return Ok(TransferOutcome::AlreadyCached);
        }

        let body = source
            .read()
            .map_err(|err| TransferError::fetch(location, format!("{err:#}")))?;
        let bytes = body.len() as u64;

        log::debug!("{location}: caching to {object_url}");
        container
            .upload(object_url, body, self.clock.as_ref())
            .map_err(|err| TransferError::upload(location, format!("{err:#}")))?;

        Ok(TransferOutcome::Uploaded { bytes })
    }

    fn is_cached(
        &self,
        source: &dyn FileSource,
        container: &SwiftContainer,
        object_url: &str,
    ) -> TransferResult<bool> {
        let probe_err = |err: eyre::Report| TransferError::probe(source.location(), format!("{err:#}"));
        let source_size = source.size().map_err(probe_err)?;
        if source_size.is_none() && !source.exists() {
            return Err(TransferError::probe(source.location(), "source does not exist"));
        }
        let object_size = container.object_size(object_url).map_err(probe_err)?;

        Ok(matches!((source_size, object_size), (Some(a), Some(b)) if a == b))
    }
}
