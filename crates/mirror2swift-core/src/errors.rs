//! Per-file transfer failures.
//!
//! A failed file never aborts the batch; the orchestrator counts it and moves
//! on. The stage records where in the probe/fetch/upload sequence it broke.

use std::fmt;

/// Step of a single file transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferStage {
    /// Size comparison against the existing object (update mode).
    Probe,
    /// Reading the file from the mirror.
    Fetch,
    /// PUT to the signed destination URL.
    Upload,
}

impl fmt::Display for TransferStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TransferStage::Probe => "probe",
            TransferStage::Fetch => "get",
            TransferStage::Upload => "put",
        };
        f.write_str(label)
    }
}

/// A transfer error with the stage it happened in.
#[derive(Debug)]
pub struct TransferError {
    /// The underlying error message.
    pub message: String,
    /// The source location that failed.
    pub location: String,
    pub stage: TransferStage,
}

impl TransferError {
    pub fn probe(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(TransferStage::Probe, location, message)
    }

    pub fn fetch(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(TransferStage::Fetch, location, message)
    }

    pub fn upload(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(TransferStage::Upload, location, message)
    }

    fn new(stage: TransferStage, location: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: location.into(),
            stage,
        }
    }
}

impl fmt::Display for TransferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} failed ({})", self.location, self.stage, self.message)
    }
}

impl std::error::Error for TransferError {}

/// Result type for single-file transfers.
pub type TransferResult<T> = std::result::Result<T, TransferError>;
