use std::path::PathBuf;

/// Options for one synchronisation run.
#[derive(Clone, Debug, Default)]
pub struct SyncOptions {
    /// Plan and report without touching the destination.
    pub dry_run: bool,
    /// Schedule every source file and let sizes decide what to re-upload.
    pub update: bool,
    /// Root for bare git clones.
    pub cache_dir: PathBuf,
}
