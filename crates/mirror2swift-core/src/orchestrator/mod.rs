use std::time::Instant;

use eyre::{Result, WrapErr};

use crate::config::{MirrorConfig, MirrorGroup, MirrorSource};
use crate::enumeration::enumerate_mirror;
use crate::mirror_planner::MirrorPlanner;
use crate::remote::{Clock, HttpClient, SwiftContainer};
use crate::transfer_engine::{TransferEngine, TransferOutcome};

mod options;
mod summary;

pub use options::SyncOptions;
pub use summary::{MirrorSummary, SyncSummary};

/// Result of one scheduled file as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    Uploaded,
    AlreadyCached,
    Failed,
    /// Dry run: the file would have been transferred.
    Listed,
}

/// Receives per-file progress while a mirror is synchronised.
pub trait TransferReporter {
    fn mirror_started(&mut self, _group: &str, _mirror: &str, _planned: usize) {}
    fn file_started(&mut self, uri: &str);
    fn file_finished(&mut self, uri: &str, status: FileStatus);
}

/// Reporter that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentReporter;

impl TransferReporter for SilentReporter {
    fn file_started(&mut self, _uri: &str) {}
    fn file_finished(&mut self, _uri: &str, _status: FileStatus) {}
}

/// Walks every group and mirror of a configuration and brings each
/// destination container up to date.
pub struct MirrorSync {
    client: HttpClient,
    engine: TransferEngine,
    planner: MirrorPlanner,
    options: SyncOptions,
}

impl MirrorSync {
    pub fn new(client: HttpClient, options: SyncOptions) -> Self {
        Self {
            engine: TransferEngine::new(client.clone()),
            planner: MirrorPlanner::new(options.update),
            client,
            options,
        }
    }

    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.engine = self.engine.with_clock(clock);
        self
    }

    /// Synchronise every mirror in document order. Enumeration and listing
    /// failures abort the run; per-file failures are counted.
    pub fn run(
        &self,
        config: &MirrorConfig,
        reporter: &mut dyn TransferReporter,
    ) -> Result<SyncSummary> {
        let start_time = Instant::now();
        let mut summary = SyncSummary {
            dry_run: self.options.dry_run,
            ..Default::default()
        };

        for (group_name, group) in &config.groups {
            summary
                .mirrors
                .extend(self.sync_group(group_name, group, reporter)?);
        }

        summary.duration = start_time.elapsed();
        Ok(summary)
    }

    fn sync_group(
        &self,
        group_name: &str,
        group: &MirrorGroup,
        reporter: &mut dyn TransferReporter,
    ) -> Result<Vec<MirrorSummary>> {
        let container = SwiftContainer::new(self.client.clone(), &group.swift);
        group
            .mirrors
            .iter()
            .map(|mirror| {
                self.sync_mirror(group_name, mirror, &container, reporter)
                    .wrap_err_with(|| format!("{group_name} [{}]", mirror.name))
            })
            .collect()
    }

    /// Enumerate one mirror, compare it with the container and transfer
    /// what the plan schedules.
    pub fn sync_mirror(
        &self,
        group_name: &str,
        mirror: &MirrorSource,
        container: &SwiftContainer,
        reporter: &mut dyn TransferReporter,
    ) -> Result<MirrorSummary> {
        let prefix = mirror.prefix();
        let listing = enumerate_mirror(&self.client, mirror, &self.options.cache_dir)?;
        let objects = container.list_objects(&prefix)?;
        let plan = self.planner.plan(&listing.uris, &objects, &prefix);

        let mut summary = MirrorSummary {
            group: group_name.to_string(),
            mirror: mirror.name.clone(),
            planned_files: plan.transfers.len(),
            unneeded_objects: plan.unneeded.len(),
            dry_run: self.options.dry_run,
            ..Default::default()
        };

        if !plan.unneeded.is_empty() {
            log::debug!(
                "{group_name} [{}]: {} objects no longer published",
                mirror.name,
                plan.unneeded.len()
            );
        }

        if plan.is_empty() {
            log::info!(
                "{group_name} [{}]: is up-to-date ({}{prefix})",
                mirror.name,
                container.base_url()
            );
            return Ok(summary);
        }

        log::info!(
            "Uploading {} missing files for mirror {group_name} [{}] ({}{prefix})",
            plan.transfers.len(),
            mirror.name,
            container.base_url()
        );
        reporter.mirror_started(group_name, &mirror.name, plan.transfers.len());

        for uri in &plan.transfers {
            reporter.file_started(uri);
            if self.options.dry_run {
                reporter.file_finished(uri, FileStatus::Listed);
                continue;
            }

            let location = listing.location(uri);
            let object_url = container.object_url(&prefix, uri);
            let status = match self.engine.upload_missing(
                &location,
                &object_url,
                container,
                self.planner.needs_size_check(uri),
            ) {
                Ok(TransferOutcome::Uploaded { bytes }) => {
                    summary.uploaded_files += 1;
                    summary.total_bytes += bytes;
                    FileStatus::Uploaded
                }
                Ok(TransferOutcome::AlreadyCached) => {
                    summary.cached_files += 1;
                    FileStatus::AlreadyCached
                }
                Err(err) => {
                    log::warn!("{err}");
                    summary.failed_files += 1;
                    FileStatus::Failed
                }
            };
            reporter.file_finished(uri, status);
        }

        Ok(summary)
    }
}
