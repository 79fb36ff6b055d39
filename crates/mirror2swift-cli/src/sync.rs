use eyre::{bail, Result};
use mirror2swift_core::config::{cache_dir, MirrorConfig};
use mirror2swift_core::orchestrator::{
    FileStatus, MirrorSync, SyncOptions, SyncSummary, TransferReporter,
};
use mirror2swift_core::remote::HttpClient;
use mirror2swift_core::repos;
use std::io::{self, Write};

use crate::cli::Cli;
use crate::context::AppContext;

pub fn run_sync(cli: &Cli) -> Result<()> {
    let config = MirrorConfig::load(&cli.filename)?;
    let options = SyncOptions {
        dry_run: cli.noop,
        update: cli.update,
        cache_dir: cache_dir(cli.cache_dir.as_deref())?,
    };

    let sync = MirrorSync::new(HttpClient::new()?, options);
    let mut reporter = ConsoleReporter::new(io::stdout());
    let summary = sync.run(&config, &mut reporter)?;

    print_summary(&summary);
    Ok(())
}

pub fn run_add_enabled_repos(ctx: &AppContext, cli: &Cli, section: &str) -> Result<()> {
    if !ctx.repos_available {
        bail!(
            "--add-enabled-repos: no package repository configuration in {}",
            ctx.repo_feed.repo_dir().display()
        );
    }
    let added = repos::add_enabled_repos(&cli.filename, section, &ctx.repo_feed)?;
    println!(
        "Added {added} repositor{} to {section} in {}",
        if added == 1 { "y" } else { "ies" },
        cli.filename.display()
    );
    Ok(())
}

/// Writes `<uri>...` when a file starts and its status when it ends.
pub struct ConsoleReporter<W: Write> {
    out: W,
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> TransferReporter for ConsoleReporter<W> {
    fn file_started(&mut self, uri: &str) {
        let _ = write!(self.out, "{uri}...");
        let _ = self.out.flush();
    }

    fn file_finished(&mut self, _uri: &str, status: FileStatus) {
        let suffix = match status {
            FileStatus::Uploaded => " OK",
            FileStatus::Failed => " Failed",
            FileStatus::AlreadyCached => " already cached",
            FileStatus::Listed => "",
        };
        let _ = writeln!(self.out, "{suffix}");
    }
}

fn print_summary(summary: &SyncSummary) {
    if summary.dry_run {
        for mirror in &summary.mirrors {
            println!(
                "{} [{}]: {} missing file(s), {} unneeded object(s)",
                mirror.group, mirror.mirror, mirror.planned_files, mirror.unneeded_objects
            );
        }
        println!(
            "Dry run complete: {} mirror(s), {} file(s) to transfer in {:.2?}",
            summary.mirrors.len(),
            summary.planned_files(),
            summary.duration
        );
        return;
    }

    println!(
        "Sync complete: {} file(s) uploaded, {} in {:.2?}",
        summary.uploaded_files(),
        format_bytes(summary.total_bytes()),
        summary.duration
    );
    if summary.cached_files() > 0 {
        println!("• Already cached: {} file(s)", summary.cached_files());
    }
    if summary.failed_files() > 0 {
        println!("• Failed: {} file(s)", summary.failed_files());
    }
    if summary.unneeded_objects() > 0 {
        println!(
            "• Unneeded objects left in place: {}",
            summary.unneeded_objects()
        );
    }
}

pub(crate) fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    if bytes == 0 {
        return "0 B".to_owned();
    }
    let mut value = bytes as f64;
    let mut unit = 0usize;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[unit])
    } else {
        format!("{:.2} {}", value, UNITS[unit])
    }
}
