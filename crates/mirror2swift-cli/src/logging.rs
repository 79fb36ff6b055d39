use eyre::{eyre, Result};
use std::fmt;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Crates whose chatter stays at warnings even with `--debug`.
const QUIET_MODULES: &[&str] = &["reqwest", "hyper", "hyper_util", "rustls"];

pub fn level(debug: bool) -> Level {
    if debug {
        Level::DEBUG
    } else {
        Level::INFO
    }
}

/// `info,reqwest=warn,...`
pub fn filter_directives(debug: bool) -> String {
    let mut directives = level(debug).as_str().to_ascii_lowercase();
    for module in QUIET_MODULES {
        directives.push_str(&format!(",{module}=warn"));
    }
    directives
}

/// `*** LEVEL:\tmessage`
struct StarredLines;

impl<S, N> FormatEvent<S, N> for StarredLines
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        write!(writer, "*** {}:\t", event.metadata().level())?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Install the process subscriber on stderr. Records emitted through the
/// `log` facade by the core library are forwarded to it.
pub fn init(debug: bool) -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::new(filter_directives(debug)))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .event_format(StarredLines),
        )
        .try_init()
        .map_err(|err| eyre!("failed to install logger: {err}"))
}
