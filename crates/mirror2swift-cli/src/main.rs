mod cli;
mod context;
mod logging;
mod sync;

use cli::Cli;
use context::AppContext;
use eyre::Result;

fn main() -> Result<()> {
    color_eyre::install()?;
    let ctx = AppContext::load();
    let cli = Cli::parse_for_host(ctx.repos_available);
    logging::init(cli.debug)?;

    match &cli.add_enabled_repos {
        Some(section) => sync::run_add_enabled_repos(&ctx, &cli, section),
        None => sync::run_sync(&cli),
    }
}
