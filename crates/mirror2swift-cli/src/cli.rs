use clap::{CommandFactory, FromArgMatches, Parser};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "mirror2swift")]
#[command(about = "Synchronise package repositories, git repositories and file trees into Swift containers")]
pub struct Cli {
    /// Mirror configuration file (YAML)
    #[arg(value_name = "FILENAME")]
    pub filename: PathBuf,
    /// Print debug messages
    #[arg(long)]
    pub debug: bool,
    /// List missing files without transferring anything
    #[arg(long)]
    pub noop: bool,
    /// Re-check every file and upload those whose size changed
    #[arg(long)]
    pub update: bool,
    /// Append the host's enabled package repositories to SECTION and exit
    #[arg(long, value_name = "SECTION")]
    pub add_enabled_repos: Option<String>,
    /// Override the git clone cache directory
    #[arg(long, value_name = "PATH")]
    pub cache_dir: Option<PathBuf>,
}

impl Cli {
    /// Parse the process arguments. `--add-enabled-repos` only shows up in
    /// the help when the host has a repository configuration.
    pub fn parse_for_host(repos_available: bool) -> Self {
        let matches = Self::command_for_host(repos_available).get_matches();
        match Self::from_arg_matches(&matches) {
            Ok(cli) => cli,
            Err(err) => err.exit(),
        }
    }

    pub fn command_for_host(repos_available: bool) -> clap::Command {
        Self::command().mut_arg("add_enabled_repos", |arg| arg.hide(!repos_available))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_flags() {
        let cli = Cli::try_parse_from([
            "mirror2swift",
            "--noop",
            "--update",
            "--cache-dir",
            "/tmp/cache",
            "mirrors.yaml",
        ])
        .unwrap();
        assert!(cli.noop);
        assert!(cli.update);
        assert!(!cli.debug);
        assert_eq!(cli.filename, PathBuf::from("mirrors.yaml"));
        assert_eq!(cli.cache_dir, Some(PathBuf::from("/tmp/cache")));
        assert_eq!(cli.add_enabled_repos, None);
    }

    #[test]
    fn filename_is_required() {
        assert!(Cli::try_parse_from(["mirror2swift", "--debug"]).is_err());
    }

    #[test]
    fn repo_flag_hidden_without_host_config() {
        let help = |available| {
            Cli::command_for_host(available)
                .render_long_help()
                .to_string()
        };
        assert!(help(true).contains("--add-enabled-repos"));
        assert!(!help(false).contains("--add-enabled-repos"));
    }
}
