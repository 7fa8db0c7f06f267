use crate::config::FetchSettings;
use crate::tools::fetch::{self, cli::FetchCommand, set_host_identity, Fetcher};
use crate::{logging, runtime};
use clap::Parser;
use std::path::PathBuf;
use tracing::debug;

#[derive(Parser, Debug)]
#[command(
    name = "plugin-web",
    version,
    about = "Fetch pages the way plugins do (redirects, cookies, user agents)"
)]
pub struct Cli {
    #[command(subcommand)]
    cmd: FetchCommand,

    /// More log output (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Settings file (defaults to the per-user plugin-web.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    set_host_identity(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    let settings = FetchSettings::load(cli.config.as_deref())?;
    debug!("settings: {:?}", settings);

    let fetcher = Fetcher::new(settings);
    runtime::block_on(fetch::cli::run(&fetcher, cli.cmd))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "plugin-web",
            "get",
            "https://example.com",
            "--cookie",
            "sid=1@.example.com",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.cmd, FetchCommand::Get(ref a) if a.url == "https://example.com"));
    }

    #[test]
    fn request_agent_conflicts_with_explicit_agent() {
        let parsed = Cli::try_parse_from([
            "plugin-web",
            "get",
            "https://example.com",
            "--request-agent",
            "--user-agent",
            "x",
        ]);
        assert!(parsed.is_err());
    }
}
