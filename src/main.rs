use std::fmt;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use colored::Colorize;
use error_stack::fmt::{Charset, ColorMode};
use error_stack::{IntoReport, Report, ResultExt};
use tuber_core::Registry;

use crate::lastfm::commands::LastFmCli;
use crate::youtube::commands::YouTubeCli;

mod config;
mod dialoguer;
mod lastfm;
mod logging;
mod table;
mod youtube;

#[derive(Debug)]
pub struct TuberError;
impl fmt::Display for TuberError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Tuber error")
    }
}
impl std::error::Error for TuberError {}

pub type TuberResult<T> = error_stack::Result<T, TuberError>;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Create playlists from Last.fm and push them to YouTube")]
struct Cli {
    /// Path of the registry file
    #[clap(long, global = true, env = "TUBER_REGISTRY")]
    registry: Option<PathBuf>,
    /// Increase log verbosity, repeat for more
    #[clap(long, short, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: TuberCommands,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
enum TuberCommands {
    /// Last.fm is a music service that learns what you love
    Lastfm(LastFmCli),
    /// Create and update your YouTube playlists
    Youtube(YouTubeCli),
}

impl TuberCommands {
    pub fn execute(&self, registry: &mut Registry) -> TuberResult<()> {
        match self {
            TuberCommands::Lastfm(cli) => cli.execute(registry).change_context(TuberError),
            TuberCommands::Youtube(cli) => cli.execute(registry).change_context(TuberError),
        }
    }

    pub fn cli_command(&self) -> String {
        match self {
            TuberCommands::Lastfm(..) => "tuber lastfm".to_string(),
            TuberCommands::Youtube(..) => "tuber youtube".to_string(),
        }
    }
}

pub struct Suggestion(String);

impl Suggestion {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn set_report() {
        Report::set_charset(Charset::Utf8);
        Report::set_color_mode(ColorMode::Color);
        Report::install_debug_hook::<Self>(|Self(value), context| {
            context.push_body(format!("{}: {value}", "suggestion".yellow()))
        });
    }
}

fn run() -> TuberResult<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    Suggestion::set_report();
    logging::init(cli.verbose)
        .into_report()
        .change_context(TuberError)?;

    let registry_path = match cli.registry {
        Some(path) => path,
        None => Registry::default_path()
            .into_report()
            .change_context(TuberError)
            .attach(Suggestion::new("pass --registry <PATH> or set TUBER_REGISTRY"))?,
    };
    log::debug!("Using registry at {}", registry_path.display());
    let mut registry = Registry::open(registry_path);

    cli.command
        .execute(&mut registry)
        .attach_printable_lazy(|| format!("while running {}", cli.command.cli_command()))
}

fn main() -> TuberResult<()> {
    run()
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_registry_flag() {
        let cli = Cli::try_parse_from([
            "tuber",
            "lastfm",
            "list",
            "--registry",
            "/tmp/storage.json",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.registry, Some(PathBuf::from("/tmp/storage.json")));
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.command.cli_command(), "tuber lastfm");
    }
}
