use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use colored::Colorize;
use error_stack::{IntoReport, Report, ResultExt};
use indicatif::{ProgressBar, ProgressStyle};
use tuber_core::sync::{push_all, reconcile_all, resolve_all};
use tuber_core::{Provider, Query, Registry};

use crate::dialoguer::Dialoguer;
use crate::table::playlist_title;
use crate::youtube::api::YouTubeClient;
use crate::youtube::auth::{authorize, ClientSecrets};
use crate::youtube::{YouTubeError, YouTubeResult};
use crate::Suggestion;

#[derive(Args, Debug, Clone, PartialEq)]
pub struct YouTubeCli {
    #[command(subcommand)]
    command: YouTubeCommands,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
enum YouTubeCommands {
    /// Configure your YouTube api credentials
    ///
    /// Create a project in the Google Developers Console, download its
    /// client_secret.json and pass the path as an argument.
    Setup { client_secrets: PathBuf },
    /// Create playlists and update their items on YouTube
    Push {
        #[command(subcommand)]
        target: Option<PushTarget>,
        /// Push playlists and then their tracks
        #[clap(long)]
        all: bool,
    },
    /// Fetch information from YouTube
    Fetch {
        #[command(subcommand)]
        target: FetchTarget,
    },
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq)]
enum PushTarget {
    /// Create new playlists on YouTube
    Playlists,
    /// Update your YouTube playlist items
    Tracks,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq)]
enum FetchTarget {
    /// Match tracks to YouTube videos
    Tracks,
}

impl YouTubeCli {
    pub fn execute(&self, registry: &mut Registry) -> YouTubeResult<()> {
        match &self.command {
            YouTubeCommands::Setup { client_secrets } => Self::setup(registry, client_secrets),
            YouTubeCommands::Push { target, all } => match (target, *all) {
                (Some(PushTarget::Playlists), _) => {
                    let client = Self::client(registry)?;
                    Self::push_playlists(registry, &client)
                }
                (Some(PushTarget::Tracks), _) => {
                    let client = Self::client(registry)?;
                    Self::push_tracks(registry, &client)
                }
                (None, true) => {
                    let client = Self::client(registry)?;
                    let pushed = Self::push_playlists(registry, &client);
                    let synced = Self::push_tracks(registry, &client);
                    pushed.and(synced)
                }
                (None, false) => Err(Report::new(YouTubeError)
                    .attach_printable("Nothing to push")
                    .attach(Suggestion::new(
                        "use `tuber youtube push playlists`, `tuber youtube push tracks` or `tuber youtube push --all`",
                    ))),
            },
            YouTubeCommands::Fetch {
                target: FetchTarget::Tracks,
            } => {
                let client = Self::client(registry)?;
                Self::fetch_tracks(registry, &client)
            }
        }
    }

    fn setup(registry: &mut Registry, client_secrets: &Path) -> YouTubeResult<()> {
        let existing = registry
            .config()
            .find(Provider::Youtube)
            .into_report()
            .change_context(YouTubeError)?;
        if existing.is_some() {
            Dialoguer::confirm_or_abort("Overwrite existing configuration?".to_string())
                .change_context(YouTubeError)?;
        }

        let secrets = ClientSecrets::read(client_secrets)?;
        let credentials = authorize(&secrets)?;
        let config = credentials
            .into_config()
            .into_report()
            .change_context(YouTubeError)?;
        registry
            .config()
            .set(config)
            .into_report()
            .change_context(YouTubeError)?;
        println!("Youtube configuration updated!");
        Ok(())
    }

    fn push_playlists(registry: &mut Registry, client: &YouTubeClient) -> YouTubeResult<()> {
        let playlists = registry
            .playlists()
            .find(&Query::new().is_null("youtube_id"))
            .into_report()
            .change_context(YouTubeError)?;
        if playlists.is_empty() {
            println!("There are no new playlists");
            return Ok(());
        }

        let pb = Self::progress(playlists.len(), "Creating playlists")?;
        let report = push_all(registry, client, &playlists, |playlist, result| {
            match result {
                Ok(pushed) => pb.println(format!(
                    "Created playlist: {} ({})",
                    playlist_title(pushed),
                    pushed.youtube_id.as_deref().unwrap_or_default().green()
                )),
                Err(error) => pb.println(format!("{} {}: {}", "Failed".red(), playlist.id, error)),
            }
            pb.inc(1);
        });
        pb.finish();
        report
            .ensure_success("playlists")
            .into_report()
            .change_context(YouTubeError)
    }

    fn push_tracks(registry: &mut Registry, client: &YouTubeClient) -> YouTubeResult<()> {
        let playlists = registry
            .playlists()
            .find(&Query::new().not_null("youtube_id"))
            .into_report()
            .change_context(YouTubeError)?;

        let pb = Self::progress(playlists.len(), "Syncing playlist items")?;
        let report = reconcile_all(registry, client, &playlists, |playlist, result| {
            match result {
                Ok(outcome) if outcome.is_noop() => pb.println(format!(
                    "Playlist is already synced: {}",
                    playlist_title(playlist)
                )),
                Ok(outcome) => {
                    for video_id in &outcome.added {
                        pb.println(format!("Added video: {}", video_id.green()));
                    }
                    for video_id in &outcome.removed {
                        pb.println(format!("Removed video: {}", video_id.yellow()));
                    }
                }
                Err(error) => pb.println(format!("{} {}: {}", "Failed".red(), playlist.id, error)),
            }
            pb.inc(1);
        });
        pb.finish();
        report
            .ensure_success("playlists")
            .into_report()
            .change_context(YouTubeError)
    }

    fn fetch_tracks(registry: &mut Registry, client: &YouTubeClient) -> YouTubeResult<()> {
        let tracks = registry
            .tracks()
            .find(&Query::new().is_null("youtube_id"))
            .into_report()
            .change_context(YouTubeError)?;
        if tracks.is_empty() {
            println!("There are no new tracks");
            return Ok(());
        }

        let pb = Self::progress(tracks.len(), "Fetching tracks")?;
        let mut matched = 0;
        let report = resolve_all(registry, client, &tracks, |track, result| {
            match result {
                Ok(Some(_)) => matched += 1,
                Ok(None) => {}
                Err(error) => pb.println(format!("{} {}: {}", "Failed".red(), track.id, error)),
            }
            pb.inc(1);
        });
        pb.finish();
        println!(
            "Matched {} of {} tracks",
            matched.to_string().green(),
            tracks.len()
        );
        report
            .ensure_success("tracks")
            .into_report()
            .change_context(YouTubeError)
    }

    fn client(registry: &mut Registry) -> YouTubeResult<YouTubeClient> {
        let config = registry
            .config()
            .get(Provider::Youtube)
            .into_report()
            .change_context(YouTubeError)
            .attach(Suggestion::new(
                "run `tuber youtube setup <CLIENT_SECRETS>` first",
            ))?;
        YouTubeClient::from_config(&config)
            .into_report()
            .change_context(YouTubeError)
    }

    fn progress(len: usize, message: &'static str) -> YouTubeResult<ProgressBar> {
        let pb = ProgressBar::new(len as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{msg} [{wide_bar:.white/blue}] {pos}/{len}")
                .into_report()
                .change_context(YouTubeError)?,
        );
        pb.set_message(message);
        Ok(pb)
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(Parser, Debug)]
    struct TestCli {
        #[command(flatten)]
        youtube: YouTubeCli,
    }

    fn parse(args: &[&str]) -> YouTubeCommands {
        let args = std::iter::once("youtube").chain(args.iter().copied());
        TestCli::try_parse_from(args).unwrap().youtube.command
    }

    #[test]
    fn test_parse_push_targets() {
        assert_eq!(
            parse(&["push", "playlists"]),
            YouTubeCommands::Push {
                target: Some(PushTarget::Playlists),
                all: false,
            }
        );
        assert_eq!(
            parse(&["push", "--all"]),
            YouTubeCommands::Push {
                target: None,
                all: true,
            }
        );
    }

    #[test]
    fn test_push_without_target_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = Registry::open(dir.path().join("storage.json"));
        let cli = TestCli::try_parse_from(["youtube", "push"]).unwrap().youtube;
        assert!(cli.execute(&mut registry).is_err());
    }

    #[test]
    fn test_push_requires_setup() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = Registry::open(dir.path().join("storage.json"));
        let cli = TestCli::try_parse_from(["youtube", "push", "tracks"])
            .unwrap()
            .youtube;
        let report = cli.execute(&mut registry).unwrap_err();
        assert!(format!("{:?}", report).contains("not configured"));
    }

    #[test]
    fn test_setup_requires_client_secrets() {
        assert!(TestCli::try_parse_from(["youtube", "setup"]).is_err());
        assert_eq!(
            parse(&["setup", "client_secret.json"]),
            YouTubeCommands::Setup {
                client_secrets: PathBuf::from("client_secret.json"),
            }
        );
    }
}
