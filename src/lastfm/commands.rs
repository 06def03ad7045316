use clap::{Args, Subcommand};
use colored::Colorize;
use error_stack::{IntoReport, Report, ResultExt};
use inflector::Inflector;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use tuber_core::sync::sync_all;
use tuber_core::{Config, PlaylistAttrs, PlaylistType, Provider, Query, Registry};

use crate::config::AppConfig;
use crate::dialoguer::Dialoguer;
use crate::lastfm::api::LastFmClient;
use crate::lastfm::api::Tag;
use crate::lastfm::params::{parse_country, validate_limit};
use crate::lastfm::tags::{cached_tags, find_tag};
use crate::lastfm::{LastFmError, LastFmResult};
use crate::table::{playlists_table, tags_table, tracks_table};
use crate::Suggestion;

#[derive(Args, Debug, Clone, PartialEq)]
pub struct LastFmCli {
    #[command(subcommand)]
    command: LastFmCommands,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
enum LastFmCommands {
    /// Configure your Last.fm api account
    Setup {
        /// Your Last.fm api key
        #[clap(long)]
        api_key: Option<String>,
    },
    /// Create a playlist
    #[command(subcommand)]
    Add(AddCommands),
    /// List all playlists or the tracks of a playlist
    List { id: Option<String> },
    /// Remove one or more playlists by id
    Remove {
        #[clap(required = true)]
        ids: Vec<String>,
        /// Skip the confirmation prompt
        #[clap(long, short)]
        yes: bool,
    },
    /// Sync one or more playlists by id, leave empty to sync all
    Sync { ids: Vec<String> },
    /// List all available tags
    Tags {
        /// Fetch the tags again instead of using the stored ones
        #[clap(long)]
        refresh: bool,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
enum AddCommands {
    /// Playlists based on a user's music preference and history
    ///
    /// Playlist types:
    /// 1. User loved tracks
    /// 2. User top tracks
    /// 3. User recent tracks
    /// 4. User friends recent tracks
    User {
        /// The user for whom the playlist will be generated
        #[clap(long)]
        user: Option<String>,
        /// The playlist type number
        #[clap(long, value_parser = clap::value_parser!(u8).range(1..=4))]
        playlist_type: Option<u8>,
        #[command(flatten)]
        options: PlaylistOptions,
    },
    /// Top tracks chart
    Chart {
        #[command(flatten)]
        options: PlaylistOptions,
    },
    /// Top tracks by country
    Country {
        /// An alpha-2 ISO-3166 country code
        #[clap(long)]
        country: Option<String>,
        #[command(flatten)]
        options: PlaylistOptions,
    },
    /// Top tracks by tag
    Tag {
        /// A Last.fm tag, see the tags command
        #[clap(long)]
        tag: Option<String>,
        #[command(flatten)]
        options: PlaylistOptions,
    },
    /// Top tracks of an artist
    Artist {
        /// An artist name
        #[clap(long)]
        artist: Option<String>,
        #[command(flatten)]
        options: PlaylistOptions,
    },
}

#[derive(Args, Debug, Clone, PartialEq)]
struct PlaylistOptions {
    /// The maximum number of tracks
    #[clap(long, value_parser = clap::value_parser!(u32).range(50..=1000))]
    limit: Option<u32>,
    /// Custom title
    #[clap(long)]
    title: Option<String>,
}

impl LastFmCli {
    pub fn execute(&self, registry: &mut Registry) -> LastFmResult<()> {
        match &self.command {
            LastFmCommands::Setup { api_key } => Self::setup(registry, api_key.clone()),
            LastFmCommands::Add(add) => Self::add(registry, add),
            LastFmCommands::List { id } => Self::list(registry, id.as_deref()),
            LastFmCommands::Remove { ids, yes } => Self::remove(registry, ids, *yes),
            LastFmCommands::Sync { ids } => Self::sync(registry, ids),
            LastFmCommands::Tags { refresh } => Self::tags(registry, *refresh),
        }
    }

    fn setup(registry: &mut Registry, api_key: Option<String>) -> LastFmResult<()> {
        let existing = registry
            .config()
            .find(Provider::Lastfm)
            .into_report()
            .change_context(LastFmError)?;
        if existing.is_some() {
            Dialoguer::confirm_or_abort("Overwrite existing configuration?".to_string())
                .change_context(LastFmError)?;
        }
        let api_key = match api_key {
            Some(api_key) => api_key,
            None => Dialoguer::input("Last.fm Api Key".to_string()).change_context(LastFmError)?,
        };

        let mut data = serde_json::Map::new();
        data.insert("api_key".to_string(), json!(api_key.trim()));
        registry
            .config()
            .set(Config::new(Provider::Lastfm, data))
            .into_report()
            .change_context(LastFmError)?;
        println!("Last.fm configuration updated!");
        Ok(())
    }

    fn add(registry: &mut Registry, add: &AddCommands) -> LastFmResult<()> {
        let attrs = match add {
            AddCommands::User {
                user,
                playlist_type,
                options,
            } => {
                let client = Self::client(registry)?;
                let user = Self::prompt_user(registry, &client, user.clone())?;
                let kind = Self::prompt_user_playlist_type(*playlist_type)?;
                let limit = Self::prompt_limit(registry, options.limit)?;
                let title = Self::prompt_title(options.title.clone())?;
                registry
                    .history()
                    .set_all([("user", json!(user)), ("limit", json!(limit))])
                    .into_report()
                    .change_context(LastFmError)?;
                PlaylistAttrs::new(kind, Provider::Lastfm, limit)
                    .argument("username", user)
                    .title(title)
            }
            AddCommands::Chart { options } => {
                let limit = Self::prompt_limit(registry, options.limit)?;
                let title = Self::prompt_title(options.title.clone())?;
                Self::remember_limit(registry, limit)?;
                PlaylistAttrs::new(PlaylistType::Chart, Provider::Lastfm, limit).title(title)
            }
            AddCommands::Country { country, options } => {
                let country = match country {
                    Some(country) => country.clone(),
                    None => Dialoguer::input("Country Code".to_string())
                        .change_context(LastFmError)?,
                };
                let country = parse_country(&country)
                    .into_report()
                    .change_context(LastFmError)?;
                let limit = Self::prompt_limit(registry, options.limit)?;
                let title = Self::prompt_title(options.title.clone())?;
                Self::remember_limit(registry, limit)?;
                PlaylistAttrs::new(PlaylistType::Country, Provider::Lastfm, limit)
                    .argument("country", country)
                    .title(title)
            }
            AddCommands::Tag { tag, options } => {
                let tag = match tag {
                    Some(tag) => tag.clone(),
                    None => Dialoguer::input("Tag".to_string()).change_context(LastFmError)?,
                };
                let tags = Self::known_tags(registry, false)?;
                let tag = find_tag(&tags, &tag)
                    .into_report()
                    .change_context(LastFmError)
                    .attach(Suggestion::new("run `tuber lastfm tags` to see the known tags"))?;
                let limit = Self::prompt_limit(registry, options.limit)?;
                let title = Self::prompt_title(options.title.clone())?;
                Self::remember_limit(registry, limit)?;
                PlaylistAttrs::new(PlaylistType::Tag, Provider::Lastfm, limit)
                    .argument("tag", tag)
                    .title(title)
            }
            AddCommands::Artist { artist, options } => {
                let client = Self::client(registry)?;
                let artist = match artist {
                    Some(artist) => artist.clone(),
                    None => Dialoguer::input("Artist".to_string()).change_context(LastFmError)?,
                };
                let artist = client
                    .get_artist(&artist)
                    .into_report()
                    .change_context(LastFmError)?;
                let limit = Self::prompt_limit(registry, options.limit)?;
                let title = Self::prompt_title(options.title.clone())?;
                Self::remember_limit(registry, limit)?;
                PlaylistAttrs::new(PlaylistType::Artist, Provider::Lastfm, limit)
                    .argument("artist", artist)
                    .title(title)
            }
        };

        let playlist = registry
            .playlists()
            .set(attrs)
            .into_report()
            .change_context(LastFmError)?;
        println!("{} playlist: {}!", playlist.verb(), playlist.record().id.green());
        Ok(())
    }

    fn list(registry: &mut Registry, id: Option<&str>) -> LastFmResult<()> {
        match id {
            Some(id) => {
                let playlist = registry
                    .playlists()
                    .get(id)
                    .into_report()
                    .change_context(LastFmError)?;
                let mut tracks = Vec::with_capacity(playlist.tracks.len());
                for track_id in &playlist.tracks {
                    tracks.push(
                        registry
                            .tracks()
                            .get(track_id)
                            .into_report()
                            .change_context(LastFmError)?,
                    );
                }
                println!("{}", tracks_table(&tracks));
            }
            None => {
                let playlists = Self::lastfm_playlists(registry)?;
                println!("{}", playlists_table(&playlists));
            }
        }
        Ok(())
    }

    fn remove(registry: &mut Registry, ids: &[String], yes: bool) -> LastFmResult<()> {
        if !yes {
            Dialoguer::confirm_or_abort("Do you want to continue?".to_string())
                .change_context(LastFmError)?;
        }
        for id in ids {
            registry
                .playlists()
                .remove(id)
                .into_report()
                .change_context(LastFmError)?;
            println!("Removed playlist: {}!", id.green());
        }
        Ok(())
    }

    fn sync(registry: &mut Registry, ids: &[String]) -> LastFmResult<()> {
        let client = Self::client(registry)?;
        let mut playlists = Self::lastfm_playlists(registry)?;
        if !ids.is_empty() {
            playlists.retain(|playlist| ids.contains(&playlist.id));
        }

        let pb = ProgressBar::new(playlists.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{msg} [{wide_bar:.white/blue}] {pos}/{len}")
                .into_report()
                .change_context(LastFmError)?,
        );
        pb.set_message("Syncing playlists");
        let report = sync_all(registry, &client, &playlists, |playlist, result| {
            if let Err(error) = result {
                pb.println(format!("{} {}: {}", "Failed".red(), playlist.id, error));
            }
            pb.inc(1);
        });
        pb.finish();
        report
            .ensure_success("playlists")
            .into_report()
            .change_context(LastFmError)
    }

    fn tags(registry: &mut Registry, refresh: bool) -> LastFmResult<()> {
        let tags = Self::known_tags(registry, refresh)?
            .into_iter()
            .map(|tag| (tag.name, tag.count, tag.reach))
            .collect::<Vec<_>>();
        println!("{}", tags_table(&tags));
        Ok(())
    }

    fn known_tags(registry: &mut Registry, refresh: bool) -> LastFmResult<Vec<Tag>> {
        let config = registry
            .config()
            .get(Provider::Lastfm)
            .into_report()
            .change_context(LastFmError)
            .attach(Suggestion::new("run `tuber lastfm setup` first"))?;
        cached_tags(registry, refresh, || {
            LastFmClient::from_config(&config)?.get_tags()
        })
        .into_report()
        .change_context(LastFmError)
    }

    fn client(registry: &mut Registry) -> LastFmResult<LastFmClient> {
        let config = registry
            .config()
            .get(Provider::Lastfm)
            .into_report()
            .change_context(LastFmError)
            .attach(Suggestion::new("run `tuber lastfm setup` first"))?;
        LastFmClient::from_config(&config)
            .into_report()
            .change_context(LastFmError)
    }

    fn lastfm_playlists(registry: &mut Registry) -> LastFmResult<Vec<tuber_core::Playlist>> {
        registry
            .playlists()
            .find(&Query::new().eq("provider", Provider::Lastfm))
            .into_report()
            .change_context(LastFmError)
    }

    fn prompt_user(
        registry: &mut Registry,
        client: &LastFmClient,
        user: Option<String>,
    ) -> LastFmResult<String> {
        let user = match user {
            Some(user) => user,
            None => {
                let last_user = registry
                    .history()
                    .get::<Option<String>>("user", None)
                    .into_report()
                    .change_context(LastFmError)?;
                Dialoguer::input_with_default(
                    "Last.fm username".to_string(),
                    last_user,
                    |user: &String| {
                        if user.trim().is_empty() {
                            Err("The username can't be empty".to_string())
                        } else {
                            Ok(())
                        }
                    },
                )
                .change_context(LastFmError)?
            }
        };
        client
            .get_user(user.trim())
            .into_report()
            .change_context(LastFmError)
    }

    fn prompt_user_playlist_type(choice: Option<u8>) -> LastFmResult<PlaylistType> {
        let user_types = PlaylistType::user_types();
        let index = match choice {
            Some(choice) => usize::from(choice.saturating_sub(1)),
            None => {
                let options = user_types
                    .iter()
                    .map(|kind| kind.to_string().to_sentence_case())
                    .collect::<Vec<_>>();
                Dialoguer::select("Playlist type".to_string(), options, None)
                    .change_context(LastFmError)?
            }
        };
        user_types.get(index).copied().ok_or_else(|| {
            Report::new(LastFmError).attach_printable(format!("Unknown playlist type: {}", index + 1))
        })
    }

    fn prompt_limit(registry: &mut Registry, limit: Option<u32>) -> LastFmResult<u32> {
        if let Some(limit) = limit {
            return Ok(limit);
        }
        let last_limit = registry
            .history()
            .get("limit", AppConfig::MIN_PLAYLIST_LIMIT)
            .into_report()
            .change_context(LastFmError)?;
        Dialoguer::input_with_default("Maximum tracks".to_string(), Some(last_limit), validate_limit)
            .change_context(LastFmError)
    }

    fn prompt_title(title: Option<String>) -> LastFmResult<String> {
        let title = match title {
            Some(title) => title,
            None => {
                Dialoguer::optional_input("Optional Title".to_string()).change_context(LastFmError)?
            }
        };
        Ok(title.trim().to_string())
    }

    fn remember_limit(registry: &mut Registry, limit: u32) -> LastFmResult<()> {
        registry
            .history()
            .set("limit", limit)
            .into_report()
            .change_context(LastFmError)
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(Parser, Debug)]
    struct TestCli {
        #[command(flatten)]
        lastfm: LastFmCli,
    }

    fn parse(args: &[&str]) -> LastFmCommands {
        let args = std::iter::once("lastfm").chain(args.iter().copied());
        TestCli::try_parse_from(args).unwrap().lastfm.command
    }

    #[test]
    fn test_parse_add_user() {
        assert_eq!(
            parse(&["add", "user", "--user", "rj", "--playlist-type", "2", "--limit", "100"]),
            LastFmCommands::Add(AddCommands::User {
                user: Some("rj".to_string()),
                playlist_type: Some(2),
                options: PlaylistOptions {
                    limit: Some(100),
                    title: None,
                },
            })
        );
    }

    #[test]
    fn test_limit_out_of_range_is_rejected() {
        let args = ["lastfm", "add", "chart", "--limit", "10"];
        assert!(TestCli::try_parse_from(args).is_err());
        let args = ["lastfm", "add", "chart", "--limit", "1001"];
        assert!(TestCli::try_parse_from(args).is_err());
    }

    #[test]
    fn test_remove_requires_ids() {
        assert!(TestCli::try_parse_from(["lastfm", "remove"]).is_err());
        assert_eq!(
            parse(&["remove", "a", "b", "--yes"]),
            LastFmCommands::Remove {
                ids: vec!["a".to_string(), "b".to_string()],
                yes: true,
            }
        );
    }

    #[test]
    fn test_sync_defaults_to_all() {
        assert_eq!(parse(&["sync"]), LastFmCommands::Sync { ids: vec![] });
    }

    #[test]
    fn test_parse_tags_refresh() {
        assert_eq!(parse(&["tags"]), LastFmCommands::Tags { refresh: false });
        assert_eq!(
            parse(&["tags", "--refresh"]),
            LastFmCommands::Tags { refresh: true }
        );
    }

    #[test]
    fn test_tags_are_served_from_the_registry() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = Registry::open(dir.path().join("storage.json"));
        let mut data = serde_json::Map::new();
        data.insert("api_key".to_string(), json!("key"));
        registry
            .config()
            .set(Config::new(Provider::Lastfm, data))
            .unwrap();
        let stored = vec![Tag {
            name: "rock".to_string(),
            count: 1,
            reach: 2,
        }];
        registry.history().set("lastfm_tags", &stored).unwrap();

        assert_eq!(LastFmCli::known_tags(&mut registry, false).unwrap(), stored);
    }

    #[test]
    fn test_tags_require_setup() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = Registry::open(dir.path().join("storage.json"));
        assert!(LastFmCli::known_tags(&mut registry, false).is_err());
    }

    #[test]
    fn test_user_playlist_type_choice() {
        assert_eq!(
            LastFmCli::prompt_user_playlist_type(Some(1)).unwrap(),
            PlaylistType::UserLovedTracks
        );
        assert_eq!(
            LastFmCli::prompt_user_playlist_type(Some(4)).unwrap(),
            PlaylistType::UserFriendsRecentTracks
        );
    }

    #[test]
    fn test_prompt_title_is_trimmed() {
        assert_eq!(
            LastFmCli::prompt_title(Some("  Summer  ".to_string())).unwrap(),
            "Summer"
        );
    }
}
