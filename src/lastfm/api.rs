use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tuber_core::provider::{SourceTrack, TrackSource};
use tuber_core::{Arguments, Config, CoreError, PlaylistType};

use crate::config::AppConfig;

/// A Last.fm tag with its usage counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    pub count: u64,
    pub reach: u64,
}

pub struct LastFmClient {
    api_key: String,
    http: Client,
}

impl LastFmClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            http: Client::new(),
        }
    }

    pub fn from_config(config: &Config) -> tuber_core::Result<Self> {
        let api_key = config
            .value("api_key")
            .filter(|api_key| !api_key.is_empty())
            .ok_or(CoreError::NotConfigured(config.provider))?;
        Ok(Self::new(api_key))
    }

    /// Canonical name of a Last.fm user.
    pub fn get_user(&self, user: &str) -> tuber_core::Result<String> {
        let response = self
            .call("user.getInfo", &[("user", user.to_string())])
            .map_err(|error| unknown("user", user, error))?;
        name_at(&response, "user").ok_or_else(|| unknown("user", user, missing("user")))
    }

    /// Canonical name of an artist, with Last.fm's autocorrection applied.
    pub fn get_artist(&self, artist: &str) -> tuber_core::Result<String> {
        let response = self
            .call(
                "artist.getInfo",
                &[("artist", artist.to_string()), ("autocorrect", "1".to_string())],
            )
            .map_err(|error| unknown("artist", artist, error))?;
        name_at(&response, "artist").ok_or_else(|| unknown("artist", artist, missing("artist")))
    }

    pub fn get_tags(&self) -> tuber_core::Result<Vec<Tag>> {
        let response = self.call("tag.getTopTags", &[])?;
        Ok(parse_tags(&response))
    }

    fn call(&self, method: &str, params: &[(&str, String)]) -> tuber_core::Result<Value> {
        let mut query = vec![
            ("method", method.to_string()),
            ("api_key", self.api_key.clone()),
            ("format", "json".to_string()),
        ];
        query.extend(params.iter().cloned());
        log::debug!("Last.fm request: {}", method);

        let response: Value = self
            .http
            .get(AppConfig::LASTFM_API_URL)
            .query(&query)
            .send()
            .map_err(remote)?
            .json()
            .map_err(remote)?;

        if let Some(code) = response.get("error") {
            let message = response
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown error");
            return Err(CoreError::RemoteService(format!(
                "Last.fm {} failed ({}): {}",
                method, code, message
            )));
        }
        Ok(response)
    }

    /// Pages through a track listing until `limit` tracks are collected.
    fn paged_tracks(
        &self,
        method: &str,
        container: &str,
        params: &[(&str, String)],
        limit: u32,
    ) -> tuber_core::Result<Vec<SourceTrack>> {
        let page_size = limit.min(AppConfig::LASTFM_PAGE_SIZE);
        let mut tracks = Vec::new();
        let mut page = 1;
        loop {
            let mut query = params.to_vec();
            query.push(("limit", page_size.to_string()));
            query.push(("page", page.to_string()));
            let response = self.call(method, &query)?;
            let batch = parse_tracks(&response, container);
            if batch.is_empty() {
                break;
            }
            tracks.extend(batch);
            if tracks.len() >= limit as usize || page >= total_pages(&response, container) {
                break;
            }
            page += 1;
        }
        tracks.truncate(limit as usize);
        Ok(tracks)
    }

    fn friends_recent_tracks(&self, user: &str, limit: u32) -> tuber_core::Result<Vec<SourceTrack>> {
        let response = self.call(
            "user.getFriends",
            &[("user", user.to_string()), ("limit", limit.to_string())],
        )?;
        let friends = list_at(&response, "friends", "user")
            .into_iter()
            .filter_map(|friend| friend.get("name").and_then(Value::as_str).map(str::to_string))
            .collect::<Vec<_>>();
        if friends.is_empty() {
            return Ok(vec![]);
        }

        let share = (limit as usize).div_ceil(friends.len()).max(1) as u32;
        let mut tracks = Vec::new();
        for friend in friends {
            let recent = self.paged_tracks(
                "user.getRecentTracks",
                "recenttracks",
                &[("user", friend), ("extended", "1".to_string())],
                share,
            )?;
            tracks.extend(recent);
            if tracks.len() >= limit as usize {
                break;
            }
        }
        tracks.truncate(limit as usize);
        Ok(tracks)
    }
}

impl TrackSource for LastFmClient {
    fn fetch_tracks(
        &self,
        kind: PlaylistType,
        limit: u32,
        arguments: &Arguments,
    ) -> tuber_core::Result<Vec<SourceTrack>> {
        let argument = |key: &str| -> tuber_core::Result<String> {
            arguments
                .get(key)
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| {
                    CoreError::Validation(format!("Missing playlist argument: {}", key))
                })
        };

        match kind {
            PlaylistType::UserLovedTracks => self.paged_tracks(
                "user.getLovedTracks",
                "lovedtracks",
                &[("user", argument("username")?)],
                limit,
            ),
            PlaylistType::UserTopTracks => self.paged_tracks(
                "user.getTopTracks",
                "toptracks",
                &[("user", argument("username")?)],
                limit,
            ),
            PlaylistType::UserRecentTracks => self.paged_tracks(
                "user.getRecentTracks",
                "recenttracks",
                &[("user", argument("username")?), ("extended", "1".to_string())],
                limit,
            ),
            PlaylistType::UserFriendsRecentTracks => {
                self.friends_recent_tracks(&argument("username")?, limit)
            }
            PlaylistType::Chart => self.paged_tracks("chart.getTopTracks", "tracks", &[], limit),
            PlaylistType::Country => self.paged_tracks(
                "geo.getTopTracks",
                "tracks",
                &[("country", argument("country")?)],
                limit,
            ),
            PlaylistType::Tag => self.paged_tracks(
                "tag.getTopTracks",
                "tracks",
                &[("tag", argument("tag")?)],
                limit,
            ),
            PlaylistType::Artist => self.paged_tracks(
                "artist.getTopTracks",
                "toptracks",
                &[("artist", argument("artist")?)],
                limit,
            ),
        }
    }
}

fn remote(error: reqwest::Error) -> CoreError {
    CoreError::RemoteService(error.to_string())
}

fn missing(field: &str) -> CoreError {
    CoreError::RemoteService(format!("response has no {}", field))
}

fn unknown(kind: &str, value: &str, error: CoreError) -> CoreError {
    log::debug!("Validating {} {} failed: {}", kind, value, error);
    CoreError::Validation(format!("Unknown {}: {}", kind, value))
}

fn name_at(response: &Value, container: &str) -> Option<String> {
    response
        .get(container)?
        .get("name")?
        .as_str()
        .map(str::to_string)
}

/// Last.fm returns a bare object instead of a one element list for single results.
fn list_at<'a>(response: &'a Value, container: &str, key: &str) -> Vec<&'a Value> {
    match response.get(container).and_then(|value| value.get(key)) {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(item @ Value::Object(_)) => vec![item],
        _ => vec![],
    }
}

/// Counters come back as strings or numbers depending on the method.
fn number(value: Option<&Value>) -> Option<u64> {
    match value? {
        Value::Number(number) => number.as_u64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn total_pages(response: &Value, container: &str) -> u32 {
    number(
        response
            .get(container)
            .and_then(|value| value.get("@attr"))
            .and_then(|attr| attr.get("totalPages")),
    )
    .unwrap_or(1) as u32
}

pub(crate) fn parse_tracks(response: &Value, container: &str) -> Vec<SourceTrack> {
    list_at(response, container, "track")
        .into_iter()
        .filter_map(|track| {
            let name = track.get("name")?.as_str()?.to_string();
            let artist = match track.get("artist")? {
                Value::Object(artist) => artist
                    .get("name")
                    .or_else(|| artist.get("#text"))?
                    .as_str()?
                    .to_string(),
                Value::String(artist) => artist.clone(),
                _ => return None,
            };
            let duration = number(track.get("duration")).filter(|duration| *duration > 0);
            Some(SourceTrack {
                artist,
                name,
                duration,
            })
        })
        .collect()
}

pub(crate) fn parse_tags(response: &Value) -> Vec<Tag> {
    list_at(response, "toptags", "tag")
        .into_iter()
        .filter_map(|tag| {
            Some(Tag {
                name: tag.get("name")?.as_str()?.to_string(),
                count: number(tag.get("count")).unwrap_or(0),
                reach: number(tag.get("reach")).unwrap_or(0),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_parse_top_tracks() {
        let response = json!({
            "toptracks": {
                "track": [
                    {"name": "Believer", "duration": "204", "artist": {"name": "Imagine Dragons"}},
                    {"name": "Thunder", "duration": "0", "artist": {"name": "Imagine Dragons"}}
                ],
                "@attr": {"page": "1", "totalPages": "3"}
            }
        });

        let tracks = parse_tracks(&response, "toptracks");
        assert_eq!(
            tracks,
            vec![
                SourceTrack {
                    artist: "Imagine Dragons".to_string(),
                    name: "Believer".to_string(),
                    duration: Some(204),
                },
                SourceTrack {
                    artist: "Imagine Dragons".to_string(),
                    name: "Thunder".to_string(),
                    duration: None,
                },
            ]
        );
        assert_eq!(total_pages(&response, "toptracks"), 3);
    }

    #[test]
    fn test_parse_single_recent_track() {
        let response = json!({
            "recenttracks": {
                "track": {"name": "Roads", "artist": {"#text": "Portishead"}}
            }
        });

        let tracks = parse_tracks(&response, "recenttracks");
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].artist, "Portishead");
        assert_eq!(total_pages(&response, "recenttracks"), 1);
    }

    #[test]
    fn test_parse_tracks_skips_malformed_entries() {
        let response = json!({"tracks": {"track": [{"name": "No artist"}, 42]}});
        assert!(parse_tracks(&response, "tracks").is_empty());
        assert!(parse_tracks(&json!({}), "tracks").is_empty());
    }

    #[test]
    fn test_parse_tags() {
        let response = json!({
            "toptags": {
                "tag": [
                    {"name": "rock", "count": 1, "reach": "2"},
                    {"name": "rap", "count": "2", "reach": 4}
                ]
            }
        });
        assert_eq!(
            parse_tags(&response),
            vec![
                Tag { name: "rock".to_string(), count: 1, reach: 2 },
                Tag { name: "rap".to_string(), count: 2, reach: 4 },
            ]
        );
    }

    #[test]
    fn test_from_config_requires_api_key() {
        let config = Config::new(tuber_core::Provider::Lastfm, Default::default());
        assert!(matches!(
            LastFmClient::from_config(&config),
            Err(CoreError::NotConfigured(_))
        ));
    }
}
