use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::query::Fields;

/// Free-form arguments of a playlist, e.g. `{"username": "rj"}` or `{"tag": "rock"}`.
pub type Arguments = BTreeMap<String, Value>;

/// Unix timestamp in seconds, UTC.
pub fn timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum_macros::Display,
    strum_macros::EnumString,
    strum_macros::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Provider {
    Lastfm,
    Youtube,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum_macros::Display,
    strum_macros::EnumString,
    strum_macros::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PlaylistType {
    UserLovedTracks,
    UserTopTracks,
    UserRecentTracks,
    UserFriendsRecentTracks,
    Chart,
    Country,
    Tag,
    Artist,
}

impl PlaylistType {
    /// The playlist types that are built from a single user's history, in prompt order.
    pub fn user_types() -> [PlaylistType; 4] {
        [
            PlaylistType::UserLovedTracks,
            PlaylistType::UserTopTracks,
            PlaylistType::UserRecentTracks,
            PlaylistType::UserFriendsRecentTracks,
        ]
    }
}

/// Credentials of one provider. There is at most one per provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub provider: Provider,
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl Config {
    pub fn new(provider: Provider, data: Map<String, Value>) -> Self {
        Self { provider, data }
    }

    pub fn value(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub artist: String,
    pub name: String,
    #[serde(default)]
    pub duration: Option<u64>,
    #[serde(default)]
    pub youtube_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Playlist {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: PlaylistType,
    pub provider: Provider,
    #[serde(default)]
    pub arguments: Arguments,
    pub limit: u32,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub tracks: Vec<String>,
    #[serde(default)]
    pub youtube_id: Option<String>,
    pub modified: i64,
    #[serde(default)]
    pub synced: Option<i64>,
    #[serde(default)]
    pub uploaded: Option<i64>,
}

/// Input of `TrackManager::set`. `None` fields leave stored values untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackAttrs {
    pub artist: String,
    pub name: String,
    pub duration: Option<u64>,
    pub youtube_id: Option<String>,
}

impl TrackAttrs {
    pub fn new(artist: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            artist: artist.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn duration(mut self, duration: Option<u64>) -> Self {
        self.duration = duration;
        self
    }

    pub fn youtube_id(mut self, youtube_id: impl Into<String>) -> Self {
        self.youtube_id = Some(youtube_id.into());
        self
    }
}

/// Input of `PlaylistManager::set`. The identity fields are always required,
/// the rest only overwrite when present.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaylistAttrs {
    pub kind: PlaylistType,
    pub provider: Provider,
    pub arguments: Arguments,
    pub limit: u32,
    pub title: Option<String>,
    pub tracks: Option<Vec<String>>,
    pub youtube_id: Option<String>,
    pub synced: Option<i64>,
    pub uploaded: Option<i64>,
}

impl PlaylistAttrs {
    pub fn new(kind: PlaylistType, provider: Provider, limit: u32) -> Self {
        Self {
            kind,
            provider,
            arguments: Arguments::new(),
            limit,
            title: None,
            tracks: None,
            youtube_id: None,
            synced: None,
            uploaded: None,
        }
    }

    pub fn argument(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.arguments.insert(key.to_string(), value.into());
        self
    }

    pub fn arguments(mut self, arguments: Arguments) -> Self {
        self.arguments = arguments;
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// Partial update of a stored playlist.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaylistPatch {
    pub title: Option<String>,
    pub tracks: Option<Vec<String>>,
    pub youtube_id: Option<String>,
    pub synced: Option<i64>,
    pub uploaded: Option<i64>,
}

impl Fields for Config {
    fn field(&self, name: &str) -> Value {
        match name {
            "id" | "provider" => json!(self.provider),
            "data" => Value::Object(self.data.clone()),
            _ => Value::Null,
        }
    }
}

impl Fields for Track {
    fn field(&self, name: &str) -> Value {
        match name {
            "id" => json!(self.id),
            "artist" => json!(self.artist),
            "name" => json!(self.name),
            "duration" => json!(self.duration),
            "youtube_id" => json!(self.youtube_id),
            _ => Value::Null,
        }
    }
}

impl Fields for Playlist {
    fn field(&self, name: &str) -> Value {
        match name {
            "id" => json!(self.id),
            "type" => json!(self.kind),
            "provider" => json!(self.provider),
            "arguments" => json!(self.arguments),
            "limit" => json!(self.limit),
            "title" => json!(self.title),
            "tracks" => json!(self.tracks),
            "youtube_id" => json!(self.youtube_id),
            "modified" => json!(self.modified),
            "synced" => json!(self.synced),
            "uploaded" => json!(self.uploaded),
            _ => Value::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_playlist_type_names() {
        assert_eq!(
            PlaylistType::UserFriendsRecentTracks.to_string(),
            "user_friends_recent_tracks"
        );
        assert_eq!(PlaylistType::from_str("chart").unwrap(), PlaylistType::Chart);
        assert_eq!(
            serde_json::to_value(PlaylistType::UserTopTracks).unwrap(),
            json!("user_top_tracks")
        );
    }

    #[test]
    fn test_provider_names() {
        assert_eq!(Provider::Lastfm.to_string(), "lastfm");
        assert_eq!(Provider::from_str("youtube").unwrap(), Provider::Youtube);
    }

    #[test]
    fn test_playlist_fields() {
        let playlist = Playlist {
            id: "abc".to_string(),
            kind: PlaylistType::Tag,
            provider: Provider::Lastfm,
            arguments: Arguments::from([("tag".to_string(), json!("rock"))]),
            limit: 50,
            title: String::new(),
            tracks: vec![],
            youtube_id: None,
            modified: 1,
            synced: None,
            uploaded: None,
        };
        assert_eq!(playlist.field("type"), json!("tag"));
        assert_eq!(playlist.field("youtube_id"), Value::Null);
        assert_eq!(playlist.field("arguments"), json!({"tag": "rock"}));
        assert_eq!(playlist.field("unknown"), Value::Null);
    }
}
