//! Seams to the remote services. The command layer supplies the HTTP clients.

use crate::error::Result;
use crate::models::{Arguments, Playlist, PlaylistType, Track, TrackAttrs};

/// A track as reported by a playlist source.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceTrack {
    pub artist: String,
    pub name: String,
    pub duration: Option<u64>,
}

impl From<SourceTrack> for TrackAttrs {
    fn from(track: SourceTrack) -> Self {
        TrackAttrs::new(track.artist, track.name).duration(track.duration)
    }
}

/// An entry of a remote playlist.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct RemoteItem {
    pub item_id: String,
    pub video_id: String,
}

pub trait TrackSource {
    fn fetch_tracks(
        &self,
        kind: PlaylistType,
        limit: u32,
        arguments: &Arguments,
    ) -> Result<Vec<SourceTrack>>;
}

pub trait VideoPlatform {
    /// Creates the remote playlist and returns its remote id.
    fn create_playlist(&self, playlist: &Playlist) -> Result<String>;
    fn list_items(&self, playlist: &Playlist) -> Result<Vec<RemoteItem>>;
    fn add_item(&self, playlist: &Playlist, video_id: &str) -> Result<()>;
    fn remove_item(&self, item: &RemoteItem) -> Result<()>;
    fn search_video(&self, track: &Track) -> Result<Option<String>>;
}
