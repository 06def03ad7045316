use chrono::{TimeZone, Utc};
use comfy_table::presets::NOTHING;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table};
use inflector::Inflector;
use serde_json::Value;
use tuber_core::{Playlist, Track};

/// The custom title, or the title-cased type when none was given.
pub fn playlist_title(playlist: &Playlist) -> String {
    if playlist.title.trim().is_empty() {
        playlist.kind.to_string().to_title_case()
    } else {
        playlist.title.clone()
    }
}

pub fn playlist_arguments(playlist: &Playlist) -> String {
    playlist
        .arguments
        .iter()
        .map(|(key, value)| match value {
            Value::String(value) => format!("{}: {}", key, value),
            other => format!("{}: {}", key, other),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn format_date(timestamp: Option<i64>) -> String {
    timestamp
        .and_then(|timestamp| Utc.timestamp_opt(timestamp, 0).single())
        .map(|date| date.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

pub fn format_duration(seconds: Option<u64>) -> String {
    match seconds {
        Some(seconds) if seconds > 0 => format!(
            "{}:{:02}:{:02}",
            seconds / 3600,
            (seconds % 3600) / 60,
            seconds % 60
        ),
        _ => "-".to_string(),
    }
}

fn new_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(NOTHING)
        .set_content_arrangement(ContentArrangement::Disabled)
        .set_header(headers.iter().map(|header| Cell::new(*header)));
    table
}

fn right(value: impl ToString) -> Cell {
    Cell::new(value).set_alignment(CellAlignment::Right)
}

pub fn playlists_table(playlists: &[Playlist]) -> Table {
    let mut table = new_table(&[
        "ID",
        "YoutubeID",
        "Title",
        "Arguments",
        "Limit",
        "Modified",
        "Synced",
        "Uploaded",
    ]);
    for playlist in playlists {
        table.add_row(vec![
            Cell::new(&playlist.id),
            Cell::new(playlist.youtube_id.clone().unwrap_or_default()),
            Cell::new(playlist_title(playlist)),
            Cell::new(playlist_arguments(playlist)),
            right(playlist.limit),
            Cell::new(format_date(Some(playlist.modified))),
            Cell::new(format_date(playlist.synced)),
            Cell::new(format_date(playlist.uploaded)),
        ]);
    }
    table
}

pub fn tracks_table(tracks: &[Track]) -> Table {
    let mut table = new_table(&["No", "Artist", "Track Name", "Duration", "YoutubeID"]);
    for (index, track) in tracks.iter().enumerate() {
        table.add_row(vec![
            right(index),
            Cell::new(&track.artist),
            Cell::new(&track.name),
            Cell::new(format_duration(track.duration)),
            Cell::new(track.youtube_id.clone().unwrap_or_default()),
        ]);
    }
    table
}

/// Rows of `(name, count, reach)`.
pub fn tags_table(tags: &[(String, u64, u64)]) -> Table {
    let mut table = new_table(&["No", "Name", "Count", "Reach"]);
    for (index, (name, count, reach)) in tags.iter().enumerate() {
        table.add_row(vec![right(index), Cell::new(name), right(count), right(reach)]);
    }
    table
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tuber_core::{Arguments, PlaylistType, Provider};

    use super::*;

    fn playlist(kind: PlaylistType, title: &str) -> Playlist {
        Playlist {
            id: "1ffdbf3".to_string(),
            kind,
            provider: Provider::Lastfm,
            arguments: Arguments::from([
                ("b".to_string(), json!(1)),
                ("c".to_string(), json!("rock")),
            ]),
            limit: 15,
            title: title.to_string(),
            tracks: vec![],
            youtube_id: None,
            modified: 1546727185,
            synced: Some(1546727285),
            uploaded: None,
        }
    }

    #[test]
    fn test_playlist_title() {
        assert_eq!(
            playlist_title(&playlist(PlaylistType::UserTopTracks, "")),
            "User Top Tracks"
        );
        assert_eq!(playlist_title(&playlist(PlaylistType::Chart, "Mine")), "Mine");
    }

    #[test]
    fn test_playlist_arguments() {
        assert_eq!(
            playlist_arguments(&playlist(PlaylistType::Tag, "")),
            "b: 1, c: rock"
        );
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date(Some(1546727685)), "2019-01-05 22:34");
        assert_eq!(format_date(None), "-");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Some(120)), "0:02:00");
        assert_eq!(format_duration(Some(1844)), "0:30:44");
        assert_eq!(format_duration(Some(0)), "-");
        assert_eq!(format_duration(None), "-");
    }

    #[test]
    fn test_playlists_table_rows() {
        let rendered = playlists_table(&[playlist(PlaylistType::Chart, "")]).to_string();
        assert!(rendered.contains("YoutubeID"));
        assert!(rendered.contains("1ffdbf3"));
        assert!(rendered.contains("Chart"));
        assert!(rendered.contains("2019-01-05 22:28"));
    }

    #[test]
    fn test_tracks_table_rows() {
        let tracks = vec![Track {
            id: "a".to_string(),
            artist: "life".to_string(),
            name: "thug".to_string(),
            duration: Some(1844),
            youtube_id: Some("v1".to_string()),
        }];
        let rendered = tracks_table(&tracks).to_string();
        assert!(rendered.contains("Track Name"));
        assert!(rendered.contains("0:30:44"));
        assert!(rendered.contains("v1"));
    }
}
