use reqwest::blocking::{Client, RequestBuilder};
use serde_json::{json, Value};
use tuber_core::provider::{RemoteItem, VideoPlatform};
use tuber_core::{Config, CoreError, Playlist, Track};

use crate::config::AppConfig;
use crate::table::{playlist_arguments, playlist_title};
use crate::youtube::auth::Credentials;

const PAGE_SIZE: u32 = 50;

pub struct YouTubeClient {
    access_token: String,
    http: Client,
}

impl YouTubeClient {
    pub fn from_config(config: &Config) -> tuber_core::Result<Self> {
        let credentials = Credentials::from_config(config)?;
        Ok(Self {
            access_token: credentials.access_token()?,
            http: Client::new(),
        })
    }

    fn url(resource: &str) -> String {
        format!("{}/{}", AppConfig::YOUTUBE_API_URL, resource)
    }

    fn send(&self, request: RequestBuilder, action: &str) -> tuber_core::Result<Value> {
        let response = request
            .bearer_auth(&self.access_token)
            .send()
            .map_err(|error| CoreError::RemoteService(error.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .map_err(|error| CoreError::RemoteService(error.to_string()))?;
        if !status.is_success() {
            return Err(CoreError::RemoteService(format!(
                "YouTube {} failed ({}): {}",
                action,
                status,
                error_message(&body)
            )));
        }
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body)?)
    }

    fn remote_id(playlist: &Playlist) -> tuber_core::Result<&str> {
        playlist.youtube_id.as_deref().ok_or_else(|| {
            CoreError::Validation(format!("Playlist {} has not been pushed yet", playlist.id))
        })
    }
}

impl VideoPlatform for YouTubeClient {
    fn create_playlist(&self, playlist: &Playlist) -> tuber_core::Result<String> {
        let request = self
            .http
            .post(Self::url("playlists"))
            .query(&[("part", "snippet,status")])
            .json(&playlist_body(playlist));
        let response = self.send(request, "playlist insert")?;
        response
            .get("id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| CoreError::RemoteService("created playlist has no id".to_string()))
    }

    fn list_items(&self, playlist: &Playlist) -> tuber_core::Result<Vec<RemoteItem>> {
        let remote_id = Self::remote_id(playlist)?;
        let mut items = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut query = vec![
                ("part", "contentDetails".to_string()),
                ("playlistId", remote_id.to_string()),
                ("maxResults", PAGE_SIZE.to_string()),
            ];
            if let Some(token) = page_token.take() {
                query.push(("pageToken", token));
            }
            let request = self.http.get(Self::url("playlistItems")).query(&query);
            let response = self.send(request, "playlist items list")?;
            let (batch, next) = parse_playlist_items(&response);
            items.extend(batch);
            match next {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }
        Ok(items)
    }

    fn add_item(&self, playlist: &Playlist, video_id: &str) -> tuber_core::Result<()> {
        let body = json!({
            "snippet": {
                "playlistId": Self::remote_id(playlist)?,
                "resourceId": {"kind": "youtube#video", "videoId": video_id}
            }
        });
        let request = self
            .http
            .post(Self::url("playlistItems"))
            .query(&[("part", "snippet")])
            .json(&body);
        self.send(request, "playlist item insert")?;
        Ok(())
    }

    fn remove_item(&self, item: &RemoteItem) -> tuber_core::Result<()> {
        let request = self
            .http
            .delete(Self::url("playlistItems"))
            .query(&[("id", item.item_id.as_str())]);
        self.send(request, "playlist item delete")?;
        Ok(())
    }

    fn search_video(&self, track: &Track) -> tuber_core::Result<Option<String>> {
        let q = format!("{} {}", track.artist, track.name);
        let request = self.http.get(Self::url("search")).query(&[
            ("part", "snippet"),
            ("type", "video"),
            ("maxResults", "1"),
            ("q", q.as_str()),
        ]);
        let response = self.send(request, "search")?;
        Ok(parse_search(&response))
    }
}

pub(crate) fn playlist_body(playlist: &Playlist) -> Value {
    json!({
        "snippet": {
            "title": playlist_title(playlist),
            "description": playlist_arguments(playlist),
        },
        "status": {"privacyStatus": "private"}
    })
}

pub(crate) fn parse_playlist_items(response: &Value) -> (Vec<RemoteItem>, Option<String>) {
    let items = response
        .get("items")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| {
                    Some(RemoteItem {
                        item_id: item.get("id")?.as_str()?.to_string(),
                        video_id: item
                            .get("contentDetails")?
                            .get("videoId")?
                            .as_str()?
                            .to_string(),
                    })
                })
                .collect()
        })
        .unwrap_or_default();
    let next = response
        .get("nextPageToken")
        .and_then(Value::as_str)
        .map(str::to_string);
    (items, next)
}

pub(crate) fn parse_search(response: &Value) -> Option<String> {
    response
        .get("items")?
        .as_array()?
        .iter()
        .find_map(|item| item.get("id")?.get("videoId")?.as_str())
        .map(str::to_string)
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("error")?
                .get("message")?
                .as_str()
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.to_string())
}

#[cfg(test)]
mod tests {
    use tuber_core::{Arguments, PlaylistType, Provider};

    use super::*;

    #[test]
    fn test_parse_playlist_items() {
        let response = json!({
            "nextPageToken": "CAUQAA",
            "items": [
                {"id": "item-1", "contentDetails": {"videoId": "v1"}},
                {"id": "item-2", "contentDetails": {"videoId": "v2"}},
                {"id": "item-3"}
            ]
        });
        let (items, next) = parse_playlist_items(&response);
        assert_eq!(
            items,
            vec![
                RemoteItem {
                    item_id: "item-1".to_string(),
                    video_id: "v1".to_string(),
                },
                RemoteItem {
                    item_id: "item-2".to_string(),
                    video_id: "v2".to_string(),
                },
            ]
        );
        assert_eq!(next, Some("CAUQAA".to_string()));

        let (items, next) = parse_playlist_items(&json!({"items": []}));
        assert!(items.is_empty());
        assert_eq!(next, None);
    }

    #[test]
    fn test_parse_search() {
        let response = json!({
            "items": [{"id": {"kind": "youtube#video", "videoId": "dQw4w9WgXcQ"}}]
        });
        assert_eq!(parse_search(&response), Some("dQw4w9WgXcQ".to_string()));
        assert_eq!(parse_search(&json!({"items": []})), None);
    }

    #[test]
    fn test_playlist_body() {
        let playlist = Playlist {
            id: "abc1234".to_string(),
            kind: PlaylistType::Tag,
            provider: Provider::Lastfm,
            arguments: Arguments::from([("tag".to_string(), json!("rock"))]),
            limit: 50,
            title: String::new(),
            tracks: vec![],
            youtube_id: None,
            modified: 0,
            synced: None,
            uploaded: None,
        };
        let body = playlist_body(&playlist);
        assert_eq!(body["snippet"]["title"], "Tag");
        assert_eq!(body["snippet"]["description"], "tag: rock");
        assert_eq!(body["status"]["privacyStatus"], "private");
    }

    #[test]
    fn test_error_message() {
        let body = r#"{"error": {"code": 403, "message": "quotaExceeded"}}"#;
        assert_eq!(error_message(body), "quotaExceeded");
        assert_eq!(error_message("Bad Gateway"), "Bad Gateway");
    }
}
