use crate::error::{CoreError, Result};
use crate::identity::playlist_id;
use crate::managers::Upserted;
use crate::models::{timestamp, Playlist, PlaylistAttrs, PlaylistPatch, Track};
use crate::query::Query;
use crate::storage::Registry;

pub struct PlaylistManager<'a> {
    registry: &'a mut Registry,
}

impl<'a> PlaylistManager<'a> {
    pub fn new(registry: &'a mut Registry) -> Self {
        Self { registry }
    }

    /// Inserts the playlist or updates the stored one with the same identity.
    ///
    /// Identity is `(type, provider, arguments, limit)`; the title is not part
    /// of it, so re-adding with a new title renames the existing playlist.
    /// Tracks, remote id and sync stamps are only touched when supplied.
    pub fn set(&mut self, attrs: PlaylistAttrs) -> Result<Upserted<Playlist>> {
        self.check_tracks(attrs.tracks.as_deref())?;
        let id = playlist_id(attrs.kind, attrs.provider, &attrs.arguments, attrs.limit);
        let upserted = match self.registry.get::<Playlist>(&id) {
            Ok(existing) => {
                let patch = PlaylistPatch {
                    title: attrs.title,
                    tracks: attrs.tracks,
                    youtube_id: attrs.youtube_id,
                    synced: attrs.synced,
                    uploaded: attrs.uploaded,
                };
                log::info!("Updating playlist {}", id);
                Upserted::Updated(apply(existing, patch))
            }
            Err(error) if error.is_not_found() => {
                log::info!("Adding playlist {}", id);
                Upserted::Added(Playlist {
                    id,
                    kind: attrs.kind,
                    provider: attrs.provider,
                    arguments: attrs.arguments,
                    limit: attrs.limit,
                    title: attrs.title.unwrap_or_default(),
                    tracks: attrs.tracks.unwrap_or_default(),
                    youtube_id: attrs.youtube_id,
                    modified: timestamp(),
                    synced: attrs.synced,
                    uploaded: attrs.uploaded,
                })
            }
            Err(error) => return Err(error),
        };
        self.registry.set(upserted.record().clone())?;
        Ok(upserted)
    }

    /// Every id in `patch.tracks` must already be a stored track.
    pub fn update(&mut self, playlist: &Playlist, patch: PlaylistPatch) -> Result<Playlist> {
        self.check_tracks(patch.tracks.as_deref())?;
        let updated = apply(playlist.clone(), patch);
        self.registry.set(updated.clone())?;
        log::debug!("Updated playlist {}", updated.id);
        Ok(updated)
    }

    pub fn get(&mut self, id: &str) -> Result<Playlist> {
        self.registry.get(id)
    }

    pub fn find(&mut self, query: &Query) -> Result<Vec<Playlist>> {
        self.registry.find(query)
    }

    fn check_tracks(&mut self, tracks: Option<&[String]>) -> Result<()> {
        for id in tracks.unwrap_or_default() {
            if let Err(error) = self.registry.get::<Track>(id) {
                return Err(match error {
                    CoreError::NotFound { .. } => {
                        CoreError::Validation(format!("Unknown track in playlist: {}", id))
                    }
                    other => other,
                });
            }
        }
        Ok(())
    }

    pub fn remove(&mut self, id: &str) -> Result<Playlist> {
        let playlist = self.registry.remove::<Playlist>(id)?;
        log::info!("Removed playlist {}", id);
        Ok(playlist)
    }
}

fn apply(mut playlist: Playlist, patch: PlaylistPatch) -> Playlist {
    if let Some(title) = patch.title {
        playlist.title = title;
    }
    if let Some(tracks) = patch.tracks {
        playlist.tracks = tracks;
    }
    if patch.youtube_id.is_some() {
        playlist.youtube_id = patch.youtube_id;
    }
    if patch.synced.is_some() {
        playlist.synced = patch.synced;
    }
    if patch.uploaded.is_some() {
        playlist.uploaded = patch.uploaded;
    }
    playlist.modified = timestamp();
    playlist
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::models::{PlaylistType, Provider, TrackAttrs};

    fn registry(dir: &TempDir) -> Registry {
        Registry::open(dir.path().join("storage.json"))
    }

    fn chart(title: &str) -> PlaylistAttrs {
        PlaylistAttrs::new(PlaylistType::Chart, Provider::Lastfm, 50).title(title)
    }

    #[test]
    fn test_add_then_update_same_identity() {
        let dir = TempDir::new().unwrap();
        let mut registry = registry(&dir);

        let added = registry.playlists().set(chart("X")).unwrap();
        assert!(!added.is_update());
        assert_eq!(added.verb(), "Added");
        assert_eq!(added.record().synced, None);
        assert_eq!(added.record().title, "X");

        let updated = registry.playlists().set(chart("Y")).unwrap();
        assert!(updated.is_update());
        assert_eq!(updated.verb(), "Updated");
        assert_eq!(updated.record().id, added.record().id);
        assert_eq!(updated.record().title, "Y");
        assert!(updated.record().modified >= added.record().modified);

        assert_eq!(registry.playlists().find(&Query::new()).unwrap().len(), 1);
    }

    #[test]
    fn test_different_limit_is_a_different_playlist() {
        let dir = TempDir::new().unwrap();
        let mut registry = registry(&dir);

        let first = registry.playlists().set(chart("X")).unwrap().into_record();
        let second = registry
            .playlists()
            .set(PlaylistAttrs::new(PlaylistType::Chart, Provider::Lastfm, 100))
            .unwrap();

        assert!(!second.is_update());
        assert_ne!(first.id, second.record().id);
    }

    #[test]
    fn test_update_keeps_sync_state() {
        let dir = TempDir::new().unwrap();
        let mut registry = registry(&dir);

        let track = registry.tracks().set(TrackAttrs::new("a", "b")).unwrap();
        let playlist = registry.playlists().set(chart("X")).unwrap().into_record();
        let synced = registry
            .playlists()
            .update(
                &playlist,
                PlaylistPatch {
                    tracks: Some(vec![track.id.clone()]),
                    youtube_id: Some("PL1".to_string()),
                    synced: Some(10),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(synced.tracks, vec![track.id.clone()]);

        let renamed = registry.playlists().set(chart("Z")).unwrap().into_record();
        assert_eq!(renamed.title, "Z");
        assert_eq!(renamed.tracks, vec![track.id]);
        assert_eq!(renamed.youtube_id.as_deref(), Some("PL1"));
        assert_eq!(renamed.synced, Some(10));
    }

    #[test]
    fn test_find_by_provider_and_remove() {
        let dir = TempDir::new().unwrap();
        let mut registry = registry(&dir);

        let playlist = registry
            .playlists()
            .set(
                PlaylistAttrs::new(PlaylistType::Tag, Provider::Lastfm, 50).argument("tag", "rock"),
            )
            .unwrap()
            .into_record();

        let found = registry
            .playlists()
            .find(&Query::new().eq("provider", Provider::Lastfm))
            .unwrap();
        assert_eq!(found, vec![playlist.clone()]);
        assert!(registry
            .playlists()
            .find(&Query::new().eq("provider", Provider::Youtube))
            .unwrap()
            .is_empty());

        assert!(registry.playlists().remove("nope").unwrap_err().is_not_found());
        registry.playlists().remove(&playlist.id).unwrap();
        assert!(registry.playlists().get(&playlist.id).unwrap_err().is_not_found());
    }

    #[test]
    fn test_unknown_track_ids_are_rejected() {
        let dir = TempDir::new().unwrap();
        let mut registry = registry(&dir);

        let track = registry.tracks().set(TrackAttrs::new("a", "b")).unwrap();
        let playlist = registry.playlists().set(chart("X")).unwrap().into_record();

        let error = registry
            .playlists()
            .update(
                &playlist,
                PlaylistPatch {
                    tracks: Some(vec![track.id.clone(), "missing".to_string()]),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(error, CoreError::Validation(_)));

        let mut attrs = chart("Y");
        attrs.tracks = Some(vec!["missing".to_string()]);
        assert!(matches!(
            registry.playlists().set(attrs).unwrap_err(),
            CoreError::Validation(_)
        ));

        let stored = registry.playlists().get(&playlist.id).unwrap();
        assert!(stored.tracks.is_empty());
        assert_eq!(stored.title, "X");
        assert_eq!(registry.playlists().find(&Query::new()).unwrap().len(), 1);
    }
}
