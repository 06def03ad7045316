use crate::error::Result;
use crate::identity::track_id;
use crate::models::{Track, TrackAttrs};
use crate::query::Query;
use crate::storage::Registry;

pub struct TrackManager<'a> {
    registry: &'a mut Registry,
}

impl<'a> TrackManager<'a> {
    pub fn new(registry: &'a mut Registry) -> Self {
        Self { registry }
    }

    /// Inserts the track or merges the supplied fields into the stored one.
    ///
    /// The id is derived from artist and name, so setting the same track twice
    /// returns the same record. Unset attributes keep their stored values.
    pub fn set(&mut self, attrs: TrackAttrs) -> Result<Track> {
        let id = track_id(&attrs.artist, &attrs.name);
        let track = match self.registry.get::<Track>(&id) {
            Ok(mut existing) => {
                if attrs.duration.is_some() {
                    existing.duration = attrs.duration;
                }
                if attrs.youtube_id.is_some() {
                    existing.youtube_id = attrs.youtube_id;
                }
                log::debug!("Updating track {}", id);
                existing
            }
            Err(error) if error.is_not_found() => {
                log::debug!("Adding track {}: {} - {}", id, attrs.artist, attrs.name);
                Track {
                    id,
                    artist: attrs.artist,
                    name: attrs.name,
                    duration: attrs.duration,
                    youtube_id: attrs.youtube_id,
                }
            }
            Err(error) => return Err(error),
        };
        self.registry.set(track.clone())?;
        Ok(track)
    }

    pub fn get(&mut self, id: &str) -> Result<Track> {
        self.registry.get(id)
    }

    pub fn find(&mut self, query: &Query) -> Result<Vec<Track>> {
        self.registry.find(query)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn registry(dir: &TempDir) -> Registry {
        Registry::open(dir.path().join("storage.json"))
    }

    #[test]
    fn test_set_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let mut registry = registry(&dir);

        let first = registry
            .tracks()
            .set(TrackAttrs::new("Queen", "Bohemian Rhapsody"))
            .unwrap();
        let second = registry
            .tracks()
            .set(TrackAttrs::new("Queen", "Bohemian Rhapsody"))
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(registry.tracks().find(&Query::new()).unwrap().len(), 1);
    }

    #[test]
    fn test_set_merges_new_fields_without_changing_id() {
        let dir = TempDir::new().unwrap();
        let mut registry = registry(&dir);

        let first = registry
            .tracks()
            .set(TrackAttrs::new("Queen", "Bohemian Rhapsody").youtube_id("fJ9rUzIMcZQ"))
            .unwrap();
        let merged = registry
            .tracks()
            .set(TrackAttrs::new("queen", "bohemian rhapsody").duration(Some(354)))
            .unwrap();

        assert_eq!(merged.id, first.id);
        assert_eq!(merged.duration, Some(354));
        assert_eq!(merged.youtube_id.as_deref(), Some("fJ9rUzIMcZQ"));
        assert_eq!(merged.artist, "Queen");
        assert_eq!(registry.tracks().get(&first.id).unwrap(), merged);
    }

    #[test]
    fn test_find_by_link_state() {
        let dir = TempDir::new().unwrap();
        let mut registry = registry(&dir);

        let linked = registry
            .tracks()
            .set(TrackAttrs::new("a", "b").youtube_id("v1"))
            .unwrap();
        let unlinked = registry.tracks().set(TrackAttrs::new("c", "d")).unwrap();

        let found = registry
            .tracks()
            .find(&Query::new().is_null("youtube_id"))
            .unwrap();
        assert_eq!(found, vec![unlinked]);

        let found = registry
            .tracks()
            .find(&Query::new().not_null("youtube_id"))
            .unwrap();
        assert_eq!(found, vec![linked]);
    }
}
