use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CoreError, Result};
use crate::managers::{ConfigManager, HistoryManager, PlaylistManager, TrackManager};
use crate::models::{Config, Playlist, Track};
use crate::query::{Fields, Query};

const REGISTRY_DIR: &str = ".tuber";
const REGISTRY_FILE: &str = "storage.json";

/// The whole persisted state: every collection lives in one JSON file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub config: Vec<Config>,
    #[serde(default)]
    pub playlists: Vec<Playlist>,
    #[serde(default)]
    pub tracks: Vec<Track>,
    #[serde(default)]
    pub history: BTreeMap<String, Value>,
}

/// A record stored in one of the registry collections.
pub trait Record: Clone + Fields {
    const KIND: &'static str;

    fn id(&self) -> String;
    fn collection(document: &Document) -> &Vec<Self>;
    fn collection_mut(document: &mut Document) -> &mut Vec<Self>;
}

impl Record for Config {
    const KIND: &'static str = "Config";

    fn id(&self) -> String {
        self.provider.to_string()
    }

    fn collection(document: &Document) -> &Vec<Self> {
        &document.config
    }

    fn collection_mut(document: &mut Document) -> &mut Vec<Self> {
        &mut document.config
    }
}

impl Record for Track {
    const KIND: &'static str = "Track";

    fn id(&self) -> String {
        self.id.clone()
    }

    fn collection(document: &Document) -> &Vec<Self> {
        &document.tracks
    }

    fn collection_mut(document: &mut Document) -> &mut Vec<Self> {
        &mut document.tracks
    }
}

impl Record for Playlist {
    const KIND: &'static str = "Playlist";

    fn id(&self) -> String {
        self.id.clone()
    }

    fn collection(document: &Document) -> &Vec<Self> {
        &document.playlists
    }

    fn collection_mut(document: &mut Document) -> &mut Vec<Self> {
        &mut document.playlists
    }
}

/// File-backed store of all collections.
///
/// The file is read on first access and kept in memory afterwards. Every
/// mutation rewrites the whole file before returning. There is no locking:
/// one process owns the registry for the duration of a command.
#[derive(Debug)]
pub struct Registry {
    path: PathBuf,
    document: Option<Document>,
}

impl Registry {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            document: None,
        }
    }

    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| {
            CoreError::Validation("Failed to resolve the home directory".to_string())
        })?;
        Ok(home.join(REGISTRY_DIR).join(REGISTRY_FILE))
    }

    #[cfg(test)]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    #[cfg(test)]
    pub fn document(&mut self) -> Result<&Document> {
        Ok(self.load()?)
    }

    pub fn get<R: Record>(&mut self, id: &str) -> Result<R> {
        R::collection(self.load()?)
            .iter()
            .find(|record| record.id() == id)
            .cloned()
            .ok_or_else(|| CoreError::not_found(R::KIND, id))
    }

    pub fn find<R: Record>(&mut self, query: &Query) -> Result<Vec<R>> {
        Ok(R::collection(self.load()?)
            .iter()
            .filter(|record| query.matches(*record))
            .cloned()
            .collect())
    }

    /// Inserts the record, or replaces the one with the same id in place.
    pub fn set<R: Record>(&mut self, record: R) -> Result<()> {
        let id = record.id();
        let collection = R::collection_mut(self.load()?);
        match collection.iter_mut().find(|existing| existing.id() == id) {
            Some(existing) => *existing = record,
            None => collection.push(record),
        }
        self.save()
    }

    pub fn remove<R: Record>(&mut self, id: &str) -> Result<R> {
        let collection = R::collection_mut(self.load()?);
        let position = collection
            .iter()
            .position(|record| record.id() == id)
            .ok_or_else(|| CoreError::not_found(R::KIND, id))?;
        let removed = collection.remove(position);
        self.save()?;
        Ok(removed)
    }

    pub fn history_value(&mut self, key: &str) -> Result<Option<Value>> {
        Ok(self.load()?.history.get(key).cloned())
    }

    pub fn set_history_values(
        &mut self,
        values: impl IntoIterator<Item = (String, Value)>,
    ) -> Result<()> {
        self.load()?.history.extend(values);
        self.save()
    }

    pub fn config(&mut self) -> ConfigManager<'_> {
        ConfigManager::new(self)
    }

    pub fn tracks(&mut self) -> TrackManager<'_> {
        TrackManager::new(self)
    }

    pub fn playlists(&mut self) -> PlaylistManager<'_> {
        PlaylistManager::new(self)
    }

    pub fn history(&mut self) -> HistoryManager<'_> {
        HistoryManager::new(self)
    }

    pub fn save(&self) -> Result<()> {
        let Some(document) = &self.document else {
            return Ok(());
        };
        if let Some(folder) = self.path.parent() {
            if !folder.as_os_str().is_empty() && !folder.exists() {
                fs::create_dir_all(folder)?;
            }
        }
        let serialized = serde_json::to_string_pretty(document)?;
        fs::write(&self.path, serialized)?;
        log::debug!("Registry saved to: {}", self.path.display());
        Ok(())
    }

    fn load(&mut self) -> Result<&mut Document> {
        if self.document.is_none() {
            let document = if self.path.is_file() {
                log::debug!("Reading registry from: {}", self.path.display());
                let content = fs::read_to_string(&self.path)?;
                if content.trim().is_empty() {
                    Document::default()
                } else {
                    serde_json::from_str(&content)?
                }
            } else {
                log::debug!(
                    "No registry found at {}, starting empty",
                    self.path.display()
                );
                Document::default()
            };
            self.document = Some(document);
        }
        Ok(self.document.get_or_insert_with(Document::default))
    }
}
