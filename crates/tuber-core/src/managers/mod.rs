mod config;
mod history;
mod playlist;
mod track;

pub use config::ConfigManager;
pub use history::HistoryManager;
pub use playlist::PlaylistManager;
pub use track::TrackManager;

/// Result of an upsert, telling apart a fresh insert from an update of an existing record.
#[derive(Debug, Clone, PartialEq)]
pub enum Upserted<T> {
    Added(T),
    Updated(T),
}

impl<T> Upserted<T> {
    pub fn record(&self) -> &T {
        match self {
            Upserted::Added(record) | Upserted::Updated(record) => record,
        }
    }

    pub fn into_record(self) -> T {
        match self {
            Upserted::Added(record) | Upserted::Updated(record) => record,
        }
    }

    pub fn is_update(&self) -> bool {
        matches!(self, Upserted::Updated(_))
    }

    pub fn verb(&self) -> &'static str {
        match self {
            Upserted::Added(_) => "Added",
            Upserted::Updated(_) => "Updated",
        }
    }
}
