pub mod error;
pub mod identity;
pub mod managers;
pub mod models;
pub mod provider;
pub mod query;
pub mod storage;
pub mod sync;

pub use error::{CoreError, Result};
pub use managers::Upserted;
pub use models::{Arguments, Config, Playlist, PlaylistAttrs, PlaylistType, Provider, Track};
pub use query::Query;
pub use storage::Registry;
