use tuber_core::{CoreError, Registry};

use crate::lastfm::api::Tag;

const TAGS_KEY: &str = "lastfm_tags";

/// The top tags, read from the registry unless `refresh` is set or nothing
/// was stored yet. Fetched tags replace the stored ones.
pub fn cached_tags(
    registry: &mut Registry,
    refresh: bool,
    fetch: impl FnOnce() -> tuber_core::Result<Vec<Tag>>,
) -> tuber_core::Result<Vec<Tag>> {
    if !refresh {
        if let Some(tags) = registry.history().get::<Option<Vec<Tag>>>(TAGS_KEY, None)? {
            log::debug!("Using {} cached tags", tags.len());
            return Ok(tags);
        }
    }
    let tags = fetch()?;
    registry.history().set(TAGS_KEY, &tags)?;
    log::info!("Cached {} tags", tags.len());
    Ok(tags)
}

/// Matches the tag against the known tags, ignoring case.
pub fn find_tag(tags: &[Tag], tag: &str) -> tuber_core::Result<String> {
    let wanted = tag.trim().to_lowercase();
    tags.iter()
        .find(|candidate| candidate.name.to_lowercase() == wanted)
        .map(|candidate| candidate.name.clone())
        .ok_or_else(|| CoreError::Validation(format!("Unknown tag: {}", tag)))
}
