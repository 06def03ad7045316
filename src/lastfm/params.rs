use tuber_core::CoreError;

use crate::config::AppConfig;
use crate::lastfm::countries::COUNTRIES;

/// Resolves an alpha-2 country code to the lowercase country name.
pub fn parse_country(code: &str) -> tuber_core::Result<String> {
    let wanted = code.trim().to_uppercase();
    COUNTRIES
        .binary_search_by(|(alpha_2, _)| (*alpha_2).cmp(wanted.as_str()))
        .map(|index| COUNTRIES[index].1.to_lowercase())
        .map_err(|_| CoreError::Validation(format!("Unknown iso-3166 country code: {}", code)))
}

pub fn validate_limit(limit: &u32) -> Result<(), String> {
    if (AppConfig::MIN_PLAYLIST_LIMIT..=AppConfig::MAX_PLAYLIST_LIMIT).contains(limit) {
        Ok(())
    } else {
        Err(format!(
            "{} is not in the range {}<=x<={}",
            limit,
            AppConfig::MIN_PLAYLIST_LIMIT,
            AppConfig::MAX_PLAYLIST_LIMIT
        ))
    }
}
