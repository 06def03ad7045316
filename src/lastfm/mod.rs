use std::fmt;

pub mod api;
pub mod commands;
mod countries;
pub mod params;
pub mod tags;

#[derive(Debug)]
pub struct LastFmError;

impl fmt::Display for LastFmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Last.fm error")
    }
}

impl std::error::Error for LastFmError {}

pub type LastFmResult<T> = error_stack::Result<T, LastFmError>;
