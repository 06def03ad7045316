use std::fmt;

pub mod api;
pub mod auth;
pub mod commands;

#[derive(Debug)]
pub struct YouTubeError;

impl fmt::Display for YouTubeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("YouTube error")
    }
}

impl std::error::Error for YouTubeError {}

pub type YouTubeResult<T> = error_stack::Result<T, YouTubeError>;
