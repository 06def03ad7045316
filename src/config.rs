/// `AppConfig` holds static configuration values for the application,
/// such as the endpoints of the remote services.
pub struct AppConfig;

impl AppConfig {
    /// Root of the Last.fm 2.0 web service.
    pub const LASTFM_API_URL: &'static str = "https://ws.audioscrobbler.com/2.0/";
    /// Largest page Last.fm serves for track listings.
    pub const LASTFM_PAGE_SIZE: u32 = 200;
    pub const YOUTUBE_API_URL: &'static str = "https://www.googleapis.com/youtube/v3";
    pub const YOUTUBE_SCOPE: &'static str = "https://www.googleapis.com/auth/youtube";
    pub const GOOGLE_AUTH_URL: &'static str = "https://accounts.google.com/o/oauth2/v2/auth";
    pub const GOOGLE_TOKEN_URL: &'static str = "https://oauth2.googleapis.com/token";
    /// Local port receiving the OAuth redirect during `youtube setup`.
    pub const OAUTH_REDIRECT_PORT: u16 = 8765;
    pub const OAUTH_CALLBACK_TIMEOUT_SECS: u64 = 300;
    pub const MIN_PLAYLIST_LIMIT: u32 = 50;
    pub const MAX_PLAYLIST_LIMIT: u32 = 1000;
}
