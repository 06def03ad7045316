use std::path::Path;
use std::time::{Duration, Instant};

use colored::Colorize;
use error_stack::{IntoReport, Report, ResultExt};
use oauth2::basic::BasicClient;
use oauth2::reqwest::http_client;
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, PkceCodeChallenge,
    RedirectUrl, RefreshToken, Scope, TokenResponse, TokenUrl,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tiny_http::{Header, Response, Server};
use tuber_core::{Config, CoreError, Provider};
use url::Url;

use crate::config::AppConfig;
use crate::youtube::{YouTubeError, YouTubeResult};

/// The `installed` (or `web`) section of a Google `client_secret.json`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClientSecrets {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub auth_uri: Option<String>,
    #[serde(default)]
    pub token_uri: Option<String>,
}

#[derive(Deserialize)]
struct ClientSecretsFile {
    installed: Option<ClientSecrets>,
    web: Option<ClientSecrets>,
}

impl ClientSecrets {
    pub fn read(path: &Path) -> YouTubeResult<Self> {
        let content = std::fs::read_to_string(path)
            .into_report()
            .change_context(YouTubeError)
            .attach_printable_lazy(|| format!("reading {}", path.display()))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> YouTubeResult<Self> {
        let file: ClientSecretsFile = serde_json::from_str(content)
            .into_report()
            .change_context(YouTubeError)?;
        file.installed
            .or(file.web)
            .ok_or_else(|| {
                Report::new(YouTubeError)
                    .attach_printable("client secrets have neither an installed nor a web section")
            })
    }

    fn token_uri(&self) -> String {
        self.token_uri
            .clone()
            .unwrap_or_else(|| AppConfig::GOOGLE_TOKEN_URL.to_string())
    }
}

/// Stored YouTube credentials, the `data` of the YouTube config record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credentials {
    pub refresh_token: String,
    pub token_uri: String,
    pub client_id: String,
    pub client_secret: String,
    pub scopes: Vec<String>,
}

impl Credentials {
    pub fn from_config(config: &Config) -> tuber_core::Result<Self> {
        serde_json::from_value(Value::Object(config.data.clone())).map_err(|error| {
            log::debug!("Invalid YouTube configuration: {}", error);
            CoreError::NotConfigured(Provider::Youtube)
        })
    }

    pub fn into_config(self) -> tuber_core::Result<Config> {
        match serde_json::to_value(self)? {
            Value::Object(data) => Ok(Config::new(Provider::Youtube, data)),
            _ => Err(CoreError::Validation(
                "credentials did not serialize to an object".to_string(),
            )),
        }
    }

    /// Mints a short lived access token from the refresh token.
    pub fn access_token(&self) -> tuber_core::Result<String> {
        let client = oauth_client(
            &self.client_id,
            &self.client_secret,
            AppConfig::GOOGLE_AUTH_URL,
            &self.token_uri,
        )?;
        let token = client
            .exchange_refresh_token(&RefreshToken::new(self.refresh_token.clone()))
            .request(http_client)
            .map_err(|error| {
                CoreError::RemoteService(format!("refreshing the YouTube token failed: {}", error))
            })?;
        Ok(token.access_token().secret().to_string())
    }
}

fn oauth_client(
    client_id: &str,
    client_secret: &str,
    auth_uri: &str,
    token_uri: &str,
) -> tuber_core::Result<BasicClient> {
    let invalid = |error: url::ParseError| CoreError::Validation(error.to_string());
    Ok(BasicClient::new(
        ClientId::new(client_id.to_string()),
        Some(ClientSecret::new(client_secret.to_string())),
        AuthUrl::new(auth_uri.to_string()).map_err(invalid)?,
        Some(TokenUrl::new(token_uri.to_string()).map_err(invalid)?),
    ))
}

fn redirect_uri() -> String {
    format!("http://localhost:{}/callback", AppConfig::OAUTH_REDIRECT_PORT)
}

/// Runs the installed app consent flow and returns long lived credentials.
pub fn authorize(secrets: &ClientSecrets) -> YouTubeResult<Credentials> {
    let auth_uri = secrets
        .auth_uri
        .clone()
        .unwrap_or_else(|| AppConfig::GOOGLE_AUTH_URL.to_string());
    let token_uri = secrets.token_uri();
    let client = oauth_client(
        &secrets.client_id,
        &secrets.client_secret,
        &auth_uri,
        &token_uri,
    )
    .into_report()
    .change_context(YouTubeError)?
    .set_redirect_uri(
        RedirectUrl::new(redirect_uri())
            .into_report()
            .change_context(YouTubeError)?,
    );

    let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();
    let (auth_url, csrf_token) = client
        .authorize_url(CsrfToken::new_random)
        .add_scope(Scope::new(AppConfig::YOUTUBE_SCOPE.to_string()))
        .add_extra_param("access_type", "offline")
        .add_extra_param("prompt", "consent")
        .set_pkce_challenge(pkce_challenge)
        .url();

    println!("Opening browser for authorization...");
    println!(
        "If the browser doesn't open, visit: {}",
        auth_url.to_string().blue()
    );
    if webbrowser::open(auth_url.as_str()).is_err() {
        println!("{}", "Failed to open the browser automatically".yellow());
    }

    let code = wait_for_code(csrf_token.secret())?;
    let token = client
        .exchange_code(AuthorizationCode::new(code))
        .set_pkce_verifier(pkce_verifier)
        .request(http_client)
        .map_err(|error| Report::new(YouTubeError).attach_printable(error.to_string()))?;

    let refresh_token = token
        .refresh_token()
        .map(|token| token.secret().to_string())
        .ok_or_else(|| {
            Report::new(YouTubeError).attach_printable("Google returned no refresh token")
        })?;
    Ok(Credentials {
        refresh_token,
        token_uri,
        client_id: secrets.client_id.clone(),
        client_secret: secrets.client_secret.clone(),
        scopes: vec![AppConfig::YOUTUBE_SCOPE.to_string()],
    })
}

fn wait_for_code(expected_state: &str) -> YouTubeResult<String> {
    let address = format!("localhost:{}", AppConfig::OAUTH_REDIRECT_PORT);
    let server = Server::http(&address)
        .map_err(|error| Report::new(YouTubeError).attach_printable(error.to_string()))?;
    log::info!("Waiting for the authorization callback on {}", redirect_uri());

    let timeout = Duration::from_secs(AppConfig::OAUTH_CALLBACK_TIMEOUT_SECS);
    let start = Instant::now();
    loop {
        if start.elapsed() > timeout {
            return Err(Report::new(YouTubeError).attach_printable("Authorization timed out"));
        }
        let request = match server.recv_timeout(Duration::from_millis(100)) {
            Ok(Some(request)) => request,
            Ok(None) => continue,
            Err(error) => {
                return Err(Report::new(YouTubeError).attach_printable(error.to_string()))
            }
        };

        match parse_callback(request.url(), expected_state) {
            Some(result) => {
                let body = match &result {
                    Ok(_) => "Authorization complete, you can close this window.",
                    Err(_) => "Authorization failed, check the terminal.",
                };
                let mut response = Response::from_string(body);
                if let Ok(header) = Header::from_bytes(&b"Content-Type"[..], &b"text/plain"[..]) {
                    response = response.with_header(header);
                }
                let _ = request.respond(response);
                return result
                    .map_err(|message| Report::new(YouTubeError).attach_printable(message));
            }
            None => {
                let _ = request.respond(Response::from_string("Not Found").with_status_code(404));
            }
        }
    }
}

/// `None` for requests that are not the OAuth callback.
pub(crate) fn parse_callback(path: &str, expected_state: &str) -> Option<Result<String, String>> {
    let url = Url::parse(&format!("http://localhost{}", path)).ok()?;
    if url.path() != "/callback" {
        return None;
    }
    let mut code = None;
    let mut state = None;
    let mut error = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "error" => error = Some(value.into_owned()),
            _ => {}
        }
    }

    if let Some(error) = error {
        return Some(Err(format!("Authorization denied: {}", error)));
    }
    if state.as_deref() != Some(expected_state) {
        return Some(Err("Authorization state mismatch".to_string()));
    }
    Some(code.ok_or_else(|| "Callback carried no authorization code".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_installed_client_secrets() {
        let secrets = ClientSecrets::parse(
            r#"{"installed": {
                "client_id": "id.apps.googleusercontent.com",
                "client_secret": "shh",
                "auth_uri": "https://accounts.google.com/o/oauth2/auth",
                "token_uri": "https://oauth2.googleapis.com/token",
                "redirect_uris": ["http://localhost"]
            }}"#,
        )
        .unwrap();
        assert_eq!(secrets.client_id, "id.apps.googleusercontent.com");
        assert_eq!(secrets.client_secret, "shh");
        assert_eq!(secrets.token_uri(), "https://oauth2.googleapis.com/token");
    }

    #[test]
    fn test_parse_web_client_secrets_without_uris() {
        let secrets =
            ClientSecrets::parse(r#"{"web": {"client_id": "a", "client_secret": "b"}}"#).unwrap();
        assert_eq!(secrets.auth_uri, None);
        assert_eq!(secrets.token_uri(), AppConfig::GOOGLE_TOKEN_URL);
    }

    #[test]
    fn test_parse_client_secrets_without_section() {
        assert!(ClientSecrets::parse(r#"{"other": {}}"#).is_err());
        assert!(ClientSecrets::parse("not json").is_err());
    }

    #[test]
    fn test_credentials_config_round_trip() {
        let credentials = Credentials {
            refresh_token: "refresh".to_string(),
            token_uri: AppConfig::GOOGLE_TOKEN_URL.to_string(),
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
            scopes: vec![AppConfig::YOUTUBE_SCOPE.to_string()],
        };
        let config = credentials.clone().into_config().unwrap();
        assert_eq!(config.provider, Provider::Youtube);
        assert_eq!(config.value("refresh_token"), Some("refresh"));
        assert_eq!(Credentials::from_config(&config).unwrap(), credentials);
    }

    #[test]
    fn test_incomplete_config_is_not_configured() {
        let config = Config::new(Provider::Youtube, Default::default());
        assert!(matches!(
            Credentials::from_config(&config),
            Err(CoreError::NotConfigured(Provider::Youtube))
        ));
    }

    #[test]
    fn test_parse_callback() {
        assert_eq!(
            parse_callback("/callback?code=4%2Fabc&state=xyz", "xyz"),
            Some(Ok("4/abc".to_string()))
        );
        assert_eq!(
            parse_callback("/callback?code=abc&state=other", "xyz"),
            Some(Err("Authorization state mismatch".to_string()))
        );
        assert_eq!(
            parse_callback("/callback?error=access_denied&state=xyz", "xyz"),
            Some(Err("Authorization denied: access_denied".to_string()))
        );
        assert_eq!(parse_callback("/favicon.ico", "xyz"), None);
    }
}
