use super::client::json_body;
use super::envelope::impl_api_result;
use super::{ApiErrorDetail, DexClient, DexError};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

const LOGIN_PATH: &[&str] = &["auth", "login"];
const CHECK_TOKEN_PATH: &[&str] = &["auth", "check"];
const LOGOUT_PATH: &[&str] = &["auth", "logout"];
const REFRESH_TOKEN_PATH: &[&str] = &["auth", "refresh"];

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthResponse {
    pub result: String,
    #[serde(default)]
    pub token: Token,
    #[serde(default)]
    pub errors: Vec<ApiErrorDetail>,
}

/// Token pair issued on login and refresh.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Token {
    pub session: String,
    pub refresh: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenCheckResponse {
    pub result: String,
    #[serde(default)]
    pub is_authenticated: bool,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
    #[serde(default)]
    pub errors: Vec<ApiErrorDetail>,
}

impl_api_result!(AuthResponse, TokenCheckResponse);

#[derive(Serialize)]
struct Credentials<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    token: &'a str,
}

impl DexClient {
    /// Logs in and attaches the issued session token to every later request.
    ///
    /// <https://api.mangadex.org/docs.html#operation/post-auth-login>
    #[instrument(skip(self, password))]
    pub async fn login(&mut self, username: &str, password: &str) -> Result<(), DexError> {
        let body = json_body(&Credentials { username, password })?;
        let ar: AuthResponse = self.response_op(Method::POST, LOGIN_PATH, body).await?;
        self.set_session(&ar.token.session, ar.token.refresh)?;
        debug!("logged in");
        Ok(())
    }

    /// Asks mangadex whether the current session token is still valid.
    ///
    /// <https://api.mangadex.org/docs.html#operation/get-auth-check>
    pub async fn check_token(&self) -> Result<TokenCheckResponse, DexError> {
        self.response_op(Method::GET, CHECK_TOKEN_PATH, None).await
    }

    /// Invalidates the session server side, then forgets the tokens locally.
    ///
    /// The local state is cleared even when mangadex reports a failure; that
    /// failure is still returned.
    ///
    /// <https://api.mangadex.org/docs.html#operation/post-auth-logout>
    #[instrument(skip(self))]
    pub async fn logout(&mut self) -> Result<(), DexError> {
        let res = self.simple_op(Method::POST, LOGOUT_PATH, None).await;
        self.clear_session();
        if let Err(e) = &res {
            warn!("logout failed server side, local session cleared anyway: {e}");
        }
        res
    }

    /// Exchanges the stored refresh token for a new token pair.
    ///
    /// Nothing is touched unless the exchange succeeds. Any error here means
    /// the caller has to log in again.
    ///
    /// <https://api.mangadex.org/docs.html#operation/post-auth-refresh>
    #[instrument(skip(self))]
    pub async fn refresh(&mut self) -> Result<(), DexError> {
        let token = self.refresh_token.as_deref().ok_or(DexError::NotLoggedIn)?;
        let body = json_body(&RefreshRequest { token })?;
        let ar: AuthResponse = self
            .response_op(Method::POST, REFRESH_TOKEN_PATH, body)
            .await?;
        self.set_session(&ar.token.session, ar.token.refresh)?;
        debug!("session refreshed");
        Ok(())
    }
}
