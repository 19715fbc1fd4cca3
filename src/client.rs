use super::envelope::{check_error_and_result, ApiResult, Envelope};
use super::{ClientConfig, DexError, QueryParams};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;
use tracing::instrument;

/// Client of the mangadex API.
///
/// The client owns its auth state: the header set (which carries the bearer
/// credential once logged in) and the refresh token. Only [`login`],
/// [`refresh`] and [`logout`] change it, and they need `&mut self`.
/// A clone carries a snapshot of the auth state at the time of cloning.
///
/// [`login`]: DexClient::login
/// [`refresh`]: DexClient::refresh
/// [`logout`]: DexClient::logout
#[derive(Debug, Clone)]
pub struct DexClient {
    http: reqwest::Client,
    base_url: Url,
    pub(crate) header: HeaderMap,
    pub(crate) refresh_token: Option<String>,
}

impl DexClient {
    /// Unauthenticated client pointed at [`BASE_API`](crate::BASE_API).
    pub fn new() -> Result<Self, DexError> {
        Self::with_config(ClientConfig::default())
    }

    pub fn with_config(config: ClientConfig) -> Result<Self, DexError> {
        let mut base_url = Url::parse(config.base_url())
            .map_err(|_e| DexError::UrlParseError(config.base_url().clone()))?;
        if base_url.cannot_be_a_base() {
            return Err(DexError::UrlParseError(config.base_url().clone()));
        }
        base_url.set_query(None);
        base_url.set_fragment(None);
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent().as_str())
            .timeout(*config.timeout())
            .build()?;
        Ok(Self {
            http,
            base_url,
            header: HeaderMap::new(),
            refresh_token: None,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Whether a bearer credential is attached to outgoing requests.
    pub fn is_authenticated(&self) -> bool {
        self.header.contains_key(AUTHORIZATION)
    }

    /// Current session token, if logged in.
    pub fn session_token(&self) -> Option<&str> {
        self.header
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub(crate) fn set_session(&mut self, session: &str, refresh: String) -> Result<(), DexError> {
        let mut value = HeaderValue::from_str(&format!("Bearer {session}"))?;
        value.set_sensitive(true);
        self.header.insert(AUTHORIZATION, value);
        self.refresh_token = Some(refresh);
        Ok(())
    }

    pub(crate) fn clear_session(&mut self) {
        self.header.remove(AUTHORIZATION);
        self.refresh_token = None;
    }

    /// Appends `segments` to the base url path, e.g. `&["manga", id, "feed"]`.
    ///
    /// Each segment is percent-encoded on its own, so `/`, `?` and `#` in an
    /// id never leave its segment. Empty, `.` and `..` segments are rejected.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, DexError> {
        if let Some(bad) = segments.iter().find(|s| matches!(**s, "" | "." | "..")) {
            return Err(DexError::UrlParseError(format!(
                "invalid path segment '{bad}' in {segments:?}"
            )));
        }
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_e| DexError::UrlParseError(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub fn endpoint_with_query(
        &self,
        segments: &[&str],
        params: &QueryParams,
    ) -> Result<Url, DexError> {
        let mut url = self.endpoint(segments)?;
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params.pairs());
        }
        Ok(url)
    }

    /// Sends one request with the current headers and hands back the raw
    /// response. Status codes are not interpreted.
    #[instrument(skip(self, body))]
    pub async fn request(
        &self,
        method: Method,
        url: Url,
        body: Option<Vec<u8>>,
    ) -> Result<reqwest::Response, DexError> {
        let mut req = self
            .http
            .request(method, url)
            .headers(self.header.clone());
        if let Some(body) = body {
            req = req
                .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
                .body(body);
        }
        let response = req.send().await?;
        debug!(status = %response.status());
        Ok(response)
    }

    /// Like [`request`](Self::request), then decodes the whole body as json.
    pub async fn request_and_decode<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<Vec<u8>>,
    ) -> Result<(StatusCode, T), DexError> {
        let response = self.request(method, url, body).await?;
        let status = response.status();
        let bytes = response.bytes().await?;
        Ok((status, serde_json::from_slice(&bytes)?))
    }

    /// Request on a path below the base url, decoded into `R` and
    /// checked for an `ok` result.
    pub(crate) async fn response_op<R>(
        &self,
        method: Method,
        path: &[&str],
        body: Option<Vec<u8>>,
    ) -> Result<R, DexError>
    where
        R: DeserializeOwned + ApiResult,
    {
        let url = self.endpoint(path)?;
        let res = self
            .request_and_decode::<R>(method, url, body)
            .await
            .map(|(_, r)| r);
        check_error_and_result(res)
    }

    /// [`response_op`](Self::response_op) for calls that only answer with the envelope.
    pub(crate) async fn simple_op(
        &self,
        method: Method,
        path: &[&str],
        body: Option<Vec<u8>>,
    ) -> Result<(), DexError> {
        self.response_op::<Envelope>(method, path, body).await?;
        Ok(())
    }

    pub(crate) async fn query_op<R>(&self, path: &[&str], params: &QueryParams) -> Result<R, DexError>
    where
        R: DeserializeOwned + ApiResult,
    {
        let url = self.endpoint_with_query(path, params)?;
        let res = self
            .request_and_decode::<R>(Method::GET, url, None)
            .await
            .map(|(_, r)| r);
        check_error_and_result(res)
    }
}

pub(crate) fn json_body<T: Serialize + ?Sized>(body: &T) -> Result<Option<Vec<u8>>, DexError> {
    Ok(Some(serde_json::to_vec(body)?))
}
