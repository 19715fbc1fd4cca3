use derive_builder::Builder;
use getset::Getters;
use std::time::Duration;

/// Default root of the mangadex API.
pub const BASE_API: &str = "https://api.mangadex.org";

const DEFAULT_USER_AGENT: &str = concat!("dexapi/", env!("CARGO_PKG_VERSION"));

/// Settings used to build a [`DexClient`](crate::DexClient).
///
/// ```
/// use std::time::Duration;
///
/// let config = dexapi::ClientConfigBuilder::default()
///     .base_url("http://127.0.0.1:8080")
///     .timeout(Duration::from_secs(5))
///     .build()
///     .unwrap();
/// assert_eq!(config.base_url(), "http://127.0.0.1:8080");
/// ```
#[derive(Debug, Clone, Builder, Getters)]
#[builder(setter(into))]
#[getset(get = "pub")]
pub struct ClientConfig {
    #[builder(default = "BASE_API.to_string()")]
    base_url: String,
    #[builder(default = "DEFAULT_USER_AGENT.to_string()")]
    user_agent: String,
    /// Upper bound for a whole request, response body included.
    #[builder(default = "Duration::from_secs(30)")]
    timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: BASE_API.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}
