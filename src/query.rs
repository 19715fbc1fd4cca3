use super::DexError;
use reqwest::IntoUrl;

/// Ordered query string pairs. Keys may repeat, as mangadex expects for
/// array parameters such as `includes[]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a pair, keeping any previous value of `key`.
    pub fn add(mut self, key: impl ToString, value: impl ToString) -> Self {
        self.pairs.push((key.to_string(), value.to_string()));
        self
    }

    /// Replaces every previous value of `key`.
    pub fn set(mut self, key: impl ToString, value: impl ToString) -> Self {
        let key = key.to_string();
        self.pairs.retain(|(k, _)| *k != key);
        self.pairs.push((key, value.to_string()));
        self
    }

    pub fn limit(self, limit: usize) -> Self {
        self.set("limit", limit)
    }

    pub fn offset(self, offset: usize) -> Self {
        self.set("offset", offset)
    }

    pub fn include(self, relationship: impl ToString) -> Self {
        self.add("includes[]", relationship)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Extracts the id from a `https://mangadex.org/<kind>/<id>/...` link.
pub fn id_from_url(url: impl IntoUrl + Clone + ToString, kind: &str) -> Result<String, DexError> {
    let invalid = || DexError::UrlParseError(url.to_string());
    let parsed = url.clone().into_url().map_err(|_e| invalid())?;
    if !parsed.domain().is_some_and(|x| x == "mangadex.org") {
        return Err(invalid());
    }
    let mut segments = parsed.path_segments().ok_or_else(invalid)?;
    if !segments.next().is_some_and(|x| x == kind) {
        return Err(invalid());
    }
    segments
        .next()
        .filter(|id| !id.is_empty())
        .map(ToString::to_string)
        .ok_or_else(invalid)
}
