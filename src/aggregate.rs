use super::envelope::impl_api_result;
use super::manga::map_or_empty;
use super::{id_from_url, ApiErrorDetail, DexClient, DexError, QueryParams};
use getset::Getters;
use reqwest::IntoUrl;
use serde::Deserialize;
use serde::Deserializer;
use std::collections::HashMap;

/// Volume/chapter index of one manga, narrowed by language and groups.
#[derive(Debug, Clone)]
pub struct AggregateQuery {
    id: String,
    groups: Vec<String>,
    translated_language: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Getters)]
#[getset(get = "pub")]
pub struct AggregateVolume {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    volume: Option<f32>,
    count: usize,
    #[serde(default, deserialize_with = "map_or_empty")]
    chapters: HashMap<String, AggregateChapter>,
}

#[derive(Debug, Clone, Deserialize, Getters, PartialEq, PartialOrd)]
#[getset(get = "pub")]
pub struct AggregateChapter {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    chapter: Option<f32>,
    id: String,
    count: usize,
    #[serde(default)]
    others: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct AggregateResponse {
    result: String,
    #[serde(default, deserialize_with = "map_or_empty")]
    volumes: HashMap<String, AggregateVolume>,
    #[serde(default)]
    errors: Vec<ApiErrorDetail>,
}

impl_api_result!(AggregateResponse);

/// `"none"` and other non numbers become `None`.
fn deserialize_number_from_string<'de, D>(deserializer: D) -> Result<Option<f32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Deserialize::deserialize(deserializer)?;
    Ok(raw.and_then(|raw| raw.parse::<f32>().ok()))
}

impl AggregateQuery {
    pub fn new(id: impl ToString) -> Self {
        Self {
            id: id.to_string(),
            groups: Vec::new(),
            translated_language: Vec::new(),
        }
    }

    /// From a `https://mangadex.org/title/<id>/...` link.
    pub fn from_url(url: impl IntoUrl + Clone + ToString) -> Result<Self, DexError> {
        Ok(Self::new(id_from_url(url, "title")?))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn group(mut self, group: impl ToString) -> Self {
        self.groups.push(group.to_string());
        self
    }

    pub fn language(mut self, language: impl ToString) -> Self {
        self.translated_language.push(language.to_string());
        self
    }

    fn params(&self) -> QueryParams {
        let params = self
            .groups
            .iter()
            .fold(QueryParams::new(), |params, group| params.add("groups[]", group));
        self.translated_language
            .iter()
            .fold(params, |params, language| {
                params.add("translatedLanguage[]", language)
            })
    }
}

impl DexClient {
    /// Volumes of a manga with their chapters, in no particular order.
    ///
    /// <https://api.mangadex.org/docs.html#operation/get-manga-aggregate>
    pub async fn manga_aggregate(
        &self,
        query: &AggregateQuery,
    ) -> Result<Vec<AggregateVolume>, DexError> {
        let response: AggregateResponse = self
            .query_op(&["manga", query.id.as_str(), "aggregate"], &query.params())
            .await?;
        Ok(response.volumes.into_values().collect())
    }
}

pub trait GetChapters<'a> {
    /// Every chapter of the volumes, sorted by number. Unnumbered chapters come first.
    fn get_chapters(&self) -> Vec<&'a AggregateChapter>;
}

impl<'a, T> GetChapters<'a> for T
where
    T: IntoIterator<Item = &'a AggregateVolume> + Clone,
{
    fn get_chapters(&self) -> Vec<&'a AggregateChapter> {
        let mut chapters: Vec<&AggregateChapter> = self
            .clone()
            .into_iter()
            .flat_map(|v| v.chapters().values())
            .collect();
        chapters.sort_by(|x, y| match (x.chapter, y.chapter) {
            (None, None) => std::cmp::Ordering::Equal,
            (None, Some(_)) => std::cmp::Ordering::Less,
            (Some(_), None) => std::cmp::Ordering::Greater,
            (Some(c1), Some(c2)) => c1.total_cmp(&c2),
        });
        chapters
    }
}
