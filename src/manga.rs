use super::client::json_body;
use super::envelope::impl_api_result;
use super::{ApiErrorDetail, ChapterList, DexClient, DexError, QueryParams};
use reqwest::Method;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

const MANGA_LIST_PATH: &[&str] = &["manga"];

pub const AUTHOR_REL: &str = "author";
pub const ARTIST_REL: &str = "artist";
pub const COVER_ART_REL: &str = "cover_art";
pub const MANGA_REL: &str = "manga";
pub const SCANLATION_GROUP_REL: &str = "scanlation_group";
pub const USER_REL: &str = "user";

/// Language code to text, e.g. `{"en": "Berserk"}`.
pub type LocalisedString = HashMap<String, String>;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MangaList {
    pub result: String,
    #[serde(default)]
    pub response: String,
    #[serde(default, alias = "results")]
    pub data: Vec<Manga>,
    #[serde(default)]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
    #[serde(default)]
    pub total: usize,
    #[serde(default)]
    pub errors: Vec<ApiErrorDetail>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MangaResponse {
    pub result: String,
    #[serde(default)]
    pub response: String,
    #[serde(default)]
    pub data: Manga,
    #[serde(default)]
    pub errors: Vec<ApiErrorDetail>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Manga {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub attributes: MangaAttributes,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
}

/// Link to another entity. `attributes` is only filled when the relationship
/// was requested through `includes[]`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Relationship {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub related: Option<String>,
    #[serde(default)]
    pub attributes: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MangaAttributes {
    #[serde(deserialize_with = "map_or_empty")]
    pub title: LocalisedString,
    pub alt_titles: Vec<LocalisedString>,
    #[serde(deserialize_with = "map_or_empty")]
    pub description: LocalisedString,
    pub is_locked: bool,
    #[serde(deserialize_with = "map_or_empty")]
    pub links: HashMap<String, String>,
    pub original_language: String,
    pub last_volume: Option<String>,
    pub last_chapter: Option<String>,
    pub publication_demographic: Option<String>,
    pub status: Option<String>,
    pub year: Option<u32>,
    pub content_rating: Option<String>,
    pub tags: Vec<Tag>,
    pub version: u32,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Tag {
    pub id: String,
    #[serde(default)]
    pub attributes: TagAttributes,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TagAttributes {
    #[serde(deserialize_with = "map_or_empty")]
    pub name: LocalisedString,
    pub group: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReadMarkersResponse {
    pub result: String,
    #[serde(default)]
    pub data: Vec<String>,
    #[serde(default)]
    pub errors: Vec<ApiErrorDetail>,
}

impl_api_result!(MangaList, MangaResponse, ReadMarkersResponse);

impl MangaAttributes {
    /// Title in `language`, falling back to any title there is.
    pub fn title_in(&self, language: &str) -> Option<&str> {
        self.title
            .get(language)
            .or_else(|| self.title.values().next())
            .map(String::as_str)
    }
}

/// Mangadex serializes empty objects as `[]`, and some maps may be `null`.
pub(crate) fn map_or_empty<'de, D, V>(deserializer: D) -> Result<HashMap<String, V>, D::Error>
where
    D: Deserializer<'de>,
    V: Deserialize<'de>,
{
    #[derive(Debug, Deserialize)]
    #[serde(untagged)]
    enum MapOrEmpty<V> {
        Map(HashMap<String, V>),
        #[allow(dead_code)]
        Empty([EmptyType; 0]),
    }

    #[derive(Debug, Deserialize)]
    struct EmptyType;

    Ok(match Option::<MapOrEmpty<V>>::deserialize(deserializer)? {
        Some(MapOrEmpty::Map(map)) => map,
        Some(MapOrEmpty::Empty(_)) | None => HashMap::new(),
    })
}

impl DexClient {
    /// Search manga. Filters, `limit`, `offset` and `includes[]` all go in `params`.
    ///
    /// <https://api.mangadex.org/docs.html#operation/get-search-manga>
    pub async fn manga_list(&self, params: &QueryParams) -> Result<MangaList, DexError> {
        self.query_op(MANGA_LIST_PATH, params).await
    }

    /// <https://api.mangadex.org/docs.html#operation/post-manga>
    pub async fn create_manga<T: Serialize + ?Sized>(
        &self,
        new_manga: &T,
    ) -> Result<MangaResponse, DexError> {
        self.response_op(Method::POST, MANGA_LIST_PATH, json_body(new_manga)?)
            .await
    }

    /// <https://api.mangadex.org/docs.html#operation/get-manga-id>
    pub async fn view_manga(&self, id: &str) -> Result<MangaResponse, DexError> {
        self.response_op(Method::GET, &["manga", id], None)
            .await
    }

    /// <https://api.mangadex.org/docs.html#operation/put-manga-id>
    pub async fn update_manga<T: Serialize + ?Sized>(
        &self,
        id: &str,
        update: &T,
    ) -> Result<MangaResponse, DexError> {
        self.response_op(Method::PUT, &["manga", id], json_body(update)?)
            .await
    }

    /// <https://api.mangadex.org/docs.html#operation/delete-manga-id>
    pub async fn delete_manga(&self, id: &str) -> Result<(), DexError> {
        self.simple_op(Method::DELETE, &["manga", id], None)
            .await
    }

    /// <https://api.mangadex.org/docs.html#operation/post-manga-id-list-listId>
    pub async fn add_manga_in_list(&self, manga_id: &str, list_id: &str) -> Result<(), DexError> {
        self.simple_op(
            Method::POST,
            &["manga", manga_id, "list", list_id],
            None,
        )
        .await
    }

    /// <https://api.mangadex.org/docs.html#operation/delete-manga-id-list-listId>
    pub async fn remove_manga_in_list(
        &self,
        manga_id: &str,
        list_id: &str,
    ) -> Result<(), DexError> {
        self.simple_op(
            Method::DELETE,
            &["manga", manga_id, "list", list_id],
            None,
        )
        .await
    }

    /// <https://api.mangadex.org/docs.html#operation/post-manga-id-follow>
    pub async fn follow_manga(&self, id: &str) -> Result<(), DexError> {
        self.simple_op(Method::POST, &["manga", id, "follow"], None)
            .await
    }

    /// <https://api.mangadex.org/docs.html#operation/delete-manga-id-follow>
    pub async fn unfollow_manga(&self, id: &str) -> Result<(), DexError> {
        self.simple_op(Method::DELETE, &["manga", id, "follow"], None)
            .await
    }

    /// Chapters of one manga.
    ///
    /// <https://api.mangadex.org/docs.html#operation/get-manga-id-feed>
    pub async fn manga_feed(&self, id: &str, params: &QueryParams) -> Result<ChapterList, DexError> {
        self.query_op(&["manga", id, "feed"], params).await
    }

    /// Ids of the chapters of `id` the logged user marked as read.
    ///
    /// <https://api.mangadex.org/docs.html#operation/get-manga-chapter-readmarkers>
    pub async fn manga_read_markers(&self, id: &str) -> Result<ReadMarkersResponse, DexError> {
        self.response_op(Method::GET, &["manga", id, "read"], None)
            .await
    }
}
