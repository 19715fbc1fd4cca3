use super::envelope::impl_api_result;
use super::{ApiErrorDetail, DexClient, DexError, Relationship};
use reqwest::Method;
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChapterList {
    pub result: String,
    #[serde(default)]
    pub response: String,
    #[serde(default, alias = "results")]
    pub data: Vec<Chapter>,
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
pub struct ChapterResponse {
    pub result: String,
    #[serde(default)]
    pub response: String,
    #[serde(default)]
    pub data: Chapter,
    #[serde(default)]
    pub errors: Vec<ApiErrorDetail>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Chapter {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub attributes: ChapterAttributes,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChapterAttributes {
    pub title: Option<String>,
    pub volume: Option<String>,
    pub chapter: Option<String>,
    pub pages: u32,
    pub translated_language: String,
    pub uploader: Option<String>,
    pub external_url: Option<String>,
    pub version: u32,
    pub created_at: String,
    pub updated_at: String,
    pub publish_at: String,
    pub readable_at: String,
}

impl_api_result!(ChapterList, ChapterResponse);

impl DexClient {
    /// <https://api.mangadex.org/docs.html#operation/get-chapter-id>
    pub async fn view_chapter(&self, id: &str) -> Result<ChapterResponse, DexError> {
        self.response_op(Method::GET, &["chapter", id], None)
            .await
    }

    /// <https://api.mangadex.org/docs.html#operation/delete-chapter-id>
    pub async fn delete_chapter(&self, id: &str) -> Result<(), DexError> {
        self.simple_op(Method::DELETE, &["chapter", id], None)
            .await
    }
}
