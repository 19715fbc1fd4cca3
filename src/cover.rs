use super::client::json_body;
use super::envelope::impl_api_result;
use super::{ApiErrorDetail, DexClient, DexError, QueryParams, Relationship};
use reqwest::Method;
use serde::{Deserialize, Serialize};

const COVER_LIST_PATH: &[&str] = &["cover"];

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CoverArtList {
    pub result: String,
    #[serde(default)]
    pub response: String,
    #[serde(default)]
    pub data: Vec<Cover>,
    #[serde(default)]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
    #[serde(default)]
    pub total: usize,
    #[serde(default)]
    pub errors: Vec<ApiErrorDetail>,
}

impl_api_result!(CoverArtList);

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Cover {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub attributes: CoverAttributes,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CoverAttributes {
    pub volume: Option<String>,
    pub file_name: String,
    pub description: Option<String>,
    pub locale: Option<String>,
    pub version: u32,
    pub created_at: String,
    pub updated_at: String,
}

/// Which ids a cover list lookup is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverFilter {
    /// Covers of these manga.
    Manga,
    /// These covers.
    Ids,
}

impl CoverFilter {
    fn key(self) -> &'static str {
        match self {
            CoverFilter::Manga => "manga",
            CoverFilter::Ids => "ids",
        }
    }
}

#[derive(Debug, Serialize)]
struct CoverListRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    manga: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ids: Option<&'a [String]>,
}

impl<'a> CoverListRequest<'a> {
    fn new(ids: &'a [String], filter: CoverFilter) -> Self {
        match filter {
            CoverFilter::Manga => Self {
                manga: Some(ids),
                ids: None,
            },
            CoverFilter::Ids => Self {
                manga: None,
                ids: Some(ids),
            },
        }
    }
}

impl DexClient {
    /// Covers of the given manga, or the given covers, depending on `filter`.
    ///
    /// The ids go both in the json body and in the query string.
    ///
    /// <https://api.mangadex.org/docs.html#operation/get-cover>
    pub async fn manga_cover_list(
        &self,
        ids: &[String],
        filter: CoverFilter,
    ) -> Result<CoverArtList, DexError> {
        let key = format!("{}[]", filter.key());
        let params = ids
            .iter()
            .fold(QueryParams::new(), |params, id| params.add(&key, id));
        let url = self.endpoint_with_query(COVER_LIST_PATH, &params)?;
        let body = json_body(&CoverListRequest::new(ids, filter))?;
        let res = self
            .request_and_decode::<CoverArtList>(Method::GET, url, body)
            .await
            .map(|(_, r)| r);
        super::check_error_and_result(res)
    }
}
