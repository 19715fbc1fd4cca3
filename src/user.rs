use super::envelope::impl_api_result;
use super::{ApiErrorDetail, DexClient, DexError, MangaList, QueryParams, Relationship};
use reqwest::Method;
use serde::Deserialize;
use std::collections::HashMap;

const LOGGED_USER_PATH: &[&str] = &["user", "me"];
const USER_FOLLOWED_MANGA_LIST_PATH: &[&str] = &["user", "follows", "manga"];
const USER_MANGA_READING_STATUS_PATH: &[&str] = &["manga", "status"];
const USER_FOLLOWED_GROUP_LIST_PATH: &[&str] = &["user", "follows", "group"];

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserList {
    pub result: String,
    #[serde(default)]
    pub response: String,
    #[serde(default, alias = "results")]
    pub data: Vec<User>,
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
pub struct UserResponse {
    pub result: String,
    #[serde(default)]
    pub response: String,
    #[serde(default)]
    pub data: User,
    #[serde(default)]
    pub errors: Vec<ApiErrorDetail>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub attributes: UserAttributes,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UserAttributes {
    pub username: String,
    pub roles: Vec<String>,
    pub version: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScanGroupList {
    pub result: String,
    #[serde(default)]
    pub response: String,
    #[serde(default, alias = "results")]
    pub data: Vec<ScanGroup>,
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
pub struct ScanGroup {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub attributes: ScanGroupAttributes,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScanGroupAttributes {
    pub name: String,
    pub website: Option<String>,
    pub description: Option<String>,
    pub official: bool,
    pub inactive: bool,
    pub version: u32,
}

/// Reading status (`reading`, `completed`, ...) keyed by manga id.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MangaReadingStatusResponse {
    pub result: String,
    #[serde(default, deserialize_with = "super::manga::map_or_empty")]
    pub statuses: HashMap<String, String>,
    #[serde(default)]
    pub errors: Vec<ApiErrorDetail>,
}

impl_api_result!(UserList, UserResponse, ScanGroupList, MangaReadingStatusResponse);

impl DexClient {
    /// <https://api.mangadex.org/docs.html#operation/get-user-id>
    pub async fn get_user(&self, id: &str) -> Result<UserResponse, DexError> {
        self.response_op(Method::GET, &["user", id], None)
            .await
    }

    /// <https://api.mangadex.org/docs.html#operation/get-user-me>
    pub async fn get_logged_user(&self) -> Result<UserResponse, DexError> {
        self.response_op(Method::GET, LOGGED_USER_PATH, None).await
    }

    /// <https://api.mangadex.org/docs.html#operation/get-user-follows-manga>
    pub async fn user_followed_manga_list(
        &self,
        limit: usize,
        offset: usize,
    ) -> Result<MangaList, DexError> {
        let params = QueryParams::new().limit(limit).offset(offset);
        self.query_op(USER_FOLLOWED_MANGA_LIST_PATH, &params).await
    }

    /// <https://api.mangadex.org/docs.html#operation/get-manga-status>
    pub async fn user_manga_reading_status(&self) -> Result<MangaReadingStatusResponse, DexError> {
        self.response_op(Method::GET, USER_MANGA_READING_STATUS_PATH, None)
            .await
    }

    /// <https://api.mangadex.org/docs.html#operation/get-user-follows-group>
    pub async fn user_followed_group_list(
        &self,
        limit: usize,
        offset: usize,
    ) -> Result<ScanGroupList, DexError> {
        let params = QueryParams::new().limit(limit).offset(offset);
        self.query_op(USER_FOLLOWED_GROUP_LIST_PATH, &params).await
    }
}
