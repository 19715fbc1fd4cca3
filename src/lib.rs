mod aggregate;
mod at_home;
mod auth;
mod chapter;
mod client;
mod config;
mod cover;
mod envelope;
mod feed;
mod manga;
mod query;
mod service;
mod user;

pub use aggregate::{AggregateChapter, AggregateQuery, AggregateVolume, GetChapters};
pub use at_home::{AtHomeChapter, AtHomeServer};
pub use auth::{AuthResponse, Token, TokenCheckResponse};
pub use chapter::{Chapter, ChapterAttributes, ChapterList, ChapterResponse};
pub use client::DexClient;
pub use config::{ClientConfig, ClientConfigBuilder, ClientConfigBuilderError, BASE_API};
pub use cover::{Cover, CoverArtList, CoverAttributes, CoverFilter};
pub use envelope::{check_error_and_result, ApiErrorDetail, ApiResult, Envelope};
pub use manga::{
    LocalisedString, Manga, MangaAttributes, MangaList, MangaResponse, ReadMarkersResponse,
    Relationship, Tag, TagAttributes, ARTIST_REL, AUTHOR_REL, COVER_ART_REL, MANGA_REL,
    SCANLATION_GROUP_REL, USER_REL,
};
pub use query::{id_from_url, QueryParams};
pub use service::{ChapterDownloadRequest, ChapterDownloader};
pub use user::{
    MangaReadingStatusResponse, ScanGroup, ScanGroupAttributes, ScanGroupList, User,
    UserAttributes, UserList, UserResponse,
};

#[derive(Debug, thiserror::Error)]
pub enum DexError {
    #[error(transparent)]
    RequestError(#[from] reqwest::Error),
    #[error(transparent)]
    DeserializeError(#[from] serde_json::Error),
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error("invalid url '{0}'")]
    UrlParseError(String),
    #[error(transparent)]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),
    #[error(transparent)]
    ConfigError(#[from] ClientConfigBuilderError),
    /// The request went through but mangadex answered with a result other than `ok`.
    #[error("{}", envelope::describe(result, errors))]
    ApiError {
        result: String,
        errors: Vec<ApiErrorDetail>,
    },
    #[error("not logged in")]
    NotLoggedIn,
}
