use super::{ChapterList, DexClient, DexError, QueryParams};

const USER_FOLLOWED_MANGA_FEED_PATH: &[&str] = &["user", "follows", "manga", "feed"];

impl DexClient {
    /// Latest chapters of every manga the logged user follows.
    ///
    /// <https://api.mangadex.org/docs.html#operation/get-user-follows-manga-feed>
    pub async fn user_followed_manga_feed(
        &self,
        params: &QueryParams,
    ) -> Result<ChapterList, DexError> {
        self.query_op(USER_FOLLOWED_MANGA_FEED_PATH, params).await
    }

    /// Chapters of the manga in the custom list `id`.
    ///
    /// <https://api.mangadex.org/docs.html#operation/get-list-id-feed>
    pub async fn custom_list_feed(
        &self,
        id: &str,
        params: &QueryParams,
    ) -> Result<ChapterList, DexError> {
        self.query_op(&["list", id, "feed"], params).await
    }
}
