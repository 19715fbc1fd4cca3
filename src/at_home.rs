use super::envelope::impl_api_result;
use super::{ApiErrorDetail, DexClient, DexError, QueryParams};
use serde::Deserialize;

/// A MangaDex@Home node able to serve the pages of one chapter.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AtHomeServer {
    pub result: String,
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub chapter: AtHomeChapter,
    #[serde(default)]
    pub errors: Vec<ApiErrorDetail>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AtHomeChapter {
    pub hash: String,
    pub data: Vec<String>,
    pub data_saver: Vec<String>,
}

impl_api_result!(AtHomeServer);

impl AtHomeServer {
    /// Urls of every page, in reading order.
    pub fn page_urls(&self, data_saver: bool) -> Vec<String> {
        let (quality, pages) = if data_saver {
            ("data-saver", &self.chapter.data_saver)
        } else {
            ("data", &self.chapter.data)
        };
        pages
            .iter()
            .map(|page| {
                format!(
                    "{}/{}/{}/{}",
                    self.base_url.trim_end_matches('/'),
                    quality,
                    self.chapter.hash,
                    page
                )
            })
            .collect()
    }
}

impl DexClient {
    /// Resolves the node serving `chapter_id`. With `ssl` set, only nodes on
    /// port 443 are returned.
    ///
    /// <https://api.mangadex.org/docs.html#operation/get-at-home-server-chapterId>
    pub async fn at_home_server(&self, chapter_id: &str, ssl: bool) -> Result<AtHomeServer, DexError> {
        let params = QueryParams::new().set("ssl", ssl);
        self.query_op(&["at-home", "server", chapter_id], &params)
            .await
    }

    /// Base url of the MangaDex@Home node serving `chapter_id`.
    pub async fn get_md_home_url(&self, chapter_id: &str, ssl: bool) -> Result<String, DexError> {
        Ok(self.at_home_server(chapter_id, ssl).await?.base_url)
    }
}
