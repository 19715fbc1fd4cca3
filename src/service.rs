use super::{id_from_url, AtHomeServer, DexClient, DexError};
use futures::Future;
use reqwest::IntoUrl;
use std::fmt::Debug;
use std::path::Path;
use std::path::PathBuf;
use std::pin::Pin;
use tokio::fs;
use tower::Service;
use tracing::debug;
use tracing::debug_span;
use tracing::instrument;
use tracing::Instrument;

/// Downloads every page of a chapter into a folder.
///
/// Pages come from the MangaDex@Home node returned by
/// [`DexClient::at_home_server`]. The bearer credential is never sent to it.
#[derive(Debug, Clone)]
pub struct ChapterDownloader {
    client: DexClient,
}

#[derive(Debug, Clone)]
pub struct ChapterDownloadRequest {
    pub(crate) id: String,
    pub(crate) data_saver: bool,
    pub(crate) ssl: bool,
    pub(crate) path: PathBuf,
}

impl ChapterDownloadRequest {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            data_saver: true,
            ssl: false,
            path: PathBuf::from("."),
        }
    }

    /// From a `https://mangadex.org/chapter/<id>` link.
    pub fn from_url(url: impl IntoUrl + Clone + ToString) -> Result<Self, DexError> {
        Ok(Self::new(&id_from_url(url, "chapter")?))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn data_saver(mut self, data_saver: bool) -> Self {
        self.data_saver = data_saver;
        self
    }

    /// Only use nodes listening on port 443.
    pub fn ssl(mut self, ssl: bool) -> Self {
        self.ssl = ssl;
        self
    }

    pub fn path(mut self, path: impl AsRef<Path>) -> Self {
        self.path = path.as_ref().to_path_buf();
        self
    }
}

impl ChapterDownloader {
    pub fn new(client: DexClient) -> Self {
        Self { client }
    }
}

impl Service<ChapterDownloadRequest> for ChapterDownloader {
    type Response = Vec<PathBuf>;
    type Error = DexError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(
        &mut self,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        std::task::Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: ChapterDownloadRequest) -> Self::Future {
        let client = self.client.clone();
        let span = debug_span!("chapter_downloader", id = %req.id);
        let fut = async move {
            debug!(?req);
            let server = client.at_home_server(&req.id, req.ssl).await?;
            download_chapter(client.http(), &server, &req.path, req.data_saver).await
        };

        Box::pin(fut.instrument(span))
    }
}

/// Writes pages as `page_<n>.<ext>`, `n` zero padded to the page count width.
#[instrument(skip(http, server))]
async fn download_chapter(
    http: &reqwest::Client,
    server: &AtHomeServer,
    path: impl AsRef<Path> + Debug,
    data_saver: bool,
) -> Result<Vec<PathBuf>, DexError> {
    async fn download_one(
        http: &reqwest::Client,
        url: String,
        file: PathBuf,
    ) -> Result<PathBuf, DexError> {
        debug!("Download {}", file.display());
        let bytes = http.get(url).send().await?.error_for_status()?.bytes().await?;
        fs::write(&file, &bytes).await?;
        Ok(file)
    }

    let path = path.as_ref();
    fs::create_dir_all(path).await?;
    let urls = server.page_urls(data_saver);
    let width = urls.len().checked_ilog10().unwrap_or(0) as usize + 1;
    let downloads = urls.into_iter().enumerate().map(|(i, url)| {
        let ext = if url.ends_with(".png") { "png" } else { "jpg" };
        let file = path.join(format!("page_{i:0width$}.{ext}"));
        download_one(http, url, file)
    });
    futures::future::join_all(downloads)
        .await
        .into_iter()
        .collect()
}
