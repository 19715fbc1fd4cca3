use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{ArgAction, Args, Parser, Subcommand};
use dexapi::{
    AggregateChapter, AggregateQuery, AggregateVolume, ChapterDownloadRequest, ChapterDownloader,
    ClientConfigBuilder, CoverFilter, DexClient, GetChapters, QueryParams, AUTHOR_REL,
};
use tower::{Service, ServiceBuilder, ServiceExt};
use tracing::warn;
use tracing_subscriber::EnvFilter;
use zip::{write::FileOptions, ZipWriter};

#[derive(Debug, Parser)]
#[command(name = "dex", version, author, about = "CLI client of the mangadex API")]
struct Arguments {
    #[arg(
        long,
        global = true,
        env = "MANGADEX_API_URL",
        default_value_t = String::from(dexapi::BASE_API),
        help = "root of the mangadex API"
    )]
    api_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Search manga by title
    Search {
        title: String,
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
        #[arg(short, long, default_value_t = 0)]
        offset: usize,
    },
    /// List the chapters of a manga
    Feed {
        #[arg(help = "manga id or url")]
        manga: String,
        #[arg(short, long, default_value_t = String::from("en"), help = "translation language")]
        language: String,
        #[arg(long, default_value_t = 100)]
        limit: usize,
        #[arg(long, default_value_t = 0)]
        offset: usize,
    },
    /// List the covers of some manga
    Covers {
        #[arg(required = true, help = "manga ids")]
        manga: Vec<String>,
    },
    /// Log in and show the account and its permissions
    Whoami(Credentials),
    /// Download one chapter
    Chapter(ChapterArgs),
    /// Download the chapters of a manga
    Manga(MangaArgs),
}

#[derive(Debug, Args)]
struct Credentials {
    #[arg(long, env = "MANGADEX_USERNAME")]
    username: String,
    #[arg(long, env = "MANGADEX_PASSWORD", hide_env_values = true)]
    password: String,
}

#[derive(Debug, Args)]
struct ChapterArgs {
    #[arg(help = "chapter id or url")]
    chapter: String,
    #[command(flatten)]
    output: Output,
}

#[derive(Debug, Args)]
struct Output {
    #[arg(short, long, default_value = ".", help = "destination folder")]
    path: PathBuf,
    #[arg(
        short = 'r',
        long = "raw",
        action = ArgAction::SetFalse,
        default_value_t = true,
        help = "download uncompressed images"
    )]
    data_saver: bool,
    #[arg(long, help = "only use MangaDex@Home nodes on port 443")]
    ssl: bool,
}

#[derive(Debug, Args)]
struct MangaArgs {
    #[arg(help = "manga id or url")]
    manga: String,
    #[arg(short, long, default_value_t = String::from("en"), help = "translation language")]
    language: String,
    #[arg(short, long, help = "translation group")]
    groups: Vec<String>,
    #[command(flatten)]
    selection: Selection,
    #[command(flatten)]
    output: Output,
    #[arg(long, help = "make cbz file")]
    make_cbz: bool,
}

#[derive(Debug, Args)]
struct Selection {
    #[arg(short, long, group = "range")]
    chapters: Vec<f32>,
    #[arg(short, long, group = "range")]
    volumes: Vec<f32>,
    #[command(flatten)]
    chapter_range: ChapterRange,
    #[command(flatten)]
    volume_range: VolumeRange,
}

#[derive(Debug, Clone, Args)]
#[group(
    id = "chapter_range",
    multiple = true,
    conflicts_with = "range",
    conflicts_with = "volume_range"
)]
struct ChapterRange {
    #[arg(long)]
    min_chapter: Option<f32>,
    #[arg(long)]
    max_chapter: Option<f32>,
}

#[derive(Debug, Clone, Args)]
#[group(id = "volume_range", multiple = true, conflicts_with = "range")]
struct VolumeRange {
    #[arg(long)]
    min_volume: Option<f32>,
    #[arg(long)]
    max_volume: Option<f32>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Arguments::parse();
    let config = ClientConfigBuilder::default()
        .base_url(args.api_url)
        .build()?;
    let mut client = DexClient::with_config(config)?;

    match args.command {
        Command::Search {
            title,
            limit,
            offset,
        } => {
            let params = QueryParams::new()
                .set("title", title)
                .limit(limit)
                .offset(offset)
                .include(AUTHOR_REL);
            let list = client.manga_list(&params).await?;
            for manga in &list.data {
                println!(
                    "{}  {}",
                    manga.id,
                    manga.attributes.title_in("en").unwrap_or("<untitled>")
                );
            }
            println!("{} of {} results", list.data.len(), list.total);
        }
        Command::Feed {
            manga,
            language,
            limit,
            offset,
        } => {
            let id = manga_id(&manga)?;
            let params = QueryParams::new()
                .add("translatedLanguage[]", language)
                .add("order[chapter]", "asc")
                .limit(limit)
                .offset(offset);
            let feed = client.manga_feed(&id, &params).await?;
            for chapter in &feed.data {
                let a = &chapter.attributes;
                println!(
                    "{}  vol {} ch {}  {}",
                    chapter.id,
                    a.volume.as_deref().unwrap_or("-"),
                    a.chapter.as_deref().unwrap_or("-"),
                    a.title.as_deref().unwrap_or("")
                );
            }
        }
        Command::Covers { manga } => {
            let covers = client.manga_cover_list(&manga, CoverFilter::Manga).await?;
            for cover in &covers.data {
                println!(
                    "vol {}  {}",
                    cover.attributes.volume.as_deref().unwrap_or("-"),
                    cover.attributes.file_name
                );
            }
        }
        Command::Whoami(credentials) => {
            client
                .login(&credentials.username, &credentials.password)
                .await?;
            let me = client.get_logged_user().await?;
            let check = client.check_token().await?;
            println!("{} ({})", me.data.attributes.username, me.data.id);
            println!("roles: {}", check.roles.join(", "));
            println!("permissions: {}", check.permissions.len());
            client.logout().await?;
        }
        Command::Chapter(args) => {
            let req = if args.chapter.contains("mangadex.org") {
                ChapterDownloadRequest::from_url(&args.chapter)?
            } else {
                ChapterDownloadRequest::new(&args.chapter)
            };
            let req = req
                .path(&args.output.path)
                .data_saver(args.output.data_saver)
                .ssl(args.output.ssl);

            let mut download_service = ChapterDownloader::new(client);
            let pages = download_service.ready().await?.call(req).await?;
            println!("{} pages", pages.len());
        }
        Command::Manga(args) => download_manga(client, args).await?,
    }
    Ok(())
}

fn manga_id(manga: &str) -> anyhow::Result<String> {
    if manga.contains("mangadex.org") {
        Ok(dexapi::id_from_url(manga, "title")?)
    } else {
        Ok(manga.to_string())
    }
}

async fn download_manga(client: DexClient, args: MangaArgs) -> anyhow::Result<()> {
    let query = args
        .groups
        .iter()
        .fold(AggregateQuery::new(manga_id(&args.manga)?), |query, group| {
            query.group(group)
        })
        .language(&args.language);
    let volumes = client.manga_aggregate(&query).await?;
    let chapters = select_chapters(&volumes, &args.selection);

    let mut download_service = ServiceBuilder::new()
        .rate_limit(1, Duration::from_secs(2))
        .service(ChapterDownloader::new(client));

    let width = chapters
        .last()
        .and_then(|c| c.chapter().as_ref())
        .map(|&c| c.log10().floor().max(0.0) as usize)
        .unwrap_or(0)
        + 1;

    let mut downloaded_paths = Vec::new();
    for chapter in chapters {
        let chapter_name = match chapter.chapter() {
            Some(c) => format!("chapter_{c:0width$}"),
            None => String::from("chapter_none"),
        };
        println!("Download {chapter_name}");

        let download_path = args.output.path.join(&chapter_name);
        download_service
            .ready()
            .await?
            .call(
                ChapterDownloadRequest::new(chapter.id())
                    .data_saver(args.output.data_saver)
                    .ssl(args.output.ssl)
                    .path(&download_path),
            )
            .await?;
        downloaded_paths.push(download_path);
    }

    if args.make_cbz {
        println!("Making cbz file...");
        make_cbz(&args.output.path, &downloaded_paths)?;
        println!("Done.");
    }
    Ok(())
}

fn select_chapters<'a>(volumes: &'a [AggregateVolume], selection: &Selection) -> Vec<&'a AggregateChapter> {
    let in_range = |value: Option<f32>, min: Option<f32>, max: Option<f32>| {
        let value = value.unwrap_or(-1.0);
        value >= min.unwrap_or(f32::NEG_INFINITY) && value <= max.unwrap_or(f32::INFINITY)
    };

    if !selection.volumes.is_empty() {
        volumes
            .iter()
            .filter(|v| selection.volumes.contains(&v.volume().unwrap_or(f32::INFINITY)))
            .get_chapters()
    } else if !selection.chapters.is_empty() {
        volumes
            .get_chapters()
            .into_iter()
            .filter(|c| selection.chapters.contains(&c.chapter().unwrap_or(f32::INFINITY)))
            .collect()
    } else if selection.chapter_range.min_chapter.is_some()
        || selection.chapter_range.max_chapter.is_some()
    {
        let range = &selection.chapter_range;
        volumes
            .get_chapters()
            .into_iter()
            .filter(|c| in_range(*c.chapter(), range.min_chapter, range.max_chapter))
            .collect()
    } else {
        let range = &selection.volume_range;
        volumes
            .iter()
            .filter(|v| in_range(*v.volume(), range.min_volume, range.max_volume))
            .get_chapters()
    }
}

/// Packs the chapter folders into `<parent>/manga.cbz`, then removes them.
fn make_cbz(parent: &Path, chapters: &[PathBuf]) -> io::Result<()> {
    if chapters.is_empty() {
        return Ok(());
    }

    let file = fs::File::create(parent.join("manga.cbz"))?;
    let mut writer = ZipWriter::new(file);
    let mut buf = Vec::new();
    for (i, chapter) in chapters.iter().enumerate() {
        let chapter_name = chapter
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        // Prefix keeps reading order when the archive is sorted by name.
        let folder = format!("{i:05}_{chapter_name}");
        let mut pages: Vec<PathBuf> = fs::read_dir(chapter)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<io::Result<_>>()?;
        pages.sort();
        for page in pages.iter().filter(|p| p.is_file()) {
            let page_name = page
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            writer.start_file(format!("{folder}/{page_name}"), FileOptions::default())?;
            fs::File::open(page)?.read_to_end(&mut buf)?;
            writer.write_all(&buf)?;
            buf.clear();
        }
        if let Err(e) = fs::remove_dir_all(chapter) {
            warn!("Could not remove {}: {e}", chapter.display());
        }
    }
    writer.finish()?;
    Ok(())
}
