//! Fetch catalog data and print what the app would show.
//! Usage:
//!   cargo run --bin catalog_props -- movie <tmdb_id>
//!   cargo run --bin catalog_props -- feed <popular|top_rated|upcoming|trending|genre:<id>|search:<text>> [pages]
//! Requires TMDB_API_KEY in the environment (.env supported).

use anyhow::{Context, Result};
use cinescope::config::Settings;
use cinescope::feed::{CatalogPageSource, QueryKey};
use cinescope::pagination::{LoadOutcome, PaginationController};
use cinescope::tmdb::{self, image_size, CatalogApi, TmdbClient};
use cinescope::trailer::select_trailer;
use dotenvy::dotenv;
use serde_json::json;
use std::env;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, PartialEq)]
enum Command {
    Movie(i64),
    Feed(QueryKey, u32),
}

fn parse_key(raw: &str) -> Result<QueryKey> {
    if let Some(id) = raw.strip_prefix("genre:") {
        return Ok(QueryKey::genre(id.parse().context("genre id must be a number")?));
    }
    if let Some(text) = raw.strip_prefix("search:") {
        return Ok(QueryKey::search(text));
    }
    match raw {
        "popular" => Ok(QueryKey::Popular),
        "top_rated" => Ok(QueryKey::TopRated),
        "upcoming" => Ok(QueryKey::Upcoming),
        "trending" => Ok(QueryKey::Trending),
        _ => Err(anyhow::anyhow!("unknown feed '{}'", raw)),
    }
}

impl FromStr for Command {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split_whitespace().collect();
        match parts.as_slice() {
            ["movie", id] => Ok(Command::Movie(id.parse().context("movie id must be a number")?)),
            ["feed", key] => Ok(Command::Feed(parse_key(key)?, 1)),
            ["feed", key, pages] => Ok(Command::Feed(
                parse_key(key)?,
                pages.parse().context("pages must be a number")?,
            )),
            _ => Err(anyhow::anyhow!(
                "usage: catalog_props movie <id> | catalog_props feed <key> [pages]"
            )),
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let loaded = dotenv();
    init_tracing();
    if let Err(e) = loaded {
        warn!("No .env file loaded ({}) - relying on environment", e);
    }

    let command: Command = env::args().skip(1).collect::<Vec<_>>().join(" ").parse()?;
    let settings = Settings::from_env()?;
    let client = TmdbClient::from_settings(&settings)?;

    match command {
        Command::Movie(id) => print_movie(&client, &settings.image_base_url, id).await,
        Command::Feed(key, pages) => print_feed(Arc::new(client), key, pages).await,
    }
}

async fn print_movie(client: &TmdbClient, image_base: &str, id: i64) -> Result<()> {
    let (movie, credits, videos, images) = tokio::try_join!(
        client.movie_details(id),
        client.credits(id),
        client.videos(id),
        client.images(id),
    )?;
    let trailer = select_trailer(&videos);
    let output = json!({
        "id": movie.id,
        "title": movie.title,
        "year": movie.year(),
        "overview": movie.overview,
        "vote_average": movie.vote_average,
        "vote_count": movie.vote_count,
        "genres": movie.genres.as_ref().map(|g| g.iter().map(|x| x.name.clone()).collect::<Vec<_>>()),
        "cast": credits.cast.iter().take(10).map(|c| c.name.clone()).collect::<Vec<_>>(),
        "trailer": trailer.map(|t| t.youtube_url()),
        "poster": tmdb::poster_url(image_base, &movie),
        "backdrop": tmdb::backdrop_url(image_base, &movie),
        "gallery": images.backdrops.iter().take(5)
            .map(|i| tmdb::image_url(image_base, &i.file_path, image_size::BACKDROP))
            .collect::<Vec<_>>(),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn print_feed(client: Arc<TmdbClient>, key: QueryKey, pages: u32) -> Result<()> {
    let feed = PaginationController::new(Arc::new(CatalogPageSource::new(client)));
    feed.reset(key.clone()).await?;
    for _ in 1..pages {
        if feed.load_next().await? == LoadOutcome::Skipped {
            break;
        }
    }
    let snap = feed.snapshot().await;
    info!(
        "{}: {} movies over {} pages (more: {})",
        key,
        snap.items.len(),
        snap.current_page,
        snap.has_more
    );
    for movie in &snap.items {
        println!("{:>8}  {:<50}  {:.1}", movie.id, movie.title, movie.vote_average);
    }
    Ok(())
}
