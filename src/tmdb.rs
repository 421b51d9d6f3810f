use crate::config::{Settings, DEFAULT_IMAGE_BASE, DEFAULT_TMDB_BASE};
use crate::error::{Error, Result};
use crate::models::{Credits, Genre, Movie, MovieImages, Page, Video};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_SORT: &str = "popularity.desc";

pub mod image_size {
    pub const PROFILE: &str = "w185";
    pub const POSTER: &str = "w500";
    pub const BACKDROP: &str = "w780";
    pub const ORIGINAL: &str = "original";
}

#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn popular(&self, page: u32) -> Result<Page<Movie>>;
    async fn top_rated(&self, page: u32) -> Result<Page<Movie>>;
    async fn upcoming(&self, page: u32) -> Result<Page<Movie>>;
    async fn trending_today(&self) -> Result<Page<Movie>>;
    async fn search(&self, query: &str, page: u32) -> Result<Page<Movie>>;
    async fn discover_by_genre(&self, genre_id: i64, page: u32, sort_by: &str)
        -> Result<Page<Movie>>;
    async fn movie_details(&self, id: i64) -> Result<Movie>;
    async fn similar(&self, id: i64) -> Result<Vec<Movie>>;
    async fn credits(&self, id: i64) -> Result<Credits>;
    async fn videos(&self, id: i64) -> Result<Vec<Video>>;
    async fn images(&self, id: i64) -> Result<MovieImages>;
}

#[derive(Debug, Clone)]
pub struct TmdbClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl TmdbClient {
    pub fn new(api_key: impl Into<String>, base_url: &str, timeout: Duration) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(Error::Validation("TMDB API key cannot be empty".to_string()));
        }
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(timeout)
            .user_agent(format!("cinescope/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Network(format!("failed to build TMDB HTTP client: {}", e)))?;
        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(
            settings.tmdb_api_key.clone(),
            &settings.tmdb_base_url,
            settings.request_timeout,
        )
    }

    pub fn with_default_base(api_key: impl Into<String>) -> Result<Self> {
        Self::new(
            api_key,
            DEFAULT_TMDB_BASE,
            Duration::from_secs(crate::config::DEFAULT_TIMEOUT_SECS),
        )
    }

    fn url(&self, path: &str, params: &[(&str, String)]) -> String {
        let mut url = format!("{}{}?api_key={}", self.base_url, path, self.api_key);
        for (key, value) in params {
            url.push('&');
            url.push_str(key);
            url.push('=');
            url.push_str(&urlencoding::encode(value));
        }
        url
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        let url = self.url(path, params);
        debug!(path = %path, "TMDB request");
        // The URL carries the API key; keep it out of logs and errors.
        let res = self.client.get(&url).send().await.map_err(|e| {
            let e = e.without_url();
            warn!("TMDB request to {} failed: {}", path, e);
            Error::Network(e.to_string())
        })?;
        let status = res.status();
        let text = res
            .text()
            .await
            .map_err(|e| Error::Network(format!("reading body failed: {}", e.without_url())))?;
        if status == StatusCode::NOT_FOUND {
            return Err(Error::NotFound(path.to_string()));
        }
        if !status.is_success() {
            warn!("TMDB {} -> {}", path, status);
            return Err(Error::Http {
                status: status.as_u16(),
                body: text,
            });
        }
        serde_json::from_str(&text)
            .map_err(|e| Error::Malformed(format!("{}: {}", path, e)))
    }

    async fn list(&self, path: &str, page: u32) -> Result<Page<Movie>> {
        self.get_json(path, &[("page", page.max(1).to_string())])
            .await
    }
}

#[async_trait]
impl CatalogApi for TmdbClient {
    async fn popular(&self, page: u32) -> Result<Page<Movie>> {
        self.list("/movie/popular", page).await
    }

    async fn top_rated(&self, page: u32) -> Result<Page<Movie>> {
        self.list("/movie/top_rated", page).await
    }

    async fn upcoming(&self, page: u32) -> Result<Page<Movie>> {
        self.list("/movie/upcoming", page).await
    }

    async fn trending_today(&self) -> Result<Page<Movie>> {
        self.get_json("/trending/movie/day", &[]).await
    }

    async fn search(&self, query: &str, page: u32) -> Result<Page<Movie>> {
        self.get_json(
            "/search/movie",
            &[
                ("query", query.to_string()),
                ("page", page.max(1).to_string()),
            ],
        )
        .await
    }

    async fn discover_by_genre(
        &self,
        genre_id: i64,
        page: u32,
        sort_by: &str,
    ) -> Result<Page<Movie>> {
        self.get_json(
            "/discover/movie",
            &[
                ("with_genres", genre_id.to_string()),
                ("page", page.max(1).to_string()),
                ("sort_by", sort_by.to_string()),
            ],
        )
        .await
    }

    async fn movie_details(&self, id: i64) -> Result<Movie> {
        self.get_json(&format!("/movie/{id}"), &[]).await
    }

    async fn similar(&self, id: i64) -> Result<Vec<Movie>> {
        let page: Page<Movie> = self.get_json(&format!("/movie/{id}/similar"), &[]).await?;
        Ok(page.items)
    }

    async fn credits(&self, id: i64) -> Result<Credits> {
        self.get_json(&format!("/movie/{id}/credits"), &[]).await
    }

    async fn videos(&self, id: i64) -> Result<Vec<Video>> {
        #[derive(Deserialize)]
        struct Videos {
            #[serde(default)]
            results: Vec<Video>,
        }
        let data: Videos = self.get_json(&format!("/movie/{id}/videos"), &[]).await?;
        Ok(data.results)
    }

    async fn images(&self, id: i64) -> Result<MovieImages> {
        self.get_json(&format!("/movie/{id}/images"), &[]).await
    }
}

/// `{base}/{size}{path}`; TMDB paths carry their own leading slash.
pub fn image_url(base: &str, path: &str, size: &str) -> String {
    let base = if base.is_empty() {
        DEFAULT_IMAGE_BASE
    } else {
        base.trim_end_matches('/')
    };
    if path.starts_with('/') {
        format!("{base}/{size}{path}")
    } else {
        format!("{base}/{size}/{path}")
    }
}

pub fn poster_url(base: &str, movie: &Movie) -> Option<String> {
    movie
        .poster_path
        .as_deref()
        .map(|p| image_url(base, p, image_size::POSTER))
}

pub fn backdrop_url(base: &str, movie: &Movie) -> Option<String> {
    movie
        .backdrop_path
        .as_deref()
        .map(|p| image_url(base, p, image_size::BACKDROP))
}

static MOVIE_GENRES: Lazy<Vec<Genre>> = Lazy::new(|| {
    [
        (28, "Action"),
        (12, "Adventure"),
        (16, "Animation"),
        (35, "Comedy"),
        (80, "Crime"),
        (99, "Documentary"),
        (18, "Drama"),
        (10751, "Family"),
        (14, "Fantasy"),
        (36, "History"),
        (27, "Horror"),
        (10402, "Music"),
        (9648, "Mystery"),
        (10749, "Romance"),
        (878, "Science Fiction"),
        (10770, "TV Movie"),
        (53, "Thriller"),
        (10752, "War"),
        (37, "Western"),
    ]
    .into_iter()
    .map(|(id, name)| Genre {
        id,
        name: name.to_string(),
    })
    .collect()
});

/// The fixed TMDB movie genre list offered for category browsing.
pub fn movie_genres() -> &'static [Genre] {
    &MOVIE_GENRES
}

pub fn genre_by_id(id: i64) -> Option<&'static Genre> {
    MOVIE_GENRES.iter().find(|g| g.id == id)
}
