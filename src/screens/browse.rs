use crate::app::AppState;
use crate::error::{Error, Result};
use crate::feed::{CatalogPageSource, QueryKey};
use crate::models::Genre;
use crate::pagination::{LoadOutcome, PaginationController, Snapshot};
use crate::tmdb;
use std::sync::Arc;

fn catalog_feed(state: &AppState) -> PaginationController {
    PaginationController::new(Arc::new(CatalogPageSource::new(state.catalog.clone())))
}

/// Genre picker plus an endlessly scrolling grid for the selected genre.
pub struct CategoriesScreen {
    selected: Option<&'static Genre>,
    feed: PaginationController,
}

impl CategoriesScreen {
    pub fn new(state: &AppState) -> Self {
        Self {
            selected: None,
            feed: catalog_feed(state),
        }
    }

    pub fn genres(&self) -> &'static [Genre] {
        tmdb::movie_genres()
    }

    pub fn selected(&self) -> Option<&'static Genre> {
        self.selected
    }

    pub async fn select(&mut self, genre_id: i64) -> Result<LoadOutcome> {
        let genre = tmdb::genre_by_id(genre_id)
            .ok_or_else(|| Error::Validation(format!("unknown genre {}", genre_id)))?;
        self.selected = Some(genre);
        self.feed.reset(QueryKey::genre(genre.id)).await
    }

    pub async fn load_more(&self) -> Result<LoadOutcome> {
        if self.selected.is_none() {
            return Ok(LoadOutcome::Skipped);
        }
        self.feed.load_next().await
    }

    pub async fn snapshot(&self) -> Snapshot {
        self.feed.snapshot().await
    }
}

pub struct TopRatedScreen {
    feed: PaginationController,
}

impl TopRatedScreen {
    pub fn new(state: &AppState) -> Self {
        Self {
            feed: catalog_feed(state),
        }
    }

    pub async fn open(&self) -> Result<LoadOutcome> {
        self.feed.reset(QueryKey::TopRated).await
    }

    pub async fn refresh(&self) -> Result<LoadOutcome> {
        self.feed.refresh().await
    }

    pub async fn load_more(&self) -> Result<LoadOutcome> {
        self.feed.load_next().await
    }

    pub async fn snapshot(&self) -> Snapshot {
        self.feed.snapshot().await
    }
}
