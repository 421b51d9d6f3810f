use crate::app::AppState;
use crate::error::Result;
use crate::feed::{CatalogPageSource, QueryKey};
use crate::models::Movie;
use crate::pagination::{LoadOutcome, PaginationController, Snapshot};
use std::sync::Arc;
use tracing::warn;

/// Shorter queries clear the results without hitting the API.
pub const MIN_QUERY_LEN: usize = 3;

pub struct SearchScreen {
    state: AppState,
    query: String,
    results: PaginationController,
    trending: Vec<Movie>,
}

impl SearchScreen {
    pub fn new(state: AppState) -> Self {
        let results =
            PaginationController::new(Arc::new(CatalogPageSource::new(state.catalog.clone())));
        Self {
            state,
            query: String::new(),
            results,
            trending: Vec::new(),
        }
    }

    /// Loads today's trending movies; a failure leaves the section empty.
    pub async fn open(&mut self) -> &[Movie] {
        match self.state.catalog.trending_today().await {
            Ok(page) => self.trending = page.items,
            Err(e) => warn!("Error fetching trending movies: {}", e),
        }
        &self.trending
    }

    pub async fn set_query(&mut self, text: &str) -> Result<LoadOutcome> {
        self.query = text.to_string();
        if text.trim().chars().count() < MIN_QUERY_LEN {
            self.results.clear().await;
            return Ok(LoadOutcome::Skipped);
        }
        self.results.reset(QueryKey::search(text)).await
    }

    pub async fn clear_query(&mut self) {
        self.query.clear();
        self.results.clear().await;
    }

    pub async fn load_more(&self) -> Result<LoadOutcome> {
        self.results.load_next().await
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn trending(&self) -> &[Movie] {
        &self.trending
    }

    pub async fn results(&self) -> Snapshot {
        self.results.snapshot().await
    }
}
