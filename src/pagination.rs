//! Incremental "load more" over a paged catalog query.
//!
//! One controller owns the accumulated items for a single [`QueryKey`] at a time.
//! Every fetch is tagged with the generation it was issued under; `reset` bumps
//! the generation, so a response that arrives after a reset is dropped instead
//! of being merged into the new query's items.

use crate::error::{Error, Result};
use crate::feed::QueryKey;
use crate::models::{Movie, Page};
use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_page(&self, key: &QueryKey, page: u32) -> Result<Page<Movie>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HasMorePolicy {
    /// More pages exist while the last page returned any items.
    NonEmptyPage,
    /// More pages exist while `page < total_pages`. Responses without
    /// `total_pages` fall back to [`HasMorePolicy::NonEmptyPage`].
    TotalPages,
}

impl HasMorePolicy {
    pub fn has_more(&self, page: &Page<Movie>) -> bool {
        match (self, page.total_pages) {
            (HasMorePolicy::TotalPages, Some(total)) => page.page_number < total,
            _ => !page.items.is_empty(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Appended { page: u32, count: usize },
    /// Guarded: a fetch is already in flight, there is nothing more, or no query is set.
    Skipped,
    /// The response belonged to a query that was reset while it was in flight.
    Stale,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub query: Option<QueryKey>,
    pub items: Vec<Movie>,
    pub current_page: u32,
    pub has_more: bool,
    pub is_loading: bool,
    pub last_error: Option<Error>,
}

struct State {
    query: Option<QueryKey>,
    generation: u64,
    items: Vec<Movie>,
    current_page: u32,
    has_more: bool,
    is_loading: bool,
    last_error: Option<Error>,
}

struct Inner {
    source: Arc<dyn PageSource>,
    policy_override: Option<HasMorePolicy>,
    // Never held across an await, so a dropped fetch can release it from `Drop`.
    state: Mutex<State>,
}

impl Inner {
    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Clears `is_loading` if the fetch future is dropped before it completes
/// (timeout, `select!`, aborted task), unless a reset already moved on.
struct InFlight<'a> {
    inner: &'a Inner,
    generation: u64,
    armed: bool,
}

impl InFlight<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut state = self.inner.state();
        if state.generation == self.generation {
            debug!("page fetch abandoned, releasing loading flag");
            state.is_loading = false;
        }
    }
}

#[derive(Clone)]
pub struct PaginationController {
    inner: Arc<Inner>,
}

impl PaginationController {
    pub fn new(source: Arc<dyn PageSource>) -> Self {
        Self::build(source, None)
    }

    /// Uses `policy` for every query instead of the key's default.
    pub fn with_policy(source: Arc<dyn PageSource>, policy: HasMorePolicy) -> Self {
        Self::build(source, Some(policy))
    }

    fn build(source: Arc<dyn PageSource>, policy_override: Option<HasMorePolicy>) -> Self {
        Self {
            inner: Arc::new(Inner {
                source,
                policy_override,
                state: Mutex::new(State {
                    query: None,
                    generation: 0,
                    items: Vec::new(),
                    current_page: 0,
                    has_more: false,
                    is_loading: false,
                    last_error: None,
                }),
            }),
        }
    }

    /// Switches to `key`, dropping accumulated items and the relevance of any
    /// in-flight fetch, then loads the first page.
    pub async fn reset(&self, key: QueryKey) -> Result<LoadOutcome> {
        {
            let mut state = self.inner.state();
            debug!(query = %key, "resetting pagination");
            state.generation += 1;
            state.query = Some(key);
            state.items.clear();
            state.current_page = 0;
            state.has_more = true;
            state.is_loading = false;
            state.last_error = None;
        }
        self.load_next().await
    }

    /// Re-runs the current query from page 1. No-op without a query.
    pub async fn refresh(&self) -> Result<LoadOutcome> {
        let query = self.inner.state().query.clone();
        match query {
            Some(key) => self.reset(key).await,
            None => Ok(LoadOutcome::Skipped),
        }
    }

    /// Forgets the current query entirely.
    pub async fn clear(&self) {
        let mut state = self.inner.state();
        state.generation += 1;
        state.query = None;
        state.items.clear();
        state.current_page = 0;
        state.has_more = false;
        state.is_loading = false;
        state.last_error = None;
    }

    pub async fn load_next(&self) -> Result<LoadOutcome> {
        let (key, generation, page) = {
            let mut state = self.inner.state();
            let Some(key) = state.query.clone() else {
                return Ok(LoadOutcome::Skipped);
            };
            if state.is_loading || !state.has_more {
                return Ok(LoadOutcome::Skipped);
            }
            state.is_loading = true;
            (key, state.generation, state.current_page + 1)
        };

        let in_flight = InFlight {
            inner: &self.inner,
            generation,
            armed: true,
        };
        debug!(query = %key, page, "fetching page");
        let result = self.inner.source.fetch_page(&key, page).await;
        in_flight.disarm();

        let mut state = self.inner.state();
        if state.generation != generation {
            debug!(query = %key, page, "discarding stale page");
            return Ok(LoadOutcome::Stale);
        }
        state.is_loading = false;

        match result {
            Ok(fetched) => {
                let policy = self
                    .inner
                    .policy_override
                    .unwrap_or_else(|| key.default_policy());
                state.has_more = policy.has_more(&fetched);
                let count = fetched.items.len();
                state.items.extend(fetched.items);
                state.current_page = page;
                state.last_error = None;
                Ok(LoadOutcome::Appended { page, count })
            }
            Err(err) => {
                warn!("Failed to load page {} for {}: {}", page, key, err);
                state.last_error = Some(err.clone());
                Err(err)
            }
        }
    }

    pub async fn snapshot(&self) -> Snapshot {
        let state = self.inner.state();
        Snapshot {
            query: state.query.clone(),
            items: state.items.clone(),
            current_page: state.current_page,
            has_more: state.has_more,
            is_loading: state.is_loading,
            last_error: state.last_error.clone(),
        }
    }

    pub async fn items(&self) -> Vec<Movie> {
        self.inner.state().items.clone()
    }

    pub async fn is_loading(&self) -> bool {
        self.inner.state().is_loading
    }

    pub async fn has_more(&self) -> bool {
        self.inner.state().has_more
    }
}
