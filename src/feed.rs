use crate::error::Result;
use crate::models::{Movie, Page};
use crate::pagination::{HasMorePolicy, PageSource};
use crate::tmdb::{CatalogApi, DEFAULT_SORT};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// Identifies one logical paginated query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    Popular,
    TopRated,
    Upcoming,
    Trending,
    Genre { id: i64, sort_by: String },
    Search(String),
}

impl QueryKey {
    pub fn genre(id: i64) -> Self {
        QueryKey::Genre {
            id,
            sort_by: DEFAULT_SORT.to_string(),
        }
    }

    pub fn search(query: &str) -> Self {
        QueryKey::Search(query.trim().to_string())
    }

    /// Genre discovery stops on the first empty page; the other feeds trust
    /// `total_pages`.
    pub fn default_policy(&self) -> HasMorePolicy {
        match self {
            QueryKey::Genre { .. } => HasMorePolicy::NonEmptyPage,
            _ => HasMorePolicy::TotalPages,
        }
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryKey::Popular => write!(f, "popular"),
            QueryKey::TopRated => write!(f, "top_rated"),
            QueryKey::Upcoming => write!(f, "upcoming"),
            QueryKey::Trending => write!(f, "trending"),
            QueryKey::Genre { id, sort_by } => write!(f, "genre:{}:{}", id, sort_by),
            QueryKey::Search(q) => write!(f, "search:{}", q),
        }
    }
}

/// Serves controller pages from the catalog API.
#[derive(Clone)]
pub struct CatalogPageSource {
    catalog: Arc<dyn CatalogApi>,
}

impl CatalogPageSource {
    pub fn new(catalog: Arc<dyn CatalogApi>) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl PageSource for CatalogPageSource {
    async fn fetch_page(&self, key: &QueryKey, page: u32) -> Result<Page<Movie>> {
        match key {
            QueryKey::Popular => self.catalog.popular(page).await,
            QueryKey::TopRated => self.catalog.top_rated(page).await,
            QueryKey::Upcoming => self.catalog.upcoming(page).await,
            // The trending endpoint is a single daily page.
            QueryKey::Trending => {
                let mut first = self.catalog.trending_today().await?;
                if page > 1 {
                    first.items.clear();
                }
                first.page_number = page;
                first.total_pages = Some(1);
                Ok(first)
            }
            QueryKey::Genre { id, sort_by } => {
                self.catalog.discover_by_genre(*id, page, sort_by).await
            }
            QueryKey::Search(q) => self.catalog.search(q, page).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policies_per_feed() {
        assert_eq!(QueryKey::genre(28).default_policy(), HasMorePolicy::NonEmptyPage);
        assert_eq!(QueryKey::TopRated.default_policy(), HasMorePolicy::TotalPages);
        assert_eq!(QueryKey::search("dune").default_policy(), HasMorePolicy::TotalPages);
    }

    #[test]
    fn search_key_is_trimmed() {
        assert_eq!(QueryKey::search("  dune "), QueryKey::Search("dune".to_string()));
        assert_eq!(QueryKey::genre(35).to_string(), "genre:35:popularity.desc");
    }
}
